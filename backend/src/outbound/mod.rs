//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories for tests and database-less runs
//! - **ai**: OpenAI-compatible chat-completions client
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod ai;
pub mod memory;
pub mod persistence;
