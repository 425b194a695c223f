//! HTTP inbound adapter exposing the `/api/v1` REST endpoints.
//!
//! Each submodule owns one resource family: request DTOs, parsing into
//! domain values, and the Actix handlers annotated for OpenAPI. Handlers
//! depend only on [`state::HttpState`], a bundle of driving ports.

pub mod accounts;
pub mod ai;
pub mod analytics;
pub mod auth;
pub mod availability;
pub mod badges;
pub mod bookings;
pub mod cache_control;
pub mod chat;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod notifications;
pub mod paging;
pub mod reviews;
pub mod schemas;
pub mod search;
pub mod skills;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod two_factor;
pub mod validation;
pub mod webhooks;

pub use error::ApiResult;
