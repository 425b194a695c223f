//! Inbound adapters that translate external traffic into driving-port
//! calls while keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the realtime chat socket lives under
//! [`ws`] and shares the same bearer-token authentication.

pub mod http;
pub mod ws;
