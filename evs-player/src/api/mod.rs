//! HTTP control API
//!
//! Switch requests come in over `POST /switch`; everything else is
//! read-only diagnostics and the SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
