//! hookwatch relay server
//!
//! Accepts webhook deliveries on `/hooks/...` and fans them out to
//! subscribers of `/api/webhooks/events` as newline-delimited JSON.
//! Nothing is stored: a subscriber only sees deliveries that arrive
//! while it is connected.

pub mod routes;
pub mod server;
pub mod state;

pub use server::{ServerHandle, create_router, run_server_blocking, start_server};
pub use state::AppState;
