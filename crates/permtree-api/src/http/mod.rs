//! HTTP surface: router, handlers, and shared application state.

mod routes;
mod state;


pub use routes::{create_router, create_router_with_body_limit, DEPTH_REMAINING_HEADER};
pub use state::{AppState, DEFAULT_EXPAND_DEPTH};
