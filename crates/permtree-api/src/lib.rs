//! permtree-api: HTTP surface for the permtree service.
//!
//! Exposes expansion, tuple read/write, and namespace management over JSON
//! endpoints, plus the configuration and logging plumbing the server binary
//! uses.

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod token;
