//! Client library for the MythX smart contract security analysis API.
//!
//! The crate is layered bottom-up:
//!
//! - [`models`]: typed request and response objects with validation.
//! - [`middleware`]: transformers applied to every request and response.
//! - [`api::APIHandler`]: assembles, sends and parses calls.
//! - [`api::Client`]: owns credentials and keeps the token pair fresh.

pub mod api;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod utils;

pub use api::{APIHandler, AuthState, Client, Credentials, Environment};
pub use config::Config;
pub use errors::{MythXError, MythXResult};
pub use middleware::{
    AnalysisCacheMiddleware, ClientToolNameMiddleware, GroupDataMiddleware, Middleware,
};
