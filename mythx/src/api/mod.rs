//! HTTP side of the crate: the endpoint-agnostic [`APIHandler`] and the
//! authenticated [`Client`] built on top of it.

pub mod client;
pub mod handler;

pub use client::{AuthState, Client, Credentials};
pub use handler::{
    APIHandler, Environment, HttpTransport, PRODUCTION_URL, STAGING_URL, Transport,
    TransportRequest, TransportResponse,
};
