//! Adapter layer modules for external system integration.
//!
//! Provides the HTTP form transport used for gateway back-channel calls.

pub mod gateway_http_client;
