//! Client for the field management backend.
//!
//! [`BackendClient`] wraps the REST endpoints and the server event stream.
//! Authentication state lives in a shared [`Session`]; a rejected token
//! signs it out so everything holding a receiver can reset.

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod sse;

pub use client::{BackendClient, EventStream, NdviRasterInfo, AUTH_HEADER};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, AUTH_EXPIRED_MESSAGE};
pub use session::Session;
pub use sse::{decode_events, SseDecoder};
