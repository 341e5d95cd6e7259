//! # azimport_arm
//!
//! Azure Resource Manager implementation of [`azimport_core::ResourceClient`].
//!
//! Issues authenticated `GET` list calls, follows `nextLink` continuation
//! URLs verbatim and retries throttled or failed requests with exponential
//! backoff. Every request and back-off races the caller's cancellation
//! token.

pub mod client;
pub mod error;

pub use client::{ArmClient, ArmClientOptions, ACCESS_TOKEN_ENV, ENDPOINT_ENV};
pub use error::{ArmError, ArmResult};
