//! Client-side user directory.
//!
//! A cached, observable view of a remote users collection together with a
//! validated create-user flow. The domain layer is transport-agnostic; the
//! reqwest adapter in [`outbound`] and the CLI in [`cli`] wire it to a real
//! endpoint.

pub mod cli;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
