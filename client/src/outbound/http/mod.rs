//! HTTP outbound adapters.
//!
//! This module provides a thin reqwest implementation of the `UsersApi`
//! port.

mod dto;
mod users_http_api;

pub use users_http_api::HttpUsersApi;
