//! Domain ports.
//!
//! Ports describe the side-effecting collaborators the domain needs. Adapters
//! in `outbound` implement them; tests substitute mocks or fixtures.

mod macros;
mod users_api;

pub(crate) use macros::define_port_error;

#[cfg(test)]
pub use users_api::MockUsersApi;
pub use users_api::{FixtureUsersApi, TransportError, UsersApi};
