//! Driven port for the remote users resource.
//!
//! The directory cache and the create-user controller depend only on this
//! trait. Production wires the reqwest adapter from `outbound::http`; tests
//! substitute mocks, recording doubles, or the in-memory
//! [`FixtureUsersApi`].

use std::sync::Mutex;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{NewUser, User, UserId};

define_port_error! {
    /// Failures surfaced by the users transport.
    ///
    /// Display strings are the human-readable messages shown by the
    /// presentation layer.
    pub enum TransportError {
        /// The endpoint could not be reached or the exchange broke mid-flight.
        Unreachable { message: String } => "Network error: {message}",
        /// The endpoint answered with a non-2xx status.
        Status { status: u16, body: String } => "Request failed with status code {status}",
        /// The response body could not be decoded into the expected shape.
        Decode { message: String } => "Malformed response: {message}",
        /// The request could not be built before reaching the network.
        InvalidRequest { message: String } => "Invalid request: {message}",
    }
}

impl TransportError {
    /// HTTP status code carried by the failure, when the server answered.
    ///
    /// # Examples
    ///
    /// ```
    /// use user_directory::domain::ports::TransportError;
    ///
    /// assert_eq!(TransportError::status(404_u16, "").status_code(), Some(404));
    /// assert_eq!(TransportError::unreachable("refused").status_code(), None);
    /// ```
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unreachable { .. } | Self::Decode { .. } | Self::InvalidRequest { .. } => None,
        }
    }
}

/// Port for reading and writing users on the remote endpoint.
///
/// No retries, timeouts, or circuit breaking happen behind this trait;
/// failures pass straight through to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// `GET /users`: the full collection in server order.
    async fn list_users(&self) -> Result<Vec<User>, TransportError>;

    /// `GET /users/{id}`.
    async fn get_user(&self, id: UserId) -> Result<User, TransportError>;

    /// `POST /users`: returns the created user with its server-assigned id.
    async fn create_user(&self, user: &NewUser) -> Result<User, TransportError>;

    /// `PUT /users/{id}` with the full user.
    async fn update_user(&self, user: &User) -> Result<User, TransportError>;

    /// `DELETE /users/{id}`.
    async fn delete_user(&self, id: UserId) -> Result<(), TransportError>;
}

/// In-memory users endpoint.
///
/// Ids are assigned sequentially from 1. Missing ids answer with a 404
/// [`TransportError::Status`], matching the remote contract.
#[derive(Debug, Default)]
pub struct FixtureUsersApi {
    directory: Mutex<FixtureDirectory>,
}

#[derive(Debug, Default)]
struct FixtureDirectory {
    users: Vec<User>,
    last_id: i64,
}

impl FixtureUsersApi {
    /// Seed the fixture with existing users; new ids continue after the
    /// largest seeded id.
    #[must_use]
    pub fn with_users(users: Vec<User>) -> Self {
        let last_id = users.iter().map(|user| user.id().get()).max().unwrap_or(0);
        Self {
            directory: Mutex::new(FixtureDirectory { users, last_id }),
        }
    }

    fn with_directory<T>(
        &self,
        operation: impl FnOnce(&mut FixtureDirectory) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let mut directory = self
            .directory
            .lock()
            .map_err(|_| TransportError::unreachable("fixture directory lock poisoned"))?;
        operation(&mut directory)
    }
}

fn not_found(id: UserId) -> TransportError {
    TransportError::status(404_u16, format!("user {id} not found"))
}

#[async_trait]
impl UsersApi for FixtureUsersApi {
    async fn list_users(&self) -> Result<Vec<User>, TransportError> {
        self.with_directory(|directory| Ok(directory.users.clone()))
    }

    async fn get_user(&self, id: UserId) -> Result<User, TransportError> {
        self.with_directory(|directory| {
            directory
                .users
                .iter()
                .find(|user| user.id() == id)
                .cloned()
                .ok_or_else(|| not_found(id))
        })
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, TransportError> {
        self.with_directory(|directory| {
            directory.last_id += 1;
            let created = user.clone().into_user(UserId::new(directory.last_id));
            directory.users.push(created.clone());
            Ok(created)
        })
    }

    async fn update_user(&self, user: &User) -> Result<User, TransportError> {
        self.with_directory(|directory| {
            let slot = directory
                .users
                .iter_mut()
                .find(|existing| existing.id() == user.id())
                .ok_or_else(|| not_found(user.id()))?;
            *slot = user.clone();
            Ok(user.clone())
        })
    }

    async fn delete_user(&self, id: UserId) -> Result<(), TransportError> {
        self.with_directory(|directory| {
            let before = directory.users.len();
            directory.users.retain(|user| user.id() != id);
            if directory.users.len() == before {
                return Err(not_found(id));
            }
            Ok(())
        })
    }
}
