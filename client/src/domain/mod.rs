//! User directory domain.
//!
//! Purpose: hold the client-side model of the remote user collection and the
//! state machines that drive it. The directory cache owns the fetched
//! collection; the create-user controller owns mutation state and talks to
//! the cache only through invalidation.
//!
//! Public surface:
//! - [`User`], [`NewUser`] and their validated parts.
//! - [`DirectoryCache`] with its [`DirectorySnapshot`].
//! - [`CreateUserController`] with its [`MutationState`].
//! - [`UserForm`] for field-level validation.
//! - [`ports`] for the transport boundary.

pub mod create_user;
pub mod directory_cache;
pub mod lifecycle;
pub mod ports;
pub mod user;
pub mod user_form;

pub use self::create_user::{
    CREATE_FAILED_MESSAGE, CreateOutcome, CreateUserController, MutationState, SubmitOutcome,
};
pub use self::directory_cache::{DirectoryCache, DirectorySnapshot, FetchOutcome, FetchState};
pub use self::lifecycle::RequestStatus;
pub use self::user::{
    AccountType, EmailAddress, NewUser, PASSWORD_MIN, Password, User, UserId, UserName,
    UserValidationError,
};
pub use self::user_form::{FieldErrors, FieldStatus, FormField, UserForm};
