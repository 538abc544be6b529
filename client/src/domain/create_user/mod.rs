//! Create-user mutation controller.
//!
//! The controller owns its own lifecycle, independent of the directory
//! cache. Side effects are strictly ordered after server confirmation: only a
//! successful create invalidates the cache and resets the form. A failed
//! create keeps both untouched so the entered values can be corrected and
//! resubmitted.
//!
//! At most one create should be in flight. That is a cooperative contract:
//! the presentation layer disables its submit affordance while
//! [`CreateUserController::can_submit`] is false.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::domain::ports::{TransportError, UsersApi};
use crate::domain::{DirectoryCache, FieldErrors, NewUser, RequestStatus, User, UserForm};

/// Message shown when the server rejects or cannot process a create.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create user. Please try again.";

/// Lifecycle of the current submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    /// No attempt since the last reset.
    #[default]
    Idle,
    /// The create request is in flight.
    Pending,
    /// The server confirmed the create.
    Success(User),
    /// The create failed; carries the display message.
    Error(String),
}

impl MutationState {
    /// Coarse lifecycle status.
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        match self {
            Self::Idle => RequestStatus::Idle,
            Self::Pending => RequestStatus::Pending,
            Self::Success(_) => RequestStatus::Success,
            Self::Error(_) => RequestStatus::Error,
        }
    }

    /// Display message; present only in the error state.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message.as_str()),
            Self::Idle | Self::Pending | Self::Success(_) => None,
        }
    }

    /// User created by the last successful attempt.
    #[must_use]
    pub fn created(&self) -> Option<&User> {
        match self {
            Self::Success(user) => Some(user),
            Self::Idle | Self::Pending | Self::Error(_) => None,
        }
    }
}

/// Result of [`CreateUserController::create_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The server created the user.
    Created(User),
    /// The transport failed; cache and form are untouched.
    Failed(TransportError),
    /// The controller was torn down before the response arrived.
    Discarded,
}

/// Result of [`CreateUserController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Blocked(FieldErrors),
    /// The server created the user and the form was reset.
    Created(User),
    /// The transport failed; entered values are preserved.
    Failed(TransportError),
    /// The controller was torn down before the response arrived.
    Discarded,
}

/// Executes create-user mutations against the users port.
pub struct CreateUserController<A: ?Sized> {
    api: Arc<A>,
    directory: Arc<DirectoryCache<A>>,
    state: watch::Sender<MutationState>,
    torn_down: AtomicBool,
}

impl<A: ?Sized> std::fmt::Debug for CreateUserController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserController")
            .field("state", &*self.state.borrow())
            .field("torn_down", &self.torn_down.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<A> CreateUserController<A>
where
    A: UsersApi + ?Sized,
{
    /// Build a controller that invalidates `directory` after each successful
    /// create.
    #[must_use]
    pub fn new(api: Arc<A>, directory: Arc<DirectoryCache<A>>) -> Self {
        let (state, _initial_receiver) = watch::channel(MutationState::default());
        Self {
            api,
            directory,
            state,
            torn_down: AtomicBool::new(false),
        }
    }

    /// Current mutation state.
    #[must_use]
    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    /// Subscribe to mutation state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    /// Whether the submit affordance should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.state.borrow().status().is_pending()
    }

    /// Return to idle, e.g. when the form is dismissed.
    pub fn reset(&self) {
        self.state.send_modify(|state| *state = MutationState::Idle);
    }

    /// Send an already validated candidate to the server.
    ///
    /// On success the directory cache is invalidated before the success
    /// state is published. On failure the error is logged for operators and
    /// the state carries [`CREATE_FAILED_MESSAGE`].
    pub async fn create_user(&self, candidate: NewUser) -> CreateOutcome {
        if self.is_torn_down() {
            return CreateOutcome::Discarded;
        }

        self.state.send_modify(|state| *state = MutationState::Pending);
        let result = self.api.create_user(&candidate).await;
        if self.is_torn_down() {
            debug!("create-user controller torn down; discarding response");
            return CreateOutcome::Discarded;
        }

        match result {
            Ok(user) => {
                info!(user_id = %user.id(), "user created");
                self.directory.invalidate();
                self.state
                    .send_modify(|state| *state = MutationState::Success(user.clone()));
                CreateOutcome::Created(user)
            }
            Err(failure) => {
                error!(
                    error = %failure,
                    kind = failure.kind(),
                    status = ?failure.status_code(),
                    "error creating user"
                );
                self.state.send_modify(|state| {
                    *state = MutationState::Error(CREATE_FAILED_MESSAGE.to_owned());
                });
                CreateOutcome::Failed(failure)
            }
        }
    }

    /// Validate `form` and, when it passes, create the user.
    ///
    /// Blocked submissions never reach the network. The form is reset only
    /// after the server confirms the create.
    pub async fn submit(&self, form: &mut UserForm) -> SubmitOutcome {
        let candidate = match form.submit() {
            Ok(candidate) => candidate,
            Err(errors) => {
                debug!(invalid_fields = errors.len(), "submission blocked by validation");
                return SubmitOutcome::Blocked(errors);
            }
        };

        match self.create_user(candidate).await {
            CreateOutcome::Created(user) => {
                form.reset();
                SubmitOutcome::Created(user)
            }
            CreateOutcome::Failed(failure) => SubmitOutcome::Failed(failure),
            CreateOutcome::Discarded => SubmitOutcome::Discarded,
        }
    }

    /// Detach the controller. Responses that arrive afterwards are dropped.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}
