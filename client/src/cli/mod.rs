//! Command-line front end.
//!
//! The CLI is a presentation layer over the domain: `list` reads through the
//! directory cache, `create` drives the form and the create-user controller,
//! and `show` calls the users port directly. In offline mode every command
//! runs against an empty in-memory directory. Domain failures are rendered to
//! the output and reported through [`CommandStatus::Failure`]; only
//! infrastructure problems surface as [`CliError`].

mod error;
mod render;

use std::io::Write;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

pub use self::error::CliError;
pub use self::render::{render_directory, render_field_errors, render_user};
use crate::config::ClientSettings;
use crate::domain::ports::{FixtureUsersApi, UsersApi};
use crate::domain::{
    CREATE_FAILED_MESSAGE, CreateUserController, DirectoryCache, FormField, RequestStatus,
    SubmitOutcome, UserForm, UserId,
};
use crate::outbound::http::HttpUsersApi;

/// Browse and extend the remote user directory.
#[derive(Debug, Parser)]
#[command(name = "user-directory", version, about)]
pub struct Cli {
    /// Base URL of the users collection. Overrides `USER_DIRECTORY_API_URL`.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
    /// Use an empty in-memory directory instead of the network.
    #[arg(long, global = true)]
    pub offline: bool,
    /// Action to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported actions.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every user in server order.
    List,
    /// Show one user.
    Show {
        /// Server-assigned identifier.
        id: UserId,
    },
    /// Create a user, then print the refreshed directory.
    Create(CreateArgs),
}

/// Raw form inputs for `create`. Validation happens in the form, so every
/// field defaults to empty and reports its own message.
#[derive(Debug, Clone, Default, Args)]
pub struct CreateArgs {
    /// Display name.
    #[arg(long, default_value = "")]
    pub name: String,
    /// Email address.
    #[arg(long, default_value = "")]
    pub email: String,
    /// Password, at least six characters.
    #[arg(long, default_value = "")]
    pub password: String,
    /// Account type: `0`/`guest`, `1`/`user` or `2`/`admin`.
    #[arg(long, default_value = "")]
    pub account_type: String,
}

impl CreateArgs {
    fn into_form(self) -> UserForm {
        let mut form = UserForm::new();
        form.set(FormField::Name, self.name);
        form.set(FormField::Email, self.email);
        form.set(FormField::Password, self.password);
        form.set(FormField::AccountType, self.account_type);
        form
    }
}

/// Whether a command completed or rendered a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command did what was asked.
    Success,
    /// The command rendered a validation or transport failure.
    Failure,
}

/// Run `command` against the users endpoint described by `settings`: the
/// HTTP endpoint normally, or an in-memory directory when offline.
///
/// # Errors
///
/// Returns [`CliError`] when the URL is invalid, the HTTP client cannot be
/// built, or output cannot be written.
pub async fn run(
    command: Command,
    settings: &ClientSettings,
    out: &mut impl Write,
) -> Result<CommandStatus, CliError> {
    if settings.offline {
        debug!("using in-memory users directory");
        return execute(command, Arc::new(FixtureUsersApi::default()), out).await;
    }
    let api_url = settings.api_url()?;
    debug!(api_url = %api_url, "using users endpoint");
    let api = Arc::new(HttpUsersApi::new(api_url)?);
    execute(command, api, out).await
}

/// Run `command` against any users port.
///
/// # Errors
///
/// Returns [`CliError::Output`] when writing to `out` fails.
pub async fn execute<A>(
    command: Command,
    api: Arc<A>,
    out: &mut impl Write,
) -> Result<CommandStatus, CliError>
where
    A: UsersApi + ?Sized,
{
    let directory = Arc::new(DirectoryCache::new(Arc::clone(&api)));
    match command {
        Command::List => list(&directory, out).await,
        Command::Show { id } => match api.get_user(id).await {
            Ok(user) => {
                writeln!(out, "{}", render_user(&user))?;
                Ok(CommandStatus::Success)
            }
            Err(failure) => {
                writeln!(out, "Error: {failure}")?;
                Ok(CommandStatus::Failure)
            }
        },
        Command::Create(args) => {
            let controller = CreateUserController::new(api, Arc::clone(&directory));
            create(&controller, &directory, args, out).await
        }
    }
}

async fn list<A>(
    directory: &DirectoryCache<A>,
    out: &mut impl Write,
) -> Result<CommandStatus, CliError>
where
    A: UsersApi + ?Sized,
{
    let snapshot = directory.ensure_fresh().await;
    writeln!(out, "{}", render_directory(&snapshot))?;
    Ok(match snapshot.status() {
        RequestStatus::Error => CommandStatus::Failure,
        RequestStatus::Idle | RequestStatus::Pending | RequestStatus::Success => {
            CommandStatus::Success
        }
    })
}

async fn create<A>(
    controller: &CreateUserController<A>,
    directory: &DirectoryCache<A>,
    args: CreateArgs,
    out: &mut impl Write,
) -> Result<CommandStatus, CliError>
where
    A: UsersApi + ?Sized,
{
    let mut form = args.into_form();
    match controller.submit(&mut form).await {
        SubmitOutcome::Blocked(errors) => {
            writeln!(out, "{}", render_field_errors(&errors))?;
            Ok(CommandStatus::Failure)
        }
        SubmitOutcome::Failed(_) | SubmitOutcome::Discarded => {
            let state = controller.state();
            let message = state.error_message().unwrap_or(CREATE_FAILED_MESSAGE);
            writeln!(out, "Error: {message}")?;
            Ok(CommandStatus::Failure)
        }
        SubmitOutcome::Created(user) => {
            writeln!(out, "Created user\n{}\n", render_user(&user))?;
            list(directory, out).await
        }
    }
}
