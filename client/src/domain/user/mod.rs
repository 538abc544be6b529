//! User data model.
//!
//! [`User`] mirrors what the server owns and is never validated on the way
//! in; the server is the source of truth for stored accounts. [`NewUser`] is
//! the creation payload and can only be assembled from validated parts, so a
//! candidate that reaches the transport is already well formed.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use zeroize::Zeroizing;

/// Minimum number of characters accepted for a password.
pub const PASSWORD_MIN: usize = 6;

/// Validation errors raised while building [`NewUser`] parts.
///
/// Display strings are the field-level messages shown next to form inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    /// Name is empty or whitespace.
    NameRequired,
    /// Email is empty or whitespace.
    EmailRequired,
    /// Email does not match the address syntax.
    InvalidEmail,
    /// Password is empty.
    PasswordRequired,
    /// Password is shorter than `min` characters.
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// No account type selected, or the selection is not a known ordinal.
    AccountTypeRequired,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameRequired => write!(f, "Name is required"),
            Self::EmailRequired => write!(f, "Email is required"),
            Self::InvalidEmail => write!(f, "Invalid email address"),
            Self::PasswordRequired => write!(f, "Password is required"),
            Self::PasswordTooShort { min } => {
                write!(f, "Password must be at least {min} characters")
            }
            Self::AccountTypeRequired => write!(f, "Account type is required"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Server-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier received from the server.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Account role, transmitted as its integer ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    /// Ordinal 0.
    Guest,
    /// Ordinal 1.
    User,
    /// Ordinal 2.
    Admin,
}

impl AccountType {
    /// Every account type in ordinal order.
    pub const ALL: [Self; 3] = [Self::Guest, Self::User, Self::Admin];

    /// Wire ordinal (`Guest=0`, `User=1`, `Admin=2`).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::User => 1,
            Self::Admin => 2,
        }
    }

    /// Map a wire ordinal back to an account type.
    ///
    /// # Examples
    ///
    /// ```
    /// use user_directory::domain::AccountType;
    ///
    /// assert_eq!(AccountType::from_ordinal(2), Some(AccountType::Admin));
    /// assert_eq!(AccountType::from_ordinal(3), None);
    /// ```
    #[must_use]
    pub const fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Guest),
            1 => Some(Self::User),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Display label used by the presentation layer.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::User => "User",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountType {
    type Err = UserValidationError;

    /// Accepts an ordinal (`"0"`..`"2"`) or a case-insensitive label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(ordinal) = trimmed.parse::<i64>() {
            return Self::from_ordinal(ordinal).ok_or(UserValidationError::AccountTypeRequired);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
            .ok_or(UserValidationError::AccountTypeRequired)
    }
}

/// Non-empty user name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Validate a name. Only the empty string counts as missing.
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(UserValidationError::NameRequired);
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Email address in `local@domain.tld` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // The domain needs at least one dot and a TLD of two or more letters.
        let pattern = r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

impl EmailAddress {
    /// Validate an address against the accepted syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use user_directory::domain::{EmailAddress, UserValidationError};
    ///
    /// assert!(EmailAddress::new("a@b.com").is_ok());
    /// assert_eq!(
    ///     EmailAddress::new("a@b"),
    ///     Err(UserValidationError::InvalidEmail)
    /// );
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        if email.is_empty() {
            return Err(UserValidationError::EmailRequired);
        }
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Write-only password. The buffer is zeroed on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a password of at least [`PASSWORD_MIN`] characters.
    pub fn new(password: impl Into<String>) -> Result<Self, UserValidationError> {
        let password = Zeroizing::new(password.into());
        if password.is_empty() {
            return Err(UserValidationError::PasswordRequired);
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(password))
    }

    /// Wrap a password echoed back by the server without re-validating it.
    #[must_use]
    pub fn from_server(password: String) -> Self {
        Self(Zeroizing::new(password))
    }

    /// Plain-text value for request serialisation only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// User as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    password: Option<Password>,
    account_type: AccountType,
}

impl User {
    /// Build a user record without a password.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            password: None,
            account_type,
        }
    }

    /// Attach the password the server sent along with the record.
    #[must_use]
    pub fn with_password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    /// Server-assigned identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Email address as stored by the server.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password, when the server echoed one. Never rendered.
    #[must_use]
    pub fn password(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    /// Account role.
    #[must_use]
    pub fn account_type(&self) -> AccountType {
        self.account_type
    }
}

/// Creation payload: a user without an id.
///
/// ## Invariants
/// - every component has passed its field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: UserName,
    email: EmailAddress,
    password: Password,
    account_type: AccountType,
}

impl NewUser {
    /// Assemble a payload from validated components.
    #[must_use]
    pub fn new(
        name: UserName,
        email: EmailAddress,
        password: Password,
        account_type: AccountType,
    ) -> Self {
        Self {
            name,
            email,
            password,
            account_type,
        }
    }

    /// Fallible constructor validating raw field values in form order.
    ///
    /// Returns the first failing rule; use `UserForm` to collect every
    /// field error at once.
    pub fn try_from_strings(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        account_type: &str,
    ) -> Result<Self, UserValidationError> {
        Ok(Self::new(
            UserName::new(name)?,
            EmailAddress::new(email)?,
            Password::new(password)?,
            account_type.parse()?,
        ))
    }

    /// Name component.
    #[must_use]
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Email component.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password component.
    #[must_use]
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Account role.
    #[must_use]
    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Attach a server-assigned id, producing the stored record.
    #[must_use]
    pub fn into_user(self, id: UserId) -> User {
        let Self {
            name,
            email,
            password,
            account_type,
        } = self;
        User {
            id,
            name: name.0,
            email: email.0,
            password: Some(password),
            account_type,
        }
    }
}
