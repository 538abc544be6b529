//! Create-user form validation.
//!
//! The form is an explicit map from [`FormField`] to its raw value and
//! validation status. Rules only run when a submission is attempted; editing a
//! field afterwards does not re-validate it until the next attempt.

use std::collections::BTreeMap;
use std::fmt;

use zeroize::Zeroizing;

use crate::domain::{AccountType, EmailAddress, NewUser, Password, UserName, UserValidationError};

/// Inputs of the create-user form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    /// Display name.
    Name,
    /// Email address.
    Email,
    /// Password.
    Password,
    /// Account type selection; the raw value is an ordinal or a label.
    AccountType,
}

impl FormField {
    /// Every field in display order.
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Password, Self::AccountType];

    /// Human-readable field label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::AccountType => "Account Type",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-field validation status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldStatus {
    /// No submission has been attempted since the last reset.
    #[default]
    Untouched,
    /// The field passed its rule on the last attempt.
    Valid,
    /// The field failed its rule on the last attempt.
    Invalid(UserValidationError),
}

/// Field errors produced by one submission attempt.
pub type FieldErrors = BTreeMap<FormField, UserValidationError>;

#[derive(Default)]
struct FieldState {
    value: Zeroizing<String>,
    status: FieldStatus,
}

/// Create-user form state.
pub struct UserForm {
    fields: BTreeMap<FormField, FieldState>,
}

impl Default for UserForm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UserForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_map();
        for (field, state) in &self.fields {
            let value = match field {
                FormField::Password => "<redacted>",
                FormField::Name | FormField::Email | FormField::AccountType => {
                    state.value.as_str()
                }
            };
            debug.entry(field, &(value, &state.status));
        }
        debug.finish()
    }
}

impl UserForm {
    /// Empty form with every field untouched.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: FormField::ALL
                .into_iter()
                .map(|field| (field, FieldState::default()))
                .collect(),
        }
    }

    /// Replace the raw value of one field. The status is left as it was.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        self.field_mut(field).value = Zeroizing::new(value.into());
    }

    /// Raw value of one field.
    #[must_use]
    pub fn value(&self, field: FormField) -> &str {
        self.fields
            .get(&field)
            .map_or("", |state| state.value.as_str())
    }

    /// Validation status of one field.
    #[must_use]
    pub fn status(&self, field: FormField) -> &FieldStatus {
        const UNTOUCHED: &FieldStatus = &FieldStatus::Untouched;
        self.fields.get(&field).map_or(UNTOUCHED, |state| &state.status)
    }

    /// Field-level message to show next to the input, if any.
    #[must_use]
    pub fn error(&self, field: FormField) -> Option<UserValidationError> {
        match self.status(field) {
            FieldStatus::Invalid(error) => Some(*error),
            FieldStatus::Untouched | FieldStatus::Valid => None,
        }
    }

    /// Whether every field is untouched and empty.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.fields
            .values()
            .all(|state| state.value.is_empty() && state.status == FieldStatus::Untouched)
    }

    /// Run every rule, record each field's status, and return the failures.
    ///
    /// An empty map means the form may be submitted.
    pub fn validate_all(&mut self) -> FieldErrors {
        self.submit().err().unwrap_or_default()
    }

    /// Attempt a submission: validate every field and, when all pass, build
    /// the creation payload.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its rule violation. No payload is
    /// produced while any field is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use user_directory::domain::{FormField, UserForm, UserValidationError};
    ///
    /// let mut form = UserForm::new();
    /// form.set(FormField::Name, "Ann");
    /// form.set(FormField::Email, "a@b");
    /// form.set(FormField::Password, "123456");
    /// form.set(FormField::AccountType, "1");
    ///
    /// let errors = form.submit().expect_err("email is malformed");
    /// assert_eq!(
    ///     errors.get(&FormField::Email),
    ///     Some(&UserValidationError::InvalidEmail)
    /// );
    /// assert_eq!(errors.len(), 1);
    /// ```
    pub fn submit(&mut self) -> Result<NewUser, FieldErrors> {
        let name = UserName::new(self.value(FormField::Name));
        let email = EmailAddress::new(self.value(FormField::Email));
        let password = Password::new(self.value(FormField::Password));
        let account_type = self.value(FormField::AccountType).parse::<AccountType>();

        self.record(FormField::Name, name.as_ref().err());
        self.record(FormField::Email, email.as_ref().err());
        self.record(FormField::Password, password.as_ref().err());
        self.record(FormField::AccountType, account_type.as_ref().err());

        match (name, email, password, account_type) {
            (Ok(name), Ok(email), Ok(password), Ok(account_type)) => {
                Ok(NewUser::new(name, email, password, account_type))
            }
            _ => Err(self.errors()),
        }
    }

    /// Clear every value and return all fields to untouched.
    pub fn reset(&mut self) {
        for state in self.fields.values_mut() {
            *state = FieldState::default();
        }
    }

    fn record(&mut self, field: FormField, error: Option<&UserValidationError>) {
        self.field_mut(field).status = match error {
            Some(error) => FieldStatus::Invalid(*error),
            None => FieldStatus::Valid,
        };
    }

    fn errors(&self) -> FieldErrors {
        self.fields
            .iter()
            .filter_map(|(field, state)| match state.status {
                FieldStatus::Invalid(error) => Some((*field, error)),
                FieldStatus::Untouched | FieldStatus::Valid => None,
            })
            .collect()
    }

    fn field_mut(&mut self, field: FormField) -> &mut FieldState {
        self.fields.entry(field).or_default()
    }
}
