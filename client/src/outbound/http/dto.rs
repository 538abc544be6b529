//! Wire DTOs for the users resource.
//!
//! The adapter decodes into these transport DTOs first, then maps into domain
//! users in one pass. Field names are camelCase and `accountType` travels as
//! its integer ordinal.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountType, NewUser, Password, User, UserId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDto {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) email: String,
    #[serde(default)]
    pub(super) password: Option<String>,
    pub(super) account_type: i64,
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<User, String> {
        let account_type = AccountType::from_ordinal(self.account_type).ok_or_else(|| {
            format!(
                "user {} has unknown account type {}",
                self.id, self.account_type
            )
        })?;
        let user = User::new(UserId::new(self.id), self.name, self.email, account_type);
        Ok(match self.password {
            Some(password) => user.with_password(Password::from_server(password)),
            None => user,
        })
    }
}

/// `POST /users` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewUserPayload<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    account_type: u8,
}

impl<'a> From<&'a NewUser> for NewUserPayload<'a> {
    fn from(user: &'a NewUser) -> Self {
        Self {
            name: user.name().as_ref(),
            email: user.email().as_ref(),
            password: user.password().expose(),
            account_type: user.account_type().ordinal(),
        }
    }
}

/// `PUT /users/{id}` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserPayload<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    account_type: u8,
}

impl<'a> From<&'a User> for UserPayload<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id().get(),
            name: user.name(),
            email: user.email(),
            password: user.password().map(Password::expose),
            account_type: user.account_type().ordinal(),
        }
    }
}
