//! Reqwest-backed users resource adapter.
//!
//! This adapter owns transport details only: URL building, JSON
//! serialisation, HTTP error mapping, and decoding into domain users. It does
//! not retry and sets no request timeout.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{NewUserPayload, UserDto, UserPayload};
use crate::domain::ports::{TransportError, UsersApi};
use crate::domain::{NewUser, User, UserId};

/// Users adapter that talks JSON to one base URL, e.g.
/// `http://localhost:5015/api/users`.
#[derive(Debug, Clone)]
pub struct HttpUsersApi {
    client: Client,
    base: Url,
}

impl HttpUsersApi {
    /// Build an adapter for the users collection at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, base })
    }

    /// Collection URL the adapter was built with.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn member_url(&self, id: UserId) -> Result<Url, TransportError> {
        member_url(&self.base, id)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let body = exchange(self.client.get(url)).await?;
        decode(&body)
    }

    async fn post<B, T>(&self, url: Url, payload: &B) -> Result<T, TransportError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = exchange(self.client.post(url).json(payload)).await?;
        decode(&body)
    }

    async fn put<B, T>(&self, url: Url, payload: &B) -> Result<T, TransportError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = exchange(self.client.put(url).json(payload)).await?;
        decode(&body)
    }

    async fn delete(&self, url: Url) -> Result<(), TransportError> {
        exchange(self.client.delete(url)).await.map(drop)
    }
}

#[async_trait]
impl UsersApi for HttpUsersApi {
    async fn list_users(&self) -> Result<Vec<User>, TransportError> {
        let users: Vec<UserDto> = self
            .get(self.base.clone())
            .await
            .inspect_err(|failure| log_failure("list_users", failure))?;
        users
            .into_iter()
            .map(UserDto::into_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(TransportError::decode)
    }

    async fn get_user(&self, id: UserId) -> Result<User, TransportError> {
        let url = self.member_url(id)?;
        let user: UserDto = self
            .get(url)
            .await
            .inspect_err(|failure| log_failure("get_user", failure))?;
        user.into_domain().map_err(TransportError::decode)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, TransportError> {
        let created: UserDto = self
            .post(self.base.clone(), &NewUserPayload::from(user))
            .await
            .inspect_err(|failure| log_failure("create_user", failure))?;
        created.into_domain().map_err(TransportError::decode)
    }

    async fn update_user(&self, user: &User) -> Result<User, TransportError> {
        let url = self.member_url(user.id())?;
        let updated: UserDto = self
            .put(url, &UserPayload::from(user))
            .await
            .inspect_err(|failure| log_failure("update_user", failure))?;
        updated.into_domain().map_err(TransportError::decode)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), TransportError> {
        let url = self.member_url(id)?;
        self.delete(url)
            .await
            .inspect_err(|failure| log_failure("delete_user", failure))
    }
}

// Callers own the operator-facing diagnostic; this only traces the exchange.
fn log_failure(operation: &'static str, failure: &TransportError) {
    debug!(
        operation,
        kind = failure.kind(),
        status = ?failure.status_code(),
        error = %failure,
        "users request failed"
    );
}

async fn exchange(request: RequestBuilder) -> Result<Vec<u8>, TransportError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body).map_err(|error| {
        TransportError::decode(format!("invalid users JSON payload: {error}"))
    })
}

fn member_url(base: &Url, id: UserId) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| TransportError::invalid_request(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .push(&id.to_string());
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_decode() {
        TransportError::decode(error.to_string())
    } else if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else {
        TransportError::unreachable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TransportError {
    TransportError::status(status.as_u16(), body_preview(body))
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
