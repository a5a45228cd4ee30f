use tracing::debug;

use parley_types::User;
use parley_types::api::{AuthAction, AuthResponse, Credentials};

use crate::client::HttpApi;
use crate::error::ApiError;

impl HttpApi {
    /// POST `{action, username?, email, password}` to the auth endpoint.
    ///
    /// The endpoint answers failed logins with a non-2xx status and an
    /// `{error}` body, so the body is decoded regardless of status and the
    /// presence of `user` decides the outcome.
    pub async fn post_auth(&self, action: AuthAction, credentials: &Credentials) -> Result<User, ApiError> {
        let body = credentials.to_request(action);

        let resp = self
            .client
            .post(&self.endpoints.auth)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        let decoded: AuthResponse = match serde_json::from_str(&text) {
            Ok(decoded) => decoded,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => return Err(ApiError::Status { status, body: text }),
        };

        match decoded.user {
            Some(user) => {
                debug!("Auth {:?} accepted for user {}", action, user.id);
                Ok(user)
            }
            None => Err(ApiError::Rejected(
                decoded
                    .error
                    .unwrap_or_else(|| format!("no user in response ({})", status)),
            )),
        }
    }
}
