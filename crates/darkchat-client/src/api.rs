//! REST authentication API.
//!
//! Login and registration are plain HTTP calls made before the event socket
//! exists. The server reports failures as a non-2xx status with a JSON body
//! carrying `message` (or `errormessage`); that text is surfaced verbatim.

use darkchat_proto::{
    Identity,
    auth::{LoginReply, LoginRequest, RegisterRequest},
};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

/// Errors from the authentication API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configured base URL is not usable.
    #[error("invalid API address: {0}")]
    InvalidUrl(String),

    /// Request could not be sent or the body not read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server rejected the request.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided reason, or the status text.
        message: String,
    },

    /// Success body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Error body the server sends with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errormessage: Option<String>,
}

/// Client for `POST /user/login` and `POST /user/register`.
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    base: Url,
}

impl AuthApi {
    /// API client rooted at `base_url`. A path prefix such as `/api` is kept.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{base_url} cannot be a base")));
        }
        // `join` replaces the last segment unless the path ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http: reqwest::Client::new(), base })
    }

    /// Exchange credentials for an identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let body = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        let response = self.http.post(self.endpoint("user/login")?).json(&body).send().await?;
        let response = check_status(response).await?;

        let reply: LoginReply =
            response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        tracing::info!(user_id = %reply.identity.user_id, "login accepted");
        Ok(reply.identity)
    }

    /// Create an account. The caller still has to log in afterwards.
    pub async fn register(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let body = RegisterRequest {
            display_name: display_name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let response = self.http.post(self.endpoint("user/register")?).json(&body).send().await?;
        check_status(response).await?;

        tracing::info!(%email, "account registered");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }
}

/// Turn a non-2xx response into [`ApiError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = error_message(status, &text);
    tracing::warn!(status = status.as_u16(), %message, "auth request rejected");
    Err(ApiError::Status { status: status.as_u16(), message })
}

fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.errormessage)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_server_text() {
        let msg = error_message(StatusCode::UNAUTHORIZED, r#"{"message":"Invalid password"}"#);
        assert_eq!(msg, "Invalid password");

        let msg = error_message(StatusCode::CONFLICT, r#"{"errormessage":"Email taken"}"#);
        assert_eq!(msg, "Email taken");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, "<html>"), "Not Found");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, r#"{"message":""}"#), "Bad Request");
    }

    #[test]
    fn endpoints_join_base() {
        let api = AuthApi::new("http://localhost:3000").expect("api");
        assert_eq!(
            api.endpoint("user/login").expect("url").as_str(),
            "http://localhost:3000/user/login"
        );
        assert!(AuthApi::new("::nope").is_err());
    }

    #[test]
    fn endpoints_keep_base_path() {
        for base in ["http://example.com/api", "http://example.com/api/"] {
            let api = AuthApi::new(base).expect("api");
            assert_eq!(
                api.endpoint("user/register").expect("url").as_str(),
                "http://example.com/api/user/register",
                "base {base}"
            );
        }
        assert!(AuthApi::new("mailto:al@example.com").is_err());
    }
}
