//! Authentication endpoints

use serde::{Deserialize, Serialize};

use crate::{
    envelope::Envelope,
    errors::ClientResult,
    http::{HttpClient, RequestOptions},
};

use super::entities::User;

/// Login form payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Sign-up form payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `CUSTOMER` or `PROFESSIONAL`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Successful login or registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthApi {
    client: HttpClient,
}

impl AuthApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    // Auth controllers have shipped with and without the `{success, data}` wrapper.
    fn options() -> RequestOptions {
        RequestOptions::new().with_envelope(Envelope::Auto)
    }

    /// `POST /auth/login`
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        let payload = self
            .client
            .post("/auth/login", credentials, Self::options())
            .await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// `POST /auth/register`
    pub async fn register(&self, payload: &RegisterPayload) -> ClientResult<AuthResponse> {
        let payload = self
            .client
            .post("/auth/register", payload, Self::options())
            .await?;
        Ok(serde_json::from_value(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, errors::ClientError};
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> AuthApi {
        AuthApi::new(
            HttpClient::new(ClientConfig::default().with_base_url(server.base_url())).unwrap(),
        )
    }

    #[tokio::test]
    async fn login_accepts_bare_and_wrapped_bodies() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/login")
                    .json_body(json!({"email": "ada@example.com", "password": "pw"}));
                then.status(200)
                    .json_body(json!({"token": "t1", "user": {"id": 1, "name": "Ada"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/register");
                then.status(201).json_body(json!({
                    "success": true,
                    "data": {"token": "t2", "user": {"id": 2, "name": "Grace"}}
                }));
            })
            .await;

        let api = api_for(&server);
        let login = api
            .login(&Credentials::new("ada@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(login.token, "t1");
        assert_eq!(login.user.get_str("name"), Some("Ada"));

        let register = api
            .register(&RegisterPayload {
                name: "Grace".into(),
                email: "grace@example.com".into(),
                password: "pw".into(),
                role: Some("PROFESSIONAL".into()),
                phone: None,
            })
            .await
            .unwrap();
        assert_eq!(register.token, "t2");
    }

    #[tokio::test]
    async fn rejected_login_is_an_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(401).body(r#"{"message":"Invalid credentials"}"#);
            })
            .await;

        let err = api_for(&server)
            .login(&Credentials::new("ada@example.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));
        assert_eq!(err.user_message(), "Invalid credentials");
    }
}
