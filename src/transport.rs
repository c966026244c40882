//! Low-level REST transport for the gateway adapter.
//!
//! Builds the full URL from the configured base, attaches the provider's
//! custom auth headers, and returns every completed exchange as an
//! [`HttpReply`]. Failures below HTTP (DNS, TLS, connect) surface as
//! [`crate::errors::GatewayError::Transport`] instead, so status checks
//! never see a transport errno dressed up as a status code.

use crate::errors::Result;
use reqwest::Client;
use serde::Serialize;

/// Outcome of a completed HTTP exchange with the provider.
#[derive(Debug, Clone)]
pub struct HttpReply {
    /// HTTP status code the provider answered with.
    pub status: u16,
    /// Raw response body, sometimes JSON-encoded.
    pub body: String,
}

impl HttpReply {
    /// Whether the provider accepted the call.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// REST caller carrying the base URL and the `Usr`/`Pwd` credential pair.
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl RestTransport {
    /// Creates a transport against the given base URL.
    ///
    /// TLS certificate verification stays at the reqwest default (enabled).
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Replaces the HTTP client, e.g. to set a timeout policy upstream.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET `path`, appending `query` as a URL-encoded query string.
    pub async fn get<Q: Serialize>(&self, path: &str, query: Option<&Q>) -> Result<HttpReply> {
        let url = self.endpoint_url(path);
        tracing::debug!(%url, "gateway GET");
        let mut request = self.client.get(&url);
        if let Some(query) = query {
            request = request.query(query);
        }
        self.send(request).await
    }

    /// POST `path` with `body` serialized as JSON.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpReply> {
        let url = self.endpoint_url(path);
        tracing::debug!(%url, "gateway POST");
        self.send(self.client.post(&url).json(body)).await
    }

    // Content-Type rides in via `RequestBuilder::json` on POSTs.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<HttpReply> {
        let response = request
            .header("Accept", "application/json")
            .header("Usr", &self.username)
            .header("Pwd", &self.password)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, body_len = body.len(), "gateway reply");
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_base_and_path() {
        let transport = RestTransport::new("https://ipgrest.asanpardakht.ir", "u", "p");
        assert_eq!(
            transport.endpoint_url("v1/Token"),
            "https://ipgrest.asanpardakht.ir/v1/Token"
        );
    }

    #[test]
    fn test_endpoint_url_tolerates_trailing_slash() {
        let transport = RestTransport::new("http://127.0.0.1:9090/", "u", "p");
        assert_eq!(transport.endpoint_url("v1/Time"), "http://127.0.0.1:9090/v1/Time");
    }

    #[test]
    fn test_reply_status_check() {
        let ok = HttpReply { status: 200, body: "\"REF\"".to_string() };
        let declined = HttpReply { status: 472, body: String::new() };
        assert!(ok.is_ok());
        assert!(!declined.is_ok());
    }
}
