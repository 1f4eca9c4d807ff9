use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::signer::Signer;
use crate::types::{Envelope, RatingChange, User};

pub const CODEFORCES_BASE: &str = "https://codeforces.com/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: CODEFORCES_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Batch user lookup, the one call the chunked fetcher needs.
#[async_trait]
pub trait UserInfoSource: Send + Sync {
    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, ApiError>;
}

#[derive(Clone)]
pub struct CodeforcesClient {
    http: reqwest::Client,
    base_url: String,
    signer: Signer,
}

impl CodeforcesClient {
    pub fn new(config: ClientConfig, signer: Signer) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: config.base_url,
            signer,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_signed()
    }

    /// Issue one GET and unwrap the `{status, comment, result}` envelope.
    ///
    /// Codeforces answers 400 with a FAILED envelope for bad input, so the
    /// body is decoded whatever the HTTP status.
    async fn call<T: DeserializeOwned>(
        &self,
        signer: &Signer,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = signer.sign(&self.base_url, method, params);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Http {
                    status: status.as_u16(),
                    body,
                });
            }
            Err(e) => return Err(ApiError::Decode(e)),
        };

        if envelope.status != "OK" {
            let comment = envelope
                .comment
                .unwrap_or_else(|| format!("status {}", envelope.status));
            return Err(ApiError::Failed { comment });
        }

        debug!(method, %status, "OK");
        envelope.result.ok_or_else(|| ApiError::Failed {
            comment: format!("{method} returned no result"),
        })
    }

    /// `user.info` for up to a few hundred `;`-joined handles.
    pub async fn get_user_info(&self, handles: &[String]) -> Result<Vec<User>, ApiError> {
        let joined = handles.join(";");
        self.call(&self.signer, "user.info", &[("handles", joined.as_str())])
            .await
    }

    /// Full contest-by-contest rating history, oldest first.
    ///
    /// A signed request that fails in transport is retried once unsigned.
    pub async fn user_rating(&self, handle: &str) -> Result<Vec<RatingChange>, ApiError> {
        let params = [("handle", handle)];
        match self.call(&self.signer, "user.rating", &params).await {
            Err(e) if e.is_transport() && self.signer.is_signed() => {
                warn!(handle, error = %e, "signed request failed, retrying unsigned");
                self.call(&Signer::Unsigned, "user.rating", &params).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl UserInfoSource for CodeforcesClient {
    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, ApiError> {
        self.get_user_info(handles).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CodeforcesClient {
        CodeforcesClient::new(
            ClientConfig {
                base_url: server.uri(),
                timeout: Duration::from_secs(5),
            },
            Signer::Unsigned,
        )
    }

    #[tokio::test]
    async fn user_info_joins_handles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user.info"))
            .and(query_param("handles", "tourist;Petr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "result": [
                    {"handle": "tourist", "rating": 3800, "rank": "legendary grandmaster", "maxRating": 4009, "maxRank": "tourist"},
                    {"handle": "Petr", "rating": 2998, "rank": "international grandmaster", "maxRating": 3372, "maxRank": "legendary grandmaster"}
                ]
            })))
            .mount(&server)
            .await;

        let users = client(&server)
            .get_user_info(&["tourist".to_string(), "Petr".to_string()])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].handle, "Petr");
    }

    #[tokio::test]
    async fn failed_envelope_on_400_keeps_comment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user.info"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status": "FAILED",
                "comment": "handles: User with handle ghost not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_user_info(&["ghost".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.missing_handle(), Some("ghost"));
    }

    #[tokio::test]
    async fn non_json_error_page_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_user_info(&["tourist".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn garbage_with_ok_status_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_user_info(&["tourist".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn user_rating_returns_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user.rating"))
            .and(query_param("handle", "Petr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "result": [
                    {"contestId": 1, "contestName": "Round 1", "handle": "Petr", "rank": 3, "ratingUpdateTimeSeconds": 1_600_000_000, "oldRating": 1500, "newRating": 1700},
                    {"contestId": 2, "contestName": "Round 2", "handle": "Petr", "rank": 1, "ratingUpdateTimeSeconds": 1_610_000_000, "oldRating": 1700, "newRating": 1950}
                ]
            })))
            .mount(&server)
            .await;

        let history = client(&server).user_rating("Petr").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].new_rating, 1950);
    }

    #[tokio::test]
    async fn signed_requests_carry_signature() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user.rating"))
            .and(query_param("apiKey", "key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "result": []
            })))
            .mount(&server)
            .await;

        let client = CodeforcesClient::new(
            ClientConfig {
                base_url: server.uri(),
                timeout: Duration::from_secs(5),
            },
            Signer::Signed {
                api_key: "key".to_string(),
                secret: "secret".to_string(),
            },
        );
        assert!(client.user_rating("Petr").await.unwrap().is_empty());

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].url.query().unwrap().contains("apiSig="));
    }
}
