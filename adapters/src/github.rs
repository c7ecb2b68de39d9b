//! GitHub repository contents API as a versioned object store.
//!
//! The blob `sha` returned by the API is the version token. Writes pass the
//! last read `sha`, so GitHub rejects them when the file moved on.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use errors::RemoteError;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tn_core::remote::{FetchOutcome, RemoteObject, VersionToken, WriteOutcome, WriteRequest};
use tn_core::traits::RemoteObjectStore;

const ACCEPT: &str = "application/vnd.github.v3+json";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    sha: String,
    #[serde(default)]
    encoding: Option<String>
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContent
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String
}

pub struct GithubContentStore {
    api_url: String,
    owner: String,
    repo: String,
    token: String,
    client: reqwest::Client
}

impl std::fmt::Debug for GithubContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubContentStore")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl GithubContentStore {
    pub fn new(
        api_url: &str,
        owner: &str,
        repo: &str,
        token: &str,
        timeout: Duration
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tubenotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transient {
                reason: format!("HTTP client setup failed: {e}")
            })?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
            client
        })
    }

    /// Builds a connector from configuration. The token must already be
    /// present, see `Config::require_remote`.
    pub fn from_config(
        remote: &config::RemoteConfig,
        sync: &config::SyncConfig
    ) -> Result<Self, RemoteError> {
        let token = remote.token.as_deref().ok_or_else(|| RemoteError::AuthFailure {
            reason: "no token configured".to_string()
        })?;
        Self::new(
            &remote.api_url,
            &remote.owner,
            &remote.repo,
            token,
            Duration::from_secs(sync.request_timeout_secs)
        )
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.owner, self.repo)
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", ACCEPT)
    }

    /// Returns the login the token belongs to.
    #[tracing::instrument(skip(self))]
    pub async fn verify_credentials(&self) -> Result<String, RemoteError> {
        let url = format!("{}/user", self.api_url);
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &headers, &body, "user"));
        }
        let user: UserResponse = response.json().await.map_err(decode)?;
        tracing::info!(login = %user.login, "GitHub credentials verified");
        Ok(user.login)
    }

    /// Checks that the configured repository exists and is visible.
    #[tracing::instrument(skip(self))]
    pub async fn verify_repository(&self) -> Result<(), RemoteError> {
        let response = self
            .request(reqwest::Method::GET, &self.repo_url())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let resource = format!("{}/{}", self.owner, self.repo);
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::AccessFailure {
                resource,
                reason: "repository not found or not visible to this token".to_string()
            });
        }
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &headers, &body, &resource))
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transient {
        reason: e.to_string()
    }
}

fn decode(e: impl std::fmt::Display) -> RemoteError {
    RemoteError::Decode {
        reason: e.to_string()
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn retry_after(headers: &HeaderMap) -> u64 {
    if let Some(secs) = header_u64(headers, "retry-after") {
        return secs;
    }
    header_u64(headers, "x-ratelimit-reset")
        .and_then(|reset| {
            let now = u64::try_from(chrono::Utc::now().timestamp()).ok()?;
            Some(reset.saturating_sub(now))
        })
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Maps a non-success status shared by every endpoint.
fn classify(status: StatusCode, headers: &HeaderMap, body: &str, resource: &str) -> RemoteError {
    let reason = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::AuthFailure { reason },
        StatusCode::FORBIDDEN => {
            if header_u64(headers, "x-ratelimit-remaining") == Some(0) {
                RemoteError::RateLimited {
                    retry_after: retry_after(headers)
                }
            } else {
                RemoteError::AccessFailure {
                    resource: resource.to_string(),
                    reason
                }
            }
        }
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited {
            retry_after: retry_after(headers)
        },
        s if s.is_server_error() => RemoteError::Transient {
            reason: format!("{s}: {reason}")
        },
        s => RemoteError::Rejected {
            status: s.as_u16(),
            reason
        }
    }
}

fn decode_content(response: ContentsResponse) -> Result<RemoteObject, RemoteError> {
    if let Some(encoding) = response.encoding.as_deref() {
        if encoding != "base64" {
            return Err(decode(format!("unsupported content encoding {encoding}")));
        }
    }
    let encoded: String = response
        .content
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = STANDARD.decode(encoded).map_err(decode)?;
    let content = String::from_utf8(bytes).map_err(decode)?;
    Ok(RemoteObject {
        content,
        version: VersionToken::new(response.sha)
    })
}

#[async_trait]
impl RemoteObjectStore for GithubContentStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_object(&self, path: &str, git_ref: &str) -> Result<FetchOutcome, RemoteError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("{}?ref={}", self.contents_url(path), git_ref)
            )
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path, "Remote object not found");
            return Ok(FetchOutcome::NotFound);
        }
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &headers, &body, path));
        }

        let body: ContentsResponse = response.json().await.map_err(decode)?;
        let object = decode_content(body)?;
        tracing::debug!(path, version = %object.version, "Fetched remote object");
        Ok(FetchOutcome::Found(object))
    }

    #[tracing::instrument(
        skip(self, request),
        fields(path = %request.path, branch = %request.branch)
    )]
    async fn write_object(&self, request: WriteRequest) -> Result<WriteOutcome, RemoteError> {
        let body = PutContentsRequest {
            message: &request.message,
            content: STANDARD.encode(request.content.as_bytes()),
            branch: &request.branch,
            sha: request.expected_version.as_ref().map(VersionToken::as_str)
        };

        let response = self
            .request(reqwest::Method::PUT, &self.contents_url(&request.path))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            let written: PutContentsResponse = response.json().await.map_err(decode)?;
            let version = VersionToken::new(written.content.sha);
            tracing::debug!(version = %version, "Wrote remote object");
            return Ok(WriteOutcome::Written(version));
        }

        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::CONFLICT => Ok(WriteOutcome::Conflict),
            StatusCode::UNPROCESSABLE_ENTITY if text.contains("sha") => Ok(WriteOutcome::Conflict),
            StatusCode::NOT_FOUND => Err(RemoteError::AccessFailure {
                resource: request.path.clone(),
                reason: error_message(&text)
            }),
            _ => Err(classify(status, &headers, &text, &request.path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_decode_content_with_newlines() {
        let encoded = STANDARD.encode(r#"{"watchHistory":[]}"#);
        let (a, b) = encoded.split_at(8);
        let object = decode_content(ContentsResponse {
            content: Some(format!("{a}\n{b}\n")),
            sha: "abc".to_string(),
            encoding: Some("base64".to_string())
        })
        .unwrap();
        assert_eq!(object.content, r#"{"watchHistory":[]}"#);
        assert_eq!(object.version.as_str(), "abc");
    }

    #[test]
    fn test_decode_content_rejects_other_encodings() {
        let result = decode_content(ContentsResponse {
            content: None,
            sha: "abc".to_string(),
            encoding: Some("none".to_string())
        });
        assert!(matches!(result, Err(RemoteError::Decode { .. })));
    }

    #[test]
    fn test_classify() {
        let empty = HeaderMap::new();
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, &empty, r#"{"message":"Bad credentials"}"#, "x"),
            RemoteError::AuthFailure { reason } if reason == "Bad credentials"
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, &empty, "", "x"),
            RemoteError::AccessFailure { .. }
        ));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, &empty, "", "x"),
            RemoteError::Transient { .. }
        ));
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, &empty, "", "x"),
            RemoteError::Rejected { status: 400, .. }
        ));

        let mut limited = HeaderMap::new();
        limited.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        limited.insert("retry-after", HeaderValue::from_static("30"));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, &limited, "", "x"),
            RemoteError::RateLimited { retry_after: 30 }
        ));
    }
}
