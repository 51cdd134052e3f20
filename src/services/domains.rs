//! Custom domain management through a hosting provider's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::DomainsConfig;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Domain provider is not configured")]
    NotConfigured,

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("provider returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub domain: String,
    pub value: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A domain as attached to the hosting project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDomain {
    pub name: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verification: Vec<VerificationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfig {
    #[serde(default)]
    pub configured_by: Option<String>,
    #[serde(default)]
    pub misconfigured: bool,
}

#[async_trait]
pub trait DomainProvider: Send + Sync {
    async fn add_domain(&self, domain: &str) -> Result<ProjectDomain, DomainError>;
    async fn remove_domain(&self, domain: &str) -> Result<(), DomainError>;
    async fn verify_domain(&self, domain: &str) -> Result<ProjectDomain, DomainError>;
    async fn dns_config(&self, domain: &str) -> Result<DnsConfig, DomainError>;
}

/// Lowercases and checks hostname shape: dot-separated labels of
/// alphanumerics and inner hyphens, at least two labels.
pub fn normalize_domain(raw: &str) -> Result<String, DomainError> {
    let domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    let invalid = || DomainError::InvalidDomain(raw.to_string());

    if domain.len() > 253 || !domain.contains('.') {
        return Err(invalid());
    }
    for label in domain.split('.') {
        let ok = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !ok {
            return Err(invalid());
        }
    }
    Ok(domain)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Vercel projects API client
#[derive(Debug, Clone)]
pub struct VercelClient {
    http: Client,
    base: String,
    token: String,
    project_id: String,
    team_id: Option<String>,
}

impl VercelClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// `Ok(None)` when token or project id is missing
    pub fn from_config(config: &DomainsConfig) -> Result<Option<Self>, DomainError> {
        let (Some(token), Some(project_id)) = (&config.vercel_token, &config.vercel_project_id) else {
            return Ok(None);
        };
        Self::new(&config.api_base, token, project_id, config.vercel_team_id.clone()).map(Some)
    }

    pub fn new(
        base: &str,
        token: &str,
        project_id: &str,
        team_id: Option<String>,
    ) -> Result<Self, DomainError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("storeflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            project_id: project_id.to_string(),
            team_id,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base, path))
            .bearer_auth(&self.token);
        if let Some(team) = &self.team_id {
            builder = builder.query(&[("teamId", team)]);
        }
        builder
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, builder: RequestBuilder) -> Result<T, DomainError> {
        let res = builder.send().await.map_err(|e| DomainError::Transport(e.to_string()))?;
        let status = res.status();
        if status.is_success() {
            return res.json::<T>().await.map_err(|e| DomainError::Transport(e.to_string()));
        }
        Err(rejected(status, res).await)
    }
}

async fn rejected(status: StatusCode, res: reqwest::Response) -> DomainError {
    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    DomainError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl DomainProvider for VercelClient {
    async fn add_domain(&self, domain: &str) -> Result<ProjectDomain, DomainError> {
        let path = format!("/v10/projects/{}/domains", self.project_id);
        self.send(self.request(reqwest::Method::POST, &path).json(&json!({ "name": domain })))
            .await
    }

    async fn remove_domain(&self, domain: &str) -> Result<(), DomainError> {
        let path = format!("/v9/projects/{}/domains/{}", self.project_id, domain);
        let res = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;
        match res.status() {
            // Already gone on the provider side
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => Err(rejected(s, res).await),
        }
    }

    async fn verify_domain(&self, domain: &str) -> Result<ProjectDomain, DomainError> {
        let path = format!("/v9/projects/{}/domains/{}/verify", self.project_id, domain);
        self.send(self.request(reqwest::Method::POST, &path)).await
    }

    async fn dns_config(&self, domain: &str) -> Result<DnsConfig, DomainError> {
        let path = format!("/v6/domains/{}/config", domain);
        self.send(self.request(reqwest::Method::GET, &path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VercelClient {
        VercelClient::new(&server.uri(), "tok", "prj_1", Some("team_9".into())).unwrap()
    }

    #[test]
    fn normalizes_domains() {
        assert_eq!(normalize_domain(" Shop.Example.COM. ").unwrap(), "shop.example.com");
        assert!(normalize_domain("localhost").is_err());
        assert!(normalize_domain("-bad.example.com").is_err());
        assert!(normalize_domain("under_score.example.com").is_err());
        assert!(normalize_domain("a..b").is_err());
    }

    #[test]
    fn missing_credentials_disable_the_client() {
        let config = crate::config::AppConfig::development().domains;
        assert!(VercelClient::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn add_domain_posts_name_with_team_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v10/projects/prj_1/domains"))
            .and(query_param("teamId", "team_9"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({ "name": "shop.example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "shop.example.com",
                "verified": false,
                "verification": [{
                    "type": "TXT",
                    "domain": "_vercel.example.com",
                    "value": "vc-domain-verify=abc",
                    "reason": "pending_domain_verification"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let domain = client(&server).add_domain("shop.example.com").await.unwrap();
        assert!(!domain.verified);
        assert_eq!(domain.verification[0].record_type, "TXT");
    }

    #[tokio::test]
    async fn provider_errors_carry_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v9/projects/prj_1/domains/shop.example.com/verify"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": "missing_txt_record", "message": "TXT record not found" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).verify_domain("shop.example.com").await.unwrap_err();
        match err {
            DomainError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "TXT record not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn remove_tolerates_unknown_domain() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v9/projects/prj_1/domains/gone.example.com"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        client(&server).remove_domain("gone.example.com").await.unwrap();
    }

    #[tokio::test]
    async fn reads_dns_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/domains/shop.example.com/config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "configuredBy": "CNAME", "misconfigured": false })),
            )
            .mount(&server)
            .await;

        let config = client(&server).dns_config("shop.example.com").await.unwrap();
        assert_eq!(config.configured_by.as_deref(), Some("CNAME"));
        assert!(!config.misconfigured);
    }
}
