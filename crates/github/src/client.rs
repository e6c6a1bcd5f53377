//! Authenticated GitHub REST client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use membership::{OrganizationName, ProviderError, RepositoryId, TeamId, TeamSlug};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{classify_response, classify_transport, GithubError};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("invite-contributors/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubSettings {
    /// API base URL (`https://api.github.com`, or `https://host/api/v3` for GHES).
    pub api_url: String,
    /// Token with `admin:org` (classic) or organisation members write
    /// (fine-grained) permission.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GithubSettings {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// GitHub REST client shared by the membership provider and contributor source.
///
/// Cheap to clone; clones share the connection pool and the team-id cache.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base: Url,
    team_ids: Arc<Mutex<HashMap<(String, String), TeamId>>>,
}

#[derive(Debug, Deserialize)]
struct TeamBody {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct OwnerBody {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryBody {
    organization: Option<OwnerBody>,
}

impl GithubClient {
    /// Builds a client. Redirects are not followed: GitHub answers some
    /// membership queries with a 302 that carries meaning.
    ///
    /// # Errors
    ///
    /// [`GithubError::InvalidBaseUrl`] for an unparsable or non-hierarchical
    /// URL, [`GithubError::InvalidToken`] for a token that cannot be sent as a
    /// header, [`GithubError::Client`] when the TLS stack cannot be initialised.
    pub fn new(settings: &GithubSettings) -> Result<Self, GithubError> {
        let invalid = || GithubError::InvalidBaseUrl {
            url: settings.api_url.clone(),
        };
        let base = Url::parse(&settings.api_url).map_err(|_| invalid())?;
        if base.cannot_be_a_base() {
            return Err(invalid());
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
            .map_err(|_| GithubError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            team_ids: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Sends a request, mapping transport failures only. HTTP error statuses
    /// are returned to the caller, which knows which ones carry meaning.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request.send().await.map_err(|e| classify_transport(&e))?;
        debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "GitHub API response"
        );
        Ok(response)
    }

    /// Turns an unexpected response into a classified [`ProviderError`].
    pub(crate) async fn unexpected(&self, response: Response) -> ProviderError {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        classify_response(status, &headers, &body, chrono::Utc::now().timestamp())
    }

    /// GETs `segments` with `query` and decodes a success body as `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let request = self.request(Method::GET, self.url(segments)).query(query);
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(self.unexpected(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::unknown(format!("Unexpected response body: {e}")))
    }

    /// Resolves a team slug to its numeric id, caching the answer.
    ///
    /// Returns `Ok(None)` when the team does not exist.
    pub(crate) async fn team_id(
        &self,
        organization: &OrganizationName,
        team: &TeamSlug,
    ) -> Result<Option<TeamId>, ProviderError> {
        let key = (
            organization.as_str().to_ascii_lowercase(),
            team.as_str().to_ascii_lowercase(),
        );
        if let Some(id) = self.cached_team_id(&key) {
            return Ok(Some(id));
        }

        let url = self.url(&["orgs", organization.as_str(), "teams", team.as_str()]);
        let response = self.send(self.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let body: TeamBody = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::unknown(format!("Unexpected team body: {e}")))?;
                let id = TeamId::new(body.id);
                if let Ok(mut cache) = self.team_ids.lock() {
                    cache.insert(key, id);
                }
                Ok(Some(id))
            }
            _ => Err(self.unexpected(response).await),
        }
    }

    fn cached_team_id(&self, key: &(String, String)) -> Option<TeamId> {
        self.team_ids.lock().ok()?.get(key).copied()
    }

    /// The organisation owning `repository`, or `None` for user-owned
    /// repositories.
    ///
    /// # Errors
    ///
    /// Any API failure, including an unknown repository.
    pub async fn repository_organization(
        &self,
        repository: &RepositoryId,
    ) -> Result<Option<OrganizationName>, GithubError> {
        let body: RepositoryBody = self
            .get_json(&["repos", repository.owner(), repository.name()], &[])
            .await?;
        Ok(body.organization.and_then(|o| OrganizationName::new(o.login)))
    }
}
