//! [`ContributorSource`] for the pull request behind a release.

use async_trait::async_trait;
use membership::{
    parse_co_authors, ContributorSet, ContributorSource, Login, PullRequestNumber, RepositoryId,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::event::{locate_pull_request, PullRequestLocator};
use crate::{GithubClient, GithubError};

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestBody {
    number: u64,
    user: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestCommit {
    author: Option<Account>,
    commit: CommitDetail,
}

/// Contributors of the pull request that triggered the release workflow:
/// its author, every commit author, and optionally `Co-authored-by` trailers.
#[derive(Debug, Clone)]
pub struct PullRequestContributors {
    client: GithubClient,
    repository: RepositoryId,
    event: Option<Value>,
    include_co_authors: bool,
}

impl PullRequestContributors {
    /// `event` is the parsed `GITHUB_EVENT_PATH` payload; `None` means the
    /// run has no event and therefore no contributors.
    pub fn new(client: GithubClient, repository: RepositoryId, event: Option<Value>) -> Self {
        Self {
            client,
            repository,
            event,
            include_co_authors: true,
        }
    }

    #[must_use]
    pub fn with_co_authors(mut self, include: bool) -> Self {
        self.include_co_authors = include;
        self
    }

    /// Resolves the pull request number from the event payload.
    ///
    /// # Errors
    ///
    /// Any API failure while looking up the pull requests of a pushed commit.
    pub async fn pull_request_number(&self) -> Result<Option<PullRequestNumber>, GithubError> {
        let Some(event) = &self.event else {
            return Ok(None);
        };

        match locate_pull_request(event) {
            None => Ok(None),
            Some(PullRequestLocator::Number(number)) => Ok(Some(number)),
            Some(PullRequestLocator::Commit(sha)) => {
                let pulls: Vec<PullRequestBody> = self
                    .client
                    .get_json(&self.repo_path(&["commits", &sha, "pulls"]), &[])
                    .await?;
                Ok(pulls.first().map(|p| PullRequestNumber::new(p.number)))
            }
        }
    }

    fn repo_path<'a>(&'a self, rest: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["repos", self.repository.owner(), self.repository.name()];
        segments.extend_from_slice(rest);
        segments
    }

    async fn commits(&self, number: &str) -> Result<Vec<PullRequestCommit>, GithubError> {
        let mut commits = Vec::new();
        for page in 1.. {
            let batch: Vec<PullRequestCommit> = self
                .client
                .get_json(
                    &self.repo_path(&["pulls", number, "commits"]),
                    &[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())],
                )
                .await?;
            let last = batch.len() < PAGE_SIZE;
            commits.extend(batch);
            if last {
                break;
            }
        }
        Ok(commits)
    }
}

#[async_trait]
impl ContributorSource for PullRequestContributors {
    type Error = GithubError;

    #[instrument(skip_all)]
    async fn release_contributors(&self) -> Result<ContributorSet, GithubError> {
        let Some(number) = self.pull_request_number().await? else {
            info!(repository = %self.repository, "No pull request associated with this run");
            return Ok(ContributorSet::new());
        };
        let number = number.to_string();

        let pull: PullRequestBody = self
            .client
            .get_json(&self.repo_path(&["pulls", &number]), &[])
            .await?;

        // The pull request author comes first so their spelling wins.
        let mut logins = ContributorSet::new();
        logins.extend(pull.user.and_then(|u| Login::new(u.login)));

        let commits = self.commits(&number).await?;
        for commit in &commits {
            logins.extend(commit.author.as_ref().and_then(|a| Login::new(a.login.as_str())));
            if self.include_co_authors {
                logins.extend(parse_co_authors(&commit.commit.message));
            }
        }

        debug!(
            repository = %self.repository,
            pull_request = %number,
            commits = commits.len(),
            contributors = logins.len(),
            "Collected contributors"
        );
        Ok(logins.sorted())
    }
}
