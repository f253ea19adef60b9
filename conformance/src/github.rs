//! GitHub REST adapter.
//!
//! [`GhPagesStore`] keeps ledger documents and the matrix page on the
//! `gh-pages` branch through the contents API; [`PullRequestThread`] is the
//! issue-comment thread of the pull request that triggered the run.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::{Error, Result};
use crate::ledger::{BlobStore, StoredBlob};

/// API root used when `GITHUB_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Branch holding the published documents.
pub const GH_PAGES_BRANCH: &str = "gh-pages";

const USER_AGENT: &str = concat!("specs-conformance/", env!("CARGO_PKG_VERSION"));
const COMMENTS_PER_PAGE: usize = 100;

/// The workflow run this process belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubContext {
    /// `owner/repo` the workflow runs in.
    pub repository: String,
    /// Triggering event, e.g. `pull_request`.
    pub event_name: String,
    /// Pull request number from the event payload.
    pub pull_request: Option<u64>,
    /// REST API root.
    pub api_url: String,
}

impl GitHubContext {
    /// Reads `GITHUB_REPOSITORY`, `GITHUB_EVENT_NAME`, `GITHUB_EVENT_PATH` and
    /// `GITHUB_API_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the context through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let event_name = lookup("GITHUB_EVENT_NAME").unwrap_or_default();
        let pull_request = match lookup("GITHUB_EVENT_PATH").filter(|p| !p.is_empty()) {
            Some(path) if event_name == "pull_request" => pull_request_number(PathBuf::from(path)),
            _ => None,
        };
        Self {
            repository: lookup("GITHUB_REPOSITORY").unwrap_or_default(),
            event_name,
            pull_request,
            api_url: lookup("GITHUB_API_URL")
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    /// Pull request of a `pull_request` event.
    pub fn pull_request(&self) -> Option<u64> {
        self.pull_request.filter(|_| self.event_name == "pull_request")
    }
}

fn pull_request_number(event_path: PathBuf) -> Option<u64> {
    let payload = match std::fs::read_to_string(&event_path) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(path = %event_path.display(), error = %e, "Cannot read event payload");
            return None;
        }
    };
    let event: Value = match serde_json::from_str(&payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(path = %event_path.display(), error = %e, "Event payload is not JSON");
            return None;
        }
    };
    event.pointer("/pull_request/number").and_then(Value::as_u64)
}

/// Status and body of a completed request.
struct Reply {
    status: u16,
    body: String,
}

/// Authenticated client for one repository.
#[derive(Clone)]
pub struct GitHubClient {
    agent: Agent,
    api_url: String,
    repository: String,
    token: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Client for `repository` (`owner/repo`) under `api_url`.
    pub fn new(api_url: &str, repository: &str, token: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token: token.to_string(),
        }
    }

    /// Client for the repository the workflow runs in.
    pub fn for_context(context: &GitHubContext, token: &str) -> Self {
        Self::new(&context.api_url, &context.repository, token)
    }

    /// Repository this client talks to.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repository, path)
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", USER_AGENT)
    }

    /// Reads a file on `branch`. `Ok(None)` on 404.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitHub`] on any other non-success response, or when the
    /// content is not base64-encoded UTF-8.
    pub fn get_content(&self, path: &str, branch: &str) -> Result<Option<StoredBlob>> {
        #[derive(Deserialize)]
        struct Content {
            sha: String,
            #[serde(default)]
            content: String,
        }

        let url = self.repo_url(&format!("contents/{path}"));
        let result = self.authorize(self.agent.get(&url)).query("ref", branch).call();
        let reply = finish("GET", &url, result)?;
        match reply.status {
            404 => {
                debug!(path, branch, "content not found");
                Ok(None)
            }
            200 => {
                let file: Content = decode_json("GET", &url, &reply)?;
                let bytes = STANDARD
                    .decode(file.content.replace(['\n', '\r'], ""))
                    .map_err(|e| unexpected("GET", &url, &reply, &e))?;
                let content =
                    String::from_utf8(bytes).map_err(|e| unexpected("GET", &url, &reply, &e))?;
                Ok(Some(StoredBlob {
                    content,
                    sha: file.sha,
                }))
            }
            _ => Err(failure("GET", &url, reply)),
        }
    }

    /// Creates or updates a file on `branch`. `sha` must be the blob sha the
    /// content was read at, or `None` when creating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteConflict`] on 409 or 422 (stale or missing sha),
    /// [`Error::GitHub`] on any other non-success response.
    pub fn put_content(
        &self,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> Result<()> {
        let url = self.repo_url(&format!("contents/{path}"));
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = Value::from(sha);
        }
        let result = self.authorize(self.agent.put(&url)).send_json(&body);
        let reply = finish("PUT", &url, result)?;
        match reply.status {
            200 | 201 => Ok(()),
            409 | 422 => {
                warn!(path, status = reply.status, body = %reply.body, "Contents write rejected");
                Err(Error::WriteConflict {
                    name: path.to_string(),
                    expected: sha.unwrap_or("none").to_string(),
                })
            }
            _ => Err(failure("PUT", &url, reply)),
        }
    }

    /// Every comment on issue or pull request `number`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitHub`] on a non-success response.
    pub fn list_comments(&self, number: u64) -> Result<Vec<IssueComment>> {
        let url = self.repo_url(&format!("issues/{number}/comments"));
        let mut comments = Vec::new();
        for page in 1.. {
            let result = self
                .authorize(self.agent.get(&url))
                .query("per_page", COMMENTS_PER_PAGE.to_string())
                .query("page", page.to_string())
                .call();
            let reply = finish("GET", &url, result)?;
            if reply.status != 200 {
                return Err(failure("GET", &url, reply));
            }
            let batch: Vec<IssueComment> = decode_json("GET", &url, &reply)?;
            let last = batch.len() < COMMENTS_PER_PAGE;
            comments.extend(batch);
            if last {
                break;
            }
        }
        Ok(comments)
    }

    /// Replaces the body of comment `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitHub`] on a non-success response.
    pub fn update_comment(&self, id: u64, body: &str) -> Result<IssueComment> {
        let url = self.repo_url(&format!("issues/comments/{id}"));
        let result = self
            .authorize(self.agent.patch(&url))
            .send_json(json!({ "body": body }));
        let reply = finish("PATCH", &url, result)?;
        if reply.status != 200 {
            return Err(failure("PATCH", &url, reply));
        }
        decode_json("PATCH", &url, &reply)
    }

    /// Adds a comment to issue or pull request `number`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitHub`] on a non-success response.
    pub fn create_comment(&self, number: u64, body: &str) -> Result<IssueComment> {
        let url = self.repo_url(&format!("issues/{number}/comments"));
        let result = self
            .authorize(self.agent.post(&url))
            .send_json(json!({ "body": body }));
        let reply = finish("POST", &url, result)?;
        if reply.status != 201 {
            return Err(failure("POST", &url, reply));
        }
        decode_json("POST", &url, &reply)
    }
}

fn finish(
    method: &'static str,
    url: &str,
    result: std::result::Result<Response<Body>, ureq::Error>,
) -> Result<Reply> {
    let transport = |status: u16, e: ureq::Error| Error::GitHub {
        method,
        url: url.to_string(),
        status,
        body: e.to_string(),
    };
    let mut response = result.map_err(|e| transport(0, e))?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| transport(status, e))?;
    debug!(method, url, status, "GitHub API response");
    Ok(Reply { status, body })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    method: &'static str,
    url: &str,
    reply: &Reply,
) -> Result<T> {
    serde_json::from_str(&reply.body).map_err(|e| unexpected(method, url, reply, &e))
}

fn unexpected(method: &'static str, url: &str, reply: &Reply, cause: &dyn std::fmt::Display) -> Error {
    Error::GitHub {
        method,
        url: url.to_string(),
        status: reply.status,
        body: format!("unexpected response format: {cause}"),
    }
}

fn failure(method: &'static str, url: &str, reply: Reply) -> Error {
    Error::GitHub {
        method,
        url: url.to_string(),
        status: reply.status,
        body: reply.body,
    }
}

/// Documents on the `gh-pages` branch of the workflow's repository.
#[derive(Debug, Clone)]
pub struct GhPagesStore {
    client: GitHubClient,
    branch: String,
}

impl GhPagesStore {
    /// Store on [`GH_PAGES_BRANCH`].
    pub fn new(client: GitHubClient) -> Self {
        Self {
            client,
            branch: GH_PAGES_BRANCH.to_string(),
        }
    }
}

impl BlobStore for GhPagesStore {
    fn read(&self, name: &str) -> Result<Option<StoredBlob>> {
        self.client.get_content(name, &self.branch)
    }

    fn write(&self, name: &str, content: &str, message: &str, sha: Option<&str>) -> Result<()> {
        self.client
            .put_content(name, content, message, &self.branch, sha)?;
        info!(
            repository = self.client.repository(),
            branch = %self.branch,
            commit = message,
            "Wrote {name}"
        );
        Ok(())
    }
}

/// Author of a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentUser {
    /// Account login.
    #[serde(default)]
    pub login: String,
    /// Account type: `User`, `Bot`, `Organization`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// An issue or pull request comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    /// Comment id.
    pub id: u64,
    /// Markdown body.
    #[serde(default)]
    pub body: Option<String>,
    /// Author.
    #[serde(default)]
    pub user: Option<CommentUser>,
    /// Web link to the comment.
    #[serde(default)]
    pub html_url: String,
}

impl IssueComment {
    /// Whether a bot posted this comment.
    pub fn is_bot(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.kind == "Bot")
    }
}

/// A comment thread the run summary can be posted to.
pub trait CommentThread {
    /// Every comment in the thread.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn comments(&self) -> Result<Vec<IssueComment>>;

    /// Replaces an existing comment's body.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn update(&self, id: u64, body: &str) -> Result<IssueComment>;

    /// Posts a new comment.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    fn create(&self, body: &str) -> Result<IssueComment>;
}

/// Comment thread of one pull request.
#[derive(Debug, Clone)]
pub struct PullRequestThread {
    client: GitHubClient,
    number: u64,
}

impl PullRequestThread {
    /// Thread of pull request `number`.
    pub fn new(client: GitHubClient, number: u64) -> Self {
        Self { client, number }
    }
}

impl CommentThread for PullRequestThread {
    fn comments(&self) -> Result<Vec<IssueComment>> {
        self.client.list_comments(self.number)
    }

    fn update(&self, id: u64, body: &str) -> Result<IssueComment> {
        self.client.update_comment(id, body)
    }

    fn create(&self, body: &str) -> Result<IssueComment> {
        self.client.create_comment(self.number, body)
    }
}
