//! [`ObjectStore`] over the GitHub REST API.
//!
//! File reads go through the Contents API; writes go through the Git Data
//! API (trees, commits, refs) so that several files land in one commit.

use async_trait::async_trait;
use base64::Engine;
use boothbook_types::ObjectHash;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::RepoConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::{FileContent, ObjectStore, TreeFile};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const REGULAR_FILE_MODE: &str = "100644";

/// GitHub-backed object store for a single repository.
pub struct GitHubStore {
    client: Client,
    config: RepoConfig,
}

impl GitHubStore {
    /// Build a client for `config`.
    ///
    /// Fails if the configuration does not validate or the HTTP client
    /// cannot be constructed.
    pub fn new(config: RepoConfig) -> StoreResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| StoreError::InvalidConfig(format!("user_agent: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.repository,
            suffix
        )
    }

    async fn send(&self, op: &'static str, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| transport_error(op, &e))?;
        tracing::debug!(op, status = %response.status(), "github response");
        Ok(response)
    }

    async fn expect_json<T: DeserializeOwned>(
        op: &'static str,
        subject: &str,
        expected: StatusCode,
        response: Response,
    ) -> StoreResult<T> {
        let status = response.status();
        if status != expected {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, subject, body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(format!("{op}: {e}")))
    }
}

impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore").field("config", &self.config).finish()
    }
}

#[async_trait]
impl ObjectStore for GitHubStore {
    async fn fetch_file(&self, reference: &str, path: &str) -> StoreResult<FileContent> {
        let url = self.repo_url(&format!("contents/{path}"));
        let request = self.client.get(url).query(&[("ref", reference)]);
        let response = self.send("fetch_file", request).await?;
        let body: ContentsResponse =
            Self::expect_json("fetch_file", path, StatusCode::OK, response).await?;
        Ok(FileContent {
            content: decode_content(&body.content)?,
            hash: parse_sha(&body.sha)?,
        })
    }

    async fn branch_tip(&self, branch: &str) -> StoreResult<ObjectHash> {
        let name = format!("refs/heads/{branch}");
        let request = self.client.get(self.repo_url(&format!("git/{name}")));
        let response = self.send("branch_tip", request).await?;
        let body: RefResponse = Self::expect_json("branch_tip", &name, StatusCode::OK, response).await?;
        parse_sha(&body.object.sha)
    }

    async fn read_commit_tree(&self, commit: &ObjectHash) -> StoreResult<ObjectHash> {
        let request = self.client.get(self.repo_url(&format!("git/commits/{commit}")));
        let response = self.send("read_commit_tree", request).await?;
        let subject = format!("commit {commit}");
        let body: CommitResponse =
            Self::expect_json("read_commit_tree", &subject, StatusCode::OK, response).await?;
        parse_sha(&body.tree.sha)
    }

    async fn commit_tree(&self, base_tree: &ObjectHash, files: &[TreeFile]) -> StoreResult<ObjectHash> {
        let payload = CreateTreeRequest {
            base_tree: base_tree.as_str(),
            tree: files
                .iter()
                .map(|f| TreeItem {
                    path: &f.path,
                    mode: REGULAR_FILE_MODE,
                    kind: "blob",
                    content: &f.content,
                })
                .collect(),
        };
        let request = self.client.post(self.repo_url("git/trees")).json(&payload);
        let response = self.send("commit_tree", request).await?;
        let subject = format!("tree {base_tree}");
        let body: ShaResponse =
            Self::expect_json("commit_tree", &subject, StatusCode::CREATED, response).await?;
        parse_sha(&body.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectHash,
        parent: &ObjectHash,
    ) -> StoreResult<ObjectHash> {
        let payload = CreateCommitRequest {
            message,
            tree: tree.as_str(),
            parents: vec![parent.as_str()],
        };
        let request = self.client.post(self.repo_url("git/commits")).json(&payload);
        let response = self.send("create_commit", request).await?;
        let subject = format!("commit parent {parent}");
        let body: ShaResponse =
            Self::expect_json("create_commit", &subject, StatusCode::CREATED, response).await?;
        parse_sha(&body.sha)
    }

    async fn advance_branch(&self, branch: &str, commit: &ObjectHash, force: bool) -> StoreResult<()> {
        let name = format!("refs/heads/{branch}");
        let payload = UpdateRefRequest {
            sha: commit.as_str(),
            force,
        };
        let request = self.client.patch(self.repo_url(&format!("git/{name}"))).json(&payload);
        let response = self.send("advance_branch", request).await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        // GitHub answers 422 "Update is not a fast forward"; 409 is seen when
        // the ref moved during the request.
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            tracing::debug!(branch, %body, "ref update refused");
            return Err(StoreError::Rejected {
                branch: branch.to_string(),
            });
        }
        Err(classify(status, &name, body))
    }
}

fn transport_error(op: &str, e: &reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Unavailable(format!("{op}: request timed out"))
    } else {
        StoreError::Unavailable(format!("{op}: {e}"))
    }
}

/// Map a non-success status to a store error.
fn classify(status: StatusCode, subject: &str, body: String) -> StoreError {
    match status.as_u16() {
        401 | 403 => StoreError::AuthFailure {
            status: status.as_u16(),
            body,
        },
        404 => StoreError::NotFound {
            path: subject.to_string(),
        },
        500..=599 => StoreError::Unavailable(format!("{subject}: {status}: {body}")),
        other => StoreError::Unexpected { status: other, body },
    }
}

/// Decode a Contents API body: base64 with embedded line breaks, UTF-8 text.
fn decode_content(encoded: &str) -> StoreResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(format!("utf-8: {e}")))
}

fn parse_sha(sha: &str) -> StoreResult<ObjectHash> {
    ObjectHash::parse(sha).map_err(|e| StoreError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: ShaResponse,
}

#[derive(Deserialize)]
struct CommitResponse {
    tree: ShaResponse,
}

#[derive(Serialize)]
struct TreeItem<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateTreeRequest<'a> {
    base_tree: &'a str,
    tree: Vec<TreeItem<'a>>,
}

#[derive(Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a str,
    force: bool,
}
