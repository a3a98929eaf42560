//! The slices of the GitHub webhook payloads this service consumes.
//!
//! Every field is `#[serde(default)]`: GitHub payloads carry far more fields
//! than we read, and a missing field degrades to an empty value for that
//! field only instead of failing the whole parse.

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct CommitAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Commit {
    pub author: CommitAuthor,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub reference: String,
    pub repository: Repository,
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub number: Option<u64>,
    pub title: String,
    pub updated_at: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct PullRequestPayload {
    pub action: String,
    pub number: Option<u64>,
    pub pull_request: PullRequest,
    pub repository: Repository,
}
