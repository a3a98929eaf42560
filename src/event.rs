use askama::Template;

use crate::github::{PullRequestPayload, PushPayload};

/// Which of the two supported webhook shapes an [`Event`] came from. The
/// kind alone selects the template that renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Push,
    PullRequest,
}

impl EventKind {
    /// Maps the `X-GitHub-Event` header value to a kind. Everything besides
    /// the two supported values (an absent header included) is `None`: a
    /// recognized no-op, not an error.
    pub fn from_header(event_type: &str) -> Option<Self> {
        match event_type {
            "push" => Some(Self::Push),
            "pull_request" => Some(Self::PullRequest),
            _ => None,
        }
    }
}

/// One notification line to emit. Transient: built from a payload, rendered,
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub author: String,
    pub repo: String,
    /// Branch name for pushes, `#<number>` for pull requests.
    pub branch: String,
    /// `"commit"` for pushes, the raw pull-request action otherwise.
    pub action: String,
    pub message: String,
    /// Timestamp from the payload, passed through unmodified.
    pub date: String,
    pub kind: EventKind,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extracts the events carried by a webhook body.
///
/// A push payload yields one event per commit (possibly zero), in array
/// order. A pull-request payload yields exactly one event.
pub fn parse(kind: EventKind, body: &[u8]) -> Result<Vec<Event>, ParseError> {
    match kind {
        EventKind::Push => {
            let payload: PushPayload = serde_json::from_slice(body)?;
            // `refs/heads/main` -> `main`; a ref without `/` is taken whole.
            let branch = payload
                .reference
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_owned();
            Ok(payload
                .commits
                .into_iter()
                .map(|commit| Event {
                    author: commit.author.name,
                    repo: payload.repository.name.clone(),
                    branch: branch.clone(),
                    action: "commit".to_owned(),
                    message: commit.message,
                    date: commit.timestamp,
                    kind: EventKind::Push,
                })
                .collect())
        }
        EventKind::PullRequest => {
            let payload: PullRequestPayload = serde_json::from_slice(body)?;
            let number = payload
                .pull_request
                .number
                .or(payload.number)
                .unwrap_or_default();
            Ok(vec![Event {
                author: payload.pull_request.user.login,
                repo: payload.repository.name,
                branch: format!("#{}", number),
                action: payload.action,
                message: payload.pull_request.title,
                date: payload.pull_request.updated_at,
                kind: EventKind::PullRequest,
            }])
        }
    }
}

#[derive(Debug, Template)]
#[template(path = "push-line.txt")]
struct PushLine<'a> {
    event: &'a Event,
}

#[derive(Debug, Template)]
#[template(path = "pull-request-line.txt")]
struct PullRequestLine<'a> {
    event: &'a Event,
}

impl Event {
    /// Renders the notification line for this event.
    pub fn render(&self) -> Result<String, askama::Error> {
        match self.kind {
            EventKind::Push => PushLine { event: self }.render(),
            EventKind::PullRequest => PullRequestLine { event: self }.render(),
        }
    }
}
