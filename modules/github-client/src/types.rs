use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A public GitHub event as returned by `/events` and stored in GH Archive.
///
/// Only the fields the pipelines inspect are typed. Everything else is kept
/// verbatim in `rest`, so re-serializing yields the full original payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_login: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Event types the pipelines distinguish. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Push,
    PullRequest,
    Other,
}

impl EventKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "PushEvent" => Self::Push,
            "PullRequestEvent" => Self::PullRequest,
            _ => Self::Other,
        }
    }

    /// Whether this event type counts toward contributor scores.
    pub fn is_scoring(self) -> bool {
        matches!(self, Self::Push | Self::PullRequest)
    }
}

impl Event {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, login: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            actor: login.map(|l| Actor {
                login: Some(l.to_string()),
                display_login: Some(l.to_string()),
                rest: Map::new(),
            }),
            rest: Map::new(),
        }
    }

    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.kind)
    }

    /// The name shown for the actor: `display_login`, falling back to `login`.
    pub fn actor_name(&self) -> Option<&str> {
        self.actor.as_ref().and_then(Actor::display_name)
    }

    /// Full JSON serialization, including untyped fields.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Actor {
    pub fn display_name(&self) -> Option<&str> {
        self.display_login
            .as_deref()
            .or(self.login.as_deref())
    }
}
