use std::borrow::Cow;

use serde::Deserialize;

use activity_common::is_bot_actor;
use github_client::EventKind;

/// The slice of an archived event that scoring looks at. Everything else on
/// the line is skipped during decoding.
#[derive(Debug, Deserialize)]
pub struct ScoringRecord<'a> {
    #[serde(rename = "type", borrow)]
    pub kind: Cow<'a, str>,
    #[serde(default, borrow)]
    pub actor: Option<RecordActor<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct RecordActor<'a> {
    #[serde(default, borrow)]
    pub login: Option<Cow<'a, str>>,
}

impl<'a> ScoringRecord<'a> {
    pub fn parse(line: &'a [u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(line)
    }

    pub fn login(&self) -> Option<&str> {
        self.actor.as_ref()?.login.as_deref()
    }

    /// The login to credit, if this is a scoring event by a human.
    pub fn scoring_login(&self) -> Option<&str> {
        if !EventKind::parse(&self.kind).is_scoring() {
            return None;
        }
        let login = self.login();
        if is_bot_actor(login) {
            return None;
        }
        login
    }
}
