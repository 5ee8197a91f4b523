use chrono::{DateTime, Utc};

/// Arguments of the atomic dedup-and-append operation.
#[derive(Debug, Clone, Copy)]
pub struct DedupInsert<'a> {
    pub stream_key: &'a str,
    pub log_key: &'a str,
    pub event_id: &'a str,
    pub payload: &'a str,
    pub max_len: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Marker created, entry appended, stream trimmed.
    Inserted,
    /// Marker already existed. Nothing was written.
    Duplicate,
}

impl InsertOutcome {
    /// Map the script reply: `0` means the marker already existed.
    pub fn from_reply(reply: i64) -> Self {
        if reply == 0 {
            Self::Duplicate
        } else {
            Self::Inserted
        }
    }
}

/// A write staged in a [`crate::WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// `ZINCRBY key by member`
    IncrementScore {
        key: String,
        member: String,
        by: i64,
    },
    /// `EXPIREAT key at`
    ExpireAt { key: String, at: DateTime<Utc> },
}

impl WriteOp {
    pub fn increment(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::IncrementScore {
            key: key.into(),
            member: member.into(),
            by: 1,
        }
    }

    pub fn expire_at(key: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::ExpireAt {
            key: key.into(),
            at,
        }
    }
}

/// One entry of the bounded event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// Store-assigned entry id (monotonic within the stream).
    pub id: String,
    pub event_id: String,
    pub payload: String,
}
