//! REST session gate — the write-authorization state machine.
//!
//! Sessions live in a process-scoped table and gate every chunk mutation.
//! Expiry is enforced lazily at point of use: a validate call past
//! `expires_at` deletes the session and fails with `Expired`; the next call
//! with the same id fails with `NotAuthorized`. [`RestSessions::sweep_expired`]
//! exists for housekeeping but is never required for correctness.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::lore::search::Searcher;
use crate::lore::types::{
    ChunkSizeRange, ChunkingGuide, KeywordCount, MetadataRules, RestSession, SessionStatus,
};

/// Sessions expire one hour after creation.
const SESSION_TTL_SECS: i64 = 3600;

/// Clock seam so expiry is testable without waiting an hour.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct RestSessions {
    sessions: Mutex<HashMap<String, RestSession>>,
    clock: Clock,
}

/// Payload returned by a session start.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionStart {
    pub session_id: String,
    pub chunking_guide: ChunkingGuide,
    pub metadata_rules: MetadataRules,
    pub status: String,
}

impl Default for RestSessions {
    fn default() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }
}

impl RestSessions {
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Start a session: snapshot the current chunking/metadata guidance from
    /// system-authored guide chunks (with hardcoded fallbacks when none
    /// exist), set a 1-hour expiry, and return the id plus snapshot.
    pub async fn start(&self, searcher: &Searcher, guide_collection: &str) -> Result<SessionStart> {
        let guides = searcher
            .get_by_category(guide_collection, "system", 10)
            .await?;

        let chunking_guide = extract_chunking_guide(&guides);
        let metadata_rules = extract_metadata_rules(&guides);

        let now = (self.clock)();
        let session = RestSession {
            id: format!("rest-{}", uuid::Uuid::new_v4()),
            created_at: now,
            expires_at: now + Duration::seconds(SESSION_TTL_SECS),
            chunking_guide: chunking_guide.clone(),
            metadata_rules: metadata_rules.clone(),
            scribed_count: 0,
            status: SessionStatus::Active,
        };

        let start = SessionStart {
            session_id: session.id.clone(),
            chunking_guide,
            metadata_rules,
            status: format!(
                "REST mode active. Scribing enabled. Session expires at {}",
                session.expires_at.to_rfc3339()
            ),
        };

        self.table().insert(session.id.clone(), session);
        Ok(start)
    }

    /// End a session and return its final scribed count.
    pub fn end(&self, session_id: &str) -> Result<u64> {
        let mut sessions = self.table();
        let session = sessions
            .remove(session_id)
            .ok_or_else(|| Error::NotFound(format!("session not found: {session_id}")))?;
        Ok(session.scribed_count)
    }

    /// Validate a session, enforcing expiry lazily. Returns a snapshot of
    /// the live session.
    pub fn validate(&self, session_id: &str) -> Result<RestSession> {
        let mut sessions = self.table();
        let session = sessions.get(session_id).ok_or_else(|| {
            Error::NotAuthorized("not in REST mode — call rest() first".into())
        })?;

        if (self.clock)() > session.expires_at {
            sessions.remove(session_id);
            return Err(Error::Expired(
                "REST session expired — call rest() again".into(),
            ));
        }

        Ok(session.clone())
    }

    /// Validate, then bump the successful-write counter.
    pub fn record_activity(&self, session_id: &str) -> Result<()> {
        // Validate under the same lock as the increment.
        let mut sessions = self.table();
        let now = (self.clock)();
        match sessions.get_mut(session_id) {
            None => Err(Error::NotAuthorized(
                "not in REST mode — call rest() first".into(),
            )),
            Some(session) if now > session.expires_at => {
                sessions.remove(session_id);
                Err(Error::Expired(
                    "REST session expired — call rest() again".into(),
                ))
            }
            Some(session) => {
                session.scribed_count += 1;
                Ok(())
            }
        }
    }

    /// Housekeeping sweep. Safe at any cadence or never.
    pub fn sweep_expired(&self) -> usize {
        let now = (self.clock)();
        let mut sessions = self.table();
        let before = sessions.len();
        sessions.retain(|_, session| now <= session.expires_at);
        before - sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<String, RestSession>> {
        self.sessions.lock().expect("session table poisoned")
    }
}

fn guide_text<'a>(guides: &'a [crate::lore::types::SearchResult], topic_id: &str) -> Option<&'a str> {
    guides
        .iter()
        .find(|g| g.chunk.get("topic_id").and_then(Value::as_str) == Some(topic_id))
        .and_then(|g| g.chunk.get("text").and_then(Value::as_str))
}

fn extract_chunking_guide(guides: &[crate::lore::types::SearchResult]) -> ChunkingGuide {
    let principles = match guide_text(guides, "chunking_principles") {
        Some(text) => vec![text.to_string()],
        None => vec![
            "Split into semantically independent units".into(),
            "Keep the smallest unit that still carries its context".into(),
            "Each chunk should fully answer the questions attached to it".into(),
        ],
    };
    ChunkingGuide {
        principles,
        ideal_chunk_size: ChunkSizeRange {
            min_tokens: 100,
            max_tokens: 512,
        },
        examples: vec![],
    }
}

fn extract_metadata_rules(guides: &[crate::lore::types::SearchResult]) -> MetadataRules {
    let question_guidelines = match guide_text(guides, "metadata_rules") {
        Some(text) => vec![text.to_string()],
        None => vec![
            "Write the questions this chunk can answer".into(),
            "Prefer specific, searchable phrasings".into(),
        ],
    };
    MetadataRules {
        required_fields: vec![
            "topic_id".into(),
            "keywords".into(),
            "questions".into(),
            "entities".into(),
        ],
        keyword_count: KeywordCount { min: 3, max: 10 },
        question_guidelines,
        entity_extraction: vec![
            "Extract technology, project, and person names".into(),
            "Always tag each entity with its type".into(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_clock(at: DateTime<Utc>) -> (Clock, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(at));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (clock, now)
    }

    fn insert_session(gate: &RestSessions, id: &str, expires_at: DateTime<Utc>) {
        let session = RestSession {
            id: id.to_string(),
            created_at: expires_at - Duration::seconds(SESSION_TTL_SECS),
            expires_at,
            chunking_guide: extract_chunking_guide(&[]),
            metadata_rules: extract_metadata_rules(&[]),
            scribed_count: 0,
            status: SessionStatus::Active,
        };
        gate.table().insert(id.to_string(), session);
    }

    #[test]
    fn validate_unknown_session_is_not_authorized() {
        let gate = RestSessions::default();
        let err = gate.validate("rest-nope").unwrap_err();
        assert_eq!(err.kind(), "not_authorized");
    }

    #[test]
    fn expired_session_fails_then_is_gone() {
        let t0 = Utc::now();
        let (clock, now) = fixed_clock(t0);
        let gate = RestSessions::with_clock(clock);
        insert_session(&gate, "rest-a", t0 + Duration::seconds(SESSION_TTL_SECS));

        // Still valid just before expiry.
        *now.lock().unwrap() = t0 + Duration::seconds(SESSION_TTL_SECS);
        assert!(gate.validate("rest-a").is_ok());

        // One second past expiry: Expired, and the entry is removed.
        *now.lock().unwrap() = t0 + Duration::seconds(SESSION_TTL_SECS + 1);
        assert_eq!(gate.validate("rest-a").unwrap_err().kind(), "expired");
        assert_eq!(gate.validate("rest-a").unwrap_err().kind(), "not_authorized");
        assert_eq!(gate.active_count(), 0);
    }

    #[test]
    fn record_activity_increments_scribed_count() {
        let t0 = Utc::now();
        let (clock, _) = fixed_clock(t0);
        let gate = RestSessions::with_clock(clock);
        insert_session(&gate, "rest-b", t0 + Duration::seconds(60));

        gate.record_activity("rest-b").unwrap();
        gate.record_activity("rest-b").unwrap();
        assert_eq!(gate.validate("rest-b").unwrap().scribed_count, 2);

        let count = gate.end("rest-b").unwrap();
        assert_eq!(count, 2);
        assert_eq!(gate.end("rest-b").unwrap_err().kind(), "not_found");
    }

    #[test]
    fn sweep_removes_only_expired_sessions() {
        let t0 = Utc::now();
        let (clock, now) = fixed_clock(t0);
        let gate = RestSessions::with_clock(clock);
        insert_session(&gate, "rest-old", t0 + Duration::seconds(10));
        insert_session(&gate, "rest-new", t0 + Duration::seconds(120));

        *now.lock().unwrap() = t0 + Duration::seconds(60);
        assert_eq!(gate.sweep_expired(), 1);
        assert_eq!(gate.active_count(), 1);
        assert!(gate.validate("rest-new").is_ok());
    }

    #[test]
    fn fallback_guides_apply_when_no_guide_chunks_exist() {
        let guide = extract_chunking_guide(&[]);
        assert_eq!(guide.principles.len(), 3);
        assert_eq!(guide.ideal_chunk_size.min_tokens, 100);

        let rules = extract_metadata_rules(&[]);
        assert_eq!(rules.keyword_count.min, 3);
        assert!(rules.required_fields.contains(&"topic_id".to_string()));
    }
}
