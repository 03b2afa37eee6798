//! Core chunk-store engine: types, aggregates, lore lifecycle, retrieval,
//! sessions, the write façade, and backup exchange.

pub mod backup;
pub mod guides;
pub mod index;
pub mod manager;
pub mod search;
pub mod session;
pub mod store;
pub mod types;

/// Current UTC time as an RFC 3339 string, the timestamp format used in all
/// stored payloads.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Set-union merge preserving first-seen order.
pub fn merge_unique(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = existing.to_vec();
    for item in incoming {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}
