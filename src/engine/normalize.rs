// Session normalization: maps flat and `data.<field>.value` upstream shapes onto `Session`.

use serde_json::Value;

use crate::model::{RawSession, Session, Speaker};

const UNTITLED: &str = "Untitled Session";
const UNKNOWN_SPEAKER: &str = "Unknown Speaker";

/// Normalize every raw session of one conference.
pub fn normalize_sessions(raw: &[RawSession], year: &str) -> Vec<Session> {
    raw.iter().map(|s| normalize_session(s, year)).collect()
}

pub fn normalize_session(raw: &RawSession, year: &str) -> Session {
    let id = text(raw.get("id"))
        .or_else(|| text(raw.get("sessionId")))
        .map(|s| strip_revision(&s).to_string())
        .unwrap_or_default();
    let session_id = text(raw.get("sessionId"))
        .or_else(|| text(raw.get("id")))
        .map(|s| strip_revision(&s).to_string())
        .unwrap_or_default();

    Session {
        id,
        session_id,
        title: field(raw, "title", UNTITLED),
        summary: field(raw, "abstract", ""),
        format: field(raw, "format", "presentation"),
        length: field(raw, "length", "45"),
        language: field(raw, "language", "en"),
        room: field(raw, "room", ""),
        start_time: field(raw, "startTime", ""),
        end_time: field(raw, "endTime", ""),
        video: field(raw, "video", ""),
        speakers: speakers(raw),
        status: field(raw, "status", "confirmed"),
        tags: tags(raw),
        year: year.to_string(),
    }
}

/// Drop one trailing `:1` revision marker.
pub fn strip_revision(id: &str) -> &str {
    id.strip_suffix(":1").unwrap_or(id)
}

/// Non-empty string or number rendered as text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `data.<name>.value`, then flat `<name>`, then `default`.
fn field(raw: &RawSession, name: &str, default: &str) -> String {
    let nested = raw
        .get("data")
        .and_then(|d| d.get(name))
        .and_then(|f| f.get("value"));
    text(nested)
        .or_else(|| text(raw.get(name)))
        .unwrap_or_else(|| default.to_string())
}

fn speakers(raw: &RawSession) -> Vec<Speaker> {
    let Some(list) = raw.get("speakers").and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .map(|s| Speaker {
            name: text(s.get("name")).unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()),
        })
        .collect()
}

fn tags(raw: &RawSession) -> Vec<String> {
    raw.pointer("/data/tagswithauthor/value")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.get("tag").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_for_empty_record() {
        let s = normalize_session(&json!({}), "2024");
        assert_eq!(s.id, "");
        assert_eq!(s.session_id, "");
        assert_eq!(s.title, "Untitled Session");
        assert_eq!(s.format, "presentation");
        assert_eq!(s.length, "45");
        assert_eq!(s.language, "en");
        assert_eq!(s.status, "confirmed");
        assert_eq!(s.summary, "");
        assert_eq!(s.room, "");
        assert!(s.speakers.is_empty());
        assert!(s.tags.is_empty());
        assert_eq!(s.year, "2024");
    }

    #[test]
    fn test_missing_nested_title_is_untitled() {
        let s = normalize_session(&json!({"data": {"abstract": {"value": "x"}}}), "2023");
        assert_eq!(s.title, "Untitled Session");
        assert_eq!(s.summary, "x");
    }

    #[test]
    fn test_strip_revision_once() {
        assert_eq!(strip_revision("abc:1"), "abc");
        assert_eq!(strip_revision("abc:1:1"), "abc:1");
        assert_eq!(strip_revision("abc:12"), "abc:12");
        assert_eq!(strip_revision("abc"), "abc");
    }

    #[test]
    fn test_id_precedence() {
        let s = normalize_session(&json!({"id": "a:1", "sessionId": "b:1"}), "2023");
        assert_eq!(s.id, "a");
        assert_eq!(s.session_id, "b");

        let s = normalize_session(&json!({"sessionId": "b:1:1"}), "2023");
        assert_eq!(s.id, "b:1");
        assert_eq!(s.session_id, "b:1");

        let s = normalize_session(&json!({"id": "", "sessionId": "c"}), "2023");
        assert_eq!(s.id, "c");
    }

    #[test]
    fn test_nested_wins_over_flat() {
        let raw = json!({
            "title": "flat",
            "format": "workshop",
            "length": 60,
            "data": {
                "title": {"privateData": false, "value": "nested"},
                "format": {"value": ""},
                "room": {"value": "Room 7"}
            }
        });
        let s = normalize_session(&raw, "2023");
        assert_eq!(s.title, "nested");
        // Empty nested value falls through to the flat field.
        assert_eq!(s.format, "workshop");
        assert_eq!(s.length, "60");
        assert_eq!(s.room, "Room 7");
    }

    #[test]
    fn test_speakers_and_tags() {
        let raw = json!({
            "speakers": [{"name": "Ada"}, {"email": "x@y"}],
            "data": {
                "tagswithauthor": {"value": [
                    {"tag": "core", "author": "pk"},
                    {"author": "pk"},
                    {"tag": "2024", "author": "pk"}
                ]}
            }
        });
        let s = normalize_session(&raw, "2024");
        let names: Vec<_> = s.speakers.iter().map(|sp| sp.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Unknown Speaker"]);
        assert_eq!(s.tags, vec!["core", "2024"]);
    }

    #[test]
    fn test_non_array_tags_and_speakers_are_empty() {
        let raw = json!({
            "speakers": "Ada",
            "data": {"tagswithauthor": {"value": "core"}}
        });
        let s = normalize_session(&raw, "2024");
        assert!(s.speakers.is_empty());
        assert!(s.tags.is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = vec![json!({"id": "a:1", "title": "One"}), json!({"sessionId": "b"})];
        let first = serde_json::to_vec(&normalize_sessions(&raw, "2023")).unwrap();
        let second = serde_json::to_vec(&normalize_sessions(&raw, "2023")).unwrap();
        assert_eq!(first, second);
    }
}
