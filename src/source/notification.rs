//! The notification type and its lenient decoder.
//!
//! Only the count matters for the panel, so decoding is two-stage: the body
//! must be a JSON array, and each element is then mapped field by field
//! without ever rejecting it.  A malformed element still counts as one
//! notification.
//!
//! ## For contributors
//!
//! If you need another field from the API, add it to [`Notification`] and
//! read it in the `From<&Value>` impl with the same "missing means default"
//! rule.  Do not switch to a strict `#[derive(Deserialize)]`: one odd element
//! would then blank the whole count.

use serde_json::Value;

/// A single notification thread as returned by `GET /notifications`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    /// Thread id.  The API sends a string; numbers are accepted too.
    pub id: String,

    pub unread: bool,

    /// Why the user was notified (`mention`, `review_requested`, ...).
    pub reason: String,

    /// API URL of the issue / pull request / commit, when there is one.
    pub subject_url: Option<String>,
}

impl From<&Value> for Notification {
    fn from(value: &Value) -> Self {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        Notification {
            id,
            unread: value.get("unread").and_then(Value::as_bool).unwrap_or(false),
            reason: value
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            subject_url: value
                .get("subject")
                .and_then(|s| s.get("url"))
                .and_then(Value::as_str)
                .map(String::from),
        }
    }
}

/// Decode a response body.  Returns `None` unless it is a JSON array.
pub fn decode_notifications(body: &[u8]) -> Option<Vec<Notification>> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let elements = value.as_array()?;
    Some(elements.iter().map(Notification::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_shape() {
        let body = br#"[
            {
                "id": "1",
                "unread": true,
                "reason": "mention",
                "subject": {
                    "title": "Fix the thing",
                    "url": "https://api.github.com/repos/o/r/issues/1",
                    "type": "Issue"
                },
                "repository": { "full_name": "o/r" }
            },
            {
                "id": "2",
                "unread": false,
                "reason": "review_requested",
                "subject": { "title": "PR", "url": null, "type": "PullRequest" }
            }
        ]"#;

        let items = decode_notifications(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1");
        assert!(items[0].unread);
        assert_eq!(items[0].reason, "mention");
        assert_eq!(
            items[0].subject_url.as_deref(),
            Some("https://api.github.com/repos/o/r/issues/1")
        );
        assert!(!items[1].unread);
        assert!(items[1].subject_url.is_none());
    }

    #[test]
    fn empty_array_is_valid() {
        assert_eq!(decode_notifications(b"[]"), Some(vec![]));
    }

    #[test]
    fn non_array_bodies_are_rejected() {
        assert!(decode_notifications(br#"{"message":"Bad credentials"}"#).is_none());
        assert!(decode_notifications(b"").is_none());
        assert!(decode_notifications(b"<html>").is_none());
        assert!(decode_notifications(b"42").is_none());
    }

    #[test]
    fn malformed_elements_still_count() {
        let items = decode_notifications(br#"[{"id": 7}, "junk", null, {"unread": "yes"}]"#).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].id, "7");
        assert_eq!(items[1], Notification::default());
        assert!(!items[3].unread);
    }
}
