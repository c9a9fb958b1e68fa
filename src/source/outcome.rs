//! The typed result of one fetch.

use super::Notification;

/// What a single poll produced.  Fetchers never return errors; every
/// failure is one of the variants below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200 with a JSON array body.
    Fresh {
        notifications: Vec<Notification>,
        /// `Last-Modified` header, echoed back as `If-Modified-Since`.
        last_modified: Option<String>,
        /// `X-Poll-Interval` header, in seconds.
        min_interval: Option<u64>,
    },
    /// 304.
    NotModified { min_interval: Option<u64> },
    /// 401.
    Unauthorized,
    /// Any other status, a 200 with an unusable body, or `0` when the
    /// configuration was rejected before sending.
    HttpError(u16),
    TransportError(String),
}

impl FetchOutcome {
    /// `Fresh` and `NotModified` reset the retry counter; everything else
    /// advances it.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Fresh { .. } | FetchOutcome::NotModified { .. })
    }

    pub fn min_interval(&self) -> Option<u64> {
        match self {
            FetchOutcome::Fresh { min_interval, .. } | FetchOutcome::NotModified { min_interval } => {
                *min_interval
            }
            _ => None,
        }
    }

    /// One-line description for the status bar and logs.
    pub fn summary(&self) -> String {
        match self {
            FetchOutcome::Fresh { notifications, .. } => {
                format!("{} notifications", notifications.len())
            }
            FetchOutcome::NotModified { .. } => "not modified".into(),
            FetchOutcome::Unauthorized => "unauthorized".into(),
            FetchOutcome::HttpError(0) => "invalid settings".into(),
            FetchOutcome::HttpError(status) => format!("HTTP {status}"),
            FetchOutcome::TransportError(message) => format!("network error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_variants() {
        let fresh = FetchOutcome::Fresh {
            notifications: vec![],
            last_modified: None,
            min_interval: Some(60),
        };
        assert!(fresh.is_success());
        assert_eq!(fresh.min_interval(), Some(60));
        assert!(FetchOutcome::NotModified { min_interval: None }.is_success());

        assert!(!FetchOutcome::Unauthorized.is_success());
        assert!(!FetchOutcome::HttpError(500).is_success());
        assert!(!FetchOutcome::TransportError("reset".into()).is_success());
        assert_eq!(FetchOutcome::HttpError(500).min_interval(), None);
    }

    #[test]
    fn summaries() {
        assert_eq!(FetchOutcome::HttpError(503).summary(), "HTTP 503");
        assert_eq!(FetchOutcome::HttpError(0).summary(), "invalid settings");
        assert_eq!(
            FetchOutcome::Fresh {
                notifications: vec![Notification::default(); 3],
                last_modified: None,
                min_interval: None,
            }
            .summary(),
            "3 notifications"
        );
    }
}
