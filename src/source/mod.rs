//! Notification source abstraction.
//!
//! This module defines the [`NotificationSource`] trait, the typed
//! [`FetchOutcome`] and the [`Notification`] type.  The real implementation
//! talks to the GitHub REST API ([`github`]); tests substitute scripted
//! sources.
//!
//! ## Adding a new source
//!
//! 1. Create a new file in this directory (e.g. `gitea.rs`).
//! 2. Implement [`NotificationSource`] for your struct.  `fetch()` must never
//!    fail: map every problem to a [`FetchOutcome`] variant.
//! 3. Add `mod gitea;` below and re-export your struct.
//! 4. Construct it in `main.rs` instead of [`GithubSource`].
//!
//! The scheduler, backoff and reconciliation are source-agnostic.

mod github;
mod notification;
mod outcome;

pub use github::GithubSource;
pub use notification::{decode_notifications, Notification};
pub use outcome::FetchOutcome;

use async_trait::async_trait;

use crate::config::PollConfig;

/// Trait that every notification source must implement.
///
/// The scheduler spawns [`fetch()`](NotificationSource::fetch) as a task on
/// its runtime, so implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Human-readable label used in logs.
    fn name(&self) -> &str;

    /// Perform one conditional fetch.
    ///
    /// `revalidation` is the `Last-Modified` value of the last fresh
    /// response, if any.
    async fn fetch(&self, config: &PollConfig, revalidation: Option<&str>) -> FetchOutcome;
}
