//! Lifecycle & pause (spec §5, §9)
//!
//! `AuditState` is the five-state lifecycle; `PauseSet` is a multi-source
//! pause mechanism keyed by caller-supplied token, so two independent
//! callers pausing a scan don't clobber each other's intent — resuming
//! requires every token that paused to resume (spec §9 design note: "Pause
//! set keyed by caller identity").

use std::collections::HashSet;

use tokio::sync::Mutex;

/// The five-state scan lifecycle (spec §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    Ready,
    Crawling,
    Auditing,
    Cleanup,
    Done,
}

impl AuditState {
    fn as_str(&self) -> &'static str {
        match self {
            AuditState::Ready => "ready",
            AuditState::Crawling => "crawling",
            AuditState::Auditing => "auditing",
            AuditState::Cleanup => "cleanup",
            AuditState::Done => "done",
        }
    }
}

/// Multi-source pause set: a scan is paused as long as at least one token
/// is present, regardless of how many callers have since resumed.
#[derive(Default)]
pub struct PauseSet {
    tokens: Mutex<HashSet<String>>,
}

impl PauseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pause(&self, token: impl Into<String>) {
        self.tokens.lock().await.insert(token.into());
    }

    pub async fn resume(&self, token: &str) {
        self.tokens.lock().await.remove(token);
    }

    pub async fn is_paused(&self) -> bool {
        !self.tokens.lock().await.is_empty()
    }
}

/// Render the stable status string (spec §6): `"paused"` overrides whatever
/// the underlying lifecycle state is whenever the pause set is non-empty.
pub async fn status_string(state: AuditState, pause_set: &PauseSet) -> String {
    if pause_set.is_paused().await {
        "paused".to_string()
    } else {
        state.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pause_set_requires_all_tokens_to_resume() {
        let pause_set = PauseSet::new();
        pause_set.pause("caller-a").await;
        pause_set.pause("caller-b").await;
        assert!(pause_set.is_paused().await);

        pause_set.resume("caller-a").await;
        assert!(pause_set.is_paused().await);

        pause_set.resume("caller-b").await;
        assert!(!pause_set.is_paused().await);
    }

    #[tokio::test]
    async fn test_status_paused_overrides_state() {
        let pause_set = PauseSet::new();
        pause_set.pause("caller-a").await;
        let status = status_string(AuditState::Auditing, &pause_set).await;
        assert_eq!(status, "paused");
    }

    #[tokio::test]
    async fn test_status_reflects_state_when_not_paused() {
        let pause_set = PauseSet::new();
        let status = status_string(AuditState::Crawling, &pause_set).await;
        assert_eq!(status, "crawling");
    }
}
