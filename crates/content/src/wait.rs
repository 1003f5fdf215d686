//! Bounded wait for an anchor node to appear in a content host.
//! 等待指定 anchor 節點出現的限時等待。
//!
//! A freshly injected fragment normally contains its anchor already, so the
//! common path resolves without waiting. The poll form exists so drivers and
//! tests control interleaving deterministically.

use thiserror::Error;
use tracing::trace;

use crate::clock::Clock;
use crate::host::{ContentHost, NodeId, Selector};

/// Default deadline for the anchor wait.
pub const DEFAULT_ANCHOR_TIMEOUT_MS: u64 = 5_000;

/// Interval between re-checks in the blocking helper.
pub const POLL_INTERVAL_MS: u64 = 25;

/// Outcome of a single poll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPoll {
    Ready(NodeId),
    Pending,
    TimedOut,
}

/// One pending wait: a selector plus an absolute deadline.
/// 一筆待處理的等待：選擇器加上絕對期限。
#[derive(Debug, Clone)]
pub struct AnchorWait {
    selector: Selector,
    deadline_ms: u64,
}

impl AnchorWait {
    pub fn new(selector: Selector, started_ms: u64, timeout_ms: u64) -> Self {
        Self {
            selector,
            deadline_ms: started_ms.saturating_add(timeout_ms),
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Checks the host once. Presence wins over the deadline so an anchor
    /// that appears exactly at expiry still resolves.
    pub fn poll(&self, host: &ContentHost, now_ms: u64) -> AnchorPoll {
        if let Some(id) = host.find(&self.selector) {
            return AnchorPoll::Ready(id);
        }
        if now_ms >= self.deadline_ms {
            return AnchorPoll::TimedOut;
        }
        AnchorPoll::Pending
    }
}

/// Blocks until the anchor exists or the deadline passes.
/// 阻塞直到 anchor 出現或超過期限。
pub fn await_anchor(
    host: &ContentHost,
    selector: &Selector,
    timeout_ms: u64,
    clock: &dyn Clock,
) -> Result<NodeId, WaitError> {
    let wait = AnchorWait::new(selector.clone(), clock.now_ms(), timeout_ms);
    loop {
        match wait.poll(host, clock.now_ms()) {
            AnchorPoll::Ready(id) => return Ok(id),
            AnchorPoll::TimedOut => {
                return Err(WaitError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms,
                })
            }
            AnchorPoll::Pending => {
                trace!(selector = %selector, "anchor not present yet");
                clock.sleep_ms(POLL_INTERVAL_MS);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("element {selector} not found within {timeout_ms} ms")]
    Timeout { selector: String, timeout_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::host::Node;

    fn selector(raw: &str) -> Selector {
        Selector::parse(raw).unwrap()
    }

    #[test]
    fn resolves_immediately_when_present() {
        let mut host = ContentHost::new();
        let id = host
            .insert(None, Node::select("Product").with_anchor("product-select"))
            .unwrap();
        let clock = TestClock::new();
        let found = await_anchor(&host, &selector("#product-select"), 5_000, &clock).unwrap();
        assert_eq!(found, id);
        // No time was spent polling.
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn times_out_when_anchor_never_appears() {
        let host = ContentHost::new();
        let clock = TestClock::new();
        let err = await_anchor(&host, &selector("#missing"), 5_000, &clock).unwrap_err();
        let WaitError::Timeout {
            selector: reported,
            timeout_ms,
        } = err;
        assert_eq!(reported, "#missing");
        assert_eq!(timeout_ms, 5_000);
        // The blocking helper gave the anchor the whole window.
        assert!(clock.now_ms() >= 5_000);
        assert!(clock.now_ms() < 5_000 + 2 * POLL_INTERVAL_MS);
    }

    #[test]
    fn poll_observes_late_appearance() {
        let mut host = ContentHost::new();
        let wait = AnchorWait::new(selector("#late"), 0, 1_000);

        assert_eq!(wait.poll(&host, 0), AnchorPoll::Pending);
        assert_eq!(wait.poll(&host, 500), AnchorPoll::Pending);

        let id = host
            .insert(None, Node::text("").with_anchor("late"))
            .unwrap();
        assert_eq!(wait.poll(&host, 600), AnchorPoll::Ready(id));
    }

    #[test]
    fn poll_times_out_at_deadline() {
        let host = ContentHost::new();
        let wait = AnchorWait::new(selector("#late"), 100, 1_000);
        assert_eq!(wait.poll(&host, 1_099), AnchorPoll::Pending);
        assert_eq!(wait.poll(&host, 1_100), AnchorPoll::TimedOut);
    }

    #[test]
    fn presence_wins_over_expiry() {
        let mut host = ContentHost::new();
        let id = host
            .insert(None, Node::text("").with_anchor("slow"))
            .unwrap();
        let wait = AnchorWait::new(selector("#slow"), 0, 10);
        assert_eq!(wait.poll(&host, 10_000), AnchorPoll::Ready(id));
    }
}
