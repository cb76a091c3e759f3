//! Wait Mechanisms
//!
//! Poll-until-true waits with hard ceilings. Nothing in this crate sleeps for
//! a fixed time to "let the page settle"; every wait names the condition it
//! is waiting for and gives up at a deadline.
//!
//! Quiescence means: document ready, zero in-flight requests for a quiet
//! window, and no running animations.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::result::{ShopError, ShopResult};
use crate::session::Session;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network quiet window (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Overall deadline
    pub timeout: Duration,
    /// Pause between checks
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Whether the condition became true
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of checks performed
    pub polls: u32,
}

/// Poll `check` until it returns `true` or the deadline passes.
///
/// The first check happens immediately. A timeout is reported through
/// [`WaitResult::success`]; errors from `check` abort the wait.
///
/// # Errors
///
/// Propagates the first error returned by `check`.
pub async fn wait_for<F, Fut>(options: WaitOptions, mut check: F) -> ShopResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ShopResult<bool>>,
{
    let start = Instant::now();
    let mut polls = 0;
    loop {
        polls += 1;
        if check().await? {
            return Ok(WaitResult {
                success: true,
                elapsed: start.elapsed(),
                polls,
            });
        }
        if start.elapsed() >= options.timeout {
            return Ok(WaitResult {
                success: false,
                elapsed: start.elapsed(),
                polls,
            });
        }
        let remaining = options.timeout.saturating_sub(start.elapsed());
        tokio::time::sleep(options.poll_interval.min(remaining)).await;
    }
}

// =============================================================================
// QUIESCENCE
// =============================================================================

/// Options for [`wait_for_quiescence`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuiescenceOptions {
    /// Hard ceiling; exceeding it is an error
    pub ceiling: Duration,
    /// How long the page must stay idle
    pub quiet_window: Duration,
    /// Pause between page-state checks
    pub poll_interval: Duration,
}

impl Default for QuiescenceOptions {
    fn default() -> Self {
        Self {
            ceiling: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            quiet_window: Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Wait until the page has been idle for the quiet window.
///
/// Returns the time spent waiting.
///
/// # Errors
///
/// [`ShopError::QuiescenceTimeout`] when the ceiling passes first; session
/// errors are propagated.
pub async fn wait_for_quiescence(
    session: &dyn Session,
    options: QuiescenceOptions,
) -> ShopResult<Duration> {
    let start = Instant::now();
    let mut quiet_since: Option<Instant> = None;
    let timed_out = || ShopError::QuiescenceTimeout {
        ms: options.ceiling.as_millis() as u64,
    };
    loop {
        let budget = options.ceiling.saturating_sub(start.elapsed());
        let state = match tokio::time::timeout(budget, session.page_state()).await {
            Ok(state) => state?,
            Err(_) => {
                tracing::warn!(
                    ceiling_ms = options.ceiling.as_millis() as u64,
                    "page state query did not answer before the ceiling"
                );
                return Err(timed_out());
            }
        };
        if state.is_idle() {
            let since = *quiet_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= options.quiet_window {
                return Ok(start.elapsed());
            }
        } else {
            quiet_since = None;
        }
        if start.elapsed() >= options.ceiling {
            tracing::warn!(
                ceiling_ms = options.ceiling.as_millis() as u64,
                ready = state.ready,
                in_flight = state.in_flight,
                animations = state.animations,
                "page never became quiescent"
            );
            return Err(timed_out());
        }
        let remaining = options.ceiling.saturating_sub(start.elapsed());
        tokio::time::sleep(options.poll_interval.min(remaining)).await;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::MockSession;
    use crate::session::PageState;
    use std::sync::atomic::{AtomicU32, Ordering};

    mod wait_for_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_immediate_success() {
            let result = wait_for(WaitOptions::new(), || async { Ok(true) })
                .await
                .unwrap();
            assert!(result.success);
            assert_eq!(result.polls, 1);
            assert_eq!(result.elapsed, Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_after_some_polls() {
            let calls = AtomicU32::new(0);
            let result = wait_for(WaitOptions::new(), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 3) }
            })
            .await
            .unwrap();
            assert!(result.success);
            assert_eq!(result.polls, 4);
            assert_eq!(result.elapsed, Duration::from_millis(150));
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out_at_deadline() {
            let options = WaitOptions::new().with_timeout(Duration::from_millis(200));
            let result = wait_for(options, || async { Ok(false) }).await.unwrap();
            assert!(!result.success);
            assert_eq!(result.elapsed, Duration::from_millis(200));
        }

        #[tokio::test(start_paused = true)]
        async fn test_error_aborts_wait() {
            let err = wait_for(WaitOptions::new(), || async {
                Err::<bool, _>(ShopError::session("gone"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, ShopError::Session { .. }));
        }
    }

    mod quiescence_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_settled_page_waits_one_quiet_window() {
            let session = MockSession::new();
            let waited = wait_for_quiescence(&session, QuiescenceOptions::default())
                .await
                .unwrap();
            assert_eq!(waited, Duration::from_millis(500));
        }

        #[tokio::test(start_paused = true)]
        async fn test_activity_resets_quiet_window() {
            let session = MockSession::new();
            let busy = PageState {
                in_flight: 2,
                ..PageState::settled()
            };
            session.script_page_states([
                PageState::settled(),
                busy,
                busy,
            ]);
            let waited = wait_for_quiescence(&session, QuiescenceOptions::default())
                .await
                .unwrap();
            // idle window restarts at the fourth poll (150ms)
            assert_eq!(waited, Duration::from_millis(650));
        }

        #[tokio::test(start_paused = true)]
        async fn test_animations_block_quiescence() {
            let session = MockSession::new();
            let animating = PageState {
                animations: 1,
                ..PageState::settled()
            };
            session.script_page_states(std::iter::repeat(animating).take(100));
            let options = QuiescenceOptions {
                ceiling: Duration::from_millis(1_000),
                ..QuiescenceOptions::default()
            };
            let err = wait_for_quiescence(&session, options).await.unwrap_err();
            assert!(matches!(err, ShopError::QuiescenceTimeout { ms: 1_000 }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresponsive_page_state_fails_at_ceiling() {
            let session = MockSession::new().stall_on("page_state", Duration::from_secs(60));
            let options = QuiescenceOptions {
                ceiling: Duration::from_secs(2),
                ..QuiescenceOptions::default()
            };
            let start = Instant::now();
            let err = wait_for_quiescence(&session, options).await.unwrap_err();
            assert!(matches!(err, ShopError::QuiescenceTimeout { ms: 2_000 }));
            assert_eq!(start.elapsed(), Duration::from_secs(2));
        }
    }
}
