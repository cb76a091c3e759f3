//! Resilient Query Engine
//!
//! Resolves a [`SelectorSpec`] to a live element. Candidates are probed in
//! priority order, round after round, until one matches or the deadline
//! passes. Absence is an ordinary outcome ([`Resolution::NotFound`]); only
//! transport failures and programmer errors surface as `Err`.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::locator::{Selector, SelectorSpec};
use crate::result::{ShopError, ShopResult};
use crate::session::{ElementHandle, Session};
use crate::wait::DEFAULT_POLL_INTERVAL_MS;

/// Extra time past the window a probe already in flight may take, so a zero
/// window still gets one answer from a responsive session
pub const QUERY_GRACE_MS: u64 = 250;

/// What counts as a match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Probe {
    /// Attached and visible
    #[default]
    Visible,
    /// Merely attached to the document
    Attached,
}

/// Outcome of resolving one semantic element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A candidate matched
    Found {
        /// The matched element, valid for the current action only
        handle: ElementHandle,
        /// The candidate that matched
        selector: Selector,
        /// Position of that candidate in the chain
        candidate_index: usize,
    },
    /// No candidate matched before the deadline
    NotFound {
        /// Semantic element name
        element: String,
        /// Number of candidates tried
        tried: usize,
        /// Time spent
        elapsed: Duration,
    },
}

impl Resolution {
    /// Whether a candidate matched
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// The matched handle
    #[must_use]
    pub const fn handle(&self) -> Option<&ElementHandle> {
        match self {
            Self::Found { handle, .. } => Some(handle),
            Self::NotFound { .. } => None,
        }
    }

    /// Convert absence into [`ShopError::NotFound`]
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] for [`Resolution::NotFound`].
    pub fn into_handle(self) -> ShopResult<ElementHandle> {
        match self {
            Self::Found { handle, .. } => Ok(handle),
            Self::NotFound {
                element,
                tried,
                elapsed,
            } => Err(ShopError::NotFound {
                element,
                tried,
                elapsed_ms: elapsed.as_millis() as u64,
            }),
        }
    }
}

enum ProbeOutcome {
    Matched(Vec<ElementHandle>),
    Empty,
    ScopeDetached,
}

/// Query engine over one session
#[derive(Clone, Copy)]
pub struct QueryEngine<'a> {
    session: &'a dyn Session,
    poll_interval: Duration,
}

impl std::fmt::Debug for QueryEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'a> QueryEngine<'a> {
    /// Create an engine with the default poll interval
    #[must_use]
    pub fn new(session: &'a dyn Session) -> Self {
        Self {
            session,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the pause between probe rounds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Resolve `spec` to one element beneath `scope`.
    ///
    /// The first round probes every candidate, so a zero timeout means
    /// "probe once". Every probe is bounded by the window plus
    /// [`QUERY_GRACE_MS`]; a session that stops answering yields
    /// [`Resolution::NotFound`] instead of hanging. Among several matches of
    /// the winning candidate the first in document order is returned.
    ///
    /// # Errors
    ///
    /// [`ShopError::Configuration`] for an empty chain; session transport
    /// failures.
    pub async fn resolve(
        &self,
        spec: &SelectorSpec,
        scope: Option<&ElementHandle>,
        timeout: Duration,
        probe: Probe,
    ) -> ShopResult<Resolution> {
        let start = Instant::now();
        self.poll(spec, scope, timeout, probe, true)
            .await
            .map(|found| match found {
                Some((index, mut handles)) => Resolution::Found {
                    handle: handles.swap_remove(0),
                    selector: spec.candidates()[index].clone(),
                    candidate_index: index,
                },
                None => Resolution::NotFound {
                    element: spec.name().to_string(),
                    tried: spec.len(),
                    elapsed: start.elapsed(),
                },
            })
    }

    /// Every match of the first candidate that has any, in document order.
    ///
    /// Empty after the timeout.
    ///
    /// # Errors
    ///
    /// Same as [`QueryEngine::resolve`].
    pub async fn resolve_all(
        &self,
        spec: &SelectorSpec,
        scope: Option<&ElementHandle>,
        timeout: Duration,
        probe: Probe,
    ) -> ShopResult<Vec<ElementHandle>> {
        Ok(self
            .poll(spec, scope, timeout, probe, false)
            .await?
            .map(|(_, handles)| handles)
            .unwrap_or_default())
    }

    /// Number of attached matches right now (single round, no waiting)
    ///
    /// # Errors
    ///
    /// Same as [`QueryEngine::resolve`].
    pub async fn count(&self, spec: &SelectorSpec, scope: Option<&ElementHandle>) -> ShopResult<usize> {
        Ok(self
            .resolve_all(spec, scope, Duration::ZERO, Probe::Attached)
            .await?
            .len())
    }

    async fn poll(
        &self,
        spec: &SelectorSpec,
        scope: Option<&ElementHandle>,
        timeout: Duration,
        probe: Probe,
        first_only: bool,
    ) -> ShopResult<Option<(usize, Vec<ElementHandle>)>> {
        if spec.is_empty() {
            return Err(ShopError::configuration(format!(
                "selector chain for '{}' is empty",
                spec.name()
            )));
        }

        let start = Instant::now();
        let deadline = start + timeout;
        let hard_deadline = deadline + Duration::from_millis(QUERY_GRACE_MS);
        let mut round = 0u32;
        loop {
            for (index, candidate) in spec.candidates().iter().enumerate() {
                let now = Instant::now();
                let budget = hard_deadline.saturating_duration_since(now);
                if budget.is_zero() || (round > 0 && now >= deadline) {
                    break;
                }
                let outcome = match tokio::time::timeout(
                    budget,
                    self.probe(candidate, scope, probe, first_only),
                )
                .await
                {
                    Ok(outcome) => outcome?,
                    Err(_) => {
                        warn!(
                            element = spec.name(),
                            selector = %candidate,
                            budget_ms = budget.as_millis() as u64,
                            "candidate query did not answer in time"
                        );
                        break;
                    }
                };
                match outcome {
                    ProbeOutcome::Matched(handles) => {
                        if index > 0 {
                            warn!(
                                element = spec.name(),
                                selector = %candidate,
                                candidate_index = index,
                                "resolved via fallback selector"
                            );
                        } else {
                            debug!(element = spec.name(), selector = %candidate, "resolved");
                        }
                        return Ok(Some((index, handles)));
                    }
                    ProbeOutcome::Empty => {
                        debug!(element = spec.name(), selector = %candidate, round, "no match");
                    }
                    ProbeOutcome::ScopeDetached => {
                        debug!(element = spec.name(), "scope detached");
                        return Ok(None);
                    }
                }
            }

            round += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(
                    element = spec.name(),
                    tried = spec.len(),
                    rounds = round,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "not found"
                );
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    async fn probe(
        &self,
        candidate: &Selector,
        scope: Option<&ElementHandle>,
        probe: Probe,
        first_only: bool,
    ) -> ShopResult<ProbeOutcome> {
        let handles = match self.session.locate(candidate, scope).await {
            Ok(handles) => handles,
            Err(ShopError::Detached { .. }) => return Ok(ProbeOutcome::ScopeDetached),
            Err(e) => return Err(e),
        };

        let mut matched = Vec::new();
        for handle in handles {
            let keep = match probe {
                Probe::Attached => true,
                Probe::Visible => match self.session.is_visible(&handle).await {
                    Ok(visible) => visible,
                    // detached between locate and the visibility check
                    Err(ShopError::Detached { .. }) => false,
                    Err(e) => return Err(e),
                },
            };
            if keep {
                matched.push(handle);
                if first_only {
                    break;
                }
            }
        }

        Ok(if matched.is_empty() {
            ProbeOutcome::Empty
        } else {
            ProbeOutcome::Matched(matched)
        })
    }
}
