//! Per-screen view state: Idle → Loading → Resolved, overwritten on the next trigger.
//!
//! Every trigger is stamped with a sequence number. Only the response for the
//! latest sequence number may resolve the screen, so a slow earlier response
//! can never overwrite a newer one.

use tracing::debug;

use crate::outcome::FetchOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading { seq: u64 },
    Resolved(FetchOutcome<T>),
}

/// What to do when the user triggers again while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InFlightPolicy {
    /// Ignore the new trigger.
    #[default]
    Guard,
    /// Start the new request; the older one's response will be discarded.
    Supersede,
}

/// Proof that a request was started; hand it back with the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone)]
pub struct FetchLifecycle<T> {
    state: ViewState<T>,
    policy: InFlightPolicy,
    next_seq: u64,
    name: &'static str,
}

impl<T> FetchLifecycle<T> {
    pub fn new(name: &'static str) -> Self {
        Self::with_policy(name, InFlightPolicy::default())
    }

    pub fn with_policy(name: &'static str, policy: InFlightPolicy) -> Self {
        Self {
            state: ViewState::Idle,
            policy,
            next_seq: 0,
            name,
        }
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn policy(&self) -> InFlightPolicy {
        self.policy
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading { .. })
    }

    pub fn outcome(&self) -> Option<&FetchOutcome<T>> {
        match &self.state {
            ViewState::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Sequence number of the most recent trigger, 0 before the first.
    pub fn latest_seq(&self) -> u64 {
        self.next_seq
    }

    /// Enter Loading. Returns `None` when guarded against an in-flight request.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.is_loading() && self.policy == InFlightPolicy::Guard {
            debug!(screen = self.name, "trigger ignored while loading");
            return None;
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        self.state = ViewState::Loading { seq };
        debug!(screen = self.name, seq, "loading");
        Some(Ticket { seq })
    }

    /// Apply an outcome. Returns `false` and drops it when the ticket is stale.
    pub fn resolve(&mut self, ticket: Ticket, outcome: FetchOutcome<T>) -> bool {
        match self.state {
            ViewState::Loading { seq } if seq == ticket.seq => {
                debug!(
                    screen = self.name,
                    seq,
                    success = outcome.is_success(),
                    "resolved"
                );
                self.state = ViewState::Resolved(outcome);
                true
            }
            _ => {
                debug!(
                    screen = self.name,
                    stale = ticket.seq,
                    latest = self.next_seq,
                    "discarding stale response"
                );
                false
            }
        }
    }

    /// Resolve straight from Idle/Resolved, for outcomes known without a round trip
    /// (blocked input). Goes through Loading so sequencing still holds.
    pub fn resolve_immediately(&mut self, outcome: FetchOutcome<T>) -> bool {
        match self.begin() {
            Some(ticket) => self.resolve(ticket, outcome),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_idle_loading_resolved() {
        let mut lc: FetchLifecycle<u32> = FetchLifecycle::new("test");
        assert_eq!(lc.state(), &ViewState::Idle);

        let ticket = lc.begin().unwrap();
        assert!(lc.is_loading());
        assert!(lc.resolve(ticket, FetchOutcome::Success(7)));
        assert_eq!(lc.outcome(), Some(&FetchOutcome::Success(7)));
    }

    #[test]
    fn test_guard_ignores_second_trigger() {
        let mut lc: FetchLifecycle<u32> = FetchLifecycle::new("test");
        let first = lc.begin().unwrap();
        assert!(lc.begin().is_none());
        assert_eq!(lc.latest_seq(), 1);
        assert!(lc.resolve(first, FetchOutcome::Success(1)));
    }

    #[test]
    fn test_supersede_discards_stale_response() {
        let mut lc: FetchLifecycle<&str> =
            FetchLifecycle::with_policy("test", InFlightPolicy::Supersede);
        let older = lc.begin().unwrap();
        let newer = lc.begin().unwrap();
        assert!(newer.seq() > older.seq());

        assert!(lc.resolve(newer, FetchOutcome::Success("Mumbai")));
        assert!(!lc.resolve(older, FetchOutcome::Success("Delhi")));
        assert_eq!(lc.outcome(), Some(&FetchOutcome::Success("Mumbai")));
    }

    #[test]
    fn test_stale_response_cannot_clear_loading() {
        let mut lc: FetchLifecycle<u8> =
            FetchLifecycle::with_policy("test", InFlightPolicy::Supersede);
        let older = lc.begin().unwrap();
        let _newer = lc.begin().unwrap();
        assert!(!lc.resolve(older, FetchOutcome::Success(1)));
        assert!(lc.is_loading());
    }

    #[test]
    fn test_resolved_is_overwritten_by_next_trigger() {
        let mut lc: FetchLifecycle<u8> = FetchLifecycle::new("test");
        let t = lc.begin().unwrap();
        lc.resolve(t, FetchOutcome::Error(FetchError::Network("down".to_string())));
        let t = lc.begin().unwrap();
        assert!(lc.outcome().is_none());
        lc.resolve(t, FetchOutcome::Success(3));
        assert_eq!(lc.outcome().and_then(|o| o.success()), Some(&3));
    }

    #[test]
    fn test_resolve_immediately_guarded() {
        let mut lc: FetchLifecycle<u8> = FetchLifecycle::new("test");
        let _t = lc.begin().unwrap();
        assert!(!lc.resolve_immediately(FetchOutcome::empty("nothing")));
        assert!(lc.is_loading());
    }
}
