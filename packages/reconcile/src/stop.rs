//! Stop policies for crawls that walk a newest-first list until they reach
//! data they already have.
//!
//! The decision is a pure predicate ([`should_stop`]); [`StopTracker`] wraps
//! it in an explicit `Scanning → Stopping → Done` state machine so the crawl
//! loop only asks "continue?" and never juggles break flags.

use serde::{Deserialize, Serialize};

use crate::dataset::Change;

/// When a list-scanning crawl stops. Chosen per dataset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopPolicy {
    /// Stop at the first id already in the dataset. Used when list order is
    /// insertion order, so everything after a known id is known too.
    Immediate,
    /// Stop after `count` consecutive known-and-unchanged ids. Used when list
    /// order is update order and a single stale entry must not end the
    /// crawl.
    Consecutive { count: u32 },
    /// Never stop early; walk the whole list.
    #[serde(rename = "none")]
    Never,
}

impl StopPolicy {
    /// Whether known ids are fetched before the decision. Under
    /// [`StopPolicy::Immediate`] a known id ends the crawl unfetched.
    #[must_use]
    pub const fn fetches_known(self) -> bool {
        !matches!(self, Self::Immediate)
    }
}

impl std::fmt::Display for StopPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate => f.write_str("immediate"),
            Self::Consecutive { count } => write!(f, "consecutive({count})"),
            Self::Never => f.write_str("none"),
        }
    }
}

/// Pure stop predicate.
///
/// `consecutive_known` is the length of the current run of known ids,
/// including this one.
#[must_use]
pub const fn should_stop(policy: StopPolicy, change: Change, consecutive_known: u32) -> bool {
    match policy {
        StopPolicy::Immediate => !matches!(change, Change::New),
        StopPolicy::Consecutive { count } => {
            matches!(change, Change::Unchanged) && consecutive_known >= count
        }
        StopPolicy::Never => false,
    }
}

/// State of a list-scanning crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    /// Walking the list.
    Scanning { consecutive_known: u32 },
    /// The stop condition fired at `at`; the crawler is wrapping up the
    /// current page.
    Stopping { at: String },
    /// Finished, either by the stop condition or by exhausting the list.
    Done { stopped_at: Option<String> },
}

/// Drives [`CrawlState`] from observed ids.
#[derive(Debug, Clone)]
pub struct StopTracker {
    policy: StopPolicy,
    state: CrawlState,
}

impl StopTracker {
    #[must_use]
    pub const fn new(policy: StopPolicy) -> Self {
        Self {
            policy,
            state: CrawlState::Scanning {
                consecutive_known: 0,
            },
        }
    }

    #[must_use]
    pub const fn policy(&self) -> StopPolicy {
        self.policy
    }

    #[must_use]
    pub const fn state(&self) -> &CrawlState {
        &self.state
    }

    #[must_use]
    pub const fn is_scanning(&self) -> bool {
        matches!(self.state, CrawlState::Scanning { .. })
    }

    /// Records the outcome for one list entry. Returns `true` while the
    /// crawl should keep scanning.
    ///
    /// New and updated ids reset the known run; unchanged ids extend it.
    pub fn observe(&mut self, id: &str, change: Change) -> bool {
        let CrawlState::Scanning { consecutive_known } = self.state else {
            return false;
        };

        let run = match change {
            Change::New | Change::Updated => 0,
            Change::Unchanged => consecutive_known + 1,
        };

        if should_stop(self.policy, change, run) {
            log::info!(
                "Stop condition ({}) reached at id {id} after {run} known ids",
                self.policy
            );
            self.state = CrawlState::Stopping { at: id.to_owned() };
            return false;
        }

        self.state = CrawlState::Scanning {
            consecutive_known: run,
        };
        true
    }

    /// Moves to [`CrawlState::Done`] and returns the id the crawl stopped
    /// at, if the stop condition fired.
    pub fn finish(&mut self) -> Option<String> {
        let stopped_at = match &self.state {
            CrawlState::Stopping { at } => Some(at.clone()),
            CrawlState::Scanning { .. } => None,
            CrawlState::Done { stopped_at } => stopped_at.clone(),
        };
        self.state = CrawlState::Done {
            stopped_at: stopped_at.clone(),
        };
        stopped_at
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Walks `list` the way a crawl does and returns (fetched, stopped_at).
    fn simulate(policy: StopPolicy, list: &[&str], known: &HashSet<&str>) -> (usize, Option<String>) {
        let mut tracker = StopTracker::new(policy);
        let mut fetched = 0;
        for id in list {
            let is_known = known.contains(id);
            if is_known && !policy.fetches_known() {
                tracker.observe(id, Change::Unchanged);
                break;
            }
            fetched += 1;
            let change = if is_known { Change::Unchanged } else { Change::New };
            if !tracker.observe(id, change) {
                break;
            }
        }
        (fetched, tracker.finish())
    }

    const LIST: [&str; 10] = ["10", "9", "8", "7", "6", "5", "4", "3", "2", "1"];

    #[test]
    fn immediate_stops_before_first_known_id() {
        let known: HashSet<&str> = ["7"].into_iter().collect();
        let (fetched, stopped_at) = simulate(StopPolicy::Immediate, &LIST, &known);
        assert_eq!(fetched, 3);
        assert_eq!(stopped_at.as_deref(), Some("7"));
    }

    #[test]
    fn consecutive_ignores_a_single_interleaved_known_id() {
        let known: HashSet<&str> = ["7"].into_iter().collect();
        let (fetched, stopped_at) =
            simulate(StopPolicy::Consecutive { count: 5 }, &LIST, &known);
        assert_eq!(fetched, 10);
        assert_eq!(stopped_at, None);
    }

    #[test]
    fn consecutive_stops_after_n_known_in_a_row() {
        let known: HashSet<&str> = ["8", "6", "5", "4", "3", "2"].into_iter().collect();
        let (fetched, stopped_at) =
            simulate(StopPolicy::Consecutive { count: 5 }, &LIST, &known);
        assert_eq!(fetched, 8);
        assert_eq!(stopped_at.as_deref(), Some("2"));
    }

    #[test]
    fn updated_ids_reset_the_known_run() {
        let mut tracker = StopTracker::new(StopPolicy::Consecutive { count: 2 });
        assert!(tracker.observe("5", Change::Unchanged));
        assert!(tracker.observe("4", Change::Updated));
        assert!(tracker.observe("3", Change::Unchanged));
        assert!(!tracker.observe("2", Change::Unchanged));
        assert_eq!(tracker.state(), &CrawlState::Stopping { at: "2".to_owned() });
        assert!(!tracker.observe("1", Change::New));
        assert_eq!(tracker.finish().as_deref(), Some("2"));
        assert_eq!(
            tracker.state(),
            &CrawlState::Done {
                stopped_at: Some("2".to_owned())
            }
        );
    }

    #[test]
    fn never_walks_everything() {
        let known: HashSet<&str> = LIST.into_iter().collect();
        let (fetched, stopped_at) = simulate(StopPolicy::Never, &LIST, &known);
        assert_eq!(fetched, 10);
        assert_eq!(stopped_at, None);
    }

    #[test]
    fn predicate_table() {
        let c5 = StopPolicy::Consecutive { count: 5 };
        assert!(should_stop(StopPolicy::Immediate, Change::Unchanged, 1));
        assert!(!should_stop(StopPolicy::Immediate, Change::New, 0));
        assert!(!should_stop(c5, Change::Unchanged, 4));
        assert!(should_stop(c5, Change::Unchanged, 5));
        assert!(!should_stop(c5, Change::Updated, 9));
        assert!(!should_stop(StopPolicy::Never, Change::Unchanged, 100));
    }

    #[test]
    fn policy_reads_from_toml_tables() {
        #[derive(Deserialize)]
        struct Wrapper {
            stop_policy: StopPolicy,
        }
        let w: Wrapper =
            toml::de::from_str("stop_policy = { kind = \"consecutive\", count = 5 }").unwrap();
        assert_eq!(w.stop_policy, StopPolicy::Consecutive { count: 5 });
        let w: Wrapper = toml::de::from_str("stop_policy = { kind = \"none\" }").unwrap();
        assert_eq!(w.stop_policy, StopPolicy::Never);
    }
}
