//! Politeness delay between consecutive requests.

use std::time::Duration;

use rand::Rng as _;
use serde::{Deserialize, Serialize};

/// How long to wait between requests: a fixed delay, or a random delay
/// drawn from an inclusive millisecond range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Politeness {
    Fixed { ms: u64 },
    Jitter { min_ms: u64, max_ms: u64 },
}

impl Default for Politeness {
    fn default() -> Self {
        Self::Fixed { ms: 1000 }
    }
}

impl Politeness {
    /// No delay at all. For tests and local mirrors.
    pub const NONE: Self = Self::Fixed { ms: 0 };

    /// Fixed delay, or jitter when `jitter` is given. A reversed range is
    /// swapped.
    #[must_use]
    pub const fn from_settings(delay_ms: u64, jitter: Option<[u64; 2]>) -> Self {
        match jitter {
            Some([a, b]) if a <= b => Self::Jitter {
                min_ms: a,
                max_ms: b,
            },
            Some([a, b]) => Self::Jitter {
                min_ms: b,
                max_ms: a,
            },
            None => Self::Fixed { ms: delay_ms },
        }
    }

    /// Draws the next delay.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        match *self {
            Self::Fixed { ms } => Duration::from_millis(ms),
            Self::Jitter { min_ms, max_ms } => {
                Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
            }
        }
    }

    /// Sleeps for [`Politeness::next_delay`].
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_range() {
        let politeness = Politeness::from_settings(1000, Some([1000, 3000]));
        for _ in 0..100 {
            let ms = politeness.next_delay().as_millis();
            assert!((1000..=3000).contains(&ms));
        }
    }

    #[test]
    fn reversed_jitter_is_swapped() {
        assert_eq!(
            Politeness::from_settings(0, Some([300, 100])),
            Politeness::Jitter {
                min_ms: 100,
                max_ms: 300
            }
        );
    }

    #[test]
    fn fixed_delay_without_jitter() {
        let politeness = Politeness::from_settings(250, None);
        assert_eq!(politeness.next_delay(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn zero_delay_returns_immediately() {
        let start = std::time::Instant::now();
        Politeness::NONE.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
