use rand::Rng;
use std::convert::TryFrom;
use std::fmt::Display;
use std::future::Future;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Exponential backoff with up to 50% random jitter, so replicas that lost the exchange at the
/// same time don't come back in lockstep.
#[derive(Clone, Debug)]
pub(super) struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub(super) fn new(initial: Duration, max: Duration) -> Self {
        Backoff {
            initial,
            max,
            next: initial,
        }
    }

    pub(super) fn next_delay(&mut self) -> Duration {
        let base = self.next;
        self.next = self.next.checked_mul(2).unwrap_or(self.max).min(self.max);

        let half_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX) / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half_ms);
        base.saturating_add(Duration::from_millis(jitter_ms)).min(self.max)
    }

    pub(super) fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Calls `op` until it succeeds, sleeping per `backoff` between failures. Returns `None` if
/// `cancel` fires first, in which case any in-flight call is dropped.
pub(super) async fn retry_until_cancelled<T, E, F, Fut>(
    logger: &slog::Logger,
    what: &str,
    backoff: &mut Backoff,
    cancel: &CancellationToken,
    mut op: F,
) -> Option<T>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = op() => result,
        };

        match result {
            Ok(value) => {
                backoff.reset();
                return Some(value);
            }
            Err(e) => {
                let delay = backoff.next_delay();
                slog::warn!(logger, "{} failed, retrying in {:?}: {}", what, delay, e);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
