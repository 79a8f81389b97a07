use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff for calls that report failure as `None`.
///
/// The call is attempted once, then retried after doubling delays starting at
/// `base_delay` until the delay would exceed `max_delay`; each wait gets a
/// random jitter slice added so parallel shards do not hammer the service in
/// lockstep. Exhaustion returns `None` to the caller, never an error, so
/// "service down" stays distinguishable from "address not found".
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    jitter: Duration,
}

impl Default for RetryPolicy {
    /// Delays of roughly 1, 2, 4, and 8 seconds, each plus up to a second of
    /// jitter: at most four retries beyond the first attempt.
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, jitter: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter,
        }
    }

    pub async fn run<T, F, Fut>(&self, mut call: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut outcome = call().await;
        let mut back_off = self.base_delay;

        while outcome.is_none() && back_off <= self.max_delay {
            let jitter = self.jitter.mul_f64(rand::thread_rng().gen::<f64>());
            tracing::debug!("no response, backing off for {:?}", back_off + jitter);
            tokio::time::sleep(back_off + jitter).await;

            outcome = call().await;
            back_off *= 2;
        }

        outcome
    }
}
