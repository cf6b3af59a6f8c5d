//! Byte-rate limiting shared between concurrent transfers.
//!
//! [`Throttle`] is a token bucket refilled at the configured rate with a
//! burst capacity of one second worth of bytes. Callers take tokens *before*
//! writing a chunk; a caller that drives the bucket negative sleeps until
//! its debt is paid back. Because the debt is shared, N transfers that hold
//! the same `Arc<Throttle>` together never exceed the rate.
//!
//! ```rust
//! use packfetch::Throttle;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let throttle = Arc::new(Throttle::new(4 * 1024 * 1024));
//! throttle.acquire(64 * 1024).await;
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket limiting the number of bytes per second.
///
/// A rate of `0` disables limiting.
#[derive(Debug)]
pub struct Throttle {
    rate: AtomicU64,
    bucket: Mutex<Bucket>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl Throttle {
    /// Create a throttle for `bytes_per_sec` (0 = unlimited).
    pub fn new(bytes_per_sec: u64) -> Self {
        Self {
            rate: AtomicU64::new(bytes_per_sec),
            bucket: Mutex::new(Bucket {
                tokens: bytes_per_sec as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// A throttle that never waits.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Current limit in bytes per second, 0 when unlimited.
    pub fn rate(&self) -> u64 {
        self.rate.load(Ordering::Relaxed)
    }

    /// Whether the throttle limits anything.
    pub fn is_limited(&self) -> bool {
        self.rate() > 0
    }

    /// Change the limit. Transfers in flight pick it up on their next chunk.
    pub fn set_rate(&self, bytes_per_sec: u64) {
        self.rate.store(bytes_per_sec, Ordering::Relaxed);
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.tokens = bucket.tokens.min(bytes_per_sec as f64);
    }

    /// Take `bytes` tokens and report how long the caller has to wait for them.
    fn reserve(&self, bytes: u64) -> Duration {
        let rate = self.rate();
        if rate == 0 || bytes == 0 {
            return Duration::ZERO;
        }
        let rate = rate as f64;

        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(rate);
        bucket.last_refill = now;
        bucket.tokens -= bytes as f64;

        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / rate)
        }
    }

    /// Wait until `bytes` may be transferred.
    pub async fn acquire(&self, bytes: u64) {
        let wait = self.reserve(bytes);
        if !wait.is_zero() {
            trace!("Throttling {} bytes for {:?}", bytes, wait);
            tokio::time::sleep(wait).await;
        }
    }
}
