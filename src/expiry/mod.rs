//! Table expiry scheduling.
//!
//! A table's lifetime is a fixed TTL from its creation instant. Each
//! client session arms at most one one-shot timer; entering a table
//! cancels and replaces whatever timer came before. A table found
//! already past its TTL is handled inline with no timer at all.

use crate::constants::TABLE_TTL;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Time left until a table expires, or `None` when it already has.
pub fn expiry_delay(created_at_ms: i64, now_ms: i64) -> Option<Duration> {
    let remaining = created_at_ms + TABLE_TTL.as_millis() as i64 - now_ms;
    if remaining <= 0 {
        None
    } else {
        Some(Duration::from_millis(remaining as u64))
    }
}

/// Cancellable handle to a one-shot expiry timer.
///
/// The timer fires by sending `event` into the owning session's event
/// channel; dropping the handle aborts the task, so a replaced timer
/// can never fire late.
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    /// Arm a one-shot timer that emits `event` after `delay`.
    pub fn spawn<E>(delay: Duration, sender: mpsc::UnboundedSender<E>, event: E) -> Self
    where
        E: Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(event);
        });
        Self { handle }
    }

    /// Disarm the timer.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_none_once_ttl_has_passed() {
        let ttl_ms = TABLE_TTL.as_millis() as i64;
        let now = 1_000_000;

        assert_eq!(expiry_delay(now - ttl_ms - 1, now), None);
        assert_eq!(expiry_delay(now - ttl_ms, now), None);
    }

    #[test]
    fn delay_spans_the_remaining_ttl() {
        let now = 1_000_000;
        assert_eq!(expiry_delay(now, now), Some(TABLE_TTL));
        assert_eq!(
            expiry_delay(now - 1_000, now),
            Some(TABLE_TTL - Duration::from_secs(1))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_its_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _timer = ExpiryTimer::spawn(TABLE_TTL, tx, "expired");

        tokio::time::advance(TABLE_TTL - Duration::from_millis(1)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert_eq!(rx.recv().await, Some("expired"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = ExpiryTimer::spawn(TABLE_TTL, tx, "expired");
        timer.cancel();

        tokio::time::advance(TABLE_TTL * 2).await;
        assert!(rx.try_recv().is_err());
        assert!(rx.recv().await.is_none());
    }
}
