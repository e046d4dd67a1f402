//! In-flight connection counting for graceful drain.

use std::sync::Arc;

use tokio::sync::watch;

/// Counts running connection workers.
///
/// The count lives in a watch channel so `shutdown` can wait for it to hit
/// zero without polling.
#[derive(Debug, Clone)]
pub(crate) struct InFlight {
    count: Arc<watch::Sender<usize>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self {
            count: Arc::new(watch::Sender::new(0)),
        }
    }

    /// Registers one worker. The count drops again when the guard does.
    pub(crate) fn track(&self) -> InFlightGuard {
        self.count.send_modify(|count| *count += 1);
        InFlightGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub(crate) fn get(&self) -> usize {
        *self.count.borrow()
    }

    /// Waits until no worker is registered.
    pub(crate) async fn wait_idle(&self) {
        let mut count = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = count.wait_for(|count| *count == 0).await;
    }
}

/// Drop guard held by a connection worker.
///
/// Dropping happens on every exit path, including a panic inside the
/// handler, so the count cannot leak.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_guard_tracks_count() {
        let in_flight = InFlight::new();
        assert_eq!(in_flight.get(), 0);

        let a = in_flight.track();
        let b = in_flight.track();
        assert_eq!(in_flight.get(), 2);

        drop(a);
        assert_eq!(in_flight.get(), 1);
        drop(b);
        assert_eq!(in_flight.get(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_empty() {
        let in_flight = InFlight::new();
        tokio::time::timeout(Duration::from_secs(1), in_flight.wait_idle())
            .await
            .expect("nothing to wait for");
    }

    #[tokio::test]
    async fn test_wait_idle_waits_for_last_guard() {
        let in_flight = InFlight::new();
        let guard = in_flight.track();

        let waiter = {
            let in_flight = in_flight.clone();
            tokio::spawn(async move { in_flight.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_guard_released_when_task_panics() {
        let in_flight = InFlight::new();
        let guard = in_flight.track();

        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("handler blew up");
        });
        assert!(task.await.is_err());
        assert_eq!(in_flight.get(), 0);
    }
}
