//! Cancellable timers grouped by match session.
//!
//! Every timer belongs to a [`SessionId`]; tearing a session down aborts
//! all of its timers at once so none can fire against stale match state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Default)]
pub struct Scheduler {
    timers: Arc<Mutex<HashMap<SessionId, Vec<JoinHandle<()>>>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once after `delay`.
    pub fn after<F>(&self, session: SessionId, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        self.track(session, handle);
    }

    /// Call `tick` every `period` until it returns `false` or the session
    /// is cancelled. The first call happens one period from now.
    pub fn every<F, Fut>(&self, session: SessionId, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if !tick().await {
                    break;
                }
            }
        });
        self.track(session, handle);
    }

    /// Abort every timer of `session`, returning how many were still live.
    pub fn cancel(&self, session: SessionId) -> usize {
        let handles = match self.timers.lock() {
            Ok(mut timers) => timers.remove(&session).unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().remove(&session).unwrap_or_default(),
        };
        let mut live = 0;
        for handle in handles {
            if !handle.is_finished() {
                live += 1;
            }
            handle.abort();
        }
        if live > 0 {
            tracing::debug!(%session, live, "timers cancelled");
        }
        live
    }

    /// Number of timers of `session` that have not completed yet.
    pub fn active(&self, session: SessionId) -> usize {
        let timers = match self.timers.lock() {
            Ok(timers) => timers,
            Err(poisoned) => poisoned.into_inner(),
        };
        timers
            .get(&session)
            .map_or(0, |handles| handles.iter().filter(|h| !h.is_finished()).count())
    }

    fn track(&self, session: SessionId, handle: JoinHandle<()>) {
        let mut timers = match self.timers.lock() {
            Ok(timers) => timers,
            Err(poisoned) => poisoned.into_inner(),
        };
        let handles = timers.entry(session).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_after_delay() {
        let scheduler = Scheduler::new();
        let session = SessionId::new();
        let fired = Arc::new(AtomicU32::new(0));

        let f = fired.clone();
        scheduler.after(session, Duration::from_secs(5), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.active(session), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active(session), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_timer_stops_when_told() {
        let scheduler = Scheduler::new();
        let session = SessionId::new();
        let ticks = Arc::new(AtomicU32::new(0));

        let t = ticks.clone();
        scheduler.every(session, Duration::from_secs(1), move || {
            let t = t.clone();
            async move { t.fetch_add(1, Ordering::SeqCst) + 1 < 3 }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let scheduler = Scheduler::new();
        let session = SessionId::new();
        let other = SessionId::new();
        let fired = Arc::new(AtomicU32::new(0));

        for s in [session, other] {
            let f = fired.clone();
            scheduler.after(s, Duration::from_secs(3), async move {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(scheduler.cancel(session), 1);
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Only the other session's timer ran.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.cancel(session), 0);
    }
}
