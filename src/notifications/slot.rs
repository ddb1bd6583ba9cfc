use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct TimerState {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Clears its value `ttl` after the last `set`. Needs a tokio runtime.
#[derive(Debug)]
pub struct AutoClearSlot<T> {
    value: Arc<watch::Sender<Option<T>>>,
    timer: Arc<Mutex<TimerState>>,
    ttl: Duration,
}

impl<T> Clone for AutoClearSlot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            timer: Arc::clone(&self.timer),
            ttl: self.ttl,
        }
    }
}

impl<T> AutoClearSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let (value, _) = watch::channel(None);
        Self {
            value: Arc::new(value),
            timer: Arc::new(Mutex::new(TimerState::default())),
            ttl,
        }
    }

    pub fn set(&self, value: T) {
        let Ok(mut timer) = self.timer.lock() else {
            return;
        };
        if let Some(previous) = timer.token.take() {
            previous.cancel();
        }
        timer.generation = timer.generation.wrapping_add(1);
        let generation = timer.generation;
        let token = CancellationToken::new();
        timer.token = Some(token.clone());
        self.value.send_replace(Some(value));
        drop(timer);

        let slot = Arc::clone(&self.value);
        let state = Arc::clone(&self.timer);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    if let Ok(mut timer) = state.lock()
                        && timer.generation == generation
                    {
                        timer.token = None;
                        slot.send_replace(None);
                        tracing::trace!(event = "slot_cleared", "auto-clear slot expired");
                    }
                }
            }
        });
    }

    pub fn clear(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(token) = timer.token.take() {
                token.cancel();
            }
            timer.generation = timer.generation.wrapping_add(1);
            self.value.send_replace(None);
        }
    }

    pub fn get(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.value.subscribe()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
