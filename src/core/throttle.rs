use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces request starts at least `delay` apart, across all tasks sharing it.
pub struct Throttle {
    delay: Duration,
    next_slot: Mutex<Instant>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if *next_slot > Instant::now() {
            sleep_until(*next_slot).await;
        }
        *next_slot = Instant::now() + self.delay;
    }
}
