use std::pin::Pin;

use tokio::time::{Duration, Instant, Sleep};

/// Idle deadline for one connection. Only [`IdleTimer::touch`] moves it, so
/// outbound traffic and other wakeups of the session loop never postpone it.
pub struct IdleTimer {
    timeout: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sleep: Box::pin(tokio::time::sleep(timeout)),
        }
    }

    /// Inbound activity: restart the countdown.
    pub fn touch(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + self.timeout);
    }

    /// Resolves once the deadline passes. Cancel-safe.
    pub async fn expired(&mut self) {
        self.sleep.as_mut().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn busy_loop_still_times_out() {
        let mut timer = IdleTimer::new(Duration::from_millis(200));
        let mut chatter = tokio::time::interval(Duration::from_millis(20));

        let fired = tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                tokio::select! {
                    _ = chatter.tick() => {}
                    () = timer.expired() => break,
                }
            }
        })
        .await;

        assert!(fired.is_ok(), "deadline kept slipping under outbound chatter");
    }

    #[tokio::test]
    async fn touch_pushes_the_deadline_back() {
        let mut timer = IdleTimer::new(Duration::from_millis(150));
        tokio::time::sleep(Duration::from_millis(100)).await;
        timer.touch();

        let since_touch = Instant::now();
        timer.expired().await;
        assert!(since_touch.elapsed() >= Duration::from_millis(100));
    }
}
