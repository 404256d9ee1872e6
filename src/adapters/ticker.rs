//! Playback timer.
//!
//! Holds a tokio interval only while playing. Stopping drops the interval,
//! so no tick can fire after a pause.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// First tick fires one period after starting.
    pub fn start(&mut self) {
        if self.interval.is_none() {
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(interval);
        }
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn set_running(&mut self, running: bool) {
        if running {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Resolves on the next tick; never resolves while stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn stopped_ticker_never_fires() {
        let mut ticker = Ticker::new(Duration::from_millis(5));
        assert!(!ticker.is_running());
        assert!(timeout(Duration::from_millis(40), ticker.tick()).await.is_err());
    }

    #[tokio::test]
    async fn running_ticker_fires() {
        let mut ticker = Ticker::new(Duration::from_millis(5));
        ticker.start();
        assert!(ticker.is_running());
        assert!(timeout(Duration::from_secs(2), ticker.tick()).await.is_ok());
        assert!(timeout(Duration::from_secs(2), ticker.tick()).await.is_ok());
    }

    #[tokio::test]
    async fn stop_cancels() {
        let mut ticker = Ticker::new(Duration::from_millis(5));
        ticker.set_running(true);
        ticker.set_running(false);
        assert!(!ticker.is_running());
        assert!(timeout(Duration::from_millis(40), ticker.tick()).await.is_err());
    }

    #[test]
    fn default_tick_is_half_a_second() {
        assert_eq!(DEFAULT_TICK, Duration::from_millis(500));
        assert_eq!(Ticker::new(DEFAULT_TICK).period(), DEFAULT_TICK);
    }
}
