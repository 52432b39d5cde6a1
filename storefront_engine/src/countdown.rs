//! Funnel countdown windows.
//!
//! A funnel can be limited to a time window. The window state is a pure function of the countdown and the current
//! time, so the same rules serve the live ticker that landing pages subscribe to and the server-side check performed
//! at checkout.
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};

use crate::db_types::Countdown;

const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownState {
    BeforeWindow,
    Active,
    Expired,
}

impl Countdown {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self { start_date, end_date, redirect_url: None }
    }

    pub fn with_redirect<S: Into<String>>(mut self, url: S) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// `now < start` is before the window, `start <= now < end` is active, and anything from `end` onwards is expired.
    pub fn state_at(&self, now: DateTime<Utc>) -> CountdownState {
        if now < self.start_date {
            CountdownState::BeforeWindow
        } else if now < self.end_date {
            CountdownState::Active
        } else {
            CountdownState::Expired
        }
    }

    /// Time left until the next boundary: the start of the window when it has not opened yet, the end of the window
    /// while it is open, and zero once it has closed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.state_at(now) {
            CountdownState::BeforeWindow => self.start_date - now,
            CountdownState::Active => self.end_date - now,
            CountdownState::Expired => Duration::zero(),
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> CountdownStatus {
        CountdownStatus {
            state: self.state_at(now),
            remaining_seconds: self.remaining(now).num_seconds().max(0),
            redirect_url: self.redirect_url.clone(),
        }
    }
}

/// A snapshot of a countdown, as published to subscribers and returned by the countdown endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownStatus {
    pub state: CountdownState,
    pub remaining_seconds: i64,
    pub redirect_url: Option<String>,
}

impl CountdownStatus {
    /// The status of a funnel without a countdown. Such funnels are always open.
    pub fn unlimited() -> Self {
        Self { state: CountdownState::Active, remaining_seconds: 0, redirect_url: None }
    }
}

/// Recomputes a countdown once a second and publishes the result on a watch channel.
///
/// The background task stops when the ticker is dropped, or once the countdown has expired (the final `Expired`
/// status is still published).
pub struct CountdownTicker {
    receiver: watch::Receiver<CountdownStatus>,
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Starts ticking. Must be called from within a tokio runtime.
    pub fn start(countdown: Countdown) -> Self {
        let (sender, receiver) = watch::channel(countdown.status_at(Utc::now()));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                let status = countdown.status_at(Utc::now());
                let expired = status.state == CountdownState::Expired;
                sender.send_replace(status);
                if expired {
                    debug!("🎯️ Countdown ended at {}. Ticker stopping.", countdown.end_date);
                    break;
                }
            }
        });
        Self { receiver, handle }
    }

    pub fn current(&self) -> CountdownStatus {
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CountdownStatus> {
        self.receiver.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn window() -> Countdown {
        Countdown::new(
            Utc.with_ymd_and_hms(2024, 2, 19, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn state_boundaries() {
        let c = window();
        assert_eq!(c.state_at(c.start_date - Duration::seconds(1)), CountdownState::BeforeWindow);
        assert_eq!(c.state_at(c.start_date), CountdownState::Active);
        assert_eq!(c.state_at(c.end_date - Duration::seconds(1)), CountdownState::Active);
        assert_eq!(c.state_at(c.end_date), CountdownState::Expired);
    }

    #[test]
    fn remaining_time() {
        let c = window();
        assert_eq!(c.remaining(c.start_date - Duration::hours(2)), Duration::hours(2));
        assert_eq!(c.remaining(c.start_date + Duration::hours(1)), Duration::hours(23));
        assert_eq!(c.remaining(c.end_date + Duration::days(3)), Duration::zero());
        let status = c.with_redirect("https://example.com/closed").status_at(Utc::now());
        assert_eq!(status.state, CountdownState::Expired);
        assert_eq!(status.remaining_seconds, 0);
        assert_eq!(status.redirect_url.as_deref(), Some("https://example.com/closed"));
    }

    #[tokio::test]
    async fn ticker_stops_when_expired() {
        let now = Utc::now();
        let countdown = Countdown::new(now - Duration::seconds(10), now + Duration::milliseconds(1500));
        let ticker = CountdownTicker::start(countdown);
        assert_eq!(ticker.current().state, CountdownState::Active);
        let mut rx = ticker.subscribe();
        let expired = tokio::time::timeout(StdDuration::from_secs(5), async {
            loop {
                if rx.borrow_and_update().state == CountdownState::Expired {
                    break;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        assert!(expired.is_ok());
        assert_eq!(ticker.current().state, CountdownState::Expired);
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert!(ticker.is_finished());
    }
}
