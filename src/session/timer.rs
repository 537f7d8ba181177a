//! One-tick-per-second countdown.
//!
//! [`Countdown::arm`] spawns a tokio task that sends
//! [`SessionEvent::Tick`] once a second with the decremented counter.  The
//! tick carrying `remaining == 0` is the expiry signal; it is sent exactly
//! once and the task then exits.  Disarming (explicitly or by dropping the
//! `Countdown`) aborts the task, so no tick can be emitted afterwards and a
//! discarded session never leaves a timer running.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::event::SessionEvent;

/// Handle to a running countdown.  Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start counting down from `initial_secs`, emitting into `tx`.
    pub fn arm(initial_secs: u64, tx: mpsc::Sender<SessionEvent>) -> Self {
        log::debug!("timer: armed for {initial_secs}s");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            interval.tick().await;

            let mut remaining = initial_secs;
            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                if tx.send(SessionEvent::Tick { remaining }).await.is_err() {
                    log::debug!("timer: receiver gone, stopping");
                    return;
                }
            }

            if initial_secs == 0 {
                let _ = tx.send(SessionEvent::Tick { remaining: 0 }).await;
            }
            log::debug!("timer: expired");
        });

        Self { handle }
    }

    /// Stop ticking.  No further events are sent.
    pub fn disarm(self) {
        log::debug!("timer: disarmed");
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
