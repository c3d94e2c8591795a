//! Timestamp-paced replay of recorded ticks.

use std::sync::mpsc::sync_channel;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::domain::tick::Tick;
use crate::ports::data_port::TickStream;

/// Replays ticks with the recorded gaps between them divided by `speed`.
/// A speed of 0 or less replays in real time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayPacer {
    pub speed: f64,
}

impl ReplayPacer {
    pub fn new(speed: f64) -> Self {
        ReplayPacer { speed }
    }

    /// Sleep to wait between `prev` and `next`; `None` for gaps that are not positive
    /// and for scaled gaps too large to represent.
    pub fn delay(
        &self,
        prev: DateTime<FixedOffset>,
        next: DateTime<FixedOffset>,
    ) -> Option<Duration> {
        let gap = (next - prev).to_std().ok()?;
        let wait = if self.speed > 0.0 {
            Duration::try_from_secs_f64(gap.as_secs_f64() / self.speed).ok()?
        } else {
            gap
        };
        (!wait.is_zero()).then_some(wait)
    }

    pub fn run<F: FnMut(&Tick)>(&self, ticks: &[Tick], mut handler: F) {
        let mut last: Option<DateTime<FixedOffset>> = None;
        for tick in ticks {
            if let Some(wait) = last.and_then(|prev| self.delay(prev, tick.timestamp)) {
                thread::sleep(wait);
            }
            handler(tick);
            last = Some(tick.timestamp);
        }
    }

    /// Re-emit `source` with pacing applied on a forwarding thread. Errors pass
    /// through unpaced and end the stream.
    pub fn pace(&self, source: TickStream) -> TickStream {
        let pacer = *self;
        let (tx, rx) = sync_channel(0);
        thread::spawn(move || {
            let mut last: Option<DateTime<FixedOffset>> = None;
            for item in source {
                let tick = match item {
                    Ok(tick) => tick,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                if let Some(wait) = last.and_then(|prev| pacer.delay(prev, tick.timestamp)) {
                    thread::sleep(wait);
                }
                last = Some(tick.timestamp);
                if tx.send(Ok(tick)).is_err() {
                    return;
                }
            }
        });
        rx
    }
}
