//! Producer-thread plumbing shared by the streaming tick sources.

use std::sync::mpsc::sync_channel;
use std::thread;

use tracing::debug;

use crate::domain::error::TicksimError;
use crate::domain::tick::Tick;
use crate::ports::data_port::TickStream;

/// Run `open` on a producer thread and hand each item over a rendezvous channel.
///
/// The first error (from `open` or from the iterator) is sent and ends the
/// stream. Dropping the receiver stops the producer at its next send.
pub fn spawn_stream<F, I>(label: &'static str, open: F) -> TickStream
where
    F: FnOnce() -> Result<I, TicksimError> + Send + 'static,
    I: Iterator<Item = Result<Tick, TicksimError>>,
{
    let (tx, rx) = sync_channel(0);
    thread::spawn(move || {
        let items = match open() {
            Ok(items) => items,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        let mut sent = 0usize;
        for item in items {
            let failed = item.is_err();
            if tx.send(item).is_err() {
                debug!(source = label, sent, "consumer hung up");
                return;
            }
            if failed {
                return;
            }
            sent += 1;
        }
        debug!(source = label, sent, "stream finished");
    });
    rx
}
