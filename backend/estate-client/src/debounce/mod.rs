//! Quiet-window debouncing for search boxes and filter fields.

pub mod filter;

pub use filter::{DebouncedFilter, FilterChange, FilterState};

use std::time::Duration;

use log::{debug, trace};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Applies the latest pushed value once no newer value has arrived for `delay`.
///
/// Superseded values are dropped, never queued. Dropping the debouncer discards a
/// value still waiting out its window. Must be created inside a tokio runtime.
pub struct Debouncer<T> {
    sender: UnboundedSender<T>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, apply: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (sender, receiver) = unbounded_channel();
        let worker = tokio::spawn(run(receiver, delay, apply));
        Self { sender, worker }
    }

    pub fn push(&self, value: T) {
        if self.sender.send(value).is_err() {
            debug!("Debouncer worker has stopped, dropping value");
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run<T, F>(mut receiver: UnboundedReceiver<T>, delay: Duration, mut apply: F)
where
    F: FnMut(T),
{
    let mut pending: Option<T> = None;

    loop {
        match pending.take() {
            None => match receiver.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            },
            Some(value) => match timeout(delay, receiver.recv()).await {
                Ok(Some(newer)) => {
                    trace!("Debounced value superseded");
                    pending = Some(newer);
                }
                Ok(None) => break,
                Err(_elapsed) => apply(value),
            },
        }
    }
}
