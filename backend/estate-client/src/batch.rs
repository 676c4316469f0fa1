//! Sequential batch operations ("delete the selected rows").
//!
//! Items run strictly one after another and the batch stops at the first failure.
//! Nothing is rolled back, so the report says exactly which subset was applied.

use crate::error::ApiError;

use std::future::Future;

use log::{info, warn};

#[derive(Debug)]
pub struct BatchReport<I> {
    /// Items whose call succeeded, in order.
    pub applied: Vec<I>,
    /// The item that stopped the batch.
    pub failed: Option<(I, ApiError)>,
    /// Items never attempted.
    pub skipped: Vec<I>,
}

impl<I> BatchReport<I> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    /// Aggregate line for a toast.
    pub fn summary(&self) -> String {
        match &self.failed {
            None => format!("{} item(s) processed", self.applied.len()),
            Some((_, err)) => format!(
                "{} item(s) processed, 1 failed, {} not attempted: {}",
                self.applied.len(),
                self.skipped.len(),
                err.user_message()
            ),
        }
    }
}

/// Await `operation` for each item in order.
pub async fn run_sequential<I, F, Fut>(items: Vec<I>, mut operation: F) -> BatchReport<I>
where
    F: FnMut(&I) -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    let total = items.len();
    let mut applied = Vec::with_capacity(total);
    let mut remaining = items.into_iter();

    while let Some(item) = remaining.next() {
        if let Err(err) = operation(&item).await {
            let skipped: Vec<I> = remaining.collect();
            warn!(
                "Batch stopped after {} of {total} item(s): {err}",
                applied.len()
            );
            return BatchReport {
                applied,
                failed: Some((item, err)),
                skipped,
            };
        }
        applied.push(item);
    }

    info!("Batch of {total} item(s) completed");
    BatchReport {
        applied,
        failed: None,
        skipped: Vec::new(),
    }
}
