use tracing::debug;

use crate::error::TransportResult;
use crate::message::{PeekedMessage, SequenceNumber};
use crate::metrics::Metrics;
use crate::queue::QueueView;
use crate::scan::cursor::ScanCursor;
use crate::scan::predicate::{Match, MatchPredicate};
use crate::transport::QueueTransport;

/// Budget and batch size of one scan, already normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    max_to_scan: usize,
    batch_size: usize,
}

impl ScanLimits {
    /// Budget used when the caller passes a non-positive value.
    pub const DEFAULT_MAX_TO_SCAN: usize = 500;
    /// Upper bound on messages per peek, regardless of caller input.
    pub const MAX_BATCH_SIZE: usize = 50;

    /// `max_to_scan <= 0` becomes the default budget; `batch_size` is
    /// clamped to `[1, MAX_BATCH_SIZE]`.
    pub fn new(max_to_scan: i64, batch_size: usize) -> Self {
        let max_to_scan = usize::try_from(max_to_scan)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(Self::DEFAULT_MAX_TO_SCAN);
        Self {
            max_to_scan,
            batch_size: batch_size.clamp(1, Self::MAX_BATCH_SIZE),
        }
    }

    pub fn max_to_scan(&self) -> usize {
        self.max_to_scan
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self::new(0, Self::MAX_BATCH_SIZE)
    }
}

/// Terminal state of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// First message, in sequence order, that satisfied the predicate.
    Matched { message: PeekedMessage, hit: Match },
    /// The budget ran out without a match.
    Exhausted,
    /// The view returned an empty batch before a match.
    Empty,
}

impl ScanOutcome {
    fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Matched { .. } => "matched",
            ScanOutcome::Exhausted => "exhausted",
            ScanOutcome::Empty => "empty",
        }
    }
}

/// Drives peek-based pagination over one queue view.
pub struct QueueScanner<'a> {
    transport: &'a dyn QueueTransport,
    metrics: &'a Metrics,
}

impl<'a> QueueScanner<'a> {
    pub fn new(transport: &'a dyn QueueTransport, metrics: &'a Metrics) -> Self {
        Self { transport, metrics }
    }

    /// Page through `view` until `predicate` matches, the budget is spent or
    /// the view runs dry. Transport failures propagate unchanged.
    pub fn scan(
        &self,
        view: &QueueView,
        predicate: &MatchPredicate,
        limits: ScanLimits,
    ) -> TransportResult<ScanOutcome> {
        let mut cursor = ScanCursor::new(limits.max_to_scan());
        let outcome = loop {
            if cursor.is_exhausted() {
                break ScanOutcome::Exhausted;
            }

            let batch_size = cursor.next_batch_size(limits.batch_size());
            let batch = self.page(view, batch_size, cursor.next_sequence())?;
            let Some(last) = batch.last().map(|m| m.sequence_number) else {
                break ScanOutcome::Empty;
            };
            let batch_len = batch.len();

            if let Some((message, hit)) = batch
                .into_iter()
                .find_map(|m| predicate.evaluate(&m).map(|hit| (m, hit)))
            {
                break ScanOutcome::Matched { message, hit };
            }

            cursor.advance(last, batch_len);
            debug!(
                %view,
                batch_len,
                next_sequence = last.saturating_add(1),
                remaining = cursor.remaining_budget(),
                "batch scanned without match"
            );
        };

        self.metrics.record_scan(view, outcome.label());
        Ok(outcome)
    }

    /// A single bounded peek, with no matching and no looping.
    pub fn page(
        &self,
        view: &QueueView,
        max: usize,
        from_sequence: Option<SequenceNumber>,
    ) -> TransportResult<Vec<PeekedMessage>> {
        let batch = self.transport.peek(view, max, from_sequence)?;
        self.metrics.record_peek(view, batch.len());
        Ok(batch)
    }
}
