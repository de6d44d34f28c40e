use crate::message::SequenceNumber;

/// Pagination state of one scan. Created at operation start, dropped at the
/// end; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    next_sequence: Option<SequenceNumber>,
    remaining_budget: usize,
}

impl ScanCursor {
    pub fn new(budget: usize) -> Self {
        Self {
            next_sequence: None,
            remaining_budget: budget,
        }
    }

    /// Watermark for the next peek; `None` means "from the head of the view".
    pub fn next_sequence(&self) -> Option<SequenceNumber> {
        self.next_sequence
    }

    pub fn remaining_budget(&self) -> usize {
        self.remaining_budget
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_budget == 0
    }

    /// Size of the next peek: the remaining budget, capped at `batch_size`.
    pub fn next_batch_size(&self, batch_size: usize) -> usize {
        self.remaining_budget.min(batch_size)
    }

    /// Record a batch that produced no match. The watermark never moves
    /// backwards, even if a transport returns an out-of-order batch.
    pub fn advance(&mut self, last_sequence: SequenceNumber, batch_len: usize) {
        let next = last_sequence.saturating_add(1);
        self.next_sequence = Some(self.next_sequence.map_or(next, |cur| cur.max(next)));
        self.remaining_budget = self.remaining_budget.saturating_sub(batch_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_head_with_full_budget() {
        let cursor = ScanCursor::new(500);
        assert_eq!(cursor.next_sequence(), None);
        assert_eq!(cursor.remaining_budget(), 500);
        assert_eq!(cursor.next_batch_size(50), 50);
    }

    #[test]
    fn advance_moves_watermark_past_last_sequence() {
        let mut cursor = ScanCursor::new(120);
        cursor.advance(49, 50);
        assert_eq!(cursor.next_sequence(), Some(50));
        assert_eq!(cursor.remaining_budget(), 70);

        cursor.advance(99, 50);
        assert_eq!(cursor.remaining_budget(), 20);
        assert_eq!(cursor.next_batch_size(50), 20);

        cursor.advance(119, 20);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn watermark_never_decreases() {
        let mut cursor = ScanCursor::new(100);
        cursor.advance(40, 5);
        cursor.advance(10, 5);
        assert_eq!(cursor.next_sequence(), Some(41));
    }

    #[test]
    fn oversized_batch_saturates_budget() {
        let mut cursor = ScanCursor::new(3);
        cursor.advance(9, 10);
        assert!(cursor.is_exhausted());
    }
}
