//! Non-destructive scan engine: predicates, pagination cursor and the
//! peek-driven scanner shared by every lookup operation.

mod cursor;
mod predicate;
mod scanner;

pub use cursor::ScanCursor;
pub use predicate::{try_extract_field, FieldSpec, LookupQuery, Match, MatchPredicate};
pub use scanner::{QueueScanner, ScanLimits, ScanOutcome};
