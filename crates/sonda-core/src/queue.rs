use std::fmt;

use serde::{Deserialize, Serialize};

/// Which message set of a queue is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubQueue {
    Active,
    DeadLetter,
}

impl SubQueue {
    pub fn from_dead_letter_flag(dead_letter: bool) -> Self {
        if dead_letter {
            SubQueue::DeadLetter
        } else {
            SubQueue::Active
        }
    }

    /// Location label reported back to callers.
    pub fn label(self) -> &'static str {
        match self {
            SubQueue::Active => "active",
            SubQueue::DeadLetter => "deadletter",
        }
    }
}

impl fmt::Display for SubQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A queue together with the sub-queue being paged. Immutable per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueView {
    pub queue: String,
    pub sub_queue: SubQueue,
}

impl QueueView {
    pub fn new(queue: impl Into<String>, sub_queue: SubQueue) -> Self {
        Self {
            queue: queue.into(),
            sub_queue,
        }
    }

    pub fn active(queue: impl Into<String>) -> Self {
        Self::new(queue, SubQueue::Active)
    }

    pub fn dead_letter(queue: impl Into<String>) -> Self {
        Self::new(queue, SubQueue::DeadLetter)
    }
}

impl fmt::Display for QueueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_queue {
            SubQueue::Active => f.write_str(&self.queue),
            SubQueue::DeadLetter => write!(f, "{}/$DeadLetterQueue", self.queue),
        }
    }
}
