//! Request tickets for one fetch channel.
//!
//! Every request takes a ticket before it goes out. When it completes, the
//! channel asks the sequencer whether the result may still be applied, so a
//! slow response can never overwrite a newer one.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct SequencerInner {
    issued: AtomicU64,
    applied: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    inner: Arc<SequencerInner>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True only for the most recently issued ticket.
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.inner.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Marks `ticket` as applied if nothing newer has been applied yet.
    ///
    /// Used by channels whose requests overlap on purpose (the status poll),
    /// where waiting for the very latest ticket would starve a slow backend.
    pub fn try_commit(&self, ticket: Ticket) -> bool {
        self.inner
            .applied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |applied| {
                (ticket.0 > applied).then_some(ticket.0)
            })
            .is_ok()
    }

    pub fn last_applied(&self) -> u64 {
        self.inner.applied.load(Ordering::SeqCst)
    }
}
