//! Per-view request sequencing.
//!
//! Every fetch takes a ticket before the request goes out. When responses
//! come back, only the one holding the most recently issued ticket may
//! replace the view's list; anything older is discarded.

/// Ticket for one outbound fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn number(self) -> u64 {
        self.0
    }
}

/// Monotonic ticket issuer.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: u64,
    discarded: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket newer than every ticket issued before.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Whether a response holding `ticket` may be applied.
    ///
    /// Counts and logs the discard when it may not.
    pub fn accept(&mut self, ticket: Ticket, view: &str) -> bool {
        if ticket.0 == self.issued {
            return true;
        }
        self.discarded += 1;
        tracing::warn!(
            view,
            ticket = ticket.0,
            latest = self.issued,
            "discarding stale response"
        );
        false
    }

    /// Number of responses discarded so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}
