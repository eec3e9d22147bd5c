/// Discard results of range queries that have been superseded
///
/// A calendar issues a range query each time the visible month changes. If
/// the user pages quickly, an older query can finish after a newer one; its
/// result must not overwrite what is on screen.

use chrono::NaiveDate;

/// Handle for one issued range query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    generation: u64,
    start: NaiveDate,
    end: NaiveDate,
}

impl QueryTicket {
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }
}

/// Tracks which range query is the latest one
#[derive(Debug, Default)]
pub struct RangeQueryGuard {
    generation: u64,
    current: Option<(NaiveDate, NaiveDate)>,
}

impl RangeQueryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new query for `[start, end]`, superseding earlier ones
    pub fn begin(&mut self, start: NaiveDate, end: NaiveDate) -> QueryTicket {
        self.generation += 1;
        self.current = Some((start, end));
        QueryTicket {
            generation: self.generation,
            start,
            end,
        }
    }

    /// Whether `ticket` belongs to the most recently issued query
    pub fn is_current(&self, ticket: &QueryTicket) -> bool {
        ticket.generation == self.generation && self.current == Some((ticket.start, ticket.end))
    }

    /// Pass `result` through only if `ticket` is still current
    pub fn accept<T>(&self, ticket: &QueryTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(
                "Discarding stale range result for {}..{}",
                ticket.start,
                ticket.end
            );
            None
        }
    }
}
