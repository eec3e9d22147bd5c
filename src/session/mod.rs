/// Editing-session helpers
///
/// Small state machines for clients that edit one day at a time: debounced
/// autosave of the day being edited, and discarding range-query results that
/// arrive after the user has already moved on.

pub mod autosave;
pub mod range_guard;

pub use autosave::{Autosaver, EditSession, EditState, DEFAULT_SAVE_DELAY};
pub use range_guard::{QueryTicket, RangeQueryGuard};
