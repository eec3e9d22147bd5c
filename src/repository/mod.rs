/// Repositories over the journal store
///
/// These are the operations the rest of the crate uses. They own the
/// input rules (clamping, validation, trimming) and the timestamps, and
/// talk to whichever backend was opened through the `JournalStore` trait.

pub mod daily_log;
pub mod medication;

pub use daily_log::DailyLogRepository;
pub use medication::MedicationRepository;
