//! Journal and metric contracts consumed by the run loop, plus one concrete
//! journal that tracks an equity curve and drawdown.

pub mod journal;
pub mod metric;
pub mod return_journal;

pub use journal::Journal;
pub use metric::Metric;
pub use return_journal::{ReturnJournal, ReturnPoint, ReturnSnapshot};
