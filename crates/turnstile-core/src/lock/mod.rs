//! Ticket lock over shared counters
//!
//! A lock named `N` is four counters in the store:
//! - `lock:N`: ticket now being served, or the `INIT`/`CLOSED` marker
//! - `N-wait`: last ticket handed out
//! - `N-event`: participants currently registered
//! - `N-event_wait`: participants that acknowledged a drain
//!
//! Handles are stateless apart from the key names and options; any number of
//! them, in any process, may drive the same record.

mod drain;
mod handle;
mod model;
mod record;

pub use handle::LockHandle;
pub use model::{LockOptions, RecordSnapshot};
pub use record::LockRecord;
