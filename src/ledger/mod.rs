//!  The ledger is organized through [store::LedgerFileStore].
//!  The basic idea is:
//!   - All punches live in a single human editable text file, see [codec].
//!   - Each project owns an ordered list of punches, only the last one can be open.
//!   - Totals are never stored authoritatively, they are always computed from punches.

pub mod codec;
pub mod entities;
pub mod error;
pub mod store;

pub use entities::{ClockState, Ledger, ProjectName, ProjectRecord, Punch};
pub use error::LedgerError;
pub use store::{LedgerFileStore, LedgerStore};
