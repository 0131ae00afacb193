use chrono::{Local, NaiveDateTime, SubsecRound};

/// Represents an entity responsible for providing the current time across the application. Punch
/// operations never ask the system for the time directly, which allows them to be tested.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Local wall-clock time. Ledgers never store timezone information.
    fn now(&self) -> NaiveDateTime;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    /// Whole seconds only, the ledger can't store anything finer.
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}
