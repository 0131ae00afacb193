//! Simple to use cli for clocking in and out of projects. Punches are kept in a plain text file
//! that can be read and corrected by hand, no database or background process is involved.
//!

pub mod cli;
pub mod ledger;
pub mod punch;
pub mod utils;
