//! Time-accrued credit ledger for the Podium voting service.
//!
//! Participants earn one spendable credit per configured interval of
//! event time, up to a cap, and spend them casting votes. This crate
//! owns the accrual arithmetic and the charge discipline; the actual
//! serialization point for concurrent charges is the store's conditional
//! updates.
//!
//! Pausing is a settings-level concern: while the voting-paused flag is
//! set nothing here changes, and on resume [`CreditLedger::resume`]
//! shifts every account's accrual anchor by the pause duration so paused
//! time never counts toward the next credit.

pub mod accrual;
pub mod ledger;

pub use accrual::{accrue, Accrual};
pub use ledger::{BalanceView, ChargeOutcome, CreditError, CreditLedger};
