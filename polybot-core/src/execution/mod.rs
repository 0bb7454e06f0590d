//! Execution modelling for simulated wagers: slippage on entry, settlement
//! at resolution (fees, optional take-profit).

pub mod settlement;
pub mod slippage;

pub use settlement::{exit_level, settle, Payoff};
pub use slippage::{contract_price, EntryFill, ExecutionModel, MAX_ENTRY_PRICE, MIN_CONTRACT_PRICE};
