//! Domain types for Polybot

pub mod bar;
pub mod ids;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use ids::{ConfigHash, SimulationId, TradeId};
pub use signal::{clamp_unit, Direction, IndicatorSignal, MarketSnapshot, Signal};
pub use trade::{Trade, TradeResult};
