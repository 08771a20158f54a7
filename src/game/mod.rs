pub mod actor;

pub use actor::{GameError, GameHandle};
