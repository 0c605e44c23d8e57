pub mod logger;

pub use logger::{ToolCallLog, TurnLog, TurnLogger};
