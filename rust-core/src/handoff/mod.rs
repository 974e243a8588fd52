//! Wait-free handoff of analysis windows between the sampling and spectrum tasks

pub mod buffer;
pub mod state;

pub use buffer::{HandoffBuffer, WindowConsumer, WindowProducer};
pub use state::Slot;
