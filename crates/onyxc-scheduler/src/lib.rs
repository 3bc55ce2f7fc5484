//! The entity heap and the stall/cycle detector: the
//! scheduling core the rest of the driver dispatches through.

mod cycle;
mod heap;

pub use cycle::{CycleDetector, CycleSignal};
pub use heap::{EntityHeap, ProgressCounts};
