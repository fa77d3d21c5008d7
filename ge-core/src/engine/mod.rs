//! Event classification and state inference

pub mod classifier;
pub mod state;

pub use classifier::EventClassifier;
pub use state::{EngineState, StateEngine};
