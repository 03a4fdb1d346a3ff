pub mod cost;
pub mod facade;

pub use cost::CostTracker;
pub use facade::{LlmFacade, ModelTier};
