//! Condition evaluation and output parameter mapping.
//!
//! The runtime only depends on the [`Evaluator`] contract. [`TemplateEvaluator`]
//! is the default implementation: flow conditions are literal booleans or rule
//! sets over scope variables, output parameters are JSON templates.

mod evaluator;
mod models;
pub mod template;

pub use evaluator::{Evaluator, TemplateEvaluator};
pub use models::*;
