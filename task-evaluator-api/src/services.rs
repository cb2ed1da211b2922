pub mod evaluation;

pub use evaluation::{EvaluationService, ModelBinding};
