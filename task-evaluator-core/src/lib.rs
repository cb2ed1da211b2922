pub mod domain;
pub mod error;
pub mod evaluation;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use evaluation::EvaluationResult;
pub use traits::*;
