pub mod ids;
pub mod task;
pub mod report;
pub mod payment;
pub mod dead_letter;

pub use ids::*;
pub use task::*;
pub use report::*;
pub use payment::*;
pub use dead_letter::*;
