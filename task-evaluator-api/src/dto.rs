pub mod evaluation;
pub mod payment;
pub mod report;
pub mod task;

pub use evaluation::*;
pub use payment::*;
pub use report::*;
pub use task::*;

use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListQuery {
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }
}
