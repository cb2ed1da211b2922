pub mod evaluations;
pub mod payments;
pub mod reports;
pub mod tasks;
pub mod webhook;
