pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod schema;

pub use memory::MemoryStore;
pub use repositories::*;
pub use schema::SchemaCapabilities;
