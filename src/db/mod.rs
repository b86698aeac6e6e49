pub mod memory;
pub mod pool;
pub mod source;

pub use memory::MemorySource;
pub use pool::create_pool;
pub use source::{AnalyticsSource, DataVersion, PgSource};
