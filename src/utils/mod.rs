pub mod cells;
pub mod clock;
pub mod query_cache;
