pub mod backfill;
pub mod models;
pub mod pool;
pub mod repo;
pub mod schema;

pub use pool::Store;
