mod pool;
pub mod queries;
pub mod schema;
pub mod seed;
mod store;

pub use pool::*;
pub use schema::init_database;
pub use store::*;
