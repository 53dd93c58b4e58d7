mod repo;
mod schema;

pub use repo::{JournalRepo, SessionInfo, UserInfo};
pub use schema::init_database;
