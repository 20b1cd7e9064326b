pub mod snapshot_store;
pub mod user_directory;

pub use snapshot_store::{BOOKS_KEY, LOANS_KEY, SESSION_KEY, SnapshotStore};
pub use user_directory::UserDirectory;
