pub mod snapshot_store;

// パブリックに型を再エクスポート
pub use snapshot_store::SnapshotStore as PostgresSnapshotStore;
