use crate::ports::snapshot_store::{Result, SnapshotStore as SnapshotStoreTrait};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// インメモリのSnapshotStore実装
///
/// プロセス内でスナップショットを保持する。テストと`LIBRARY_STORAGE=memory`で使用。
/// 書き込み失敗を注入してロールバックの検証ができる。
pub struct SnapshotStore {
    snapshots: Mutex<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// 以降の書き込みを失敗させる（テスト用）
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // 保持中にpanicしても中身は常に完全なスナップショット
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStoreTrait for SnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(key))
    }

    async fn save_many(&self, entries: Vec<(&'static str, Value)>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("snapshot store is failing writes".into());
        }
        let mut snapshots = self.lock();
        for (key, value) in entries {
            snapshots.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("snapshot store is failing writes".into());
        }
        self.lock().remove(key);
        Ok(())
    }
}
