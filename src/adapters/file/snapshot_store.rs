use crate::ports::snapshot_store::{Result, SnapshotStore as SnapshotStoreTrait};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSONファイルによるSnapshotStore実装
///
/// データディレクトリ直下にキーごとの`<key>.json`を置く。
/// 書き込みは一時ファイルへ書いてからrenameで置き換える。
/// `save_many`はすべての一時ファイルを書き終えてからキーごとに置き換え、
/// 置き換えた旧ファイルは`.json.bak`に退避しておく。途中で失敗した場合は
/// 退避したファイルを戻すので、どのスナップショットも変わらない。
/// 戻す処理自体が失敗した場合（プロセスの強制終了を含む）は保証しない。
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// データディレクトリを作成して開く
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", key))
    }

    fn backup_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.bak", key))
    }

    /// 旧ファイルを退避してから一時ファイルで置き換える。退避したかどうかを返す
    async fn commit(&self, key: &str) -> std::io::Result<bool> {
        let path = self.path_for(key);
        let backup = self.backup_path_for(key);
        let had_backup = match tokio::fs::rename(&path, &backup).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        if let Err(e) = tokio::fs::rename(self.temp_path_for(key), &path).await {
            if had_backup {
                let _ = tokio::fs::rename(&backup, &path).await;
            }
            return Err(e);
        }
        Ok(had_backup)
    }

    /// 置き換え済みのキーを逆順に元へ戻す
    async fn roll_back(&self, committed: &[(&'static str, bool)]) {
        for &(key, had_backup) in committed.iter().rev() {
            let path = self.path_for(key);
            let result = if had_backup {
                tokio::fs::rename(self.backup_path_for(key), &path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            if let Err(e) = result {
                tracing::error!(key, error = %e, "Failed to restore snapshot file");
            }
        }
    }

    async fn discard_temp_files(&self, entries: &[(&'static str, Value)]) {
        for (key, _) in entries {
            let _ = tokio::fs::remove_file(self.temp_path_for(key)).await;
        }
    }
}

#[async_trait]
impl SnapshotStoreTrait for SnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_many(&self, entries: Vec<(&'static str, Value)>) -> Result<()> {
        // 1. すべて一時ファイルに書き出す
        for (key, value) in &entries {
            let bytes = serde_json::to_vec_pretty(value)?;
            if let Err(e) = tokio::fs::write(self.temp_path_for(key), bytes).await {
                self.discard_temp_files(&entries).await;
                return Err(e.into());
            }
        }

        // 2. 旧ファイルを退避しながら置き換える
        let mut committed: Vec<(&'static str, bool)> = Vec::with_capacity(entries.len());
        for &(key, _) in &entries {
            match self.commit(key).await {
                Ok(had_backup) => committed.push((key, had_backup)),
                Err(e) => {
                    self.roll_back(&committed).await;
                    self.discard_temp_files(&entries).await;
                    return Err(e.into());
                }
            }
        }

        // 3. 退避ファイルを消す
        for &(key, had_backup) in &committed {
            if had_backup {
                let _ = tokio::fs::remove_file(self.backup_path_for(key)).await;
            }
        }

        tracing::debug!(
            keys = ?entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            dir = %self.dir.display(),
            "Snapshots written"
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).await.unwrap();

        assert_eq!(store.load("library_books").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).await.unwrap();

        store
            .save_many(vec![
                ("library_books", json!([{ "id": "1" }])),
                ("library_loans", json!([])),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.load("library_books").await.unwrap(),
            Some(json!([{ "id": "1" }]))
        );
        assert!(dir.path().join("library_loans.json").exists());
        assert!(!dir.path().join("library_loans.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_replace_restores_earlier_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).await.unwrap();
        store
            .save_many(vec![
                ("library_books", json!(["old books"])),
                ("library_loans", json!(["old loans"])),
            ])
            .await
            .unwrap();

        // 退避先がディレクトリなので2件目の置き換えが失敗する
        let blocker = dir.path().join("library_loans.json.bak");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let result = store
            .save_many(vec![
                ("library_books", json!(["new books"])),
                ("library_loans", json!(["new loans"])),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(
            store.load("library_books").await.unwrap(),
            Some(json!(["old books"]))
        );
        assert_eq!(
            store.load("library_loans").await.unwrap(),
            Some(json!(["old loans"]))
        );
        assert!(!dir.path().join("library_books.json.tmp").exists());
        assert!(!dir.path().join("library_loans.json.tmp").exists());
        assert!(!dir.path().join("library_books.json.bak").exists());
    }

    #[tokio::test]
    async fn test_successful_save_leaves_no_backups() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).await.unwrap();

        store.save("library_books", json!([1])).await.unwrap();
        store.save("library_books", json!([2])).await.unwrap();

        assert_eq!(store.load("library_books").await.unwrap(), Some(json!([2])));
        assert!(!dir.path().join("library_books.json.bak").exists());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).await.unwrap();
        store.save("library_session", json!({})).await.unwrap();

        store.remove("library_session").await.unwrap();
        store.remove("library_session").await.unwrap();

        assert_eq!(store.load("library_session").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("library");

        let store = SnapshotStore::open(&nested).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }
}
