use async_trait::async_trait;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍スナップショットのキー
pub const BOOKS_KEY: &str = "library_books";
/// 貸出記録スナップショットのキー
pub const LOANS_KEY: &str = "library_loans";
/// セッション（現在の利用者）スナップショットのキー
pub const SESSION_KEY: &str = "library_session";

/// スナップショットストアポート
///
/// キーごとにJSONスナップショットを丸ごと保存する。
/// 書き込みは常に直前のスナップショットを置き換える（last-writer-wins）。
/// スキーマバージョンは持たない。
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// スナップショットを読み込む。存在しない場合は`None`
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// 複数のスナップショットをまとめて保存する
    ///
    /// 1つの論理トランザクションで複数のコレクションを更新する場合に使用する。
    /// 実装はできる限り全件成功か全件失敗のどちらかにする。
    async fn save_many(&self, entries: Vec<(&'static str, Value)>) -> Result<()>;

    /// スナップショットを削除する。存在しない場合は何もしない
    async fn remove(&self, key: &str) -> Result<()>;

    /// 1件のスナップショットを保存する
    async fn save(&self, key: &'static str, value: Value) -> Result<()> {
        self.save_many(vec![(key, value)]).await
    }
}
