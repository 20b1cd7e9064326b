use thiserror::Error;

/// セッション層のエラー
#[derive(Debug, Error)]
pub enum SessionError {
    /// メールアドレスまたはパスワードが一致しない
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// ログインしていない
    #[error("Not signed in")]
    NotSignedIn,

    /// 権限がない（管理者専用の操作など）
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// セッションスナップショットが読み込めない形式
    #[error("Corrupt session snapshot")]
    CorruptSnapshot(#[source] serde_json::Error),

    /// SnapshotStoreのエラー
    #[error("Storage error")]
    StorageError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// UserDirectoryのエラー
    #[error("User directory error")]
    DirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, SessionError>;
