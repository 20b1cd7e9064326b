use thiserror::Error;

/// 図書館アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LibraryError {
    /// 書籍が存在しない、または貸出可能数が0
    #[error("Book not available")]
    NotAvailable,

    /// 蔵書数が不正（総冊数0、貸出可能数が総冊数超過など）
    #[error("Invalid copy counts: {0}")]
    InvalidCopyCounts(String),

    /// 蔵書数が貸出台帳と一致しない
    #[error("Copy counts out of sync with ledger: {on_loan} copies on loan but {issued} issued loans")]
    CopyCountsOutOfSync { on_loan: u32, issued: u32 },

    /// 貸出中の記録がある書籍は削除できない
    #[error("Book has {0} active loan(s)")]
    BookHasActiveLoans(u32),

    /// ドメイン層のエラー
    #[error("Domain error: {0}")]
    DomainError(String),

    /// スナップショットが読み込めない形式
    #[error("Corrupt snapshot: {key}")]
    CorruptSnapshot {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// SnapshotStoreのエラー
    #[error("Storage error")]
    StorageError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryError>;
