/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueBookError {
    /// 書籍が存在しない、または貸出可能数が0
    NotAvailable,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// 既に返却済み
    AlreadyReturned,
    /// 貸出記録が別の書籍を参照している
    BookMismatch,
    /// 返却すると貸出可能数が総冊数を超える
    CopiesExceedTotal,
}
