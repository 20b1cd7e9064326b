use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 書籍ID - カタログの集約ID
///
/// 不透明な文字列。新規発行はUUIDv7なので、発行順 = 作成順となる。
/// スナップショットから読み込む既存ID（例: "1"）もそのまま受け入れる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 貸出ID - 貸出台帳の集約ID（発行順 = 貸出順）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(String);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 利用者ID - セッション/利用者ディレクトリへの参照
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 蔵書数エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyCountError {
    /// 総冊数が0
    NoCopies,
    /// 貸出可能数が総冊数を超えている
    AvailableExceedsTotal { total: u32, available: u32 },
    /// 貸出可能数が0のため減らせない
    NoneAvailable,
}

impl std::fmt::Display for CopyCountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyCountError::NoCopies => write!(f, "total copies must be at least 1"),
            CopyCountError::AvailableExceedsTotal { total, available } => write!(
                f,
                "available copies ({}) exceed total copies ({})",
                available, total
            ),
            CopyCountError::NoneAvailable => write!(f, "no copies available"),
        }
    }
}

impl std::error::Error for CopyCountError {}

/// 蔵書数（総冊数と貸出可能数）
///
/// 不変条件：`1 <= total` かつ `0 <= available <= total`
/// 型システムでこの制約を強制し、不正な組み合わせを作成できないようにする。
/// デシリアライズも同じ検証を通る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCopyCounts", into = "RawCopyCounts")]
pub struct CopyCounts {
    total: u32,
    available: u32,
}

impl CopyCounts {
    pub fn new(total: u32, available: u32) -> Result<Self, CopyCountError> {
        if total == 0 {
            return Err(CopyCountError::NoCopies);
        }
        if available > total {
            return Err(CopyCountError::AvailableExceedsTotal { total, available });
        }
        Ok(Self { total, available })
    }

    /// 全冊貸出可能な状態で作成
    pub fn fully_available(total: u32) -> Result<Self, CopyCountError> {
        Self::new(total, total)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    /// 貸出中の冊数
    pub fn on_loan(&self) -> u32 {
        self.total - self.available
    }

    pub fn has_available(&self) -> bool {
        self.available > 0
    }

    /// 1冊貸し出す
    ///
    /// # エラー
    /// 貸出可能数が0の場合は`CopyCountError::NoneAvailable`を返す
    pub fn checkout_one(self) -> Result<Self, CopyCountError> {
        if self.available == 0 {
            return Err(CopyCountError::NoneAvailable);
        }
        Ok(Self {
            available: self.available - 1,
            ..self
        })
    }

    /// 1冊返却する
    ///
    /// # エラー
    /// 総冊数を超える場合は`CopyCountError::AvailableExceedsTotal`を返す
    pub fn return_one(self) -> Result<Self, CopyCountError> {
        Self::new(self.total, self.available.saturating_add(1))
    }
}

/// `CopyCounts`の永続化表現（`totalCopies` / `availableCopies`）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCopyCounts {
    total_copies: u32,
    available_copies: u32,
}

impl TryFrom<RawCopyCounts> for CopyCounts {
    type Error = CopyCountError;

    fn try_from(raw: RawCopyCounts) -> Result<Self, Self::Error> {
        CopyCounts::new(raw.total_copies, raw.available_copies)
    }
}

impl From<CopyCounts> for RawCopyCounts {
    fn from(counts: CopyCounts) -> Self {
        Self {
            total_copies: counts.total,
            available_copies: counts.available,
        }
    }
}
