use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Book, BookId, IssueBookError, LoanId, ReturnBookError, UserId};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// 貸出ステータス（永続化される値）
///
/// 延滞は保存しない。`issued`かつ返却期限切れかどうかは
/// 表示のたびに`is_overdue`で導出する。
/// 過去のスナップショットに残る`"overdue"`は`Issued`として読み込む。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 貸出中
    #[serde(alias = "overdue")]
    Issued,
    /// 返却済み
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Issued => "issued",
            LoanStatus::Returned => "returned",
        }
    }

    pub fn is_issued(&self) -> bool {
        matches!(self, LoanStatus::Issued)
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, LoanStatus::Returned)
    }
}

/// 表示用の貸出状態（導出値、保存しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanState {
    /// 貸出中（期限内）
    Issued,
    /// 延滞中
    Overdue,
    /// 返却済み
    Returned,
}

impl LoanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanState::Issued => "issued",
            LoanState::Overdue => "overdue",
            LoanState::Returned => "returned",
        }
    }
}

impl std::str::FromStr for LoanState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "issued" => Ok(LoanState::Issued),
            "overdue" => Ok(LoanState::Overdue),
            "returned" => Ok(LoanState::Returned),
            _ => Err(format!("Invalid loan state: {}", s)),
        }
    }
}

/// 借り手情報（貸出時点のコピー。利用者への生きた参照ではない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

/// 貸出記録 - 1冊の書籍の1回の貸出
///
/// 貸出時に作成され、返却時に1度だけ更新される。削除はしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    // 識別子
    pub id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,

    // 借り手（非正規化コピー）
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,

    // 貸出管理の責務
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出可能数が0の書籍は貸し出せない
/// - 貸出期間は14日間（暦日、営業日計算なし）
/// - 状態はIssued
/// - 書籍の貸出可能数はちょうど1減る
///
/// 副作用なし。更新後のBookと新しいLoanRecordを返す。
pub fn issue_book(
    book: &Book,
    borrower: Borrower,
    issued_at: DateTime<Utc>,
) -> Result<(Book, LoanRecord), IssueBookError> {
    let copies = book
        .copies
        .checkout_one()
        .map_err(|_| IssueBookError::NotAvailable)?;

    let loan = LoanRecord {
        id: LoanId::new(),
        book_id: book.id.clone(),
        user_id: borrower.user_id,
        user_name: borrower.name,
        user_email: borrower.email,
        issue_date: issued_at,
        due_date: issued_at + Duration::days(LOAN_PERIOD_DAYS),
        return_date: None,
        status: LoanStatus::Issued,
    };

    let updated_book = Book {
        copies,
        ..book.clone()
    };

    Ok((updated_book, loan))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 返却済みの貸出は再度返却できない
/// - 延滞していても返却は受け付ける
/// - 書籍の貸出可能数はちょうど1増える（総冊数は超えない）
///
/// 副作用なし。更新後のBookとLoanRecordを返す。
pub fn return_book(
    book: &Book,
    loan: &LoanRecord,
    returned_at: DateTime<Utc>,
) -> Result<(Book, LoanRecord), ReturnBookError> {
    // バリデーション：既に返却済みは不可
    if loan.status.is_returned() {
        return Err(ReturnBookError::AlreadyReturned);
    }

    // バリデーション：別の書籍の貸出
    if loan.book_id != book.id {
        return Err(ReturnBookError::BookMismatch);
    }

    let copies = book
        .copies
        .return_one()
        .map_err(|_| ReturnBookError::CopiesExceedTotal)?;

    let returned_loan = LoanRecord {
        return_date: Some(returned_at),
        status: LoanStatus::Returned,
        ..loan.clone()
    };

    let updated_book = Book {
        copies,
        ..book.clone()
    };

    Ok((updated_book, returned_loan))
}

/// 純粋関数：延滞判定
///
/// `status == issued` かつ `now > due_date`。
/// 時刻に依存するため結果をキャッシュしてはいけない。
pub fn is_overdue(loan: &LoanRecord, now: DateTime<Utc>) -> bool {
    loan.status.is_issued() && now > loan.due_date
}

/// 純粋関数：表示用の状態を導出する
pub fn loan_state(loan: &LoanRecord, now: DateTime<Utc>) -> LoanState {
    match loan.status {
        LoanStatus::Returned => LoanState::Returned,
        LoanStatus::Issued if now > loan.due_date => LoanState::Overdue,
        LoanStatus::Issued => LoanState::Issued,
    }
}

/// 純粋関数：延滞日数（切り捨て）
///
/// 延滞していない場合は0。
pub fn days_overdue(loan: &LoanRecord, now: DateTime<Utc>) -> i64 {
    if !is_overdue(loan, now) {
        return 0;
    }
    (now - loan.due_date).num_days()
}

/// 純粋関数：返却期限までの残り日数（切り上げ）
///
/// 期限を過ぎている場合は負の値になる。
pub fn days_remaining(loan: &LoanRecord, now: DateTime<Utc>) -> i64 {
    let remaining = loan.due_date - now;
    let day_ms = Duration::days(1).num_milliseconds();
    let ms = remaining.num_milliseconds();
    ms.div_euclid(day_ms) + i64::from(ms.rem_euclid(day_ms) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CopyCounts;

    fn book_with(total: u32, available: u32) -> Book {
        Book {
            id: BookId::new(),
            title: "Introduction to Algorithms".to_string(),
            author: "Thomas H. Cormen".to_string(),
            category: "Computer Science".to_string(),
            isbn: "978-0-262-03384-8".to_string(),
            published_year: 2009,
            description: None,
            image_url: None,
            copies: CopyCounts::new(total, available).unwrap(),
        }
    }

    fn borrower() -> Borrower {
        Borrower {
            user_id: UserId::from_string("2"),
            name: "John Doe".to_string(),
            email: "student@smartreads.com".to_string(),
        }
    }

    #[test]
    fn test_issue_book_creates_loan_with_correct_due_date() {
        let book = book_with(3, 1);
        let issued_at = Utc::now();

        let result = issue_book(&book, borrower(), issued_at);
        assert!(result.is_ok());

        let (updated_book, loan) = result.unwrap();

        // 貸出期間は14日間
        assert_eq!(loan.due_date, issued_at + Duration::days(14));
        assert_eq!(loan.issue_date, issued_at);
        assert_eq!(loan.status, LoanStatus::Issued);
        assert_eq!(loan.return_date, None);
        assert_eq!(loan.book_id, book.id);
        assert_eq!(loan.user_name, "John Doe");

        // 貸出可能数はちょうど1減る
        assert_eq!(updated_book.copies.available(), 0);
        assert_eq!(updated_book.copies.total(), 3);
    }

    #[test]
    fn test_issue_book_fails_when_no_copies_available() {
        let book = book_with(3, 0);

        let result = issue_book(&book, borrower(), Utc::now());
        assert_eq!(result.unwrap_err(), IssueBookError::NotAvailable);
    }

    #[test]
    fn test_return_book_success() {
        let book = book_with(3, 1);
        let issued_at = Utc::now();
        let (book, loan) = issue_book(&book, borrower(), issued_at).unwrap();
        let returned_at = issued_at + Duration::days(7);

        let (book, loan) = return_book(&book, &loan, returned_at).unwrap();

        assert_eq!(loan.status, LoanStatus::Returned);
        assert_eq!(loan.return_date, Some(returned_at));
        assert_eq!(book.copies.available(), 1);
    }

    #[test]
    fn test_return_book_fails_when_already_returned() {
        let book = book_with(2, 2);
        let issued_at = Utc::now();
        let (book, loan) = issue_book(&book, borrower(), issued_at).unwrap();
        let (book, loan) = return_book(&book, &loan, issued_at).unwrap();

        // 2回目の返却は失敗し、貸出可能数は増えない
        let result = return_book(&book, &loan, issued_at + Duration::days(1));
        assert_eq!(result.unwrap_err(), ReturnBookError::AlreadyReturned);
        assert_eq!(book.copies.available(), 2);
    }

    #[test]
    fn test_return_book_fails_for_other_book() {
        let issued_at = Utc::now();
        let (_, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();

        let result = return_book(&book_with(1, 0), &loan, issued_at);
        assert_eq!(result.unwrap_err(), ReturnBookError::BookMismatch);
    }

    #[test]
    fn test_return_book_never_exceeds_total() {
        let issued_at = Utc::now();
        let (_, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();
        let full = Book {
            id: loan.book_id.clone(),
            ..book_with(1, 1)
        };

        let result = return_book(&full, &loan, issued_at);
        assert_eq!(result.unwrap_err(), ReturnBookError::CopiesExceedTotal);
    }

    #[test]
    fn test_is_overdue_false_when_before_due_date() {
        let issued_at = Utc::now();
        let (_, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();

        assert!(!is_overdue(&loan, issued_at + Duration::days(7)));
        assert_eq!(loan_state(&loan, issued_at), LoanState::Issued);
    }

    #[test]
    fn test_is_overdue_true_when_after_due_date() {
        let issued_at = Utc::now() - Duration::days(20);
        let (_, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();
        let now = Utc::now();

        assert!(is_overdue(&loan, now));
        assert_eq!(loan_state(&loan, now), LoanState::Overdue);
        assert_eq!(days_overdue(&loan, now), 6);
    }

    #[test]
    fn test_is_overdue_false_when_returned() {
        let issued_at = Utc::now() - Duration::days(30);
        let (book, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();
        let (_, loan) = return_book(&book, &loan, issued_at + Duration::days(20)).unwrap();
        let now = Utc::now();

        assert!(!is_overdue(&loan, now));
        assert_eq!(loan_state(&loan, now), LoanState::Returned);
        assert_eq!(days_overdue(&loan, now), 0);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let issued_at = Utc::now();
        let (_, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();

        assert_eq!(days_remaining(&loan, issued_at), 14);
        assert_eq!(days_remaining(&loan, issued_at + Duration::hours(1)), 14);
        assert_eq!(days_remaining(&loan, issued_at + Duration::days(14)), 0);
        assert_eq!(
            days_remaining(&loan, issued_at + Duration::days(15) + Duration::hours(1)),
            -1
        );
    }

    #[test]
    fn test_loan_status_reads_legacy_overdue_as_issued() {
        let status: LoanStatus = serde_json::from_str(r#""overdue""#).unwrap();
        assert_eq!(status, LoanStatus::Issued);
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""issued""#);
    }

    #[test]
    fn test_loan_record_round_trips_iso_dates() {
        let issued_at = Utc::now();
        let (_, loan) = issue_book(&book_with(1, 1), borrower(), issued_at).unwrap();

        let json = serde_json::to_value(&loan).unwrap();
        assert!(json["issueDate"].is_string());
        assert!(json.get("returnDate").is_none());

        let parsed: LoanRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, loan);
    }
}
