use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::ReturnOutcome;
use crate::domain::{
    BookId, Borrower, LoanRecord, LoanState, UserId,
    loan::{days_remaining, loan_state},
};

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 貸出リクエスト（POST /loans、管理者が借り手を指定する）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLoanRequest {
    pub book_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

impl IssueLoanRequest {
    pub fn book_id(&self) -> BookId {
        BookId::from_string(self.book_id.clone())
    }

    pub fn borrower(&self) -> Borrower {
        Borrower {
            user_id: UserId::from_string(self.user_id.clone()),
            name: self.user_name.clone(),
            email: self.user_email.clone(),
        }
    }
}

/// 書籍一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct BookSearchQuery {
    #[serde(default)]
    pub q: String,
    /// カテゴリで絞り込み（未指定は全カテゴリ）
    pub category: Option<String>,
}

/// 貸出一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct LoanSearchQuery {
    #[serde(default)]
    pub q: String,
    /// 状態で絞り込み（issued, overdue, returned）
    pub state: Option<String>,
}

/// 利用者一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// 貸出レスポンス
///
/// 保存された記録に、リクエスト時点で導出した状態を加えたもの。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    #[serde(flatten)]
    pub loan: LoanRecord,
    pub state: LoanState,
    pub overdue: bool,
    pub days_remaining: i64,
}

impl LoanResponse {
    pub fn at(loan: &LoanRecord, now: DateTime<Utc>) -> Self {
        let state = loan_state(loan, now);
        Self {
            loan: loan.clone(),
            state,
            overdue: state == LoanState::Overdue,
            days_remaining: days_remaining(loan, now),
        }
    }
}

/// 自分の貸出（GET /me/loans）
#[derive(Debug, Serialize)]
pub struct MyLoansResponse {
    pub current: Vec<LoanResponse>,
    pub history: Vec<LoanResponse>,
}

/// 返却レスポンス
#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    /// returned, loan_not_found, book_missing, already_returned
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanResponse>,
}

impl ReturnResponse {
    pub fn from_outcome(outcome: ReturnOutcome, now: DateTime<Utc>) -> Self {
        match outcome {
            ReturnOutcome::Returned(loan) => Self {
                outcome: "returned",
                loan: Some(LoanResponse::at(&loan, now)),
            },
            ReturnOutcome::LoanNotFound => Self {
                outcome: "loan_not_found",
                loan: None,
            },
            ReturnOutcome::BookMissing => Self {
                outcome: "book_missing",
                loan: None,
            },
            ReturnOutcome::AlreadyReturned => Self {
                outcome: "already_returned",
                loan: None,
            },
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// 状態クエリパラメータのパース
pub fn parse_state_filter(state: &str) -> Result<LoanState, String> {
    state.parse::<LoanState>()
}
