use crate::application::library::{
    IssuedReportEntry, OverdueReportEntry, Overview, PopularReportEntry,
};
use crate::application::{Library, RegisterUser, Session};
use crate::domain::{
    Book, BookId, BookUpdate, LoanId, NewBook, User, UserId,
    commands::{IssueBook, ReturnBook},
    loan::loan_state,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    error::ApiError,
    types::{
        BookSearchQuery, IssueLoanRequest, LoanResponse, LoanSearchQuery, LoginRequest,
        MyLoansResponse, ReturnResponse, UserSearchQuery, parse_state_filter,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
///
/// ロックは常に session → library の順で取得する。
pub struct AppState {
    pub library: RwLock<Library>,
    pub session: RwLock<Session>,
}

impl AppState {
    pub fn new(library: Library, session: Session) -> Self {
        Self {
            library: RwLock::new(library),
            session: RwLock::new(session),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// POST /session/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .session
        .write()
        .await
        .login(&req.email, &req.password)
        .await?;
    Ok(Json(user))
}

/// POST /session/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.session.write().await.register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /session/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.session.write().await.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /session - 現在の利用者
pub async fn current_user(State(state): State<Arc<AppState>>) -> Result<Json<User>, ApiError> {
    let session = state.session.read().await;
    Ok(Json(session.require_user()?.clone()))
}

// ============================================================================
// Books
// ============================================================================

/// GET /books?q=&category=
///
/// 空のクエリは全件を返す。
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookSearchQuery>,
) -> Json<Vec<Book>> {
    let library = state.library.read().await;
    let books = library
        .catalog()
        .browse(&query.q, query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Json(books)
}

/// GET /books/categories
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let library = state.library.read().await;
    Json(
        library
            .catalog()
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

/// GET /books/available - 貸出可能な書籍（貸出フォームの選択肢）
pub async fn list_available_books(State(state): State<Arc<AppState>>) -> Json<Vec<Book>> {
    let library = state.library.read().await;
    Json(library.catalog().available().into_iter().cloned().collect())
}

/// GET /books/:id
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let library = state.library.read().await;
    library
        .catalog()
        .get_by_id(&BookId::from_string(id.clone()))
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))
}

/// POST /books - 書籍の登録（管理者）
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    let book = state.library.write().await.add_book(req).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PATCH /books/:id - 書籍の編集（管理者）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BookUpdate>,
) -> Result<Json<Book>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    state
        .library
        .write()
        .await
        .edit_book(&BookId::from_string(id.clone()), req)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))
}

/// DELETE /books/:id - 書籍の削除（管理者）
///
/// 貸出中の記録がある書籍は422。
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    state
        .library
        .write()
        .await
        .remove_book(&BookId::from_string(id.clone()))
        .await?
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))
}

/// GET /books/:id/loans - 書籍の貸出履歴（管理者）
pub async fn book_loans(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    let now = Utc::now();
    let library = state.library.read().await;
    let loans = library
        .ledger()
        .loans_for_book(&BookId::from_string(id))
        .into_iter()
        .map(|loan| LoanResponse::at(loan, now))
        .collect();
    Ok(Json(loans))
}

/// POST /books/:id/borrow - ログイン中の利用者が自分で借りる
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let session = state.session.read().await;
    let borrower = session.require_user()?.as_borrower();

    let now = Utc::now();
    let loan = state
        .library
        .write()
        .await
        .issue_book(IssueBook {
            book_id: BookId::from_string(id),
            borrower,
            issued_at: now,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::at(&loan, now))))
}

// ============================================================================
// Loans
// ============================================================================

/// GET /loans?q=&state= - 貸出記録の検索（管理者）
///
/// 借り手の名前・メール、書籍タイトルで検索する。
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoanSearchQuery>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    let filter = query
        .state
        .as_deref()
        .map(parse_state_filter)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let now = Utc::now();
    let library = state.library.read().await;
    let loans = library
        .search_loans(&query.q)
        .into_iter()
        .filter(|loan| filter.is_none_or(|s| loan_state(loan, now) == s))
        .map(|loan| LoanResponse::at(loan, now))
        .collect();
    Ok(Json(loans))
}

/// POST /loans - 貸出（管理者が借り手を指定）
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 貸出可能数が1以上であること
pub async fn issue_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    let now = Utc::now();
    let loan = state
        .library
        .write()
        .await
        .issue_book(IssueBook {
            book_id: req.book_id(),
            borrower: req.borrower(),
            issued_at: now,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::at(&loan, now))))
}

/// POST /loans/:id/return - 返却（管理者）
///
/// 返却できなかった場合も200で`outcome`に理由を返す。
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    let now = Utc::now();
    let outcome = state
        .library
        .write()
        .await
        .return_book(ReturnBook {
            loan_id: LoanId::from_string(id),
            returned_at: now,
        })
        .await?;

    Ok(Json(ReturnResponse::from_outcome(outcome, now)))
}

/// GET /me/loans - 自分の貸出中・返却済みの記録
pub async fn my_loans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MyLoansResponse>, ApiError> {
    let session = state.session.read().await;
    let user_id = session.require_user()?.id.clone();

    let now = Utc::now();
    let library = state.library.read().await;
    let ledger = library.ledger();
    Ok(Json(MyLoansResponse {
        current: ledger
            .current_for_user(&user_id)
            .into_iter()
            .map(|l| LoanResponse::at(l, now))
            .collect(),
        history: ledger
            .history_for_user(&user_id)
            .into_iter()
            .map(|l| LoanResponse::at(l, now))
            .collect(),
    }))
}

// ============================================================================
// Reports (admin)
// ============================================================================

/// GET /reports/overview
pub async fn overview_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Overview>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;
    Ok(Json(state.library.read().await.overview(Utc::now())))
}

/// GET /reports/issued
pub async fn issued_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IssuedReportEntry>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;
    Ok(Json(state.library.read().await.issued_report()))
}

/// GET /reports/overdue
pub async fn overdue_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OverdueReportEntry>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;
    Ok(Json(state.library.read().await.overdue_report(Utc::now())))
}

/// GET /reports/popular
pub async fn popular_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PopularReportEntry>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;
    Ok(Json(state.library.read().await.popular_report()))
}

// ============================================================================
// Users (admin)
// ============================================================================

/// GET /users?q=
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;
    Ok(Json(session.list_users(&query.q).await?))
}

/// GET /users/:id/loans - 利用者の全貸出（返却済みを含む）
pub async fn user_loans(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let session = state.session.read().await;
    session.require_admin()?;

    let now = Utc::now();
    let library = state.library.read().await;
    let loans = library
        .ledger()
        .loans_by_user(&UserId::from_string(id))
        .into_iter()
        .map(|loan| LoanResponse::at(loan, now))
        .collect();
    Ok(Json(loans))
}
