use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, book_loans, borrow_book, create_book, current_user, delete_book, get_book,
    issue_loan, issued_report, list_available_books, list_books, list_categories, list_loans,
    list_users, login, logout, my_loans, overdue_report, overview_report, popular_report,
    register, return_loan, update_book, user_loans,
};

/// Creates the API router
///
/// Session:
/// - POST /session/login, /session/register, /session/logout
/// - GET /session
///
/// Catalog (writes require an admin):
/// - GET /books, /books/categories, /books/available, /books/:id
/// - POST /books, PATCH /books/:id, DELETE /books/:id
/// - POST /books/:id/borrow - borrow for the signed-in user
///
/// Loans (admin):
/// - GET /loans, POST /loans, POST /loans/:id/return
/// - GET /books/:id/loans, GET /users/:id/loans
/// - GET /me/loans - any signed-in user
///
/// Reports and users (admin):
/// - GET /reports/{overview,issued,overdue,popular}
/// - GET /users
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Session
        .route("/session", get(current_user))
        .route("/session/login", post(login))
        .route("/session/register", post(register))
        .route("/session/logout", post(logout))
        // Catalog
        .route("/books", get(list_books).post(create_book))
        .route("/books/categories", get(list_categories))
        .route("/books/available", get(list_available_books))
        .route(
            "/books/:id",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .route("/books/:id/borrow", post(borrow_book))
        .route("/books/:id/loans", get(book_loans))
        // Loans
        .route("/loans", get(list_loans).post(issue_loan))
        .route("/loans/:id/return", post(return_loan))
        .route("/me/loans", get(my_loans))
        // Reports
        .route("/reports/overview", get(overview_report))
        .route("/reports/issued", get(issued_report))
        .route("/reports/overdue", get(overdue_report))
        .route("/reports/popular", get(popular_report))
        // Users
        .route("/users", get(list_users))
        .route("/users/:id/loans", get(user_loans))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
