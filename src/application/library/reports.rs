use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Book, LoanRecord, loan::days_overdue};

use crate::application::ledger::POPULAR_LIMIT;

use super::library_service::Library;

/// 概要レポートの「最近の貸出」件数
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// カテゴリごとのタイトル数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub titles: usize,
}

/// 概要レポート
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_books: usize,
    pub total_copies: u64,
    pub issued_count: usize,
    pub overdue_count: usize,
    pub categories: Vec<CategoryCount>,
    pub recent_activity: Vec<LoanRecord>,
}

/// 貸出中レポートの1行
#[derive(Debug, Clone, Serialize)]
pub struct IssuedReportEntry {
    pub loan: LoanRecord,
    pub book: Option<Book>,
}

/// 延滞レポートの1行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueReportEntry {
    pub loan: LoanRecord,
    pub book: Option<Book>,
    pub days_overdue: i64,
}

/// 人気レポートの1行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularReportEntry {
    pub book: Book,
    pub issue_count: usize,
}

impl Library {
    /// 概要レポート
    ///
    /// 延滞件数は`now`時点で導出する。
    /// 「最近の貸出」は台帳の先頭（古い順）ではなく、末尾から新しい順に5件取る。
    pub fn overview(&self, now: DateTime<Utc>) -> Overview {
        let catalog = self.catalog();
        let ledger = self.ledger();

        let categories = catalog
            .categories()
            .into_iter()
            .map(|category| CategoryCount {
                category: category.to_string(),
                titles: catalog
                    .all()
                    .iter()
                    .filter(|b| b.category == category)
                    .count(),
            })
            .collect();

        Overview {
            total_books: catalog.len(),
            total_copies: catalog.total_copies(),
            issued_count: ledger.issued().len(),
            overdue_count: ledger.overdue(now).len(),
            categories,
            recent_activity: ledger
                .most_recent(RECENT_ACTIVITY_LIMIT)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    /// 貸出中レポート（書籍が削除済みの場合は`book`が`None`）
    pub fn issued_report(&self) -> Vec<IssuedReportEntry> {
        self.ledger()
            .issued()
            .into_iter()
            .map(|loan| IssuedReportEntry {
                book: self.catalog().get_by_id(&loan.book_id).cloned(),
                loan: loan.clone(),
            })
            .collect()
    }

    /// 延滞レポート
    pub fn overdue_report(&self, now: DateTime<Utc>) -> Vec<OverdueReportEntry> {
        self.ledger()
            .overdue(now)
            .into_iter()
            .map(|loan| OverdueReportEntry {
                book: self.catalog().get_by_id(&loan.book_id).cloned(),
                days_overdue: days_overdue(loan, now),
                loan: loan.clone(),
            })
            .collect()
    }

    /// 人気レポート
    ///
    /// 削除済みの書籍を除外してから上位10件に絞る。
    pub fn popular_report(&self) -> Vec<PopularReportEntry> {
        self.ledger()
            .issue_counts()
            .into_iter()
            .filter_map(|(book_id, issue_count)| {
                let book = self.catalog().get_by_id(&book_id)?.clone();
                Some(PopularReportEntry { book, issue_count })
            })
            .take(POPULAR_LIMIT)
            .collect()
    }
}
