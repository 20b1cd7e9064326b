use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::domain::{BookId, LoanId, LoanRecord, UserId, loan::is_overdue};

/// 人気ランキングの件数
pub const POPULAR_LIMIT: usize = 10;

/// 貸出台帳
///
/// 貸出記録コレクションを排他的に所有する。並び順は貸出順（古い順）。
/// 記録は追加と返却時の更新のみで、削除しない。
#[derive(Debug, Clone, Default)]
pub struct LoanLedger {
    loans: Vec<LoanRecord>,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のスナップショットから復元
    pub fn from_loans(loans: Vec<LoanRecord>) -> Self {
        Self { loans }
    }

    pub(crate) fn append(&mut self, loan: LoanRecord) {
        self.loans.push(loan);
    }

    pub(crate) fn replace(&mut self, loan: LoanRecord) -> bool {
        match self.loans.iter_mut().find(|l| l.id == loan.id) {
            Some(slot) => {
                *slot = loan;
                true
            }
            None => false,
        }
    }

    pub fn get_by_id(&self, id: &LoanId) -> Option<&LoanRecord> {
        self.loans.iter().find(|l| &l.id == id)
    }

    pub fn all(&self) -> &[LoanRecord] {
        &self.loans
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    /// 利用者の全貸出（返却済みを含む）
    pub fn loans_by_user(&self, user_id: &UserId) -> Vec<&LoanRecord> {
        self.loans.iter().filter(|l| &l.user_id == user_id).collect()
    }

    /// 利用者の貸出中の記録
    pub fn current_for_user(&self, user_id: &UserId) -> Vec<&LoanRecord> {
        self.loans
            .iter()
            .filter(|l| &l.user_id == user_id && l.status.is_issued())
            .collect()
    }

    /// 利用者の返却済みの記録
    pub fn history_for_user(&self, user_id: &UserId) -> Vec<&LoanRecord> {
        self.loans
            .iter()
            .filter(|l| &l.user_id == user_id && l.status.is_returned())
            .collect()
    }

    /// 書籍の貸出履歴（返却済みを含む）
    pub fn loans_for_book(&self, book_id: &BookId) -> Vec<&LoanRecord> {
        self.loans.iter().filter(|l| &l.book_id == book_id).collect()
    }

    /// 書籍の貸出中の冊数
    pub fn issued_count_for_book(&self, book_id: &BookId) -> u32 {
        let count = self
            .loans
            .iter()
            .filter(|l| &l.book_id == book_id && l.status.is_issued())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// 貸出中の記録
    pub fn issued(&self) -> Vec<&LoanRecord> {
        self.loans.iter().filter(|l| l.status.is_issued()).collect()
    }

    /// 延滞中の記録（`now`時点で導出）
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<&LoanRecord> {
        self.loans.iter().filter(|l| is_overdue(l, now)).collect()
    }

    /// 新しい順に`limit`件
    pub fn most_recent(&self, limit: usize) -> Vec<&LoanRecord> {
        self.loans.iter().rev().take(limit).collect()
    }

    /// 貸出記録の検索
    ///
    /// 借り手の名前・メールアドレス、または参照先書籍のタイトルに
    /// 大文字小文字を区別せず部分一致するもの。書籍タイトルは呼び出し側が引く。
    pub fn search<'a, 'b, F>(&'a self, query: &str, title_of: F) -> Vec<&'a LoanRecord>
    where
        F: Fn(&BookId) -> Option<&'b str>,
    {
        let q = query.to_lowercase();
        self.loans
            .iter()
            .filter(|l| {
                l.user_name.to_lowercase().contains(&q)
                    || l.user_email.to_lowercase().contains(&q)
                    || title_of(&l.book_id).is_some_and(|t| t.to_lowercase().contains(&q))
            })
            .collect()
    }

    /// 人気ランキング（上位10件）
    pub fn popularity(&self) -> Vec<(BookId, usize)> {
        let mut counts = self.issue_counts();
        counts.truncate(POPULAR_LIMIT);
        counts
    }

    /// 書籍ごとの貸出回数（全ステータス）を降順に並べたもの。件数の制限なし
    ///
    /// 同数の場合は台帳での初出順。
    pub fn issue_counts(&self) -> Vec<(BookId, usize)> {
        let mut counts: Vec<(BookId, usize)> = Vec::new();
        let mut index: HashMap<&BookId, usize> = HashMap::new();
        for loan in &self.loans {
            match index.get(&loan.book_id) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(&loan.book_id, counts.len());
                    counts.push((loan.book_id.clone(), 1));
                }
            }
        }
        // sort_by は安定ソートなので同数は初出順のまま
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}
