use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::application::{CatalogStore, LoanLedger};
use crate::domain::{
    self, Book, BookId, BookUpdate, IssueBookError, LoanRecord, NewBook, ReturnBookError,
    commands::{IssueBook, ReturnBook},
};
use crate::ports::{BOOKS_KEY, LOANS_KEY, SnapshotStore};

use super::errors::{LibraryError, Result};
use super::sample_catalog::sample_books;

/// 読み込み時のオプション
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// 書籍スナップショットがない場合にサンプル蔵書を投入する
    pub seed_sample_catalog: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            seed_sample_catalog: true,
        }
    }
}

/// 返却の結果
///
/// `Returned`以外はいずれも状態を変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// 返却した
    Returned(LoanRecord),
    /// 貸出記録が存在しない
    LoanNotFound,
    /// 参照先の書籍がカタログから削除されている
    BookMissing,
    /// 既に返却済み
    AlreadyReturned,
}

/// 図書館
///
/// カタログストアと貸出台帳を所有し、両方にまたがる操作
/// （貸出・返却・削除）を1つの論理トランザクションとして扱う。
///
/// 変更のたびにスナップショット全体を保存する。保存に失敗した場合は
/// メモリ上の状態を変更前に戻し、`StorageError`を返す。
pub struct Library {
    catalog: CatalogStore,
    ledger: LoanLedger,
    store: Arc<dyn SnapshotStore>,
}

impl Library {
    /// スナップショットストアから読み込む
    ///
    /// 書籍スナップショットがなく`seed_sample_catalog`が有効な場合は
    /// サンプル蔵書を投入して保存する。
    pub async fn load(store: Arc<dyn SnapshotStore>, options: LoadOptions) -> Result<Self> {
        let books: Option<Vec<Book>> = load_snapshot(store.as_ref(), BOOKS_KEY).await?;
        let loans: Option<Vec<LoanRecord>> = load_snapshot(store.as_ref(), LOANS_KEY).await?;

        let seeded = books.is_none() && options.seed_sample_catalog;
        let books = match books {
            Some(books) => books,
            None if seeded => sample_books(),
            None => Vec::new(),
        };

        let library = Self {
            catalog: CatalogStore::from_books(books),
            ledger: LoanLedger::from_loans(loans.unwrap_or_default()),
            store,
        };

        if seeded {
            library.persist(&[BOOKS_KEY]).await?;
            tracing::info!(books = library.catalog.len(), "Seeded sample catalog");
        }

        for (book_id, on_loan, issued) in library.copy_count_mismatches() {
            tracing::warn!(
                book_id = %book_id,
                on_loan,
                issued,
                "Copy counts do not match issued loans"
            );
        }

        tracing::info!(
            books = library.catalog.len(),
            loans = library.ledger.len(),
            "Library loaded"
        );

        Ok(library)
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    /// 書籍を登録する
    ///
    /// 新規タイトルには貸出記録がないため、`available == total`でなければならない。
    pub async fn add_book(&mut self, new_book: NewBook) -> Result<Book> {
        if new_book.copies.on_loan() != 0 {
            return Err(LibraryError::CopyCountsOutOfSync {
                on_loan: new_book.copies.on_loan(),
                issued: 0,
            });
        }

        let before = self.catalog.clone();
        let book = self.catalog.add(new_book);

        if let Err(e) = self.persist(&[BOOKS_KEY]).await {
            self.catalog = before;
            return Err(e);
        }

        tracing::info!(book_id = %book.id, title = %book.title, "Book added");
        Ok(book)
    }

    /// 書籍を編集する
    ///
    /// ビジネスルール：
    /// - IDが存在しない場合は何もせず`Ok(None)`
    /// - 総冊数だけを変更した場合、貸出可能数も同じだけ増減する
    /// - 蔵書数を変更する場合、結果は `総冊数 - 貸出可能数 == 貸出中の記録数` を満たすこと
    pub async fn edit_book(&mut self, id: &BookId, update: BookUpdate) -> Result<Option<Book>> {
        let Some(current) = self.catalog.get_by_id(id) else {
            return Ok(None);
        };

        let update = shift_available_with_total(current, update)?;
        let issued = self.ledger.issued_count_for_book(id);

        let before = self.catalog.clone();
        let updated = self
            .catalog
            .update(id, &update)
            .map_err(|e| LibraryError::InvalidCopyCounts(e.to_string()))?;

        let Some(updated) = updated else {
            return Ok(None);
        };

        if update.touches_copies() && updated.copies.on_loan() != issued {
            self.catalog = before;
            return Err(LibraryError::CopyCountsOutOfSync {
                on_loan: updated.copies.on_loan(),
                issued,
            });
        }

        if let Err(e) = self.persist(&[BOOKS_KEY]).await {
            self.catalog = before;
            return Err(e);
        }

        tracing::info!(book_id = %id, "Book updated");
        Ok(Some(updated))
    }

    /// 書籍を削除する
    ///
    /// 貸出中の記録が残っている書籍は削除できない
    /// （返却できない貸出記録が残るのを防ぐ）。
    /// IDが存在しない場合は何もせず`Ok(None)`。
    pub async fn remove_book(&mut self, id: &BookId) -> Result<Option<Book>> {
        let issued = self.ledger.issued_count_for_book(id);
        if issued > 0 && self.catalog.get_by_id(id).is_some() {
            tracing::warn!(book_id = %id, issued, "Refused to delete book with active loans");
            return Err(LibraryError::BookHasActiveLoans(issued));
        }

        let before = self.catalog.clone();
        let Some(removed) = self.catalog.delete(id) else {
            return Ok(None);
        };

        if let Err(e) = self.persist(&[BOOKS_KEY]).await {
            self.catalog = before;
            return Err(e);
        }

        tracing::info!(book_id = %id, title = %removed.title, "Book deleted");
        Ok(Some(removed))
    }

    /// 書籍を貸し出す
    ///
    /// ビジネスルール：
    /// - 書籍が存在し、貸出可能数が1以上であること
    /// - 返却期限は貸出日 + 14日
    /// - 書籍の貸出可能数をちょうど1減らす
    ///
    /// 台帳とカタログの更新は1回の`save_many`で保存する。
    /// 失敗した場合はどちらの変更も残らない。
    pub async fn issue_book(&mut self, cmd: IssueBook) -> Result<LoanRecord> {
        // 1. 書籍の存在確認
        let Some(book) = self.catalog.get_by_id(&cmd.book_id) else {
            tracing::warn!(book_id = %cmd.book_id, "Issue rejected: unknown book");
            return Err(LibraryError::NotAvailable);
        };

        // 2. ドメイン層の純粋関数を呼び出し
        let (updated_book, loan) = domain::loan::issue_book(book, cmd.borrower, cmd.issued_at)
            .map_err(|e| match e {
                IssueBookError::NotAvailable => LibraryError::NotAvailable,
            })
            .inspect_err(|_| {
                tracing::warn!(book_id = %cmd.book_id, "Issue rejected: no copies available");
            })?;

        // 3. 両方のコレクションを更新
        let before = (self.catalog.clone(), self.ledger.clone());
        self.catalog.replace(updated_book);
        self.ledger.append(loan.clone());

        // 4. まとめて保存
        if let Err(e) = self.persist(&[BOOKS_KEY, LOANS_KEY]).await {
            (self.catalog, self.ledger) = before;
            return Err(e);
        }

        tracing::info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            user_id = %loan.user_id,
            due_date = %loan.due_date,
            "Book issued"
        );
        Ok(loan)
    }

    /// 書籍を返却する
    ///
    /// ビジネスルール：
    /// - 貸出記録が存在しない、書籍が削除済み、既に返却済みの場合は何もしない
    /// - 延滞していても返却は受け付ける
    /// - 書籍の貸出可能数をちょうど1増やす
    pub async fn return_book(&mut self, cmd: ReturnBook) -> Result<ReturnOutcome> {
        // 1. 貸出記録の確認
        let Some(loan) = self.ledger.get_by_id(&cmd.loan_id) else {
            return Ok(ReturnOutcome::LoanNotFound);
        };

        // 2. 書籍の確認
        let Some(book) = self.catalog.get_by_id(&loan.book_id) else {
            tracing::warn!(loan_id = %cmd.loan_id, book_id = %loan.book_id, "Return skipped: book no longer in catalog");
            return Ok(ReturnOutcome::BookMissing);
        };

        // 3. ドメイン層の純粋関数を呼び出し
        let (updated_book, returned_loan) =
            match domain::loan::return_book(book, loan, cmd.returned_at) {
                Ok(result) => result,
                Err(ReturnBookError::AlreadyReturned) => {
                    return Ok(ReturnOutcome::AlreadyReturned);
                }
                Err(e) => return Err(LibraryError::DomainError(format!("{:?}", e))),
            };

        // 4. 両方のコレクションを更新
        let before = (self.catalog.clone(), self.ledger.clone());
        self.catalog.replace(updated_book);
        self.ledger.replace(returned_loan.clone());

        // 5. まとめて保存
        if let Err(e) = self.persist(&[BOOKS_KEY, LOANS_KEY]).await {
            (self.catalog, self.ledger) = before;
            return Err(e);
        }

        tracing::info!(
            loan_id = %returned_loan.id,
            book_id = %returned_loan.book_id,
            "Book returned"
        );
        Ok(ReturnOutcome::Returned(returned_loan))
    }

    /// 貸出記録の検索（借り手の名前・メール、書籍タイトル）
    pub fn search_loans(&self, query: &str) -> Vec<&LoanRecord> {
        let catalog = &self.catalog;
        self.ledger.search(query, |id| {
            catalog.get_by_id(id).map(|b| b.title.as_str())
        })
    }

    /// 蔵書数と貸出台帳の不一致を検出する
    ///
    /// `(書籍ID, 総冊数 - 貸出可能数, 貸出中の記録数)` の一覧。空なら整合している。
    pub fn copy_count_mismatches(&self) -> Vec<(BookId, u32, u32)> {
        self.catalog
            .all()
            .iter()
            .filter_map(|book| {
                let issued = self.ledger.issued_count_for_book(&book.id);
                let on_loan = book.copies.on_loan();
                (on_loan != issued).then(|| (book.id.clone(), on_loan, issued))
            })
            .collect()
    }

    /// 指定したキーのスナップショットを保存する
    async fn persist(&self, keys: &[&'static str]) -> Result<()> {
        let mut entries: Vec<(&'static str, Value)> = Vec::with_capacity(keys.len());
        for &key in keys {
            let value = match key {
                BOOKS_KEY => serde_json::to_value(self.catalog.all()),
                _ => serde_json::to_value(self.ledger.all()),
            }
            .map_err(|e| LibraryError::StorageError(Box::new(e)))?;
            entries.push((key, value));
        }

        self.store.save_many(entries).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist library snapshot");
            LibraryError::StorageError(e)
        })
    }
}

/// 総冊数だけが指定された場合、貸出可能数を同じ差分だけ動かす
fn shift_available_with_total(book: &Book, mut update: BookUpdate) -> Result<BookUpdate> {
    if let (Some(total), None) = (update.total_copies, update.available_copies) {
        let delta = i64::from(total) - i64::from(book.copies.total());
        let available = i64::from(book.copies.available()) + delta;
        let available = u32::try_from(available).map_err(|_| {
            LibraryError::InvalidCopyCounts(format!(
                "cannot reduce total copies to {} while {} are on loan",
                total,
                book.copies.on_loan()
            ))
        })?;
        update.available_copies = Some(available);
    }
    Ok(update)
}

async fn load_snapshot<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    key: &'static str,
) -> Result<Option<T>> {
    let Some(value) = store.load(key).await.map_err(LibraryError::StorageError)? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| LibraryError::CorruptSnapshot { key, source })
}
