use crate::domain::{
    Book, BookId, BookUpdate, CopyCountError, NewBook,
    book::{apply_update, matches_query},
};

/// カタログストア
///
/// 書籍コレクションを排他的に所有する。並び順は登録順。
/// 永続化は行わない（`Library`がスナップショットを保存する）。
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    books: Vec<Book>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のスナップショットから復元
    pub fn from_books(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// 新しいIDを付与して末尾に追加する
    ///
    /// ISBNの重複チェックはしない。常に成功する。
    pub fn add(&mut self, new_book: NewBook) -> Book {
        let book = new_book.into_book(BookId::new());
        self.books.push(book.clone());
        book
    }

    /// IDに一致する書籍にフィールドをマージする
    ///
    /// IDが存在しない場合は何もせず`Ok(None)`を返す。
    pub fn update(
        &mut self,
        id: &BookId,
        update: &BookUpdate,
    ) -> Result<Option<Book>, CopyCountError> {
        let Some(slot) = self.books.iter_mut().find(|b| &b.id == id) else {
            return Ok(None);
        };
        let updated = apply_update(slot, update)?;
        *slot = updated.clone();
        Ok(Some(updated))
    }

    /// 書籍を丸ごと置き換える（貸出・返却で使用）
    pub(crate) fn replace(&mut self, book: Book) -> bool {
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book;
                true
            }
            None => false,
        }
    }

    /// IDに一致する書籍を削除する
    ///
    /// 貸出中かどうかは確認しない。存在しない場合は`None`。
    pub fn delete(&mut self, id: &BookId) -> Option<Book> {
        let index = self.books.iter().position(|b| &b.id == id)?;
        Some(self.books.remove(index))
    }

    /// 検索
    ///
    /// タイトル・著者・カテゴリは大文字小文字を区別しない部分一致、
    /// ISBNは生のクエリで部分一致。空白のみのクエリは全件を登録順で返す。
    pub fn search(&self, query: &str) -> Vec<&Book> {
        if query.trim().is_empty() {
            return self.books.iter().collect();
        }
        self.books
            .iter()
            .filter(|book| matches_query(book, query))
            .collect()
    }

    /// 検索結果をさらにカテゴリ（完全一致）で絞り込む
    pub fn browse(&self, query: &str, category: Option<&str>) -> Vec<&Book> {
        self.search(query)
            .into_iter()
            .filter(|book| category.is_none_or(|c| book.category == c))
            .collect()
    }

    pub fn get_by_id(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    pub fn all(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// カテゴリ一覧（重複なし、初出順）
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for book in &self.books {
            if !categories.contains(&book.category.as_str()) {
                categories.push(&book.category);
            }
        }
        categories
    }

    /// 貸出可能数が1以上の書籍
    pub fn available(&self) -> Vec<&Book> {
        self.books
            .iter()
            .filter(|b| b.copies.has_available())
            .collect()
    }

    /// 総蔵書数（全タイトルの総冊数の合計）
    pub fn total_copies(&self) -> u64 {
        self.books.iter().map(|b| u64::from(b.copies.total())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CopyCounts;

    fn new_book(title: &str, author: &str, category: &str, isbn: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            isbn: isbn.to_string(),
            published_year: 2008,
            description: None,
            image_url: None,
            copies: CopyCounts::fully_available(2).unwrap(),
        }
    }

    fn sample_store() -> CatalogStore {
        let mut store = CatalogStore::new();
        store.add(new_book(
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            "Fiction",
            "978-0-7432-7356-5",
        ));
        store.add(new_book(
            "Clean Code",
            "Robert C. Martin",
            "Programming",
            "978-0-13-235088-4",
        ));
        store.add(new_book(
            "To Kill a Mockingbird",
            "Harper Lee",
            "Fiction",
            "978-0-06-112008-4",
        ));
        store
    }

    #[test]
    fn test_add_assigns_fresh_ids_in_order() {
        let store = sample_store();
        let ids: Vec<&BookId> = store.all().iter().map(|b| &b.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    }

    #[test]
    fn test_add_allows_duplicate_isbn() {
        let mut store = sample_store();
        store.add(new_book("Clean Code", "Robert C. Martin", "Programming", "978-0-13-235088-4"));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let store = sample_store();
        let lower = store.search("clean");
        let upper = store.search("CLEAN");
        assert_eq!(lower.len(), 1);
        assert_eq!(lower[0].title, "Clean Code");
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_search_empty_query_returns_all_in_order() {
        let store = sample_store();
        let results = store.search("   ");
        let titles: Vec<&str> = results.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["The Great Gatsby", "Clean Code", "To Kill a Mockingbird"]
        );
    }

    #[test]
    fn test_search_matches_category_and_isbn() {
        let store = sample_store();
        assert_eq!(store.search("fiction").len(), 2);
        assert_eq!(store.search("112008").len(), 1);
    }

    #[test]
    fn test_browse_filters_by_category() {
        let store = sample_store();
        let results = store.browse("", Some("Fiction"));
        assert_eq!(results.len(), 2);
        assert!(store.browse("gatsby", Some("Programming")).is_empty());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = sample_store();
        let before = store.all().to_vec();
        let result = store.update(&BookId::from_string("missing"), &BookUpdate::default());
        assert_eq!(result, Ok(None));
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = sample_store();
        let id = store.all()[1].id.clone();
        let update = BookUpdate {
            category: Some("Software Engineering".to_string()),
            ..Default::default()
        };

        let updated = store.update(&id, &update).unwrap().unwrap();

        assert_eq!(updated.category, "Software Engineering");
        assert_eq!(store.get_by_id(&id).unwrap().title, "Clean Code");
    }

    #[test]
    fn test_delete_removes_record() {
        let mut store = sample_store();
        let id = store.all()[0].id.clone();
        assert!(store.delete(&id).is_some());
        assert!(store.get_by_id(&id).is_none());
        assert!(store.delete(&id).is_none());
    }

    #[test]
    fn test_categories_first_appearance_order() {
        let store = sample_store();
        assert_eq!(store.categories(), vec!["Fiction", "Programming"]);
    }

    #[test]
    fn test_total_copies() {
        assert_eq!(sample_store().total_copies(), 6);
    }
}
