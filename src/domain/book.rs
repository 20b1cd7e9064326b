use serde::{Deserialize, Serialize};

use super::{BookId, CopyCounts};

/// Book集約 - カタログ上の1タイトルとその蔵書数
///
/// ISBNは自由入力の文字列（チェックサム検証なし）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    // 識別子
    pub id: BookId,

    // 書誌情報
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: String,
    pub published_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    // 蔵書数（totalCopies / availableCopies）
    #[serde(flatten)]
    pub copies: CopyCounts,
}

/// IDを持たない書籍（新規登録用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: String,
    pub published_year: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub copies: CopyCounts,
}

impl NewBook {
    /// IDを付与してBookにする
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            category: self.category,
            isbn: self.isbn,
            published_year: self.published_year,
            description: self.description,
            image_url: self.image_url,
            copies: self.copies,
        }
    }
}

/// 書籍の部分更新
///
/// `None`のフィールドは変更しない。
/// `description` / `image_url` は `Some(None)` で削除できる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    pub total_copies: Option<u32>,
    pub available_copies: Option<u32>,
}

/// 明示的な`null`を`Some(None)`として受け取る
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl BookUpdate {
    /// 蔵書数に関わる変更を含むか
    pub fn touches_copies(&self) -> bool {
        self.total_copies.is_some() || self.available_copies.is_some()
    }
}

/// 純粋関数：部分更新を適用する
///
/// 書誌情報はそのまま上書きする。蔵書数は指定されたものだけ置き換え、
/// 結果が`CopyCounts`の不変条件を満たさない場合はエラーを返す。
///
/// 副作用なし。新しいBookを返す。
pub fn apply_update(
    book: &Book,
    update: &BookUpdate,
) -> Result<Book, super::CopyCountError> {
    let total = update.total_copies.unwrap_or(book.copies.total());
    let available = update
        .available_copies
        .unwrap_or(book.copies.available());
    let copies = CopyCounts::new(total, available)?;

    Ok(Book {
        id: book.id.clone(),
        title: update.title.clone().unwrap_or_else(|| book.title.clone()),
        author: update.author.clone().unwrap_or_else(|| book.author.clone()),
        category: update
            .category
            .clone()
            .unwrap_or_else(|| book.category.clone()),
        isbn: update.isbn.clone().unwrap_or_else(|| book.isbn.clone()),
        published_year: update.published_year.unwrap_or(book.published_year),
        description: update
            .description
            .clone()
            .unwrap_or_else(|| book.description.clone()),
        image_url: update
            .image_url
            .clone()
            .unwrap_or_else(|| book.image_url.clone()),
        copies,
    })
}

/// 純粋関数：検索クエリに一致するか
///
/// タイトル・著者・カテゴリは大文字小文字を区別しない部分一致。
/// ISBNは生のクエリでの部分一致（小文字化しない）。
/// 空白のみのクエリは呼び出し側で全件扱いにする。
pub fn matches_query(book: &Book, query: &str) -> bool {
    let lowercase_query = query.to_lowercase();
    book.title.to_lowercase().contains(&lowercase_query)
        || book.author.to_lowercase().contains(&lowercase_query)
        || book.category.to_lowercase().contains(&lowercase_query)
        || book.isbn.contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_code() -> Book {
        Book {
            id: BookId::from_string("4"),
            title: "Clean Code".to_string(),
            author: "Robert C. Martin".to_string(),
            category: "Programming".to_string(),
            isbn: "978-0-13-235088-4".to_string(),
            published_year: 2008,
            description: Some("A handbook of agile software craftsmanship.".to_string()),
            image_url: None,
            copies: CopyCounts::new(6, 4).unwrap(),
        }
    }

    #[test]
    fn test_matches_query_is_case_insensitive_on_title() {
        let book = clean_code();
        assert!(matches_query(&book, "clean"));
        assert!(matches_query(&book, "CLEAN"));
    }

    #[test]
    fn test_matches_query_on_author_and_category() {
        let book = clean_code();
        assert!(matches_query(&book, "martin"));
        assert!(matches_query(&book, "programming"));
        assert!(!matches_query(&book, "fiction"));
    }

    #[test]
    fn test_matches_query_isbn_raw_substring() {
        let book = clean_code();
        assert!(matches_query(&book, "235088"));
        assert!(!matches_query(&book, "9780132"));
    }

    #[test]
    fn test_apply_update_merges_fields() {
        let book = clean_code();
        let update = BookUpdate {
            title: Some("Clean Code (2nd ed.)".to_string()),
            description: Some(None),
            ..Default::default()
        };

        let updated = apply_update(&book, &update).unwrap();

        assert_eq!(updated.title, "Clean Code (2nd ed.)");
        assert_eq!(updated.author, book.author);
        assert_eq!(updated.description, None);
        assert_eq!(updated.copies, book.copies);
    }

    #[test]
    fn test_apply_update_rejects_invalid_copies() {
        let book = clean_code();
        let update = BookUpdate {
            total_copies: Some(2),
            ..Default::default()
        };

        assert!(apply_update(&book, &update).is_err());
    }

    #[test]
    fn test_book_serializes_camel_case() {
        let json = serde_json::to_value(clean_code()).unwrap();
        assert_eq!(json["totalCopies"], 6);
        assert_eq!(json["availableCopies"], 4);
        assert_eq!(json["publishedYear"], 2008);
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_book_update_distinguishes_null_from_absent() {
        let update: BookUpdate = serde_json::from_str(r#"{"imageUrl":null}"#).unwrap();
        assert_eq!(update.image_url, Some(None));
        assert_eq!(update.description, None);
    }
}
