use crate::domain::{Book, BookId, CopyCounts};

const COVER_URL: &str = "https://images.pexels.com/photos/159711/books-bookstore-book-reading-159711.jpeg?auto=compress&cs=tinysrgb&w=400";

/// 初回起動時に投入するサンプル蔵書
///
/// 貸出記録がない状態で投入するため、全冊貸出可能にしておく。
pub fn sample_books() -> Vec<Book> {
    [
        (
            "1",
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            "Fiction",
            "978-0-7432-7356-5",
            5,
            "A classic American novel set in the Jazz Age.",
            1925,
        ),
        (
            "2",
            "To Kill a Mockingbird",
            "Harper Lee",
            "Fiction",
            "978-0-06-112008-4",
            4,
            "A gripping tale of racial injustice and childhood innocence.",
            1960,
        ),
        (
            "3",
            "Introduction to Algorithms",
            "Thomas H. Cormen",
            "Computer Science",
            "978-0-262-03384-8",
            3,
            "Comprehensive introduction to algorithms and data structures.",
            2009,
        ),
        (
            "4",
            "Clean Code",
            "Robert C. Martin",
            "Programming",
            "978-0-13-235088-4",
            6,
            "A handbook of agile software craftsmanship.",
            2008,
        ),
        (
            "5",
            "The Catcher in the Rye",
            "J.D. Salinger",
            "Fiction",
            "978-0-316-76948-0",
            3,
            "The controversial coming-of-age story of Holden Caulfield.",
            1951,
        ),
    ]
    .into_iter()
    .filter_map(
        |(id, title, author, category, isbn, copies, description, year)| {
            Some(Book {
                id: BookId::from_string(id),
                title: title.to_string(),
                author: author.to_string(),
                category: category.to_string(),
                isbn: isbn.to_string(),
                published_year: year,
                description: Some(description.to_string()),
                image_url: Some(COVER_URL.to_string()),
                copies: CopyCounts::fully_available(copies).ok()?,
            })
        },
    )
    .collect()
}
