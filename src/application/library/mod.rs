mod errors;
mod library_service;
mod reports;
mod sample_catalog;

pub use errors::{LibraryError, Result};
pub use library_service::{Library, LoadOptions, ReturnOutcome};
pub use reports::{
    CategoryCount, IssuedReportEntry, OverdueReportEntry, Overview, PopularReportEntry,
    RECENT_ACTIVITY_LIMIT,
};
pub use sample_catalog::sample_books;
