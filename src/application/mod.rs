pub mod catalog;
pub mod ledger;
pub mod library;
pub mod session;

pub use catalog::CatalogStore;
pub use ledger::LoanLedger;
pub use library::{Library, LibraryError, LoadOptions, ReturnOutcome};
pub use session::{RegisterUser, Session, SessionError};
