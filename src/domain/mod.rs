pub mod book;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod user;
pub mod value_objects;

pub use book::{Book, BookUpdate, NewBook};
pub use errors::*;
pub use loan::{Borrower, LoanRecord, LoanState, LoanStatus};
pub use user::{Role, User};
pub use value_objects::*;
