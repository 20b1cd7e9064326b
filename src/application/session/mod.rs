mod errors;
mod session_service;

pub use errors::{Result, SessionError};
pub use session_service::{RegisterUser, Session};
