pub mod file;
pub mod memory;
pub mod mock;
pub mod postgres;
