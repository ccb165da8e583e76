pub mod catalog;
pub use catalog::Catalog;

pub mod driver;
pub use driver::Connection;

mod error;
pub use error::{Error, IntoError};

pub mod mapping;

pub mod stmt;

/// A Result type alias that uses Saddle's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
