pub mod error;
pub mod locator;
pub mod outcome;
pub mod request;
