//! Tools for the lms.instructor.cz e-learning portal
//!
//! - [`portal`] completes pending courses and downloads certificates
//! - [`signature`] signs a downloaded certificate

pub mod credentials;
pub mod error;
pub mod filter;
pub mod logger;
pub mod portal;
pub mod query;
pub mod signature;
pub mod utils;

pub use error::{Error, Result};
