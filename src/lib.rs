//! Web functions that resize images and extract text from them
//!
//! Each function accepts a base64 body and a raw query string from the hosting
//! runtime, runs one processing engine, and always answers with a structured
//! result that echoes the caller's test id.

pub mod bridge;
pub mod envelope;
pub mod error;
pub mod functions;
pub mod image;
pub mod models;
pub mod ocr;

pub use error::{Error, Result};
