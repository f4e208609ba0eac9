//! localsite Core Library
//!
//! Configuration, city model, URL mapping and error handling shared by the
//! generator, the HTML rewriters and the CLI.

pub mod city;
pub mod config;
pub mod error;
pub mod url;

pub use city::{City, name_from_slug};
pub use config::Config;
pub use error::{CoreError, Result};
