//! Common types shared across the tokenflight crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
