//! Core definitions (error taxonomy and verification helpers), relied upon by
//! all tessera-* crates.

pub mod error;
pub mod result;

pub use result::Result;
