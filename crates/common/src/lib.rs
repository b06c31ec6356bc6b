pub mod config;
pub mod diagnostics;

pub use indexmap;
