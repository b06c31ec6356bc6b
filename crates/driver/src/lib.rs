pub mod db;
pub mod diagnostics;

pub use db::{DiagnosticsCollection, DriverDataBase, SymbolError};
