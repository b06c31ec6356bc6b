pub mod analysis_pass;
pub mod diagnostics;
pub mod name_resolution;
pub mod ty;
