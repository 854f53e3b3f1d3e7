pub mod files;
pub mod progress;
pub mod validation;
