pub mod args;
pub mod concat;
pub mod init;
pub mod logging;
