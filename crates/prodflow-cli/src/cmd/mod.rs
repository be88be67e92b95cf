pub mod advance;
pub mod check;
pub mod init;
pub mod list;
pub mod stage;
pub mod status;
