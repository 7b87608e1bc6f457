pub mod build;
pub mod init;
pub mod lint;
pub mod watch;
