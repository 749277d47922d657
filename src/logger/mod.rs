pub mod cleanup;
pub mod init;
