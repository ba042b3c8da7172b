pub mod filter;
pub mod group;
pub mod init;
pub mod roll;
pub mod serve;
pub mod student;
