pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod group;
pub mod group_student;
pub mod paths;
pub mod roll;
pub mod roll_state;
pub mod student;
pub mod types;

pub use error::{Result, RollcallError};
