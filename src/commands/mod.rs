pub mod config;
pub mod convert;
pub mod export;
pub mod lessons;
pub mod teachings;
