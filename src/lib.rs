pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod quality;
pub mod schema;
pub mod storage;
