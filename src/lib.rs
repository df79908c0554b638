pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod logging;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod supabase;
pub mod types;
pub mod writer;
