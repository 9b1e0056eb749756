pub mod cli;
pub mod config;
pub mod export;
pub mod global;
pub mod jobs;
pub mod lifecycle;
pub mod presentation;
pub mod text_io;
