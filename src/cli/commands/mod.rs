pub mod classify;
pub mod config;
pub mod sections;
pub mod update;
