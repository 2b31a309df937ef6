pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod db;
pub mod decompress;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod layout;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod retrievers;
pub mod snapshot;
pub mod table;
pub mod transforms;
