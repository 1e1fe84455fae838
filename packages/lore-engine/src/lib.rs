pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod logging;
pub mod oracle;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod retrieval;
pub mod scoring;
pub mod sink;
pub mod stories;
