pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod instrumentation;
pub mod llm;
pub mod prompt;
pub mod search;
pub mod session;
pub mod web;
