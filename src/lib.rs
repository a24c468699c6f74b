//! Sinaliza - Interpreter Translation Workflow
//!
//! Library behind the sign-language translation front end: interpreters fetch
//! passages from registered web pages, record translation videos and submit
//! their links to the passage service.

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod forms;
pub mod notice;
pub mod passage;
pub mod service;
pub mod site;
pub mod workflow;
