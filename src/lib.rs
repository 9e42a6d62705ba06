//! Natural-language-to-SQL query service.
//!
//! A question goes in; an LLM turns it into SQL; the SQL runs against
//! PostgreSQL; the results come back as display-safe records with a summary
//! message and a chart-type hint. Database failures never surface raw: they
//! pass through the error classifier and come out as friendly explanations.

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod response;
pub mod result;
pub mod service;
pub mod sqlgen;
