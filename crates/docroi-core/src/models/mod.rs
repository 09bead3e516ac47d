//! Data models for document templates, records and configuration.

pub mod config;
pub mod document;
pub mod record;
