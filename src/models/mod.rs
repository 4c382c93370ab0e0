// src/models/mod.rs

//! Domain models for the results crawler.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod link;
mod record;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, EventNameMapping, GenderKeywords, HeaderLayout, HtmlConfig,
    NameTables, PdfConfig, SeasonConfig,
};
pub use link::{LinkDescriptor, PageContext};
pub use record::{Field, Gender, GroupedCollection, ResultRecord, ResultSet};
