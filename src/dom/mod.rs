//! DOM model and structural queries
//!
//! This module provides the parsed view of a page that the locator engine
//! works against. It includes:
//! - Page: a parsed document with its URL and title
//! - ElementSnapshot: structural description of an element captured earlier
//! - ElementInfo: lightweight element metadata attached to captured steps
//! - query: unique selectors, id/class heuristics and uniqueness helpers

pub mod element;
pub mod page;
pub mod query;

pub use element::{ElementInfo, ElementSnapshot, is_truncated_text};
pub use page::Page;
pub use query::{ensure_unique_selector, is_meaningful_id, is_svg_element, unique_selector};

pub use scraper::ElementRef;
