//! The library code for the `quire` blog indexer. A build is a single pass
//! over the site's content directory that produces the data the page layer
//! renders from:
//!
//! 1. Indexing posts from source files on disk ([`crate::index`])
//! 2. Extending every page's data from the index ([`crate::plugin`])
//!
//! Indexing walks the posts directory and turns each content file into a
//! [`post::PostInfo`]. A post's route comes from its file name: the name is
//! matched against the filename [`permalink::Permalink`] (for example
//! `:year-:month-:day-:title`) and the extracted fields are rendered through
//! the route permalink (for example `:year/:month/:day/:title/`). Front
//! matter can override the title, date, tags and summary. The resulting
//! index holds every post sorted by date, most recent first, and the posts
//! grouped by tag.
//!
//! The index is a plain value returned from [`index::build_index`]; building
//! it twice over the same files gives the same result.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod index;
pub mod markdown;
pub mod permalink;
pub mod plugin;
pub mod post;
pub mod tag;
mod util;
