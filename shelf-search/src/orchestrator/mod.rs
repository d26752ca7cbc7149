//! Fetch-and-merge pipeline: concurrent catalog queries, similarity dedup.
//!
//! This module fans a page request out to every catalog adapter
//! concurrently, absorbs individual catalog failures, and folds the
//! surviving record lists into one duplicate-free page.

pub mod dedup;
pub mod search;
pub mod similarity;
