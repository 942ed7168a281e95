#![allow(clippy::new_without_default)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod resolver;
pub mod scraper;
pub mod search;
