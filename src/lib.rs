//! cuedeck: a terminal request helper.
//!
//! Keeps reusable text snippets and an ordered deck of URLs with a viewer
//! that steps through them, backed by a local SQLite store.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod export;
pub mod reorder;
pub mod storage;
pub mod title;
pub mod ui;
pub mod util;
pub mod viewer;
