//! photosieve - Perceptual Image Duplicate Finder
//!
//! A cross-platform Rust CLI for finding near-duplicate photos using
//! perceptual hashing (DCT and row-gradient hash families), grouping them
//! into identical and similar tiers, and moving redundant copies aside with
//! reversible, undo-logged moves. Files are never deleted.

pub mod actions;
pub mod app;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

pub use app::run_app;
