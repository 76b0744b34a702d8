//! # lux-panel
//!
//! Runs on the **display** side. Listens for chunked pixel frames over
//! UDP, reassembles and decodes them through `lux-core`, and previews
//! the matrix in the terminal next to live link statistics.

pub mod config;
pub mod sink;
pub mod ui;
