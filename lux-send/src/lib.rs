//! # lux-send
//!
//! Runs on the **feed** side. Renders a test pattern, encodes it for
//! the wire, and streams it to a panel as chunked UDP datagrams at a
//! fixed frame rate. Useful for exercising a panel (or `lux-panel`)
//! without a real video source.

pub mod pattern;
pub mod service;
