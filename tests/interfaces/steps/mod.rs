//! Step definitions for the interface tests.

pub mod client;
