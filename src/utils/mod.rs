//! Helpers for binaries and hosts embedding the client.

pub mod bootstrap;
