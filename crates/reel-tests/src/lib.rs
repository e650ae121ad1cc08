//! Integration test crate for Reel.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple reel crates to verify they work together.

#[cfg(test)]
mod timeline;

#[cfg(test)]
mod session;
