//! Common types and utilities for the jinfer inference engine.
//!
//! This crate provides foundational types used across all jinfer crates:
//! - String interning (`Atom`, `Interner`)
//! - Centralized limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;
