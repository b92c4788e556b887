//! Domain model for cities and per-user map preferences.
//!
//! # Invariants
//! - City names are exact, case-sensitive keys.
//! - A marker color is always one of the six palette values.

pub mod city;
pub mod preference;
