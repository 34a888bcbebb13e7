//! Integration suite for the record cache.
//!
//! Exercises the manager, live record arrays, and the store contract as a
//! whole rather than module by module.

pub mod end_to_end_tests;
