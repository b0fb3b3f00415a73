//! Shared utilities for feature slices

pub mod validation;
