//! Utility functions for the trellis framework.
//!
//! - [`text`]: naming conventions (camelize, underscore).

pub mod text;
