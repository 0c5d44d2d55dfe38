//! Utility functions for file handling and other operations

pub mod file_utils;
pub mod misc;

pub use file_utils::*;
pub use misc::*;
