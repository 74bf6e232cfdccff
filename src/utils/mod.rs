//! Utility modules shared by the pipelines.

pub mod date;
pub mod glob;
pub mod slug;
