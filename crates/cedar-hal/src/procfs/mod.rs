//! Parsers for procfs files.

pub mod mountinfo;
