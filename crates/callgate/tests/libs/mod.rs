//! Callers living in separate directories.

#![allow(dead_code)]

pub mod math;
pub mod other;
