//! Notemark CLI library.
//!
//! Input loading and the command implementations behind the `notemark`
//! binary.

pub mod commands;
pub mod input;
