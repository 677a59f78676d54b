//! G-Code parser and state machine
//!
//! This module provides:
//! - G-Code command parsing
//! - Modal state tracking
//! - Absolute position resolution
//! - Line streaming with byte accounting

pub mod command;
pub mod parser;
pub mod position;
pub mod stream;

pub use command::*;
pub use parser::*;
pub use position::*;
