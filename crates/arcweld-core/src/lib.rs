//! # Arcweld Core
//!
//! Core types shared by the arcweld crates: machine positions, units,
//! and the error types used across parsing, settings and welding.

pub mod data;
pub mod error;

pub use data::{Position, Units};
pub use error::{Error, GcodeError, Result, WelderError};
