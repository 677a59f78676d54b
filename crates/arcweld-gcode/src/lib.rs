//! # Arcweld G-code
//!
//! Command source for the welder: turns raw G-code lines into structured
//! commands and resolves the absolute machine position and modal state
//! for each of them.

pub mod gcode;

pub use gcode::{
    stream::{GcodeFileReader, GcodeLineReader, SourceLine},
    CommandParameter, GcodeParser, ModalState, ParsedCommand, PositionSnapshot, PositionTracker,
};
