//! qrslide-core: slide wire format and configuration.
//! The session crates and the binary depend on this one.

pub mod config;
pub mod slide;

pub use slide::{FrameDefect, Slide, SlideError, SlideKind};
