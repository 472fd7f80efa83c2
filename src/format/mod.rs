//! Message text rendering.
//!
//! Everything here is pure: the same input always yields the same output and
//! nothing reads the clock or performs I/O. Malformed markup degrades to
//! literal text instead of failing.

pub mod markup;
pub mod text;
pub mod timestamp;

pub use markup::*;
pub use text::*;
pub use timestamp::*;
