//! Horologion Calendar - Hebrew calendar conversion
//!
//! Pure calendar arithmetic: a Gregorian-anchored instant in, a
//! `HebrewDate` out. No state is carried between conversions.

pub mod hebrew;

pub use hebrew::*;
