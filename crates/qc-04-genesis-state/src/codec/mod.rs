//! Framing Codec
//!
//! How records are delimited and how a part header is laid out.

pub mod framing;

pub use framing::{FrameError, FrameReader, HeaderLayout};
