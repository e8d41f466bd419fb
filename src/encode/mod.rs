//! Frame sinks.
//!
//! Sinks consume rendered frames in index order and are driven by the sweep renderer.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
