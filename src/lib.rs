//! Basketball player tracking: clean one player's path and draw it on a half court.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod render;
pub mod signal;
