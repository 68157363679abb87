//! Vista3 HTTP adapter

pub mod client;

pub use client::{ChunkOptions, VistaClientImpl};
