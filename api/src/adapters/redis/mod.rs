//! Redis adapters

pub mod cache;

pub use cache::RedisCache;
