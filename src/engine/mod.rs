// Engine: the session cache, its normalizer and the read façade built on top.

pub mod cache;
pub mod filter;
pub mod normalize;
pub mod reader;
pub mod stats;
