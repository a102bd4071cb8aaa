pub mod attribute;
pub mod bounds;
pub mod cache;
pub mod client;
pub mod colormap;
pub mod compose;
pub mod config;
pub mod district;
pub mod enrich;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod records;
pub mod web;

pub use attribute::ResourceAttribute;
pub use config::AtlasConfig;
pub use pipeline::{Atlas, RenderOutput};
