//! Catalog CSV Engine — validation and normalization core for
//! marketplace product feeds (Shopify, WooCommerce, Amazon, eBay, Etsy,
//! and user-defined custom formats).
//!
//! The crate never talks to disk, a database, or a UI; a host embeds
//! it and drives [`engine::Engine::apply`] with CSV text it has already
//! read and a [`model::Format`] resolved from [`registry::FormatRegistry`].

pub mod csv_codec;
pub mod custom;
pub mod engine;
pub mod error;
pub mod issue;
pub mod model;
pub mod money;
pub mod normalizer;
pub mod platforms;
pub mod presets;
pub mod quota;
pub mod registry;
pub mod variant_resolver;

pub use engine::{Engine, EngineConfig, EngineSettings};
pub use error::EngineError;
pub use model::{FixResult, Format, Headers, Issue, Row, Severity, UserFormat};
pub use registry::FormatRegistry;
