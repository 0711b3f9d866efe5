//! One module per target marketplace platform. Each exposes a
//! `format() -> Format` constructor that `registry.rs` wires into the
//! static builtin table.

pub mod amazon;
pub mod ebay;
pub mod etsy;
pub mod shopify;
pub mod woocommerce;
