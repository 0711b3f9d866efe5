// Format registry — the lookup table of every builtin optimizer plus
// whatever custom formats a host has compiled and registered at
// runtime.
//
// Grounded on the Tauri app's own pattern of a process-wide, lazily
// built static table (`lazy_static!` guarding a `Mutex`/`RwLock`) that
// the command layer looks formats up in by id.

use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;

use crate::model::{Format, UserFormat};
use crate::platforms::{amazon, ebay, etsy, shopify, woocommerce};

fn builtin_formats() -> Vec<Format> {
    vec![
        shopify::format(),
        woocommerce::format(),
        woocommerce::format_variable(),
        amazon::format(),
        ebay::format(),
        etsy::format(),
    ]
}

lazy_static! {
    // Keyed by format id. `Format` holds a boxed closure and isn't
    // `Clone`, so we keep the `UserFormat` source of truth here and
    // compile a fresh `Format` on every lookup instead of trying to
    // share one compiled closure across callers.
    static ref CUSTOM_FORMATS: RwLock<HashMap<String, UserFormat>> = RwLock::new(HashMap::new());
}

/// The set of formats known to the engine: builtin optimizers plus
/// whatever custom formats a host has registered.
pub struct FormatRegistry;

impl FormatRegistry {
    /// Look up a format by id, checking custom (user-defined) formats
    /// first so a host can shadow a builtin id if it chooses to. A
    /// stored format that fails structural validation is treated as
    /// unresolvable rather than panicking — registration should have
    /// caught that already, but a lookup is not the place to surface it.
    pub fn resolve(id: &str) -> Option<Format> {
        if let Some(user_format) = CUSTOM_FORMATS.read().unwrap().get(id) {
            return match crate::custom::compile_user_format(user_format) {
                Ok(format) => Some(format),
                Err(err) => {
                    log::warn!("stored custom format `{}` failed to compile: {}", id, err);
                    None
                }
            };
        }
        builtin_formats().into_iter().find(|f| f.id == id)
    }

    /// Validate and register a user-defined format, overwriting any
    /// previous registration under the same id. Rejects the format
    /// up front with `EngineError::InvalidUserFormat` rather than
    /// storing something every later `resolve`/`list` call would have
    /// to fail on.
    pub fn register_user_format(user_format: UserFormat) -> Result<(), crate::error::EngineError> {
        crate::custom::compile_user_format(&user_format)?;
        CUSTOM_FORMATS.write().unwrap().insert(user_format.id.clone(), user_format);
        Ok(())
    }

    pub fn unregister_user_format(id: &str) {
        CUSTOM_FORMATS.write().unwrap().remove(id);
    }

    /// All formats currently known, builtin first then custom, for
    /// host-side format pickers. A stored format that no longer
    /// compiles (see [`FormatRegistry::resolve`]) is skipped rather
    /// than panicking the whole listing.
    pub fn list() -> Vec<Format> {
        let mut formats = builtin_formats();
        formats.extend(
            CUSTOM_FORMATS
                .read()
                .unwrap()
                .values()
                .filter_map(|uf| crate::custom::compile_user_format(uf).ok()),
        );
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_builtin_id() {
        for id in [
            "shopify_products",
            "woocommerce_products",
            "woocommerce_variable",
            "amazon_inventory_loader",
            "ebay_listings",
            "etsy_listings",
        ] {
            assert!(FormatRegistry::resolve(id).is_some(), "missing builtin format {}", id);
        }
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        assert!(FormatRegistry::resolve("not_a_format").is_none());
    }

    #[test]
    fn register_and_resolve_a_custom_format() {
        let uf = UserFormat {
            version: 1,
            id: "registry_test_custom".to_string(),
            name: "Registry Test".to_string(),
            source: "user".to_string(),
            columns: vec![crate::model::UserColumn {
                id: "a".to_string(),
                key: None,
                title: Some("A".to_string()),
                required: false,
                default_value: None,
            }],
            rules: Vec::new(),
            global_rules: Vec::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            extra: serde_json::Map::new(),
        };
        assert!(FormatRegistry::register_user_format(uf).is_ok());
        assert!(FormatRegistry::resolve("registry_test_custom").is_some());
        FormatRegistry::unregister_user_format("registry_test_custom");
        assert!(FormatRegistry::resolve("registry_test_custom").is_none());
    }

    #[test]
    fn register_rejects_a_structurally_invalid_format() {
        let uf = UserFormat {
            version: 1,
            id: "registry_test_invalid".to_string(),
            name: "Invalid".to_string(),
            source: "user".to_string(),
            columns: vec![
                crate::model::UserColumn {
                    id: "dup".to_string(),
                    key: None,
                    title: Some("A".to_string()),
                    required: false,
                    default_value: None,
                },
                crate::model::UserColumn {
                    id: "dup".to_string(),
                    key: None,
                    title: Some("B".to_string()),
                    required: false,
                    default_value: None,
                },
            ],
            rules: Vec::new(),
            global_rules: Vec::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            extra: serde_json::Map::new(),
        };
        assert!(FormatRegistry::register_user_format(uf).is_err());
        assert!(FormatRegistry::resolve("registry_test_invalid").is_none());
    }
}
