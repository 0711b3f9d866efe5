// Presets — host-facing metadata for picking a builtin format, plus a
// sample CSV generator so a host can show "here's what this looks
// like" before a user uploads anything.
//
// Grounded on the Tauri app's catalog of named presets surfaced to the
// frontend; generalized from a fixed liquidation-category list to
// whatever `Format`s the registry currently knows about.

use crate::csv_codec;
use crate::model::{FormatCategory, FormatSource, Headers, Row};
use crate::registry::FormatRegistry;

#[derive(Debug, Clone)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: FormatCategory,
    pub source: FormatSource,
}

impl Preset {
    /// A one-row sample CSV for this preset's format, built from its
    /// `expected_headers`/`example_row`. Returns `None` for a format
    /// that doesn't publish an example (e.g. a custom format with no
    /// sample data attached).
    pub fn sample_csv(&self) -> Option<String> {
        let format = FormatRegistry::resolve(&self.id)?;
        let headers = format.expected_headers?;
        let example = format.example_row.unwrap_or_default();
        let headers = Headers::new(headers);
        let mut row = Row::new();
        for (i, h) in headers.iter().enumerate() {
            row.set(h.clone(), example.get(i).cloned().unwrap_or_default());
        }
        Some(csv_codec::serialize(&headers, &[row]))
    }
}

/// List every format currently registered (builtin + custom) as a
/// [`Preset`] summary, for a host's format picker.
pub fn list_presets() -> Vec<Preset> {
    FormatRegistry::list()
        .into_iter()
        .map(|f| Preset {
            id: f.id,
            name: f.name,
            description: f.description,
            category: f.category,
            source: f.source,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_preset_produces_a_sample_csv() {
        for preset in list_presets() {
            if preset.source != FormatSource::Builtin {
                continue;
            }
            let sample = preset.sample_csv();
            assert!(sample.is_some(), "no sample for {}", preset.id);
            assert!(sample.unwrap().ends_with('\n'));
        }
    }
}
