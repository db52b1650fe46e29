//! Attribute merging for overlay output.

use serde::Deserialize;

use crate::feature::Properties;

/// How to resolve attribute names present on both overlay operands.
///
/// Configured as `"clip_wins"` or `"suffix"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The clip-side value replaces the base-side value.
    #[default]
    ClipWins,
    /// Keep both, renamed `<name>_1` (base) and `<name>_2` (clip).
    Suffix,
}

/// Combine the attributes of a base feature and a clip feature.
///
/// Base fields come first, followed by clip fields, each in their
/// original order.
pub fn merge_properties(base: &Properties, clip: &Properties, policy: CollisionPolicy) -> Properties {
    let mut merged = Properties::new();

    match policy {
        CollisionPolicy::ClipWins => {
            merged.extend(base.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged.extend(clip.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        CollisionPolicy::Suffix => {
            for (key, value) in base {
                let name = if clip.contains_key(key) {
                    format!("{}_1", key)
                } else {
                    key.clone()
                };
                merged.insert(name, value.clone());
            }
            for (key, value) in clip {
                let name = if base.contains_key(key) {
                    format!("{}_2", key)
                } else {
                    key.clone()
                };
                merged.insert(name, value.clone());
            }
        }
    }

    merged
}
