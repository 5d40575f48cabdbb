//! The character descriptor : which variant and colour fills each layer slot.

use crate::catalog::LayerSlot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod generator;

pub use generator::Generator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct LayerVariant {
    /// Index into the slot's file list
    #[serde(rename = "type")]
    pub kind: usize,
    /// Colour band of the slot's palette
    pub color: usize,
}

impl LayerVariant {
    pub fn new(kind: usize, color: usize) -> Self {
        LayerVariant { kind, color }
    }
}

/// Layer slot -> variant. Empty slots are absent and never drawn.
///
/// There is no way to edit a character in place : a different look is a
/// different `Character`, which keeps any cached layer images keyed on the
/// old one trivially stale.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Character {
    layers: BTreeMap<LayerSlot, LayerVariant>,
}

impl Character {
    pub fn new(layers: impl IntoIterator<Item = (LayerSlot, LayerVariant)>) -> Self {
        Character {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn get(&self, slot: LayerSlot) -> Option<LayerVariant> {
        self.layers.get(&slot).copied()
    }

    pub fn contains(&self, slot: LayerSlot) -> bool {
        self.layers.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Populated slots in enum order (not draw order)
    pub fn slots(&self) -> impl Iterator<Item = LayerSlot> + '_ {
        self.layers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerSlot, LayerVariant)> + '_ {
        self.layers.iter().map(|(slot, variant)| (*slot, *variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_the_page_descriptor_shape() {
        let character: Character =
            serde_json::from_str(r#"{ "hair": { "type": 3, "color": 2 }, "base": { "type": 0, "color": 1 } }"#)
                .unwrap();

        assert_eq!(character.len(), 2);
        assert_eq!(character.get(LayerSlot::Hair), Some(LayerVariant::new(3, 2)));
        assert!(!character.contains(LayerSlot::Hat));
    }
}
