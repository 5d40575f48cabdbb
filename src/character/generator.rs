use super::{Character, LayerVariant};
use crate::catalog::{Catalog, LayerSlot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Rolls random characters from a catalog.
///
/// Slots are visited back to front. Each one is filled with probability
/// `presence`, with a uniformly random file and colour. A slot excluded by an
/// already worn slot is skipped, and wearing a slot takes off any earlier
/// slot it excludes, so the result never holds two exclusive slots.
pub struct Generator {
    catalog: Rc<Catalog>,
    rng: StdRng,
}

impl Generator {
    pub fn new(catalog: Rc<Catalog>) -> Self {
        Generator {
            catalog,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests and replays
    pub fn seeded(catalog: Rc<Catalog>, seed: u64) -> Self {
        Generator {
            catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> Character {
        let mut layers: BTreeMap<LayerSlot, LayerVariant> = BTreeMap::new();

        for slot in self.catalog.draw_order() {
            let Some(definition) = self.catalog.slot(slot) else {
                continue;
            };
            // the roll happens even for excluded slots so one slot's outcome
            // doesn't shift the random stream of the slots after it
            let present = self.rng.gen_bool(definition.presence);
            let variant = LayerVariant {
                kind: self.rng.gen_range(0..definition.variant_count()),
                color: self.rng.gen_range(0..definition.palette_size),
            };
            if !present || Self::is_excluded(&self.catalog, &layers, slot) {
                continue;
            }
            for excluded in &definition.excludes {
                layers.remove(excluded);
            }
            layers.insert(slot, variant);
        }

        Character { layers }
    }

    fn is_excluded(
        catalog: &Catalog,
        layers: &BTreeMap<LayerSlot, LayerVariant>,
        slot: LayerSlot,
    ) -> bool {
        layers.keys().any(|worn| {
            catalog
                .slot(*worn)
                .map(|definition| definition.excludes.contains(&slot))
                .unwrap_or(false)
        })
    }
}
