use crate::catalog::{Action, Catalog, LayerSlot, Tool};
use crate::character::Character;
use std::collections::HashMap;
use std::rc::Rc;

/// Sub-directory holding the held tools of every action
const TOOL_DIR: &str = "e-tool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayer {
    pub slot: LayerSlot,
    /// Empty when the variant names no file; such layers are never drawn
    pub path: String,
}

impl ResolvedLayer {
    pub fn is_drawable(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Maps a character and action onto sheet file paths.
///
/// The same logical variant lives in a different file per action
/// (`hair/bob.png` -> `animations/axe/hair/bob_axe.png`), so the paths must be
/// resolved again whenever the action changes, not only the character.
pub struct Resolver {
    catalog: Rc<Catalog>,
    // back-to-front rank of every catalog slot
    ranks: HashMap<LayerSlot, usize>,
    asset_root: String,
    preview_root: String,
}

impl Resolver {
    pub fn new(catalog: Rc<Catalog>, asset_root: &str, preview_root: &str) -> Self {
        let ranks = catalog
            .draw_order()
            .into_iter()
            .enumerate()
            .map(|(rank, slot)| (slot, rank))
            .collect();
        Resolver {
            catalog,
            ranks,
            asset_root: asset_root.trim_end_matches('/').to_string(),
            preview_root: preview_root.trim_end_matches('/').to_string(),
        }
    }

    /// Sorts `slots` back to front. Slots the catalog doesn't know go last.
    pub fn order(&self, slots: impl IntoIterator<Item = LayerSlot>) -> Vec<LayerSlot> {
        let mut slots: Vec<LayerSlot> = slots.into_iter().collect();
        slots.sort_by_key(|slot| (self.ranks.get(slot).copied().unwrap_or(usize::MAX), *slot));
        slots
    }

    /// Every populated slot of `character`, back to front
    pub fn resolve(&self, character: &Character, action: Action) -> Vec<ResolvedLayer> {
        self.order(character.slots())
            .into_iter()
            .map(|slot| ResolvedLayer {
                slot,
                path: self.layer_path(character, slot, action),
            })
            .collect()
    }

    /// `{root}/{action}/{slot}/{stem}_{action}.{ext}`, or "" when the slot is
    /// empty, unknown to the catalog, or its variant index has no file
    pub fn layer_path(&self, character: &Character, slot: LayerSlot, action: Action) -> String {
        let (Some(variant), Some(definition), Some(action_definition)) = (
            character.get(slot),
            self.catalog.slot(slot),
            self.catalog.action(action),
        ) else {
            return String::new();
        };
        let Some(file) = definition.files.get(variant.kind) else {
            warn!("No '{}' file for type {}", slot, variant.kind);
            return String::new();
        };
        let (stem, extension) = split_extension(file);

        format!(
            "{}/{}/{}/{}_{}.{}",
            self.asset_root,
            action_definition.path,
            definition.path,
            stem,
            action.name(),
            extension
        )
    }

    /// Held tool overlay for `action`. Only the axe swing shows the selected
    /// cosmetic; every other action holds the basic axe.
    pub fn resolve_tool(&self, action: Action, tool: Tool) -> String {
        let action_path = self
            .catalog
            .action(action)
            .or_else(|| self.catalog.action(Action::Idle))
            .map(|definition| definition.path.as_str())
            .unwrap_or("idle");
        let tool = if action.shows_selected_tool() { tool } else { Tool::Axe };

        format!(
            "{}/{}/{}/{}.png",
            self.asset_root,
            action_path,
            TOOL_DIR,
            tool.file_stem()
        )
    }

    /// Static preview sheets : `{preview_root}/{slot}/{file}`
    pub fn resolve_preview(&self, character: &Character) -> Vec<ResolvedLayer> {
        self.order(character.slots())
            .into_iter()
            .map(|slot| {
                let path = character
                    .get(slot)
                    .zip(self.catalog.slot(slot))
                    .and_then(|(variant, definition)| {
                        definition
                            .files
                            .get(variant.kind)
                            .map(|file| format!("{}/{}/{}", self.preview_root, definition.path, file))
                    })
                    .unwrap_or_default();
                ResolvedLayer { slot, path }
            })
            .collect()
    }
}

/// `"bob.png"` -> `("bob", "png")`; a file without extension is treated as png
fn split_extension(file: &str) -> (&str, &str) {
    match file.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, extension),
        _ => (file, "png"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::LayerVariant;

    fn resolver() -> Resolver {
        Resolver::new(Rc::new(Catalog::builtin()), "animations", "cozy-people-asset-pack")
    }

    fn character() -> Character {
        Character::new([
            (LayerSlot::Hair, LayerVariant::new(0, 4)),
            (LayerSlot::Base, LayerVariant::new(0, 1)),
            (LayerSlot::Eyes, LayerVariant::new(0, 2)),
        ])
    }

    #[test]
    fn paths_follow_action_and_slot() {
        let layers = resolver().resolve(&character(), Action::Axe);

        assert_eq!(
            layers,
            vec![
                ResolvedLayer {
                    slot: LayerSlot::Base,
                    path: "animations/axe/char_a/char_a_axe.png".to_string()
                },
                ResolvedLayer {
                    slot: LayerSlot::Eyes,
                    path: "animations/axe/eyes/eyes_axe.png".to_string()
                },
                ResolvedLayer {
                    slot: LayerSlot::Hair,
                    path: "animations/axe/hair/bob_axe.png".to_string()
                },
            ]
        );
    }

    #[test]
    fn changing_action_changes_every_path() {
        let resolver = resolver();
        let walk = resolver.resolve(&character(), Action::Walk);
        let die = resolver.resolve(&character(), Action::Die);

        for (w, d) in walk.iter().zip(die.iter()) {
            assert_eq!(w.slot, d.slot);
            assert_ne!(w.path, d.path);
            assert!(w.path.ends_with("_walk.png"));
            assert!(d.path.starts_with("animations/die/"));
        }
    }

    #[test]
    fn variant_without_file_resolves_empty() {
        let character = Character::new([(LayerSlot::Eyes, LayerVariant::new(99, 0))]);
        let layers = resolver().resolve(&character, Action::Walk);

        assert_eq!(layers.len(), 1);
        assert!(!layers[0].is_drawable());
    }

    #[test]
    fn only_axe_action_uses_selected_tool() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_tool(Action::Axe, Tool::AxeGold),
            "animations/axe/e-tool/axe_gold.png"
        );
        assert_eq!(
            resolver.resolve_tool(Action::Idle, Tool::AxeGold),
            "animations/idle/e-tool/axe.png"
        );
    }

    #[test]
    fn preview_paths_use_raw_files() {
        let layers = resolver().resolve_preview(&character());
        assert_eq!(layers[0].path, "cozy-people-asset-pack/char_a/char_a.png");
        assert_eq!(layers[2].path, "cozy-people-asset-pack/hair/bob.png");
    }

    #[test]
    fn order_is_the_same_for_any_subset() {
        let resolver = resolver();
        let full = resolver.order(LayerSlot::ALL);
        assert_eq!(full.first(), Some(&LayerSlot::Base));

        let subset = resolver.order([LayerSlot::Hat, LayerSlot::Shoes, LayerSlot::Eyes]);
        assert_eq!(subset, vec![LayerSlot::Eyes, LayerSlot::Shoes, LayerSlot::Hat]);
        let positions: Vec<usize> = subset
            .iter()
            .map(|slot| full.iter().position(|other| other == slot).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn order_ignores_insertion_order() {
        let a = Character::new([
            (LayerSlot::Hat, LayerVariant::new(0, 0)),
            (LayerSlot::Base, LayerVariant::new(0, 0)),
            (LayerSlot::Hair, LayerVariant::new(0, 0)),
        ]);
        let b = Character::new([
            (LayerSlot::Hair, LayerVariant::new(0, 0)),
            (LayerSlot::Hat, LayerVariant::new(0, 0)),
            (LayerSlot::Base, LayerVariant::new(0, 0)),
        ]);

        let resolver = resolver();
        let expected = vec![LayerSlot::Base, LayerSlot::Hair, LayerSlot::Hat];
        assert_eq!(resolver.order(a.slots()), expected);
        assert_eq!(resolver.order(b.slots()), expected);
        assert_eq!(resolver.order([LayerSlot::Hat, LayerSlot::Hair, LayerSlot::Base]), expected);
    }

    #[test]
    fn split_extension_keeps_dots_in_stem() {
        assert_eq!(split_extension("hat.v2.png"), ("hat.v2", "png"));
        assert_eq!(split_extension("mask"), ("mask", "png"));
    }
}
