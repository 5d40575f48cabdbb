//! Read-only description of the asset pack : which layer slots exist, which
//! sheet files each slot offers, how the per-action sheets are laid out and
//! in which order layers stack.
//!
//! A [`Catalog`] is built once (bundled via [`Catalog::builtin`] or fetched as
//! JSON) and handed to the generator, resolver and compositor behind an `Rc`.

use anyhow::{anyhow, ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

mod builtin;

// ==================== Layer slots ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSlot {
    Base,
    Eyes,
    Blush,
    Lipstick,
    Upper,
    Lower,
    Bodysuit,
    Shoes,
    Hair,
    Beard,
    Glasses,
    Earring,
    Hat,
    Mask,
}

impl LayerSlot {
    pub const ALL: [LayerSlot; 14] = [
        LayerSlot::Base,
        LayerSlot::Eyes,
        LayerSlot::Blush,
        LayerSlot::Lipstick,
        LayerSlot::Upper,
        LayerSlot::Lower,
        LayerSlot::Bodysuit,
        LayerSlot::Shoes,
        LayerSlot::Hair,
        LayerSlot::Beard,
        LayerSlot::Glasses,
        LayerSlot::Earring,
        LayerSlot::Hat,
        LayerSlot::Mask,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayerSlot::Base => "base",
            LayerSlot::Eyes => "eyes",
            LayerSlot::Blush => "blush",
            LayerSlot::Lipstick => "lipstick",
            LayerSlot::Upper => "upper",
            LayerSlot::Lower => "lower",
            LayerSlot::Bodysuit => "bodysuit",
            LayerSlot::Shoes => "shoes",
            LayerSlot::Hair => "hair",
            LayerSlot::Beard => "beard",
            LayerSlot::Glasses => "glasses",
            LayerSlot::Earring => "earring",
            LayerSlot::Hat => "hat",
            LayerSlot::Mask => "mask",
        }
    }
}

impl fmt::Display for LayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==================== Directions ====================
/// Facing of the character; each one is a row of every spritesheet
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
    #[default]
    Right,
    Left,
}

impl Direction {
    pub fn row(&self) -> usize {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
            Direction::Right => 2,
            Direction::Left => 3,
        }
    }

    pub const COUNT: usize = 4;
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "down" => Ok(Direction::Down),
            "up" => Ok(Direction::Up),
            "right" => Ok(Direction::Right),
            "left" => Ok(Direction::Left),
            _ => Err(anyhow!("Unknown direction : '{}'", s)),
        }
    }
}

// ==================== Actions ====================
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Walk,
    Axe,
    Pickaxe,
    Die,
    #[default]
    Idle,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Walk,
        Action::Axe,
        Action::Pickaxe,
        Action::Die,
        Action::Idle,
    ];

    /// Suffix of every per-action sheet file : `hair_1_{name}.png`
    pub fn name(&self) -> &'static str {
        match self {
            Action::Walk => "walk",
            Action::Axe => "axe",
            Action::Pickaxe => "pickaxe",
            Action::Die => "die",
            Action::Idle => "idle",
        }
    }

    /// Every action holds a tool; only the axe swing shows the selected
    /// cosmetic, the others hold the basic axe
    pub fn shows_selected_tool(&self) -> bool {
        matches!(self, Action::Axe)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.name() == s)
            .ok_or_else(|| anyhow!("Unknown action : '{}'", s))
    }
}

// ==================== Tools ====================
/// Axe cosmetics, unlocked by the player's total click count
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Axe,
    AxeWood,
    AxeCopper,
    AxeSilver,
    AxeGold,
    AxeBlue,
    AxePink,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Axe,
        Tool::AxeWood,
        Tool::AxeCopper,
        Tool::AxeSilver,
        Tool::AxeGold,
        Tool::AxeBlue,
        Tool::AxePink,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            Tool::Axe => "axe",
            Tool::AxeWood => "axe_wood",
            Tool::AxeCopper => "axe_copper",
            Tool::AxeSilver => "axe_silver",
            Tool::AxeGold => "axe_gold",
            Tool::AxeBlue => "axe_blue",
            Tool::AxePink => "axe_pink",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Axe => "Basic Axe",
            Tool::AxeWood => "Wood Axe",
            Tool::AxeCopper => "Copper Axe",
            Tool::AxeSilver => "Silver Axe",
            Tool::AxeGold => "Gold Axe",
            Tool::AxeBlue => "Blue Axe",
            Tool::AxePink => "Pink Axe",
        }
    }

    pub fn unlock_clicks(&self) -> u64 {
        match self {
            Tool::Axe => 0,
            Tool::AxeWood => 100,
            Tool::AxeCopper => 500,
            Tool::AxeSilver => 1_000,
            Tool::AxeGold => 5_000,
            Tool::AxeBlue => 10_000,
            Tool::AxePink => 100_000,
        }
    }

    pub fn is_unlocked(&self, total_clicks: u64) -> bool {
        total_clicks >= self.unlock_clicks()
    }

    pub fn unlocked(total_clicks: u64) -> impl Iterator<Item = Tool> {
        Tool::ALL
            .into_iter()
            .filter(move |tool| tool.is_unlocked(total_clicks))
    }
}

impl FromStr for Tool {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Tool::ALL
            .iter()
            .copied()
            .find(|tool| tool.file_stem() == s)
            .ok_or_else(|| anyhow!("Unknown tool : '{}'", s))
    }
}

// ==================== Definitions ====================
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FrameSize {
    pub x: f64,
    pub y: f64,
}

fn always() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDefinition {
    /// Directory of this slot's sheets
    pub path: String,
    /// One file per variant, indexed by `LayerVariant::kind`
    pub files: Vec<String>,
    /// Frame of the static preview sheet
    pub frame_size: FrameSize,
    /// Draw order, lowest first
    pub layer_index: u32,
    /// Colour bands per sheet
    pub palette_size: usize,
    /// Chance the generator fills this slot
    #[serde(default = "always")]
    pub presence: f64,
    /// Slots that may not be worn together with this one
    #[serde(default)]
    pub excludes: Vec<LayerSlot>,
}

impl SlotDefinition {
    pub fn variant_count(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub path: String,
    pub frame_size: FrameSize,
    pub animation_frame_length: usize,
}

impl ActionDefinition {
    /// Pixel extent of one sheet of this action with `palette_size` colour bands
    pub fn sheet_size(&self, palette_size: usize) -> (f64, f64) {
        (
            self.frame_size.x * (self.animation_frame_length * palette_size) as f64,
            self.frame_size.y * Direction::COUNT as f64,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Catalog {
    pub slots: BTreeMap<LayerSlot, SlotDefinition>,
    pub actions: BTreeMap<Action, ActionDefinition>,
}

impl Catalog {
    pub fn builtin() -> Self {
        builtin::cozy_people()
    }

    pub fn from_parts(
        slots: impl IntoIterator<Item = (LayerSlot, SlotDefinition)>,
        actions: impl IntoIterator<Item = (Action, ActionDefinition)>,
    ) -> Result<Self> {
        let catalog = Catalog {
            slots: slots.into_iter().collect(),
            actions: actions.into_iter().collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks the invariants the rest of the crate relies on : every slot
    /// offers a file and a colour, every action has at least one frame.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.slots.is_empty(), "Catalog has no layer slots");
        for (slot, definition) in &self.slots {
            ensure!(
                !definition.files.is_empty(),
                "Slot '{}' has no variant files",
                slot
            );
            ensure!(
                definition.palette_size > 0,
                "Slot '{}' has an empty palette",
                slot
            );
            ensure!(
                (0.0..=1.0).contains(&definition.presence),
                "Slot '{}' presence {} is not a probability",
                slot,
                definition.presence
            );
        }
        for (action, definition) in &self.actions {
            ensure!(
                definition.animation_frame_length > 0,
                "Action '{}' has no frames",
                action
            );
        }
        Ok(())
    }

    pub fn slot(&self, slot: LayerSlot) -> Option<&SlotDefinition> {
        self.slots.get(&slot)
    }

    pub fn action(&self, action: Action) -> Option<&ActionDefinition> {
        self.actions.get(&action)
    }

    /// Frames in the loop of `action`; 1 for an action the pack lacks, which
    /// pins the clock at frame 0
    pub fn frame_length(&self, action: Action) -> usize {
        self.action(action)
            .map(|definition| definition.animation_frame_length.max(1))
            .unwrap_or(1)
    }

    /// Total sort key : layer index, ties broken by slot declaration order
    pub fn order_key(&self, slot: LayerSlot) -> (u32, LayerSlot) {
        let index = self
            .slot(slot)
            .map(|definition| definition.layer_index)
            .unwrap_or(u32::MAX);
        (index, slot)
    }

    /// Every catalog slot, back to front
    pub fn draw_order(&self) -> Vec<LayerSlot> {
        let mut slots: Vec<LayerSlot> = self.slots.keys().copied().collect();
        slots.sort_by_key(|slot| self.order_key(*slot));
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
        for action in Action::ALL {
            assert!(catalog.action(action).is_some(), "missing {}", action);
        }
    }

    #[test]
    fn draw_order_starts_with_base_and_ends_with_mask() {
        let order = Catalog::builtin().draw_order();
        assert_eq!(order.first(), Some(&LayerSlot::Base));
        assert_eq!(order.last(), Some(&LayerSlot::Mask));
        assert_eq!(order.len(), LayerSlot::ALL.len());
    }

    #[test]
    fn layer_indices_are_unique_in_builtin() {
        let catalog = Catalog::builtin();
        let mut indices: Vec<u32> = catalog.slots.values().map(|s| s.layer_index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), catalog.slots.len());
    }

    #[test]
    fn catalog_round_trips_through_json_config() {
        let json = r#"{
            "slots": {
                "base": { "path": "base", "files": ["char_a.png"], "frameSize": { "x": 32, "y": 32 },
                          "layerIndex": 0, "paletteSize": 3 },
                "hat": { "path": "hat", "files": ["cap.png", "beret.png"], "frameSize": { "x": 32, "y": 32 },
                         "layerIndex": 9, "paletteSize": 2, "presence": 0.5, "excludes": ["hair"] }
            },
            "actions": {
                "walk": { "path": "walk", "frameSize": { "x": 32, "y": 32 }, "animationFrameLength": 8 }
            }
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        catalog.validate().unwrap();

        let hat = catalog.slot(LayerSlot::Hat).unwrap();
        assert_eq!(hat.excludes, vec![LayerSlot::Hair]);
        assert_eq!(hat.presence, 0.5);
        assert_eq!(catalog.slot(LayerSlot::Base).unwrap().presence, 1.0);
        assert_eq!(catalog.frame_length(Action::Walk), 8);
        assert_eq!(catalog.frame_length(Action::Die), 1);
    }

    #[test]
    fn validate_rejects_empty_palette() {
        let mut catalog = Catalog::builtin();
        catalog.slots.get_mut(&LayerSlot::Eyes).unwrap().palette_size = 0;
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn tools_unlock_by_click_count() {
        assert_eq!(Tool::unlocked(0).collect::<Vec<_>>(), vec![Tool::Axe]);
        assert_eq!(Tool::unlocked(500).count(), 3);
        assert!(Tool::AxePink.is_unlocked(100_000));
        assert!(!Tool::AxePink.is_unlocked(99_999));
        assert_eq!("axe_gold".parse::<Tool>().unwrap(), Tool::AxeGold);
    }

    #[test]
    fn names_parse_back() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
        }
        assert_eq!("left".parse::<Direction>().unwrap().row(), 3);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
