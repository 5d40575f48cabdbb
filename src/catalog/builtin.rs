use super::{Action, ActionDefinition, Catalog, FrameSize, LayerSlot, SlotDefinition};

const FRAME: FrameSize = FrameSize { x: 32.0, y: 32.0 };

fn slot(
    path: &str,
    files: &[&str],
    layer_index: u32,
    palette_size: usize,
    presence: f64,
    excludes: &[LayerSlot],
) -> SlotDefinition {
    SlotDefinition {
        path: path.to_string(),
        files: files.iter().map(|file| file.to_string()).collect(),
        frame_size: FRAME,
        layer_index,
        palette_size,
        presence,
        excludes: excludes.to_vec(),
    }
}

fn action(path: &str, animation_frame_length: usize) -> ActionDefinition {
    ActionDefinition {
        path: path.to_string(),
        frame_size: FRAME,
        animation_frame_length,
    }
}

/// The cozy-people pack the game ships with
pub(super) fn cozy_people() -> Catalog {
    use LayerSlot::*;

    let slots = [
        (Base, slot("char_a", &["char_a.png"], 0, 8, 1.0, &[])),
        (Eyes, slot("eyes", &["eyes.png"], 1, 14, 1.0, &[])),
        (Blush, slot("blush", &["blush_all.png"], 2, 5, 0.25, &[])),
        (Lipstick, slot("lipstick", &["lipstick.png"], 3, 5, 0.2, &[])),
        (
            Upper,
            slot(
                "clothes",
                &["basic.png", "floral.png", "sailor.png", "shirt.png", "skull.png", "spaghetti.png", "sporty.png", "stripe.png", "sailor_bow.png"],
                4,
                10,
                1.0,
                &[],
            ),
        ),
        (
            Lower,
            slot(
                "pants",
                &["pants.png", "pants_suit.png", "skirt.png", "shorts.png"],
                5,
                10,
                1.0,
                &[],
            ),
        ),
        (
            Bodysuit,
            slot(
                "bodysuit",
                &["overalls.png", "dress.png", "suit.png", "clown.png", "pumpkin.png", "spooky.png", "witch.png"],
                6,
                10,
                0.15,
                &[Upper, Lower],
            ),
        ),
        (Shoes, slot("shoes", &["shoes.png"], 7, 10, 1.0, &[])),
        (
            Hair,
            slot(
                "hair",
                &["bob.png", "braids.png", "buzzcut.png", "curly.png", "emo.png", "extra_long.png", "french_curl.png", "gentleman.png", "long_straight.png", "midiwave.png", "ponytail.png", "spacebuns.png", "wavy.png"],
                8,
                14,
                0.9,
                &[],
            ),
        ),
        (Beard, slot("beard", &["beard.png"], 9, 14, 0.2, &[Mask])),
        (Glasses, slot("acc", &["glasses.png", "glasses_sun.png"], 10, 10, 0.2, &[])),
        (Earring, slot("acc", &["earring_emerald.png", "earring_red.png"], 11, 3, 0.15, &[])),
        (
            Hat,
            slot(
                "acc",
                &["hat_cowboy.png", "hat_lucky.png", "hat_pumpkin.png", "hat_witch.png"],
                12,
                5,
                0.2,
                &[],
            ),
        ),
        (Mask, slot("acc", &["mask_clown.png", "mask_spooky.png"], 13, 2, 0.05, &[Beard])),
    ];

    let actions = [
        (Action::Walk, action("walk", 8)),
        (Action::Axe, action("axe", 10)),
        (Action::Pickaxe, action("pickaxe", 10)),
        (Action::Die, action("die", 6)),
        (Action::Idle, action("idle", 4)),
    ];

    Catalog {
        slots: slots.into_iter().collect(),
        actions: actions.into_iter().collect(),
    }
}
