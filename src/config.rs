//! Tuning knobs for rendering and click-driven animation speed.
//!
//! Both structs deserialize with `#[serde(default)]`, so a page can override
//! a single field and keep the rest.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Edge, in pixels, a view resizes its square canvas element to
    pub canvas_size: f64,
    /// Clip square, as a fraction of the destination rect's short side.
    /// Hides neighbouring spritesheet frames that bleed in through sub-pixel
    /// rounding when a sprite is scaled.
    pub clip_ratio: f64,
    /// Border pixels trimmed from the left/top edge of every source frame
    pub source_inset: f64,
    /// Root of the per-action sheets : `{asset_root}/{action}/{slot}/...`
    pub asset_root: String,
    /// Root of the static (non-animated) preview sheets
    pub preview_root: String,
    /// Columns in one colour band of a preview sheet
    pub preview_band_frames: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            canvas_size: 256.0,
            clip_ratio: 0.9,
            source_inset: 1.0,
            asset_root: "animations".to_string(),
            preview_root: "cozy-people-asset-pack".to_string(),
            preview_band_frames: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeedConfig {
    /// Milliseconds per frame with no clicks; also the ceiling
    pub base_ms: f64,
    /// Floor, however fast the clicks come in
    pub min_ms: f64,
    /// Milliseconds removed per click/second
    pub reduction_ms: f64,
    /// Trailing click window, and the silence after which speed decays to base
    pub window_ms: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            base_ms: 70.0,
            min_ms: 20.0,
            reduction_ms: 5.0,
            window_ms: 1500.0,
        }
    }
}

impl SpeedConfig {
    pub fn clamp(&self, speed_ms: f64) -> f64 {
        speed_ms.max(self.min_ms).min(self.base_ms)
    }
}
