//! Paints the ordered layers of one animation frame onto a [`DrawSurface`].
//!
//! Spritesheet layout, per slot and action :
//!
//! ```text
//!            colour 0                 colour 1
//!        ┌────┬────┬─────┬────┐ ┌────┬────┬─────┬────┐
//! down   │ f0 │ f1 │ ... │ fN │ │ f0 │ f1 │ ... │ fN │ ...
//! up     ├────┼────┼─────┼────┤ ├────┼────┼─────┼────┤
//! right  │    │    │     │    │ │    │    │     │    │
//! left   └────┴────┴─────┴────┘ └────┴────┴─────┴────┘
//! ```
//!
//! Columns are animation frames repeated once per colour band, rows are
//! directions.

use crate::catalog::{Action, ActionDefinition, Catalog, Direction, LayerSlot};
use crate::character::LayerVariant;
use crate::config::RenderConfig;
use crate::engine::{DrawSurface, Point, Rect, Size};
use std::rc::Rc;

/// One layer handed to the compositor. Either half may be missing; the
/// layer is then skipped.
#[derive(Debug)]
pub struct LayerImage<'a, I> {
    pub slot: LayerSlot,
    pub image: Option<&'a I>,
    pub variant: Option<LayerVariant>,
}

impl<'a, I> Clone for LayerImage<'a, I> {
    fn clone(&self) -> Self {
        LayerImage {
            slot: self.slot,
            image: self.image,
            variant: self.variant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRequest {
    pub action: Action,
    pub frame: usize,
    pub direction: Direction,
    /// Scaled size on the surface; defaults to a square of the surface width
    pub dest_size: Option<Size>,
    /// Top left on the surface; defaults to centred
    pub dest_origin: Option<Point>,
}

impl DrawRequest {
    pub fn new(action: Action, frame: usize, direction: Direction) -> Self {
        DrawRequest {
            action,
            frame,
            direction,
            dest_size: None,
            dest_origin: None,
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.dest_size = Some(size);
        self
    }

    pub fn at(mut self, origin: Point) -> Self {
        self.dest_origin = Some(origin);
        self
    }
}

pub struct Compositor {
    catalog: Rc<Catalog>,
    config: RenderConfig,
}

impl Compositor {
    pub fn new(catalog: Rc<Catalog>, config: RenderConfig) -> Self {
        Compositor { catalog, config }
    }

    /// Frame `frame` of colour band `color`, row `direction`, minus the
    /// trimmed border
    fn frame_rect(
        &self,
        definition: &ActionDefinition,
        color: usize,
        frame: usize,
        direction: Direction,
    ) -> Rect {
        let length = definition.animation_frame_length.max(1);
        let width = definition.frame_size.x;
        let height = definition.frame_size.y;
        let inset = self.config.source_inset;

        let x = (frame % length) as f64 * width + color as f64 * width * length as f64;
        let y = direction.row() as f64 * height;

        Rect::new_from_x_y(x + inset, y + inset, width - inset, height - inset)
    }

    /// Source rectangle of `variant` in its `action` sheet. A colour past the
    /// slot's palette is clamped to the last band.
    pub fn source_rect(
        &self,
        slot: LayerSlot,
        variant: LayerVariant,
        action: Action,
        frame: usize,
        direction: Direction,
    ) -> Option<Rect> {
        let definition = self.catalog.action(action)?;
        let palette_size = self
            .catalog
            .slot(slot)
            .map(|slot| slot.palette_size)
            .unwrap_or(1)
            .max(1);
        let color = if variant.color >= palette_size {
            warn!(
                "Colour {} is outside the {} band palette of '{}', clamping",
                variant.color, palette_size, slot
            );
            palette_size - 1
        } else {
            variant.color
        };

        Some(self.frame_rect(definition, color, frame, direction))
    }

    /// Tool sheets carry a single colour band
    pub fn tool_source_rect(&self, action: Action, frame: usize, direction: Direction) -> Option<Rect> {
        let definition = self.catalog.action(action)?;
        Some(self.frame_rect(definition, 0, frame, direction))
    }

    pub fn dest_rect(&self, surface: Size, request: &DrawRequest) -> Rect {
        let size = request
            .dest_size
            .unwrap_or_else(|| Size::square(surface.width));
        let origin = request.dest_origin.unwrap_or(Point {
            x: (surface.width - size.width) / 2.0,
            y: (surface.height - size.height) / 2.0,
        });
        Rect::new(origin, size)
    }

    /// Clears the destination, then copies one source frame per layer in the
    /// given (back to front) order, and the tool on top of everything.
    ///
    /// Layers without an image or variant are skipped, as is any copy the
    /// surface rejects. Returns the number of images drawn.
    pub fn draw<S: DrawSurface>(
        &self,
        surface: &S,
        layers: &[LayerImage<'_, S::Image>],
        request: &DrawRequest,
        tool: Option<&S::Image>,
    ) -> usize {
        let dest = self.dest_rect(surface.size(), request);
        surface.clear(&dest);

        if self.catalog.action(request.action).is_none() {
            warn!("No sheet layout for action '{}', nothing drawn", request.action);
            return 0;
        }

        surface.save();
        surface.clip(&dest.centered_square(self.config.clip_ratio));

        let mut drawn = 0;
        for layer in layers {
            let (Some(image), Some(variant)) = (layer.image, layer.variant) else {
                log!("Skipping layer '{}' : image or variant missing", layer.slot);
                continue;
            };
            let Some(source) = self.source_rect(
                layer.slot,
                variant,
                request.action,
                request.frame,
                request.direction,
            ) else {
                continue;
            };
            drawn += self.copy(surface, image, &source, &dest, layer.slot.name());
        }

        if let Some(tool) = tool {
            if let Some(source) =
                self.tool_source_rect(request.action, request.frame, request.direction)
            {
                drawn += self.copy(surface, tool, &source, &dest, "tool");
            }
        }

        surface.restore();
        drawn
    }

    /// Static preview : first frame of each layer's colour band from the
    /// preview sheets, stretched over the whole surface
    pub fn draw_preview<S: DrawSurface>(
        &self,
        surface: &S,
        layers: &[LayerImage<'_, S::Image>],
    ) -> usize {
        let size = surface.size();
        let dest = Rect::new(Point::default(), size);
        surface.clear(&dest);

        let mut drawn = 0;
        for layer in layers {
            let (Some(image), Some(variant), Some(definition)) =
                (layer.image, layer.variant, self.catalog.slot(layer.slot))
            else {
                continue;
            };
            let frame = definition.frame_size;
            let source = Rect::new_from_x_y(
                frame.x * variant.color as f64 * self.config.preview_band_frames as f64,
                0.0,
                frame.x,
                frame.y,
            );
            drawn += self.copy(surface, image, &source, &dest, layer.slot.name());
        }
        drawn
    }

    fn copy<S: DrawSurface>(
        &self,
        surface: &S,
        image: &S::Image,
        source: &Rect,
        dest: &Rect,
        name: &str,
    ) -> usize {
        match surface.draw_image(image, source, dest) {
            Ok(()) => 1,
            Err(err) => {
                warn!("Skipping layer '{}' : {:#}", name, err);
                0
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::engine::{DrawSurface, Rect, Size};
    use anyhow::{anyhow, Result};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear(Rect),
        Save,
        Clip(Rect),
        Restore,
        Draw {
            image: String,
            frame: Rect,
            destination: Rect,
        },
    }

    /// Records every call; images are names, and one named "broken" fails to draw
    pub struct RecordingSurface {
        pub size: Size,
        pub ops: RefCell<Vec<Op>>,
    }

    impl RecordingSurface {
        pub fn new(edge: f64) -> Self {
            RecordingSurface {
                size: Size::square(edge),
                ops: RefCell::new(Vec::new()),
            }
        }

        pub fn draws(&self) -> Vec<(String, Rect, Rect)> {
            self.ops
                .borrow()
                .iter()
                .filter_map(|op| match op {
                    Op::Draw {
                        image,
                        frame,
                        destination,
                    } => Some((image.clone(), *frame, *destination)),
                    _ => None,
                })
                .collect()
        }

        pub fn take(&self) -> Vec<Op> {
            self.ops.borrow_mut().drain(..).collect()
        }
    }

    impl DrawSurface for RecordingSurface {
        type Image = String;

        fn size(&self) -> Size {
            self.size
        }

        fn clear(&self, rect: &Rect) {
            self.ops.borrow_mut().push(Op::Clear(*rect));
        }

        fn save(&self) {
            self.ops.borrow_mut().push(Op::Save);
        }

        fn clip(&self, rect: &Rect) {
            self.ops.borrow_mut().push(Op::Clip(*rect));
        }

        fn restore(&self) {
            self.ops.borrow_mut().push(Op::Restore);
        }

        fn draw_image(&self, image: &String, frame: &Rect, destination: &Rect) -> Result<()> {
            if image == "broken" {
                return Err(anyhow!("image is broken"));
            }
            self.ops.borrow_mut().push(Op::Draw {
                image: image.clone(),
                frame: *frame,
                destination: *destination,
            });
            Ok(())
        }
    }
}
