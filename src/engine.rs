use crate::browser;
use anyhow::{anyhow, Error, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn square(edge: f64) -> Self {
        Size {
            width: edge,
            height: edge,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn new_from_x_y(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn right(&self) -> f64 {
        self.x() + self.width()
    }

    pub fn bottom(&self) -> f64 {
        self.y() + self.height()
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x() + self.width() * 0.5,
            y: self.y() + self.height() * 0.5,
        }
    }

    /// Square of `ratio * min(width, height)` sharing this rect's center
    pub fn centered_square(&self, ratio: f64) -> Rect {
        let edge = self.width().min(self.height()) * ratio;
        let center = self.center();
        Rect::new_from_x_y(center.x - edge * 0.5, center.y - edge * 0.5, edge, edge)
    }
}

// ==================== Drawing ====================
/// Anything the compositor can paint into.
///
/// The browser implementation is [`CanvasRenderer`]; tests use a recording
/// fake so draw order and rectangles can be asserted without a DOM.
pub trait DrawSurface {
    type Image;

    fn size(&self) -> Size;
    fn clear(&self, rect: &Rect);
    fn save(&self);
    fn clip(&self, rect: &Rect);
    fn restore(&self);
    fn draw_image(&self, image: &Self::Image, frame: &Rect, destination: &Rect) -> Result<()>;
}

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let context = browser::context(&canvas)?;
        // pixel art : nearest neighbour when scaling
        context.set_image_smoothing_enabled(false);
        Ok(CanvasRenderer { canvas, context })
    }
}

impl DrawSurface for CanvasRenderer {
    type Image = HtmlImageElement;

    fn size(&self) -> Size {
        Size {
            width: self.canvas.width().into(),
            height: self.canvas.height().into(),
        }
    }

    fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    fn save(&self) {
        self.context.save();
    }

    fn clip(&self, rect: &Rect) {
        self.context.begin_path();
        self.context
            .rect(rect.x(), rect.y(), rect.width(), rect.height());
        self.context.clip();
    }

    fn restore(&self) {
        self.context.restore();
    }

    fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) -> Result<()> {
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x(),
                frame.y(),
                frame.width(),
                frame.height(),
                destination.x(),
                destination.y(),
                destination.width(),
                destination.height(),
            )
            .map_err(|err| anyhow!("drawImage failed : {:#?}", err))
    }
}

// ==================== Image loading ====================
/// Source of decoded images for a path.
///
/// `?Send` because browser images are `!Send` and everything runs on the
/// single wasm thread.
#[async_trait(?Send)]
pub trait ImageLoader {
    type Image;

    async fn load(&self, source: &str) -> Result<Self::Image>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserImageLoader;

#[async_trait(?Send)]
impl ImageLoader for BrowserImageLoader {
    type Image = HtmlImageElement;

    async fn load(&self, source: &str) -> Result<HtmlImageElement> {
        load_image(source).await
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();
    let path = source.to_string();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!("Error loading image [{}]: {:#?}", path, err)));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callbacks alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields the channel result
    // - second ? propagates the image load error
    rx.await??;

    Ok(image)
}

// ==================== Game loop ====================
pub trait Game {
    /// `now` is the requestAnimationFrame timestamp in milliseconds
    fn update(&mut self, now: f64);
    fn draw(&mut self, renderer: &CanvasRenderer);
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

pub struct GameLoop;

/// Cancels a running [`GameLoop`]; the loop also stops when this is dropped.
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
    frame_id: Rc<Cell<Option<i32>>>,
    closure: SharedLoopClosure,
}

impl LoopHandle {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn stop(&self) {
        if !self.running.replace(false) {
            return;
        }
        if let Some(id) = self.frame_id.take() {
            if let Err(err) = browser::cancel_animation_frame(id) {
                warn!("GameLoop: {:#}", err);
            }
        }
        // breaks the closure -> closure reference cycle
        self.closure.borrow_mut().take();
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl GameLoop {
    pub fn start<G: Game + 'static>(
        game: Rc<RefCell<G>>,
        renderer: CanvasRenderer,
    ) -> Result<LoopHandle> {
        let running = Rc::new(Cell::new(true));
        let frame_id = Rc::new(Cell::new(None));
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();

        let loop_running = running.clone();
        let loop_frame_id = frame_id.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            if !loop_running.get() {
                return;
            }
            {
                let mut game = game.borrow_mut();
                game.update(perf);
                game.draw(&renderer);
            }
            if let Some(closure) = f.borrow().as_ref() {
                match browser::request_animation_frame(closure) {
                    Ok(id) => loop_frame_id.set(Some(id)),
                    Err(err) => warn!("GameLoop: {:#}", err),
                }
            }
        }));

        let id = browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;
        frame_id.set(Some(id));

        Ok(LoopHandle {
            running,
            frame_id,
            closure: g,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centered_square_shares_center_and_uses_short_side() {
        let rect = Rect::new_from_x_y(10.0, 20.0, 100.0, 50.0);
        let clip = rect.centered_square(0.9);

        assert_relative_eq!(clip.width(), 45.0);
        assert_relative_eq!(clip.height(), 45.0);
        assert_relative_eq!(clip.center().x, rect.center().x);
        assert_relative_eq!(clip.center().y, rect.center().y);
    }

    #[test]
    fn rect_edges() {
        let rect = Rect::new_from_x_y(4.0, 8.0, 32.0, 16.0);
        assert_relative_eq!(rect.right(), 36.0);
        assert_relative_eq!(rect.bottom(), 24.0);
    }
}
