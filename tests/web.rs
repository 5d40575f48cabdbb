//! Browser-only checks : run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use js_sys::{Reflect, JSON};
use lumberjack_sprites::catalog::{Action, Catalog, Direction, LayerSlot};
use lumberjack_sprites::compositor::{Compositor, DrawRequest};
use lumberjack_sprites::config::RenderConfig;
use lumberjack_sprites::engine::{load_image, CanvasRenderer, DrawSurface};
use lumberjack_sprites::{random_character, CharacterView};
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::HtmlCanvasElement;

wasm_bindgen_test_configure!(run_in_browser);

fn detached_canvas(edge: u32) -> HtmlCanvasElement {
    let canvas: HtmlCanvasElement = web_sys::window()
        .unwrap()
        .document()
        .unwrap()
        .create_element("canvas")
        .unwrap()
        .dyn_into()
        .unwrap();
    canvas.set_width(edge);
    canvas.set_height(edge);
    canvas
}

#[wasm_bindgen_test]
fn random_character_always_has_a_base_layer() {
    let character = random_character(JsValue::UNDEFINED).unwrap();
    let base = Reflect::get(&character, &JsValue::from_str(LayerSlot::Base.name())).unwrap();
    assert!(base.is_object());

    let json: String = JSON::stringify(&character).unwrap().into();
    assert!(json.contains("\"type\""));
}

#[wasm_bindgen_test]
fn random_character_accepts_a_catalog_object() {
    let catalog = JSON::parse(r#"{
        "slots": {
            "base": { "path": "char_a", "files": ["char_a.png"], "frameSize": { "x": 32, "y": 32 }, "layerIndex": 0, "paletteSize": 2 }
        },
        "actions": {
            "idle": { "path": "idle", "frameSize": { "x": 32, "y": 32 }, "animationFrameLength": 4 }
        }
    }"#)
    .unwrap();

    let character = random_character(catalog).unwrap();
    let keys = js_sys::Object::keys(character.unchecked_ref());
    assert_eq!(keys.length(), 1);
}

#[wasm_bindgen_test]
fn view_on_a_missing_canvas_is_an_error() {
    let result = CharacterView::new("no-such-canvas", JsValue::UNDEFINED, JsValue::UNDEFINED);
    assert!(result.is_err());
}

#[wasm_bindgen_test]
fn renderer_reports_canvas_size() {
    let renderer = CanvasRenderer::new(detached_canvas(64)).unwrap();
    let size = renderer.size();
    assert_eq!(size.width, 64.0);
    assert_eq!(size.height, 64.0);
}

#[wasm_bindgen_test]
fn drawing_no_layers_only_clears() {
    let renderer = CanvasRenderer::new(detached_canvas(64)).unwrap();
    let compositor = Compositor::new(Rc::new(Catalog::builtin()), RenderConfig::default());

    let drawn = compositor.draw(
        &renderer,
        &[],
        &DrawRequest::new(Action::Walk, 0, Direction::Right),
        None,
    );
    assert_eq!(drawn, 0);
}

#[wasm_bindgen_test]
async fn missing_image_fails_with_its_path() {
    let err = load_image("does/not/exist.png").await.unwrap_err();
    assert!(format!("{:#}", err).contains("does/not/exist.png"));
}
