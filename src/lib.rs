// ==================== Imports ====================
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;
use web_sys::HtmlImageElement;

#[macro_use]
mod browser;
pub mod catalog;
pub mod character;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod game;
pub mod sprite;

use catalog::{Action, Catalog, Direction, Tool};
use character::{Character, Generator};
use config::{RenderConfig, SpeedConfig};
use engine::{BrowserImageLoader, CanvasRenderer, GameLoop, LoopHandle, Point, Size};
use game::{gather, CharacterInstance, InstanceStatus};

// ==================== Structs ====================
/// Everything a page may pass when mounting a view; every field is optional
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct ViewOptions {
    catalog: Option<Catalog>,
    render: RenderConfig,
    speed: SpeedConfig,
    action: Action,
    direction: Direction,
    tool: Tool,
    /// Sprite edge on the canvas; the canvas width when absent
    sprite_size: Option<f64>,
    origin: Option<Point>,
}

/// One cosmetic as a page lists it
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolInfo {
    stem: &'static str,
    name: &'static str,
    unlock_clicks: u64,
}

impl From<Tool> for ToolInfo {
    fn from(tool: Tool) -> Self {
        ToolInfo {
            stem: tool.file_stem(),
            name: tool.display_name(),
            unlock_clicks: tool.unlock_clicks(),
        }
    }
}

type SharedInstance = Rc<RefCell<CharacterInstance<HtmlImageElement>>>;

/// One animated character bound to a canvas element
#[wasm_bindgen]
pub struct CharacterView {
    instance: SharedInstance,
    game_loop: LoopHandle,
}

// ==================== Conversions ====================
fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

fn from_js<T: for<'de> Deserialize<'de> + Default>(value: JsValue) -> Result<T> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| anyhow!("Invalid argument : {}", err))
}

// plain objects rather than ES Maps, so pages can JSON.stringify the result
fn to_value<T: Serialize>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| anyhow!("Could not convert to JsValue : {}", err))
}

fn catalog_or_builtin(catalog: Option<Catalog>) -> Result<Rc<Catalog>> {
    match catalog {
        Some(catalog) => {
            catalog.validate()?;
            Ok(Rc::new(catalog))
        }
        None => Ok(Rc::new(Catalog::builtin())),
    }
}

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - better panic messages in the console
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    log!("lumberjack-sprites ready");
    Ok(())
}

/// Rolls a random character. `catalog` may be omitted for the bundled pack.
#[wasm_bindgen(js_name = randomCharacter)]
pub fn random_character(catalog: JsValue) -> Result<JsValue, JsValue> {
    let catalog = catalog_or_builtin(from_js(catalog).map_err(to_js)?).map_err(to_js)?;
    let character = Generator::new(catalog).generate();
    to_value(&character).map_err(to_js)
}

/// Fetches a catalog JSON file and checks it before a page hands it to a view
#[wasm_bindgen(js_name = fetchCatalog)]
pub async fn fetch_catalog(url: String) -> Result<JsValue, JsValue> {
    let catalog: Catalog = browser::fetch_json(&url).await.map_err(to_js)?;
    catalog.validate().map_err(to_js)?;
    to_value(&catalog).map_err(to_js)
}

fn tool_infos(total_clicks: f64) -> Vec<ToolInfo> {
    Tool::unlocked(total_clicks.max(0.0) as u64)
        .map(ToolInfo::from)
        .collect()
}

/// Axe cosmetics a player with `total_clicks` has earned, as
/// `{ stem, name, unlockClicks }` objects; `stem` is what `setTool` takes
#[wasm_bindgen(js_name = unlockedTools)]
pub fn unlocked_tools(total_clicks: f64) -> Result<JsValue, JsValue> {
    to_value(&tool_infos(total_clicks)).map_err(to_js)
}

#[wasm_bindgen]
impl CharacterView {
    /// Mounts a character on `canvas_id` and starts its frame loop. A missing
    /// `character` is rolled at random.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, character: JsValue, options: JsValue) -> Result<CharacterView, JsValue> {
        let options: ViewOptions = from_js(options).map_err(to_js)?;
        let catalog = catalog_or_builtin(options.catalog).map_err(to_js)?;
        let character = if character.is_undefined() || character.is_null() {
            Generator::new(catalog.clone()).generate()
        } else {
            from_js::<Character>(character).map_err(to_js)?
        };

        let canvas = browser::canvas(canvas_id).map_err(to_js)?;
        let edge = options.render.canvas_size.max(1.0) as u32;
        canvas.set_width(edge);
        canvas.set_height(edge);
        let renderer = CanvasRenderer::new(canvas).map_err(to_js)?;
        let mut instance = CharacterInstance::new(catalog, character, options.render, options.speed);
        instance.set_action(options.action);
        instance.set_direction(options.direction);
        instance.set_tool(options.tool);
        if options.sprite_size.is_some() || options.origin.is_some() {
            instance.set_placement(options.sprite_size.map(Size::square), options.origin);
        }

        let instance = Rc::new(RefCell::new(instance));
        let game_loop = GameLoop::start(instance.clone(), renderer).map_err(to_js)?;
        let view = CharacterView {
            instance,
            game_loop,
        };
        view.reload();
        Ok(view)
    }

    /// Fetches whatever sheets the current character + action still miss.
    /// Results arriving after a newer change are dropped by the instance.
    fn reload(&self) {
        let plan = self.instance.borrow_mut().begin_load();
        let instance = Rc::downgrade(&self.instance);
        browser::spawn_local(async move {
            let results = gather(&BrowserImageLoader, &plan.paths).await;
            match instance.upgrade() {
                Some(instance) => {
                    instance.borrow_mut().finish_load(plan.epoch, results);
                }
                None => log!("View dropped before its sheets loaded"),
            }
        });
    }

    #[wasm_bindgen(js_name = setAction)]
    pub fn set_action(&self, action: &str) -> Result<(), JsValue> {
        let action = action.parse::<Action>().map_err(to_js)?;
        self.instance.borrow_mut().set_action(action);
        self.reload();
        Ok(())
    }

    #[wasm_bindgen(js_name = setDirection)]
    pub fn set_direction(&self, direction: &str) -> Result<(), JsValue> {
        let direction = direction.parse::<Direction>().map_err(to_js)?;
        self.instance.borrow_mut().set_direction(direction);
        Ok(())
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&self, tool: &str) -> Result<(), JsValue> {
        let tool = tool.parse::<Tool>().map_err(to_js)?;
        self.instance.borrow_mut().set_tool(tool);
        self.reload();
        Ok(())
    }

    #[wasm_bindgen(js_name = setAnimating)]
    pub fn set_animating(&self, animating: bool) {
        self.instance.borrow_mut().set_animating(animating);
    }

    /// `submitting`, `optimistic`, `confirmed` or `failed`
    #[wasm_bindgen(js_name = setStatus)]
    pub fn set_status(&self, status: &str) -> Result<(), JsValue> {
        let status: InstanceStatus = status.parse().map_err(to_js)?;
        self.instance.borrow_mut().set_status(status);
        self.reload();
        Ok(())
    }

    #[wasm_bindgen(js_name = setCharacter)]
    pub fn set_character(&self, character: JsValue) -> Result<(), JsValue> {
        let character: Character = from_js(character).map_err(to_js)?;
        self.instance.borrow_mut().set_character(character);
        self.reload();
        Ok(())
    }

    pub fn character(&self) -> Result<JsValue, JsValue> {
        to_value(self.instance.borrow().character()).map_err(to_js)
    }

    /// Registers a click now; returns the new milliseconds per frame
    #[wasm_bindgen(js_name = recordClick)]
    pub fn record_click(&self) -> Result<f64, JsValue> {
        let now = browser::now().map_err(to_js)?;
        Ok(self.instance.borrow_mut().record_click(now))
    }

    pub fn speed(&self) -> f64 {
        self.instance.borrow().speed()
    }

    pub fn frame(&self) -> usize {
        self.instance.borrow().frame()
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.instance.borrow().is_ready()
    }

    /// Stops the frame loop; the view draws nothing afterwards
    pub fn stop(&self) {
        self.game_loop.stop();
    }
}
