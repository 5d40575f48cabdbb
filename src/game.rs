use crate::catalog::{Action, Catalog, Direction, Tool};
use crate::character::Character;
use crate::compositor::{Compositor, DrawRequest, LayerImage};
use crate::config::{RenderConfig, SpeedConfig};
use crate::engine::{CanvasRenderer, DrawSurface, Game, ImageLoader, Point, Size};
use crate::sprite::{AnimationClock, ResolvedLayer, Resolver};
use anyhow::{anyhow, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;
use web_sys::HtmlImageElement;

// ┌──────────────── Instance Update Flow ───────────────────────────────────┐
// │                                                                         │
// │   page event          CharacterInstance             surface             │
// │   ──────────          ─────────────────             ───────             │
// │   set_action ───────► epoch += 1, clock reset                           │
// │                       begin_load ──► LoadPlan                           │
// │                                        │ (loader, join_all)             │
// │                       finish_load ◄────┘ stale epoch ? discard          │
// │   click ────────────► record_click ─► speed                             │
// │   animation frame ──► update(now) ──► frame                             │
// │                       draw ───────────────────────► clear/clip/copy     │
// │                                                                         │
// └─────────────────────────────────────────────────────────────────────────┘

/// Outcome of loading one sheet; failures are cached too, so a missing file
/// is requested once and then simply left out of the picture.
#[derive(Debug)]
pub enum LoadResult<I> {
    Loaded(Rc<I>),
    Failed(String),
}

impl<I> LoadResult<I> {
    fn image(&self) -> Option<&I> {
        match self {
            LoadResult::Loaded(image) => Some(image),
            LoadResult::Failed(_) => None,
        }
    }
}

/// Transaction state of a mini instance, as reported by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Submitting,
    Optimistic,
    Confirmed,
    Failed,
}

impl InstanceStatus {
    pub fn action(&self) -> Action {
        match self {
            InstanceStatus::Submitting | InstanceStatus::Optimistic => Action::Axe,
            InstanceStatus::Failed => Action::Die,
            InstanceStatus::Confirmed => Action::Idle,
        }
    }

    pub fn is_animating(&self) -> bool {
        !matches!(self, InstanceStatus::Confirmed)
    }
}

impl FromStr for InstanceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submitting" => Ok(InstanceStatus::Submitting),
            "optimistic" => Ok(InstanceStatus::Optimistic),
            "confirmed" => Ok(InstanceStatus::Confirmed),
            "failed" => Ok(InstanceStatus::Failed),
            _ => Err(anyhow!("Unknown instance status : '{}'", s)),
        }
    }
}

/// Sheets still to fetch for one character + action combination
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub epoch: u64,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone)]
struct LayerSet {
    epoch: u64,
    action: Action,
    layers: Vec<ResolvedLayer>,
    tool: String,
}

/// Loads every path at once and waits for all of them
pub async fn gather<L: ImageLoader>(loader: &L, paths: &[String]) -> Vec<(String, Result<L::Image>)> {
    let loads = paths.iter().map(|path| async move {
        let result = loader.load(path).await;
        (path.clone(), result)
    });
    join_all(loads).await
}

/// One on-screen character : its clock, its image cache and the layer set
/// currently on display. Instances share nothing but the read-only catalog,
/// so several of them animate independently.
pub struct CharacterInstance<I> {
    catalog: Rc<Catalog>,
    resolver: Resolver,
    compositor: Compositor,
    clock: AnimationClock,
    character: Character,
    action: Action,
    direction: Direction,
    tool: Tool,
    dest_size: Option<Size>,
    dest_origin: Option<Point>,
    cache: HashMap<String, LoadResult<I>>,
    // bumped by anything that changes which sheets are needed
    epoch: u64,
    pending: Option<LayerSet>,
    installed: Option<LayerSet>,
    dirty: bool,
}

impl<I> CharacterInstance<I> {
    pub fn new(
        catalog: Rc<Catalog>,
        character: Character,
        render: RenderConfig,
        speed: SpeedConfig,
    ) -> Self {
        let action = Action::default();
        let resolver = Resolver::new(catalog.clone(), &render.asset_root, &render.preview_root);
        let clock = AnimationClock::new(catalog.frame_length(action), speed);
        CharacterInstance {
            compositor: Compositor::new(catalog.clone(), render),
            catalog,
            resolver,
            clock,
            character,
            action,
            direction: Direction::default(),
            tool: Tool::default(),
            dest_size: None,
            dest_origin: None,
            cache: HashMap::new(),
            epoch: 0,
            pending: None,
            installed: None,
            dirty: true,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn frame(&self) -> usize {
        self.clock.frame()
    }

    pub fn speed(&self) -> f64 {
        self.clock.speed()
    }

    pub fn is_animating(&self) -> bool {
        self.clock.is_running()
    }

    /// Whether the sheets of the current character + action are all in
    pub fn is_ready(&self) -> bool {
        self.installed
            .as_ref()
            .map_or(false, |set| set.epoch == self.epoch)
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty && self.is_ready()
    }

    fn invalidate(&mut self) {
        self.epoch += 1;
        self.pending = None;
        self.dirty = true;
    }

    /// Swap in a whole new character; nothing is drawn until its sheets load
    pub fn set_character(&mut self, character: Character) {
        if character != self.character {
            self.character = character;
            self.invalidate();
        }
    }

    pub fn set_action(&mut self, action: Action) {
        if action != self.action {
            self.action = action;
            self.clock.set_action(self.catalog.frame_length(action));
            self.invalidate();
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            self.tool = tool;
            if self.action.shows_selected_tool() {
                self.invalidate();
            }
        }
    }

    pub fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            self.direction = direction;
            self.dirty = true;
        }
    }

    pub fn set_animating(&mut self, animating: bool) {
        if animating != self.clock.is_running() {
            self.clock.set_animating(animating);
            self.dirty = true;
        }
    }

    pub fn set_status(&mut self, status: InstanceStatus) {
        self.set_action(status.action());
        self.set_animating(status.is_animating());
    }

    /// Scale the sprite to `size` and place it at `origin` instead of
    /// stretching it centred over the whole surface
    pub fn set_placement(&mut self, size: Option<Size>, origin: Option<Point>) {
        self.dest_size = size;
        self.dest_origin = origin;
        self.dirty = true;
    }

    pub fn record_click(&mut self, now: f64) -> f64 {
        self.clock.record_click(now)
    }

    pub fn set_speed(&mut self, speed_ms: f64) {
        self.clock.set_speed(speed_ms);
    }

    /// Moves the clock to `now`; true when a new frame is due on screen
    pub fn update(&mut self, now: f64) -> bool {
        let changed = self.clock.advance_to(now);
        self.dirty |= changed;
        changed
    }

    /// Resolves the current character + action and lists the sheets not yet
    /// cached. The resolution is kept until [`Self::finish_load`] brings back
    /// results for the same epoch.
    pub fn begin_load(&mut self) -> LoadPlan {
        let layers = self.resolver.resolve(&self.character, self.action);
        let tool = self.resolver.resolve_tool(self.action, self.tool);

        let mut paths: Vec<String> = Vec::new();
        let wanted = layers
            .iter()
            .filter(|layer| layer.is_drawable())
            .map(|layer| &layer.path)
            .chain(std::iter::once(&tool));
        for path in wanted {
            if !self.cache.contains_key(path) && !paths.contains(path) {
                paths.push(path.clone());
            }
        }

        self.pending = Some(LayerSet {
            epoch: self.epoch,
            action: self.action,
            layers,
            tool,
        });
        LoadPlan {
            epoch: self.epoch,
            paths,
        }
    }

    /// Stores load results and, when they belong to the current epoch,
    /// installs the pending layer set. Results of an older epoch are
    /// dropped. Returns true when the instance is ready to draw.
    pub fn finish_load(&mut self, epoch: u64, results: Vec<(String, Result<I>)>) -> bool {
        if epoch != self.epoch {
            log!(
                "Discarding {} sheet(s) loaded for a stale character/action",
                results.len()
            );
            return false;
        }
        for (path, result) in results {
            let entry = match result {
                Ok(image) => LoadResult::Loaded(Rc::new(image)),
                Err(err) => {
                    warn!("Could not load '{}', layer will be skipped : {:#}", path, err);
                    LoadResult::Failed(format!("{:#}", err))
                }
            };
            self.cache.insert(path, entry);
        }
        match self.pending.take() {
            Some(set) if set.epoch == epoch => {
                self.installed = Some(set);
                self.dirty = true;
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// [`Self::begin_load`], every sheet fetched through `loader`, then
    /// [`Self::finish_load`]
    pub async fn load<L>(&mut self, loader: &L) -> bool
    where
        L: ImageLoader<Image = I>,
    {
        let plan = self.begin_load();
        let results = gather(loader, &plan.paths).await;
        self.finish_load(plan.epoch, results)
    }

    /// Paints the current frame. Does nothing (returns 0) while the sheets
    /// of the current character + action are still loading.
    pub fn draw<S>(&mut self, surface: &S) -> usize
    where
        S: DrawSurface<Image = I>,
    {
        let Some(set) = self.installed.as_ref().filter(|set| set.epoch == self.epoch) else {
            return 0;
        };

        let layers: Vec<LayerImage<'_, I>> = set
            .layers
            .iter()
            .map(|layer| LayerImage {
                slot: layer.slot,
                image: self.cache.get(&layer.path).and_then(LoadResult::image),
                variant: self.character.get(layer.slot),
            })
            .collect();
        let tool = self.cache.get(&set.tool).and_then(LoadResult::image);

        let mut request = DrawRequest::new(set.action, self.clock.frame(), self.direction);
        request.dest_size = self.dest_size;
        request.dest_origin = self.dest_origin;

        let drawn = self.compositor.draw(surface, &layers, &request, tool);
        self.dirty = false;
        drawn
    }

    /// Static preview of the character from the preview sheets, through
    /// `loader` and bypassing the animation cache
    pub async fn draw_preview<L, S>(&self, loader: &L, surface: &S) -> usize
    where
        L: ImageLoader<Image = I>,
        S: DrawSurface<Image = I>,
    {
        let resolved = self.resolver.resolve_preview(&self.character);
        let paths: Vec<String> = resolved
            .iter()
            .filter(|layer| layer.is_drawable())
            .map(|layer| layer.path.clone())
            .collect();
        let loaded: HashMap<String, I> = gather(loader, &paths)
            .await
            .into_iter()
            .filter_map(|(path, result)| match result {
                Ok(image) => Some((path, image)),
                Err(err) => {
                    warn!("Preview sheet '{}' failed : {:#}", path, err);
                    None
                }
            })
            .collect();

        let layers: Vec<LayerImage<'_, I>> = resolved
            .iter()
            .map(|layer| LayerImage {
                slot: layer.slot,
                image: loaded.get(&layer.path),
                variant: self.character.get(layer.slot),
            })
            .collect();
        self.compositor.draw_preview(surface, &layers)
    }
}

impl Game for CharacterInstance<HtmlImageElement> {
    fn update(&mut self, now: f64) {
        CharacterInstance::update(self, now);
    }

    fn draw(&mut self, renderer: &CanvasRenderer) {
        if self.needs_redraw() {
            CharacterInstance::draw(self, renderer);
        }
    }
}
