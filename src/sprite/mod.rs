// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Directory Structure                                 │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ sprite/           │ Everything between a character and its frame         │
// │ ├── resolver.rs   │ Character + action -> ordered sheet paths            │
// │ ├── state.rs      │ Idle/Running clock, frame index per tick             │
// │ └── speed.rs      │ Click rate -> milliseconds per frame                 │
// └───────────────────┴──────────────────────────────────────────────────────┘
pub mod resolver;
pub mod speed;
pub mod state;

pub use resolver::{ResolvedLayer, Resolver};
pub use speed::ClickRate;
pub use state::AnimationClock;
