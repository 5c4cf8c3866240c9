//! A Flappy Bird simulation that can be played or stepped by an agent.
//!
//! ```
//! use flappy_rl::{Action, Game, GameConfig};
//!
//! let mut game = Game::with_seed(GameConfig::default(), 7).unwrap();
//! let mut state = game.reset();
//! for _ in 0..10_000 {
//!     let action = if state.bird_y > state.next_pipe_bottom - 40.0 {
//!         Action::Jump
//!     } else {
//!         Action::Noop
//!     };
//!     let step = game.step(action);
//!     if step.done {
//!         break;
//!     }
//!     state = step.state;
//! }
//! ```

pub mod agent;
pub mod bird;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod pipe;
pub mod render;
pub mod sound;

pub use agent::{EpisodeSummary, GapFollower, Policy, RandomPolicy, run_episode};
pub use bird::Bird;
pub use config::{ConfigError, GameConfig};
pub use engine::{Action, Game, InvalidAction, Observation, Phase, Step};
pub use pipe::Pipe;
pub use render::Renderer;
pub use sound::Sfx;
