//! The steppable simulation.
//!
//! A [`Game`] owns the bird and the pipes and advances them one tick per
//! [`Game::step`]. Every step returns the encoded [`Observation`], a reward
//! and a `done` flag, which is all an agent needs. Rendering reads the game
//! through the accessors and never mutates it.

use crate::bird::Bird;
use crate::config::{ConfigError, GameConfig};
use crate::pipe::Pipe;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

pub const SURVIVAL_REWARD: i32 = 1;
pub const TERMINAL_PENALTY: i32 = -1000;
/// How far past the right edge the first pipe of an episode starts.
pub const FIRST_PIPE_LEAD: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Noop,
    Jump,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid action {0}, expected 0 (no-op) or 1 (jump)")]
pub struct InvalidAction(pub u8);

impl TryFrom<u8> for Action {
    type Error = InvalidAction;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Noop),
            1 => Ok(Action::Jump),
            other => Err(InvalidAction(other)),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        match action {
            Action::Noop => 0,
            Action::Jump => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Over,
}

/// What an agent sees. Shape and units never change between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub bird_y: f64,
    pub bird_velocity: f64,
    /// From the bird's x to the left edge of the next pipe.
    pub next_pipe_distance: f64,
    pub next_pipe_top: f64,
    pub next_pipe_bottom: f64,
}

impl Observation {
    pub const LEN: usize = 5;

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.bird_y,
            self.bird_velocity,
            self.next_pipe_distance,
            self.next_pipe_top,
            self.next_pipe_bottom,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: Observation,
    pub reward: i32,
    pub done: bool,
}

pub struct Game<R: Rng = StdRng> {
    config: GameConfig,
    rng: R,
    bird: Bird,
    pipes: Vec<Pipe>,
    score: u32,
    phase: Phase,
    frames_elapsed: u64,
    current_speed: f64,
}

impl Game<StdRng> {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible game: the same seed and actions give the same episode.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Validate `config` and start the first episode.
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Game {
            bird: Bird::new(start_y(&config)),
            pipes: Vec::new(),
            score: 0,
            phase: Phase::Running,
            frames_elapsed: 0,
            current_speed: config.base_speed,
            config,
            rng,
        };
        game.reset();
        Ok(game)
    }

    pub fn reset(&mut self) -> Observation {
        self.bird = Bird::new(start_y(&self.config));
        let first = Pipe::spawn(
            self.config.screen_width + FIRST_PIPE_LEAD,
            self.config.pipe_gap,
            self.config.screen_height,
            &mut self.rng,
        );
        self.pipes.clear();
        self.pipes.push(first);
        self.score = 0;
        self.frames_elapsed = 0;
        self.current_speed = self.config.base_speed;
        self.phase = Phase::Running;
        log::debug!("Episode reset");
        self.state()
    }

    /// Once the episode is over this does nothing and keeps reporting
    /// `done` with a zero reward until [`Game::reset`] is called.
    pub fn step(&mut self, action: Action) -> Step {
        if self.phase == Phase::Over {
            return Step {
                state: self.state(),
                reward: 0,
                done: true,
            };
        }

        if action == Action::Jump {
            self.bird.jump();
        }
        self.bird.update();

        self.frames_elapsed += 1;
        let seconds = self.frames_elapsed as f64 / f64::from(self.config.tick_rate);
        self.current_speed = self.config.base_speed + seconds * self.config.speed_increase_rate;

        // First colliding pipe in spawn order ends the episode; the rest of
        // the tick (scoring, despawn, spawn) is skipped.
        for pipe in &mut self.pipes {
            pipe.update(self.current_speed);
            if pipe.collides_with(&self.bird) {
                return self.finish("pipe");
            }
        }

        for pipe in self.pipes.iter_mut().filter(|p| !p.passed) {
            if pipe.right_edge() < self.bird.x {
                pipe.passed = true;
                self.score += 1;
                log::trace!("Pipe passed, score {}", self.score);
            }
        }

        let before = self.pipes.len();
        self.pipes.retain(|p| !p.off_screen());
        if self.pipes.len() != before {
            log::trace!("Despawned {} pipe(s)", before - self.pipes.len());
        }

        let spawn_line = self.config.screen_width - self.config.pipe_distance;
        if self.pipes.last().is_none_or(|p| p.x < spawn_line) {
            let pipe = Pipe::spawn(
                self.config.screen_width,
                self.config.pipe_gap,
                self.config.screen_height,
                &mut self.rng,
            );
            log::trace!("Spawned pipe with top height {}", pipe.top_height);
            self.pipes.push(pipe);
        }

        if self.bird.y < 0.0 || self.bird.y > self.config.screen_height {
            return self.finish("out of bounds");
        }

        Step {
            state: self.state(),
            reward: SURVIVAL_REWARD,
            done: false,
        }
    }

    fn finish(&mut self, cause: &str) -> Step {
        self.phase = Phase::Over;
        log::debug!(
            "Episode over ({}) after {} ticks, score {}",
            cause,
            self.frames_elapsed,
            self.score
        );
        Step {
            state: self.state(),
            reward: TERMINAL_PENALTY,
            done: true,
        }
    }

    /// First pipe in spawn order whose trailing edge has not cleared the bird.
    pub fn next_pipe(&self) -> Option<&Pipe> {
        self.pipes.iter().find(|p| p.right_edge() >= self.bird.x)
    }

    pub fn state(&self) -> Observation {
        match self.next_pipe() {
            Some(pipe) => Observation {
                bird_y: self.bird.y,
                bird_velocity: self.bird.velocity,
                next_pipe_distance: pipe.x - self.bird.x,
                next_pipe_top: pipe.top_height,
                next_pipe_bottom: pipe.gap_bottom(),
            },
            None => Observation {
                bird_y: self.bird.y,
                bird_velocity: self.bird.velocity,
                next_pipe_distance: self.config.screen_width,
                next_pipe_top: self.config.screen_height / 2.0,
                next_pipe_bottom: self.config.screen_height,
            },
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bird(&self) -> &Bird {
        &self.bird
    }

    /// Pipes in spawn order, which is also left-to-right.
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.frames_elapsed
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    #[cfg(test)]
    pub(crate) fn pipes_mut(&mut self) -> &mut Vec<Pipe> {
        &mut self.pipes
    }

    #[cfg(test)]
    pub(crate) fn bird_mut(&mut self) -> &mut Bird {
        &mut self.bird
    }
}

fn start_y(config: &GameConfig) -> f64 {
    (config.screen_height / 2.0).floor()
}
