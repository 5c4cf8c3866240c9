//! Helpers for driving a [`Game`] from code instead of a keyboard.

use crate::engine::{Action, Game, Observation, Step};
use rand::Rng;
use std::ops::ControlFlow;

/// Anything that picks an action from an observation.
pub trait Policy {
    fn act(&mut self, obs: &Observation) -> Action;
}

impl<F: FnMut(&Observation) -> Action> Policy for F {
    fn act(&mut self, obs: &Observation) -> Action {
        self(obs)
    }
}

/// Keeps the bird near the lower part of the next gap.
///
/// Jumps when the bird is falling and has sunk below `margin` above the
/// gap bottom. Good enough to clear many pipes with the default config.
#[derive(Debug, Clone, Copy)]
pub struct GapFollower {
    pub margin: f64,
}

impl Default for GapFollower {
    fn default() -> Self {
        Self { margin: 45.0 }
    }
}

impl Policy for GapFollower {
    fn act(&mut self, obs: &Observation) -> Action {
        let aim = obs.next_pipe_bottom - self.margin;
        if obs.bird_velocity >= 0.0 && obs.bird_y > aim {
            Action::Jump
        } else {
            Action::Noop
        }
    }
}

/// Jumps with a fixed probability each tick.
pub struct RandomPolicy<R: Rng> {
    jump_probability: f64,
    rng: R,
}

impl<R: Rng> RandomPolicy<R> {
    /// Probabilities outside `[0, 1]` are clamped; NaN never jumps.
    pub fn new(jump_probability: f64, rng: R) -> Self {
        let jump_probability = if jump_probability.is_nan() {
            0.0
        } else {
            jump_probability.clamp(0.0, 1.0)
        };
        Self {
            jump_probability,
            rng,
        }
    }

    pub fn jump_probability(&self) -> f64 {
        self.jump_probability
    }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    fn act(&mut self, _obs: &Observation) -> Action {
        if self.rng.gen_bool(self.jump_probability) {
            Action::Jump
        } else {
            Action::Noop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpisodeSummary {
    pub steps: u64,
    pub score: u32,
    pub total_reward: i64,
    /// False when the episode hit `max_steps` or was stopped before ending.
    pub crashed: bool,
}

/// Reset `game` and play one episode with `policy`.
///
/// `on_step` sees the game after every tick; renderers hook in there.
/// Returning `ControlFlow::Break` stops the episode early.
pub fn run_episode<R, P, F>(
    game: &mut Game<R>,
    policy: &mut P,
    max_steps: u64,
    mut on_step: F,
) -> EpisodeSummary
where
    R: Rng,
    P: Policy + ?Sized,
    F: FnMut(&Game<R>, &Step) -> ControlFlow<()>,
{
    let mut obs = game.reset();
    let mut summary = EpisodeSummary::default();

    while summary.steps < max_steps {
        let step = game.step(policy.act(&obs));
        summary.steps += 1;
        summary.total_reward += i64::from(step.reward);
        if step.done {
            summary.crashed = true;
        }
        if on_step(game, &step).is_break() || step.done {
            break;
        }
        obs = step.state;
    }

    summary.score = game.score();
    log::debug!(
        "Episode finished: {} steps, score {}, reward {}",
        summary.steps,
        summary.score,
        summary.total_reward
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::engine::{SURVIVAL_REWARD, TERMINAL_PENALTY};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn game(seed: u64) -> Game<ChaCha8Rng> {
        Game::with_rng(GameConfig::default(), ChaCha8Rng::seed_from_u64(seed))
            .expect("valid config")
    }

    fn obs(bird_y: f64, bird_velocity: f64) -> Observation {
        Observation {
            bird_y,
            bird_velocity,
            next_pipe_distance: 100.0,
            next_pipe_top: 200.0,
            next_pipe_bottom: 400.0,
        }
    }

    #[test]
    fn test_gap_follower_jumps_when_sinking_low() {
        let mut p = GapFollower::default();
        assert_eq!(p.act(&obs(380.0, 2.0)), Action::Jump);
        assert_eq!(p.act(&obs(380.0, -3.0)), Action::Noop);
        assert_eq!(p.act(&obs(300.0, 2.0)), Action::Noop);
    }

    #[test]
    fn test_random_policy_extremes() {
        let mut never = RandomPolicy::new(0.0, ChaCha8Rng::seed_from_u64(1));
        let mut always = RandomPolicy::new(1.0, ChaCha8Rng::seed_from_u64(1));
        for _ in 0..50 {
            assert_eq!(never.act(&obs(300.0, 0.0)), Action::Noop);
            assert_eq!(always.act(&obs(300.0, 0.0)), Action::Jump);
        }
    }

    #[test]
    fn test_random_policy_out_of_range_probabilities() {
        let mut nan = RandomPolicy::new(f64::NAN, ChaCha8Rng::seed_from_u64(2));
        assert_eq!(nan.jump_probability(), 0.0);
        for _ in 0..50 {
            assert_eq!(nan.act(&obs(300.0, 0.0)), Action::Noop);
        }
        let high = RandomPolicy::new(3.5, ChaCha8Rng::seed_from_u64(2));
        assert_eq!(high.jump_probability(), 1.0);
        let low = RandomPolicy::new(-1.0, ChaCha8Rng::seed_from_u64(2));
        assert_eq!(low.jump_probability(), 0.0);
    }

    #[test]
    fn test_closure_policy() {
        let mut p = |_: &Observation| Action::Noop;
        assert_eq!(Policy::act(&mut p, &obs(0.0, 0.0)), Action::Noop);
    }

    #[test]
    fn test_noop_episode_rewards() {
        let mut g = game(5);
        let mut p = |_: &Observation| Action::Noop;
        let summary = run_episode(&mut g, &mut p, 1000, |_, _| ControlFlow::Continue(()));
        assert!(summary.crashed);
        assert_eq!(summary.score, 0);
        let survived = summary.steps as i64 - 1;
        assert_eq!(
            summary.total_reward,
            survived * i64::from(SURVIVAL_REWARD) + i64::from(TERMINAL_PENALTY)
        );
    }

    #[test]
    fn test_max_steps_caps_episode() {
        let mut g = game(5);
        let mut p = GapFollower::default();
        let summary = run_episode(&mut g, &mut p, 10, |_, _| ControlFlow::Continue(()));
        assert_eq!(summary.steps, 10);
        assert!(!summary.crashed);
        assert!(!g.is_over());
    }

    #[test]
    fn test_on_step_sees_every_tick() {
        let mut g = game(8);
        let mut p = |_: &Observation| Action::Noop;
        let mut seen = 0u64;
        let summary = run_episode(&mut g, &mut p, 1000, |game, step| {
            seen += 1;
            assert_eq!(game.frames_elapsed(), seen);
            assert_eq!(step.done, game.is_over());
            ControlFlow::Continue(())
        });
        assert_eq!(seen, summary.steps);
    }

    #[test]
    fn test_break_stops_episode() {
        let mut g = game(8);
        let mut p = |_: &Observation| Action::Noop;
        let summary = run_episode(&mut g, &mut p, 1000, |game, _| {
            if game.frames_elapsed() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(summary.steps, 3);
        assert!(!summary.crashed);
    }
}
