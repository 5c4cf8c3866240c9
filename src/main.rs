use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, terminal,
};
use flappy_rl::{Action, Game, GameConfig, GapFollower, Renderer, Sfx, run_episode};
use std::io::{self, stdout};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flappy-rl", version, about = "Flappy Bird in your terminal, playable by humans and agents")]
struct Cli {
    /// TOML file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Horizontal distance between pipes
    #[arg(long)]
    pipe_distance: Option<f64>,

    /// Vertical gap height in pipes
    #[arg(long)]
    pipe_gap: Option<f64>,

    /// Scroll speed gained per second (0 keeps speed constant)
    #[arg(long)]
    speed_increase_rate: Option<f64>,

    /// Seed for pipe heights
    #[arg(long)]
    seed: Option<u64>,

    /// Disable sound effects
    #[arg(long)]
    mute: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play with the keyboard: Space to jump, q to quit
    Play,
    /// Let the built-in autopilot play
    Autopilot {
        #[arg(long, default_value_t = 10)]
        episodes: u32,

        /// Stop an episode after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_steps: u64,

        /// Draw the episodes in the terminal
        #[arg(long)]
        watch: bool,
    },
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GameConfig::default(),
        };
        if let Some(v) = self.pipe_distance {
            config.pipe_distance = v;
        }
        if let Some(v) = self.pipe_gap {
            config.pipe_gap = v;
        }
        if let Some(v) = self.speed_increase_rate {
            config.speed_increase_rate = v;
        }
        Ok(config)
    }

    fn game(&self) -> Result<Game> {
        let config = self.game_config()?;
        let game = match self.seed {
            Some(seed) => Game::with_seed(config, seed),
            None => Game::new(config),
        };
        game.context("invalid game settings")
    }
}

// ── Terminal ────────────────────────────────────────────────────────────────

fn enter_terminal() -> io::Result<(u16, u16)> {
    terminal::enable_raw_mode()?;
    execute!(
        stdout(),
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
    )?;
    terminal::size()
}

fn leave_terminal() -> io::Result<()> {
    execute!(
        stdout(),
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

/// Run `f` on the alternate screen, restoring the terminal even if it fails.
fn in_terminal<T>(f: impl FnOnce(u16, u16) -> Result<T>) -> Result<T> {
    let (cols, rows) = enter_terminal().context("setting up terminal")?;
    let result = f(cols, rows);
    leave_terminal().context("restoring terminal")?;
    result
}

enum Input {
    Flap,
    Quit,
    Resize(u16, u16),
}

fn poll_input() -> io::Result<Vec<Input>> {
    let mut inputs = Vec::new();
    while event::poll(Duration::ZERO)? {
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => inputs.push(Input::Quit),
                KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => inputs.push(Input::Flap),
                _ => {}
            },
            Event::Resize(c, r) => inputs.push(Input::Resize(c, r)),
            _ => {}
        }
    }
    Ok(inputs)
}

// ── Modes ───────────────────────────────────────────────────────────────────

fn play(mut game: Game, sfx: &Sfx) -> Result<()> {
    in_terminal(|cols, rows| {
        let tick_rate = game.config().tick_rate;
        let mut renderer = Renderer::new(stdout(), cols, rows, tick_rate);

        loop {
            let mut action = Action::Noop;
            for input in poll_input()? {
                match input {
                    Input::Quit => {
                        log::info!("Quit, best score {}", renderer.best());
                        return Ok(());
                    }
                    Input::Flap if game.is_over() => {
                        game.reset();
                    }
                    Input::Flap => action = Action::Jump,
                    Input::Resize(c, r) => renderer.resize(c, r),
                }
            }

            if !game.is_over() {
                if action == Action::Jump {
                    sfx.flap();
                }
                let step = game.step(action);
                if step.done {
                    sfx.death();
                    log::info!("Game over, score {}", game.score());
                }
            }

            renderer.render(&game, game.is_over())?;
        }
    })
}

fn autopilot(mut game: Game, episodes: u32, max_steps: u64, watch: bool) -> Result<()> {
    let mut policy = GapFollower::default();
    let mut summaries = Vec::new();

    if watch {
        in_terminal(|cols, rows| {
            let tick_rate = game.config().tick_rate;
            let mut renderer = Renderer::new(stdout(), cols, rows, tick_rate);
            let mut failure = None;
            let mut quit = false;

            for _ in 0..episodes {
                let summary = run_episode(&mut game, &mut policy, max_steps, |game, step| {
                    let drawn = poll_input().and_then(|inputs| {
                        for input in inputs {
                            match input {
                                Input::Quit => quit = true,
                                Input::Resize(c, r) => renderer.resize(c, r),
                                Input::Flap => {}
                            }
                        }
                        renderer.render(game, step.done)
                    });
                    if let Err(e) = drawn {
                        failure = Some(e);
                    }
                    if quit || failure.is_some() {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
                summaries.push(summary);
                if quit || failure.is_some() {
                    break;
                }
            }
            match failure {
                Some(e) => Err(e.into()),
                None => Ok(()),
            }
        })?;
    } else {
        for _ in 0..episodes {
            let summary = run_episode(&mut game, &mut policy, max_steps, |_, _| {
                ControlFlow::Continue(())
            });
            summaries.push(summary);
        }
    }

    for (i, s) in summaries.iter().enumerate() {
        println!(
            "episode {:>3}: score {:>4}  steps {:>6}  reward {:>7}{}",
            i + 1,
            s.score,
            s.steps,
            s.total_reward,
            if s.crashed { "" } else { "  (cut off)" }
        );
    }
    if !summaries.is_empty() {
        let mean = summaries.iter().map(|s| f64::from(s.score)).sum::<f64>()
            / summaries.len() as f64;
        let best = summaries.iter().map(|s| s.score).max().unwrap_or(0);
        println!("mean score {:.1}, best {}", mean, best);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let game = cli.game()?;
    log::info!("Starting with {:?}", game.config());

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => {
            let sfx = if cli.mute { Sfx::muted() } else { Sfx::new() };
            log::info!("Sound {}", if sfx.enabled() { "on" } else { "off" });
            play(game, &sfx)
        }
        Command::Autopilot {
            episodes,
            max_steps,
            watch,
        } => autopilot(game, episodes, max_steps, watch),
    }
}
