use crate::bird::Bird;
use crate::geometry::Rect;
use rand::Rng;

pub const PIPE_WIDTH: f64 = 70.0;
/// Minimum height of the top column, and of the bottom column at spawn.
pub const PIPE_MARGIN: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub x: f64,
    pub gap: f64,
    /// Height of the top column; the gap starts here.
    pub top_height: f64,
    /// Set once, when the bird first clears the trailing edge.
    pub passed: bool,
    screen_height: f64,
}

impl Pipe {
    /// Spawn a pipe at `x` with a random opening.
    ///
    /// `top_height` is a whole number drawn uniformly from
    /// `[PIPE_MARGIN, screen_height - gap - PIPE_MARGIN]`. The caller
    /// guarantees that range is non-empty (see [`crate::GameConfig::validate`]).
    pub fn spawn<R: Rng + ?Sized>(x: f64, gap: f64, screen_height: f64, rng: &mut R) -> Self {
        let min = PIPE_MARGIN as i64;
        let max = ((screen_height - gap - PIPE_MARGIN).floor() as i64).max(min);
        let top_height = rng.gen_range(min..=max) as f64;
        Self::with_top_height(x, gap, top_height, screen_height)
    }

    pub fn with_top_height(x: f64, gap: f64, top_height: f64, screen_height: f64) -> Self {
        Self {
            x,
            gap,
            top_height,
            passed: false,
            screen_height,
        }
    }

    /// Scroll left by `speed`. Speed belongs to the engine, not the pipe.
    pub fn update(&mut self, speed: f64) {
        self.x -= speed;
    }

    pub fn right_edge(&self) -> f64 {
        self.x + PIPE_WIDTH
    }

    pub fn gap_bottom(&self) -> f64 {
        self.top_height + self.gap
    }

    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, PIPE_WIDTH, self.top_height)
    }

    pub fn bottom_rect(&self) -> Rect {
        let y = self.gap_bottom();
        Rect::new(self.x, y, PIPE_WIDTH, self.screen_height - y)
    }

    pub fn collides_with(&self, bird: &Bird) -> bool {
        let b = bird.rect();
        b.intersects(&self.top_rect()) || b.intersects(&self.bottom_rect())
    }

    pub fn off_screen(&self) -> bool {
        self.right_edge() < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pipe_at(x: f64, top_height: f64) -> Pipe {
        Pipe::with_top_height(x, 200.0, top_height, 600.0)
    }

    #[test]
    fn test_spawn_top_height_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let pipe = Pipe::spawn(400.0, 200.0, 600.0, &mut rng);
            assert!(pipe.top_height >= 100.0);
            assert!(pipe.top_height <= 300.0);
            assert_eq!(pipe.top_height.fract(), 0.0);
            assert!(!pipe.passed);
        }
    }

    #[test]
    fn test_spawn_with_tightest_gap_is_fixed() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pipe = Pipe::spawn(400.0, 400.0, 600.0, &mut rng);
        assert_relative_eq!(pipe.top_height, 100.0);
    }

    #[test]
    fn test_update_moves_left_by_speed() {
        let mut pipe = pipe_at(400.0, 150.0);
        pipe.update(3.0);
        assert_relative_eq!(pipe.x, 397.0);
        pipe.update(4.5);
        assert_relative_eq!(pipe.x, 392.5);
    }

    #[test]
    fn test_rects_leave_gap() {
        let pipe = pipe_at(100.0, 150.0);
        let top = pipe.top_rect();
        let bottom = pipe.bottom_rect();
        assert_relative_eq!(top.bottom(), 150.0);
        assert_relative_eq!(bottom.y, 350.0);
        assert_relative_eq!(bottom.bottom(), 600.0);
        assert_relative_eq!(top.w, PIPE_WIDTH);
    }

    #[test]
    fn test_collides_with_top_column() {
        let pipe = pipe_at(60.0, 250.0);
        let bird = Bird::new(200.0);
        assert!(pipe.collides_with(&bird));
    }

    #[test]
    fn test_collides_with_bottom_column() {
        let pipe = pipe_at(60.0, 100.0);
        let bird = Bird::new(320.0);
        assert!(pipe.collides_with(&bird));
    }

    #[test]
    fn test_no_collision_inside_gap() {
        let pipe = pipe_at(60.0, 200.0);
        let bird = Bird::new(300.0);
        assert!(!pipe.collides_with(&bird));
    }

    #[test]
    fn test_no_collision_when_horizontally_clear() {
        // Bird box spans x in [65, 95).
        let pipe = pipe_at(95.0, 500.0);
        let bird = Bird::new(300.0);
        assert!(!pipe.collides_with(&bird));
    }

    #[test]
    fn test_touching_gap_edge_is_not_a_collision() {
        // Bird box spans y in [285, 315); gap is [285, 485).
        let pipe = pipe_at(60.0, 285.0);
        let bird = Bird::new(300.0);
        assert!(!pipe.collides_with(&bird));
    }

    #[test]
    fn test_off_screen_only_past_left_edge() {
        assert!(!pipe_at(0.0, 150.0).off_screen());
        assert!(!pipe_at(-PIPE_WIDTH, 150.0).off_screen());
        assert!(pipe_at(-PIPE_WIDTH - 0.5, 150.0).off_screen());
    }
}
