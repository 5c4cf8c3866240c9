use crate::geometry::Rect;

pub const BIRD_X: f64 = 80.0;
/// Velocity added every tick (positive = downward).
pub const GRAVITY: f64 = 0.5;
/// Velocity set by a jump. Overrides, never adds.
pub const JUMP_STRENGTH: f64 = -10.0;
pub const BIRD_SIZE: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
}

impl Bird {
    pub fn new(start_y: f64) -> Self {
        Self {
            x: BIRD_X,
            y: start_y,
            velocity: 0.0,
        }
    }

    pub fn jump(&mut self) {
        self.velocity = JUMP_STRENGTH;
    }

    /// Semi-implicit Euler: velocity first, then position.
    pub fn update(&mut self) {
        self.velocity += GRAVITY;
        self.y += self.velocity;
    }

    /// Square box centred on the bird. Collision uses this, not the drawn circle.
    pub fn rect(&self) -> Rect {
        let half = BIRD_SIZE / 2.0;
        Rect::new(self.x - half, self.y - half, BIRD_SIZE, BIRD_SIZE)
    }
}
