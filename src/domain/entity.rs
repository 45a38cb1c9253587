use crate::domain::tuning::{FIELD_HEIGHT, FIELD_WIDTH};

/// Scale applied to acceleration and velocity when integrating per tick.
const SPEED_MULTIPLIER: f32 = 0.1;

/// Shared kinematic and collision state for ships, bullets, and asteroids.
///
/// Heading 0 points up; positive rotation is clockwise. Velocity is stored as
/// a vector so thrust can curve an existing trajectory.
#[derive(Debug, Clone)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    /// Current heading in degrees, kept in [0, 360).
    pub heading: i32,
    /// Signed degrees applied to heading each tick.
    pub rotation_rate: i32,
    /// Forward acceleration applied while `accelerating` is set.
    pub acceleration: i32,
    pub accelerating: bool,
    pub radius: i32,
    pub destroyed: bool,
}

impl Body {
    /// Creates a body travelling along `heading` at scalar `velocity`.
    pub fn new(x: f32, y: f32, heading: i32, velocity: i32) -> Self {
        let radians = (heading as f32).to_radians();
        Self {
            x,
            y,
            vel_x: radians.sin() * velocity as f32,
            vel_y: radians.cos() * velocity as f32,
            heading,
            rotation_rate: 0,
            acceleration: 0,
            accelerating: false,
            radius: 0,
            destroyed: false,
        }
    }

    /// Integrates one tick of rotation, thrust, and motion, then wraps the
    /// position onto the toroidal playfield.
    pub fn advance(&mut self) {
        self.heading = (self.heading + self.rotation_rate).rem_euclid(360);
        let radians = (self.heading as f32).to_radians();
        let accel = if self.accelerating {
            self.acceleration
        } else {
            0
        } as f32;
        self.vel_x += radians.sin() * accel * SPEED_MULTIPLIER;
        self.vel_y += radians.cos() * accel * SPEED_MULTIPLIER;
        self.x += self.vel_x * SPEED_MULTIPLIER;
        // Screen y grows downward, so forward velocity subtracts.
        self.y -= self.vel_y * SPEED_MULTIPLIER;
        self.x = self.x.rem_euclid(FIELD_WIDTH);
        self.y = self.y.rem_euclid(FIELD_HEIGHT);
    }

    /// Contact test between two live bodies. Manhattan distance stands in for
    /// circular overlap; cheap, and close enough at these radii.
    pub fn is_contacting(&self, other: &Body) -> bool {
        !self.destroyed
            && !other.destroyed
            && (self.x - other.x).abs() + (self.y - other.y).abs()
                < (self.radius + other.radius) as f32
    }

    /// Kills the body's motion inputs without marking it destroyed.
    pub fn halt_inputs(&mut self) {
        self.accelerating = false;
        self.rotation_rate = 0;
    }
}

/// Destroys both bodies unconditionally. First writer wins within a tick;
/// later contact tests see the destroyed flags and skip.
pub fn collide(a: &mut Body, b: &mut Body) {
    a.destroyed = true;
    b.destroyed = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_position_into_field_bounds() {
        let mut body = Body::new(5.0, 5.0, 315, 200);
        body.radius = 10;
        for _ in 0..2000 {
            body.advance();
            assert!((0.0..FIELD_WIDTH).contains(&body.x), "x = {}", body.x);
            assert!((0.0..FIELD_HEIGHT).contains(&body.y), "y = {}", body.y);
        }
    }

    #[test]
    fn heading_stays_normalized() {
        let mut body = Body::new(100.0, 100.0, 0, 0);
        body.rotation_rate = -7;
        for _ in 0..200 {
            body.advance();
            assert!((0..360).contains(&body.heading));
        }
        body.rotation_rate = 13;
        for _ in 0..200 {
            body.advance();
            assert!((0..360).contains(&body.heading));
        }
    }

    #[test]
    fn contact_uses_manhattan_distance() {
        let mut a = Body::new(100.0, 100.0, 0, 0);
        a.radius = 10;
        let mut b = Body::new(109.0, 110.0, 0, 0);
        b.radius = 10;
        // |dx| + |dy| = 19 < 20: contacting even though the circles barely miss.
        assert!(a.is_contacting(&b));
        b.x = 111.0;
        assert!(!a.is_contacting(&b));
    }

    #[test]
    fn destroyed_bodies_never_contact() {
        let mut a = Body::new(0.0, 0.0, 0, 0);
        a.radius = 50;
        let mut b = a.clone();
        collide(&mut a, &mut b);
        assert!(a.destroyed && b.destroyed);
        assert!(!a.is_contacting(&b));
    }
}
