use crate::domain::entity::Body;
use crate::domain::tuning::{AsteroidTuning, FIELD_HEIGHT, FIELD_WIDTH};

use rand::Rng;
use rand::rngs::StdRng;

/// Asteroid size tier. Smaller rocks are worth more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Large,
    Medium,
    Small,
}

impl Size {
    pub fn score_value(self) -> i32 {
        match self {
            Size::Large => 20,
            Size::Medium => 50,
            Size::Small => 100,
        }
    }

    /// The tier produced when a rock of this size is destroyed.
    pub fn split(self) -> Option<Size> {
        match self {
            Size::Large => Some(Size::Medium),
            Size::Medium => Some(Size::Small),
            Size::Small => None,
        }
    }

    pub fn radius(self, tuning: &AsteroidTuning) -> i32 {
        match self {
            Size::Large => tuning.large_radius,
            Size::Medium => tuning.medium_radius,
            Size::Small => tuning.small_radius,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub body: Body,
    pub size: Size,
    /// Scalar launch speed, kept for wire resyncs (asteroids never steer).
    pub speed: i32,
}

impl Asteroid {
    pub fn new(
        x: f32,
        y: f32,
        heading: i32,
        speed: i32,
        size: Size,
        tuning: &AsteroidTuning,
    ) -> Self {
        let mut body = Body::new(x, y, heading, speed);
        body.radius = size.radius(tuning);
        Self { body, size, speed }
    }

    /// Child rocks released when this asteroid is destroyed: two of the next
    /// tier down at the parent's position, each on an independent random
    /// course, or none for the smallest tier.
    pub fn split_children(&self, rng: &mut StdRng, tuning: &AsteroidTuning) -> Vec<Asteroid> {
        let Some(child_size) = self.size.split() else {
            return Vec::new();
        };
        (0..2)
            .map(|_| {
                let heading = rng.gen_range(0..360);
                let speed = rng.gen_range(tuning.min_speed..=tuning.max_speed);
                Asteroid::new(self.body.x, self.body.y, heading, speed, child_size, tuning)
            })
            .collect()
    }
}

/// Spawns a fresh field of large asteroids along the screen edges with random
/// courses. Levels at or below zero produce an empty field.
pub fn generate_field(level: i32, rng: &mut StdRng, tuning: &AsteroidTuning) -> Vec<Asteroid> {
    if level < 1 {
        return Vec::new();
    }
    (0..tuning.field_size)
        .map(|_| {
            // Coin flip between the top edge and the left edge; wrap motion
            // spreads the field over the first seconds of the level.
            let along_top = rng.gen_bool(0.5);
            let (x, y) = if along_top {
                (rng.gen_range(0..FIELD_WIDTH as i32) as f32, 0.0)
            } else {
                (0.0, rng.gen_range(0..FIELD_HEIGHT as i32) as f32)
            };
            let heading = rng.gen_range(0..360);
            let speed = rng.gen_range(tuning.min_speed..=tuning.max_speed);
            Asteroid::new(x, y, heading, speed, Size::Large, tuning)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn large_splits_into_two_medium_at_parent_position() {
        let tuning = AsteroidTuning::default();
        let mut rng = StdRng::seed_from_u64(7);
        let parent = Asteroid::new(300.0, 200.0, 45, 5, Size::Large, &tuning);
        let children = parent.split_children(&mut rng, &tuning);
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.size, Size::Medium);
            assert_eq!(child.body.x, 300.0);
            assert_eq!(child.body.y, 200.0);
            assert!((0..360).contains(&child.body.heading));
            assert!((tuning.min_speed..=tuning.max_speed).contains(&child.speed));
        }
    }

    #[test]
    fn small_splits_into_nothing() {
        let tuning = AsteroidTuning::default();
        let mut rng = StdRng::seed_from_u64(7);
        let parent = Asteroid::new(10.0, 10.0, 0, 2, Size::Small, &tuning);
        assert!(parent.split_children(&mut rng, &tuning).is_empty());
    }

    #[test]
    fn generated_field_hugs_the_edges() {
        let tuning = AsteroidTuning::default();
        let mut rng = StdRng::seed_from_u64(42);
        let field = generate_field(1, &mut rng, &tuning);
        assert_eq!(field.len(), tuning.field_size);
        for rock in &field {
            assert_eq!(rock.size, Size::Large);
            assert!(rock.body.x == 0.0 || rock.body.y == 0.0);
            assert!((tuning.min_speed..=tuning.max_speed).contains(&rock.speed));
        }
    }

    #[test]
    fn no_field_outside_gameplay_levels() {
        let tuning = AsteroidTuning::default();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(generate_field(0, &mut rng, &tuning).is_empty());
        assert!(generate_field(-1, &mut rng, &tuning).is_empty());
    }
}
