use crate::domain::asteroid::Size;
use crate::domain::entity::Body;
use crate::domain::tuning::BulletTuning;

#[derive(Debug, Clone)]
pub struct Bullet {
    pub body: Body,
    /// Slot of the ship that fired this bullet; scores credit its owner.
    pub owner_slot: usize,
    /// Simulation time at creation, for TTL expiry.
    pub created_at_ms: u64,
    /// Size of the asteroid this bullet hit, consumed once for scoring.
    pub hit_asteroid: Option<Size>,
    ttl_ms: u64,
}

impl Bullet {
    pub fn new(
        owner_slot: usize,
        x: f32,
        y: f32,
        heading: i32,
        now_ms: u64,
        tuning: &BulletTuning,
    ) -> Self {
        let mut body = Body::new(x, y, heading, tuning.speed);
        body.radius = tuning.radius;
        Self {
            body,
            owner_slot,
            created_at_ms: now_ms,
            hit_asteroid: None,
            ttl_ms: tuning.ttl_ms,
        }
    }

    /// Advances the bullet one tick, self-destructing once its TTL elapses.
    pub fn advance(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.created_at_ms) > self.ttl_ms {
            self.body.destroyed = true;
            return;
        }
        self.body.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::TICK_MS;

    #[test]
    fn bullet_expires_after_ttl() {
        let tuning = BulletTuning::default();
        let mut bullet = Bullet::new(0, 100.0, 100.0, 90, 0, &tuning);
        let mut now = 0;
        while now <= tuning.ttl_ms {
            bullet.advance(now);
            assert!(!bullet.body.destroyed);
            now += TICK_MS;
        }
        bullet.advance(now);
        assert!(bullet.body.destroyed);
    }

    #[test]
    fn bullet_moves_along_its_heading() {
        let tuning = BulletTuning::default();
        let mut bullet = Bullet::new(0, 100.0, 100.0, 0, 0, &tuning);
        bullet.advance(TICK_MS);
        // Heading 0 is straight up; screen y shrinks.
        assert_eq!(bullet.body.x, 100.0);
        assert!(bullet.body.y < 100.0);
    }
}
