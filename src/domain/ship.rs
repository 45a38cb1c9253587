use crate::domain::bullet::Bullet;
use crate::domain::entity::Body;
use crate::domain::tuning::{BulletTuning, ShipTuning};

/// Explicit lifecycle state, each timed phase carrying its deadline. The
/// simulation driver evaluates deadlines once per tick; nothing here is
/// driven by wall-clock timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipState {
    /// Not on the field: freshly created, terminated, or out of lives.
    Destroyed,
    /// Destroyed with lives left; respawns once the deadline passes and the
    /// spawn point is clear.
    RespawnPending { at_ms: u64 },
    /// On the field but still materializing; immune to destruction.
    Spawning { until_ms: u64 },
    Alive,
}

/// A player-controlled ship. `body.destroyed` mirrors the lifecycle state:
/// set for `Destroyed`/`RespawnPending`, clear for `Spawning`/`Alive`.
#[derive(Debug, Clone)]
pub struct Ship {
    pub body: Body,
    pub state: ShipState,
    pub lives: i32,
    /// Highest number of lives this ship has held.
    pub max_lives: i32,
    pub score: i32,
    /// Live bullets in firing order, bounded at `max_bullets`.
    pub bullets: Vec<Bullet>,
    /// Set whenever locally controlled state changes; the session layer sends
    /// a ship update and clears it.
    pub sync_dirty: bool,
    /// Slot this ship occupies; maintained by the roster on insert.
    owner_slot: usize,
    tuning: ShipTuning,
}

impl Ship {
    /// Creates a ship off the field. Call `spawn` to put it into play.
    pub fn new(tuning: ShipTuning) -> Self {
        let mut body = Body::new(0.0, 0.0, 0, 0);
        body.acceleration = tuning.thrust;
        body.radius = tuning.radius;
        body.destroyed = true;
        Self {
            body,
            state: ShipState::Destroyed,
            lives: tuning.starting_lives,
            max_lives: tuning.starting_lives,
            score: 0,
            bullets: Vec::with_capacity(tuning.max_bullets),
            sync_dirty: false,
            owner_slot: 0,
            tuning,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.body.destroyed
    }

    /// True while the post-spawn invulnerability window is open.
    pub fn is_spawning(&self) -> bool {
        matches!(self.state, ShipState::Spawning { .. })
    }

    /// Engages or cuts thrust. Returns true if the setting changed, so the
    /// caller can emit the matching audio cue.
    pub fn set_thrust(&mut self, on: bool) -> bool {
        if self.body.accelerating == on {
            return false;
        }
        self.body.accelerating = on;
        self.sync_dirty = true;
        true
    }

    pub fn rotate_left(&mut self) {
        self.set_rotation(-self.tuning.rotate_speed);
    }

    pub fn rotate_right(&mut self) {
        self.set_rotation(self.tuning.rotate_speed);
    }

    pub fn rotate_stop(&mut self) {
        self.set_rotation(0);
    }

    fn set_rotation(&mut self, rate: i32) {
        if self.body.rotation_rate != rate {
            self.body.rotation_rate = rate;
            self.sync_dirty = true;
        }
    }

    /// Fires a bullet from just outside the hull along the current heading.
    /// A full pool makes this a silent no-op.
    pub fn fire(&mut self, now_ms: u64, tuning: &BulletTuning) -> Option<&Bullet> {
        if self.bullets.len() >= self.tuning.max_bullets {
            return None;
        }
        let radians = (self.body.heading as f32).to_radians();
        let reach = (self.body.radius - tuning.radius) as f32;
        let x = self.body.x + radians.sin() * reach;
        let y = self.body.y - radians.cos() * reach;
        self.bullets.push(Bullet::new(
            self.owner_slot,
            x,
            y,
            self.body.heading,
            now_ms,
            tuning,
        ));
        self.bullets.last()
    }

    /// Records the slot this ship occupies, retagging any live bullets.
    pub fn set_owner_slot(&mut self, slot: usize) {
        self.owner_slot = slot;
        for bullet in &mut self.bullets {
            bullet.owner_slot = slot;
        }
    }

    pub fn owner_slot(&self) -> usize {
        self.owner_slot
    }

    /// Puts the ship on the field, motionless and pointed up, opening the
    /// invulnerability window. Only an authoritative peer passes
    /// `spend_life`; clients learn their life count from the host.
    pub fn spawn(&mut self, now_ms: u64, spend_life: bool) {
        self.body.destroyed = false;
        self.state = ShipState::Spawning {
            until_ms: now_ms + self.tuning.materialize_ms,
        };
        if spend_life {
            self.lives -= 1;
        }
        self.sync_dirty = true;
    }

    /// Takes the ship off the field without the destruction lifecycle: stop
    /// thrust and rotation, mark destroyed.
    pub fn terminate(&mut self) {
        self.body.halt_inputs();
        self.body.destroyed = true;
        self.state = ShipState::Destroyed;
        self.sync_dirty = true;
    }

    /// Moves the ship to a spawn point with motion cleared. Resetting for a
    /// new game also restores score and lives.
    pub fn reset(&mut self, spawn: (f32, f32), new_game: bool) {
        self.body.x = spawn.0;
        self.body.y = spawn.1;
        self.body.heading = 0;
        self.body.vel_x = 0.0;
        self.body.vel_y = 0.0;
        if new_game {
            self.score = 0;
            self.lives = self.tuning.starting_lives;
            self.max_lives = self.tuning.starting_lives;
        }
    }

    /// Adds points, granting one life per `extra_life_score` boundary
    /// crossed. Returns true when a life was granted.
    pub fn add_score(&mut self, points: i32) -> bool {
        let step = self.tuning.extra_life_score;
        let granted = self.score / step < (self.score + points) / step;
        if granted {
            self.lives += 1;
            self.max_lives = self.max_lives.max(self.lives);
        }
        self.score += points;
        granted
    }

    /// Applies a kinematic update received from the network, overriding any
    /// locally predicted motion.
    pub fn force_update(
        &mut self,
        x: f32,
        y: f32,
        heading: i32,
        thrust: bool,
        vel_x: f32,
        vel_y: f32,
        rotation_rate: i32,
    ) -> bool {
        self.body.x = x;
        self.body.y = y;
        self.body.heading = heading;
        self.body.vel_x = vel_x;
        self.body.vel_y = vel_y;
        self.body.rotation_rate = rotation_rate;
        self.set_thrust(thrust)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> Ship {
        let mut s = Ship::new(ShipTuning::default());
        s.spawn(0, true);
        s.state = ShipState::Alive;
        s
    }

    #[test]
    fn fire_is_a_no_op_at_pool_capacity() {
        let bullets = BulletTuning::default();
        let mut s = ship();
        for _ in 0..4 {
            assert!(s.fire(0, &bullets).is_some());
        }
        assert!(s.fire(0, &bullets).is_none());
        assert_eq!(s.bullets.len(), 4);
    }

    #[test]
    fn extra_life_granted_per_score_boundary() {
        let mut s = ship();
        let lives = s.lives;
        assert!(!s.add_score(9_999));
        assert_eq!(s.lives, lives);
        assert!(s.add_score(1));
        assert_eq!(s.lives, lives + 1);
        // 10_000 -> 30_050 crosses 20_000 and 30_000 in one award.
        assert!(s.add_score(20_050));
        assert_eq!(s.lives, lives + 2);
    }

    #[test]
    fn max_lives_tracks_high_water_mark() {
        let mut s = ship();
        s.lives = 1;
        s.max_lives = 5;
        s.add_score(10_000);
        assert_eq!(s.lives, 2);
        assert_eq!(s.max_lives, 5);
        s.lives = 5;
        s.add_score(10_000);
        assert_eq!(s.max_lives, 6);
    }

    #[test]
    fn spawn_only_spends_life_when_authoritative() {
        let mut s = Ship::new(ShipTuning::default());
        let lives = s.lives;
        s.spawn(0, false);
        assert_eq!(s.lives, lives);
        s.terminate();
        s.spawn(0, true);
        assert_eq!(s.lives, lives - 1);
    }

    #[test]
    fn terminate_clears_inputs() {
        let mut s = ship();
        s.set_thrust(true);
        s.rotate_left();
        s.terminate();
        assert!(!s.body.accelerating);
        assert_eq!(s.body.rotation_rate, 0);
        assert!(s.is_destroyed());
    }
}
