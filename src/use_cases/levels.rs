//! Level progression and game-over sequencing.
//!
//! Every timed transition here is a deadline on the world's level phase,
//! evaluated once per tick by the simulation driver. A phase whose
//! precondition no longer holds simply ends; nothing is cancelled from the
//! outside.

use crate::domain::asteroid::generate_field;
use crate::domain::roster::ShipRoster;
use crate::domain::world::{Cue, LevelPhase, Sound, World};
use crate::use_cases::simulation::TickReport;

/// Wait before a new level's asteroid field is generated.
pub const NEW_LEVEL_WAIT_MS: u64 = 3000;
/// Quiet delay between final death and the game-over banner.
pub const BEFORE_GAMEOVER_WAIT_MS: u64 = 3000;
/// How long the game-over banner stays up.
pub const GAMEOVER_WAIT_MS: u64 = 6000;

/// Score above which the end-of-run music celebrates instead of mourns.
const HIGHSCORE_THRESHOLD: i32 = 5000;

/// Starts a fresh run. An authoritative peer resets and spawns every ship
/// and kicks off level 1; a client only resets its own ship and waits for
/// the host's updates.
pub fn start_game(world: &mut World, authoritative: bool, multiplayer: bool, report: &mut TickReport) {
    if world.set_started(true) {
        report.game_state_changed = true;
    }
    if authoritative {
        start_level(world, 1, report);
        let now = world.now_ms();
        let mut spawned = Vec::new();
        for (slot, ship) in world.roster.occupied_mut() {
            ship.reset(ShipRoster::spawn_position(slot, multiplayer), true);
            ship.spawn(now, true);
            spawned.push(slot);
        }
        for slot in spawned {
            world.cue(Cue::Play(Sound::Spawn));
            report.ship_events.push(slot);
            report.score_changes.push(slot);
        }
    } else {
        let slot = world.local_slot;
        if let Some(ship) = world.roster.get_mut(slot) {
            ship.reset(ShipRoster::spawn_position(slot, multiplayer), true);
        }
    }
}

/// Stops the run, terminating every ship and restoring the drifting
/// background field shown outside of gameplay.
pub fn stop_game(world: &mut World, authoritative: bool, report: &mut TickReport) {
    if world.set_started(false) {
        report.game_state_changed = true;
    }
    let mut terminated = Vec::new();
    for (slot, ship) in world.roster.occupied_mut() {
        ship.terminate();
        terminated.push(slot);
    }
    report.ship_events.extend(terminated);
    world.level = 1;
    world.level_phase = LevelPhase::Idle;
    world.show_level_text = false;
    if authoritative {
        world.asteroids = generate_field(world.level, &mut world.rng, &world.tuning.asteroid);
        report.asteroids_changed = true;
    }
}

/// Enters the banner phase for `level`; the field is generated after
/// [`NEW_LEVEL_WAIT_MS`] if the roster is still empty by then.
pub fn start_level(world: &mut World, level: i32, report: &mut TickReport) {
    world.level = level;
    world.show_level_text = true;
    if level == 1 {
        world.asteroids.clear();
    }
    world.level_phase = LevelPhase::LevelStarting {
        since_ms: world.now_ms(),
    };
    report.level_changed = Some(level);
}

pub fn next_level(world: &mut World, report: &mut TickReport) {
    let next = world.level + 1;
    start_level(world, next, report);
}

/// Ends the run exactly once: later calls while the level is already -1 are
/// no-ops, so concurrent destruction of the last ships cannot double-signal.
pub fn game_over(world: &mut World, report: &mut TickReport) {
    if world.level == -1 {
        return;
    }
    world.level = -1;
    world.cue(Cue::Stop(Sound::MusicGame));
    let local_score = world.local_ship().map(|s| s.score).unwrap_or(0);
    if local_score > HIGHSCORE_THRESHOLD {
        world.cue(Cue::Play(Sound::MusicHighscore));
    } else {
        world.cue(Cue::Play(Sound::MusicDeath));
    }
    world.level_phase = LevelPhase::GameOver {
        death_at_ms: world.now_ms(),
    };
    report.level_changed = Some(world.level);
}

/// Per-tick phase evaluation.
pub fn tick(world: &mut World, authoritative: bool, report: &mut TickReport) {
    let now = world.now_ms();
    match world.level_phase {
        LevelPhase::Idle => {}
        LevelPhase::LevelStarting { since_ms } => {
            if !world.started || !world.asteroids.is_empty() {
                // Stale phase: the game stopped or a resync repopulated the
                // field before the wait elapsed.
                world.show_level_text = false;
                world.level_phase = LevelPhase::Idle;
            } else if now.saturating_sub(since_ms) >= NEW_LEVEL_WAIT_MS {
                if authoritative {
                    world.asteroids =
                        generate_field(world.level, &mut world.rng, &world.tuning.asteroid);
                    report.asteroids_changed = true;
                }
                world.show_level_text = false;
                world.level_phase = LevelPhase::Idle;
            }
        }
        LevelPhase::GameOver { death_at_ms } => {
            let since = now.saturating_sub(death_at_ms);
            if since >= BEFORE_GAMEOVER_WAIT_MS + GAMEOVER_WAIT_MS {
                world.show_level_text = false;
                world.level_phase = LevelPhase::Idle;
            } else if since >= BEFORE_GAMEOVER_WAIT_MS {
                world.show_level_text = true;
                if world.set_started(false) {
                    report.game_state_changed = true;
                }
            } else if !world.started {
                // Stopped before the banner: drop the sequence.
                world.level_phase = LevelPhase::Idle;
            }
        }
    }
}
