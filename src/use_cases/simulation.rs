//! The fixed-tick simulation driver.
//!
//! Every peer advances motion; only an authoritative peer (standalone or
//! host) resolves collisions, scores, splits, and respawns. Clients apply
//! the host's updates instead, so one event is never resolved twice.

use crate::domain::asteroid::Size;
use crate::domain::entity::collide;
use crate::domain::roster::ShipRoster;
use crate::domain::ship::ShipState;
use crate::domain::world::{Cue, Sound, World};
use crate::use_cases::levels;

/// Externally visible changes produced by one tick. The session layer turns
/// this into outbound protocol traffic; standalone play ignores it.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Started/paused flipped; broadcast GAME.
    pub game_state_changed: bool,
    /// Level transition (or -1 for game over); broadcast LEVEL.
    pub level_changed: Option<i32>,
    /// The asteroid roster was regenerated, split, or cleared; broadcast a
    /// full ASTEROIDS resync.
    pub asteroids_changed: bool,
    /// Slots whose ships spawned, died, or terminated; broadcast SHIP.
    pub ship_events: Vec<usize>,
    /// Slots whose score or lives changed; broadcast SCORE_LIVES.
    pub score_changes: Vec<usize>,
    /// Bullets removed this tick as (owner slot, index at removal);
    /// broadcast BULLET_DESTROY in order.
    pub destroyed_bullets: Vec<(usize, usize)>,
}

/// Runs one simulation tick. `multiplayer` selects the spread-out spawn
/// points; it is independent of authority (a host with peers is both).
pub fn simulate(world: &mut World, authoritative: bool, multiplayer: bool) -> TickReport {
    let mut report = TickReport::default();
    if world.paused {
        return report;
    }
    world.advance_clock();
    let now = world.now_ms();

    levels::tick(world, authoritative, &mut report);

    // Materialization is pure time and runs on every peer.
    for (_, ship) in world.roster.occupied_mut() {
        if let ShipState::Spawning { until_ms } = ship.state {
            if now >= until_ms {
                ship.state = ShipState::Alive;
            }
        }
    }

    if authoritative {
        evaluate_respawns(world, &mut report);
    }

    // Motion for ships and their bullet pools.
    for (_, ship) in world.roster.occupied_mut() {
        if !ship.is_destroyed() {
            ship.body.advance();
        }
        for bullet in &mut ship.bullets {
            if !bullet.body.destroyed {
                bullet.advance(now);
            }
        }
        if !authoritative {
            // Clients drop expired bullets locally; the host's explicit
            // removals cover the rest.
            ship.bullets.retain(|b| !b.body.destroyed);
        }
    }

    for asteroid in &mut world.asteroids {
        asteroid.body.advance();
    }

    if authoritative {
        resolve_collisions(world, multiplayer, &mut report);
    }

    report
}

/// Respawn gate: the delay must have elapsed and the spawn point must be
/// clear of asteroids. Both are re-tested every tick until they hold.
fn evaluate_respawns(world: &mut World, report: &mut TickReport) {
    let now = world.now_ms();
    let due: Vec<usize> = world
        .roster
        .occupied()
        .filter_map(|(slot, ship)| match ship.state {
            ShipState::RespawnPending { at_ms } if now >= at_ms => Some(slot),
            _ => None,
        })
        .collect();
    for slot in due {
        if !is_safe_haven(world, slot) {
            continue;
        }
        if let Some(ship) = world.roster.get_mut(slot) {
            ship.spawn(now, true);
        }
        world.cue(Cue::Play(Sound::Spawn));
        report.ship_events.push(slot);
        report.score_changes.push(slot);
    }
}

/// True when no asteroid is within the clearance margin of the ship's spawn
/// point (the ship is already parked there while waiting).
fn is_safe_haven(world: &World, slot: usize) -> bool {
    let Some(ship) = world.roster.get(slot) else {
        return false;
    };
    let margin = world.tuning.ship.safe_haven_margin;
    world.asteroids.iter().all(|a| {
        (ship.body.x - a.body.x).abs() + (ship.body.y - a.body.y).abs()
            >= (ship.body.radius + a.body.radius + margin) as f32
    })
}

/// The host-only collision pass, in fixed order: ship-vs-ship,
/// ship-vs-asteroid, then each ship's bullets newest-first against other
/// ships (first match) and asteroids (reverse scan, so the last matching
/// roster entry wins). Contact tests exclude destroyed entities, so running
/// the pass twice in one tick cannot double-destroy or double-score.
pub fn resolve_collisions(world: &mut World, multiplayer: bool, report: &mut TickReport) {
    ships_vs_ships(world);
    ships_vs_asteroids(world);
    bullets_vs_world(world, report);
    settle_destroyed_ships(world, multiplayer, report);
    settle_destroyed_asteroids(world, report);
}

fn ships_vs_ships(world: &mut World) {
    let slots = world.roster.slots_mut();
    for i in 0..slots.len() {
        for j in i + 1..slots.len() {
            let (left, right) = slots.split_at_mut(j);
            let (Some(a), Some(b)) = (left[i].as_mut(), right[0].as_mut()) else {
                continue;
            };
            if a.is_spawning() || b.is_spawning() {
                continue;
            }
            if a.body.is_contacting(&b.body) {
                collide(&mut a.body, &mut b.body);
            }
        }
    }
}

fn ships_vs_asteroids(world: &mut World) {
    for (_, ship) in world.roster.occupied_mut() {
        if ship.is_spawning() {
            continue;
        }
        for asteroid in world.asteroids.iter_mut().rev() {
            if ship.body.is_contacting(&asteroid.body) {
                collide(&mut ship.body, &mut asteroid.body);
            }
        }
    }
}

fn bullets_vs_world(world: &mut World, report: &mut TickReport) {
    let slot_count = world.roster.slot_count();
    for slot in 0..slot_count {
        let mut pool = match world.roster.get_mut(slot) {
            Some(ship) => std::mem::take(&mut ship.bullets),
            None => continue,
        };
        // Newest bullets are checked first; removal by descending index
        // keeps earlier indices stable.
        for index in (0..pool.len()).rev() {
            let bullet = &mut pool[index];
            if !bullet.body.destroyed {
                for (other_slot, other) in world.roster.occupied_mut() {
                    if other_slot == slot || other.is_spawning() {
                        continue;
                    }
                    if bullet.body.is_contacting(&other.body) {
                        collide(&mut bullet.body, &mut other.body);
                        break;
                    }
                }
            }
            if !bullet.body.destroyed {
                for asteroid in world.asteroids.iter_mut().rev() {
                    if bullet.body.is_contacting(&asteroid.body) {
                        collide(&mut bullet.body, &mut asteroid.body);
                        bullet.hit_asteroid = Some(asteroid.size);
                        break;
                    }
                }
            }
            if let Some(size) = pool[index].hit_asteroid.take() {
                let granted = world
                    .roster
                    .get_mut(slot)
                    .is_some_and(|owner| owner.add_score(size.score_value()));
                if granted {
                    world.cue(Cue::Play(Sound::ExtraLife));
                }
                report.score_changes.push(slot);
            }
            if pool[index].body.destroyed {
                pool.remove(index);
                report.destroyed_bullets.push((slot, index));
            }
        }
        if let Some(ship) = world.roster.get_mut(slot) {
            ship.bullets = pool;
        }
    }
}

/// Runs the destruction lifecycle for ships the pass just killed: explosion
/// cue, terminate, then either a pending respawn at the slot's spawn point
/// or the game-over check when the last life is gone.
fn settle_destroyed_ships(world: &mut World, multiplayer: bool, report: &mut TickReport) {
    let now = world.now_ms();
    let killed: Vec<usize> = world
        .roster
        .occupied()
        .filter_map(|(slot, ship)| {
            let newly_dead = ship.is_destroyed()
                && matches!(ship.state, ShipState::Alive | ShipState::Spawning { .. });
            newly_dead.then_some(slot)
        })
        .collect();
    for slot in killed {
        world.cue(Cue::Play(Sound::ExplodePlayer));
        world.cue(Cue::Stop(Sound::Thrust));
        let spawn = ShipRoster::spawn_position(slot, multiplayer);
        let mut lives = 0;
        if let Some(ship) = world.roster.get_mut(slot) {
            ship.terminate();
            lives = ship.lives;
            if lives > 0 {
                ship.reset(spawn, false);
                ship.state = ShipState::RespawnPending {
                    at_ms: now + world.tuning.ship.respawn_delay_ms,
                };
            }
        }
        report.ship_events.push(slot);
        if lives == 0 {
            let all_out = world
                .roster
                .occupied()
                .all(|(_, s)| s.is_destroyed() && s.lives == 0);
            if all_out {
                levels::game_over(world, report);
            }
        }
    }
}

/// Applies the split rule to destroyed asteroids and detects level
/// completion when the roster empties during gameplay.
fn settle_destroyed_asteroids(world: &mut World, report: &mut TickReport) {
    if !world.asteroids.iter().any(|a| a.body.destroyed) {
        return;
    }
    let mut survivors = Vec::with_capacity(world.asteroids.len());
    let mut destroyed = Vec::new();
    for asteroid in std::mem::take(&mut world.asteroids) {
        if asteroid.body.destroyed {
            destroyed.push(asteroid);
        } else {
            survivors.push(asteroid);
        }
    }
    for asteroid in &destroyed {
        let sound = match asteroid.size {
            Size::Large => Sound::ExplodeLarge,
            Size::Medium => Sound::ExplodeMedium,
            Size::Small => Sound::ExplodeSmall,
        };
        world.cue(Cue::Play(sound));
        let children = asteroid.split_children(&mut world.rng, &world.tuning.asteroid);
        survivors.extend(children);
    }
    world.asteroids = survivors;
    report.asteroids_changed = true;
    if world.asteroids.is_empty() && world.started && world.level > 0 {
        levels::next_level(world, report);
    }
}
