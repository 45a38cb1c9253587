//! Peer session: applies inbound protocol traffic to the world and turns
//! tick reports into outbound traffic.
//!
//! All mutation funnels through [`Session::handle_event`] and
//! [`Session::tick`], both called from the single runtime loop, so a message
//! is always applied fully before or fully after a tick's collision pass.

use crate::domain::asteroid::Size;
use crate::domain::bullet::Bullet;
use crate::domain::ship::Ship;
use crate::domain::world::{Cue, Sound, World};
use crate::interface_adapters::protocol::{AsteroidRecord, Message};
use crate::use_cases::levels;
use crate::use_cases::simulation::{self, TickReport};

use tokio::sync::mpsc;

/// Unconditional ship resync period; bounds drift from any lost packet.
const SHIP_RESYNC_INTERVAL_MS: u64 = 5000;

/// Network role, fixed at connect time. A standalone session that accepts a
/// connection becomes the host; a session that dials out becomes a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Standalone,
    Host,
    Client,
}

/// Connection lifecycle events, produced by the network layer and drained by
/// the runtime loop once per tick.
#[derive(Debug)]
pub enum SessionEvent {
    Connected { peer: u64, tx: mpsc::Sender<String> },
    Disconnected { peer: u64 },
    Line { peer: u64, line: String },
}

#[derive(Debug)]
struct Peer {
    id: u64,
    slot: usize,
    tx: mpsc::Sender<String>,
}

#[derive(Debug)]
pub struct Session {
    pub world: World,
    role: Role,
    peers: Vec<Peer>,
    /// Client only: true until the host's bare slot-id line arrives.
    awaiting_slot: bool,
    last_ship_resync_ms: u64,
}

impl Session {
    pub fn new(world: World, role: Role) -> Self {
        Self {
            world,
            role,
            peers: Vec::new(),
            awaiting_slot: false,
            last_ship_resync_ms: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn authoritative(&self) -> bool {
        self.role != Role::Client
    }

    fn multiplayer(&self) -> bool {
        self.world.roster.occupied().count() > 1
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected { peer, tx } => self.on_connected(peer, tx),
            SessionEvent::Disconnected { peer } => self.on_disconnected(peer),
            SessionEvent::Line { peer, line } => self.on_line(peer, line),
        }
    }

    fn on_connected(&mut self, peer: u64, tx: mpsc::Sender<String>) {
        match self.role {
            Role::Client => {
                // The dialed host link; wait for the slot assignment.
                self.peers = vec![Peer { id: peer, slot: 0, tx }];
                self.awaiting_slot = true;
                tracing::info!(peer, "connected to host, awaiting slot");
            }
            Role::Standalone | Role::Host => {
                self.role = Role::Host;
                let Some(slot) = self.world.roster.first_vacant() else {
                    tracing::warn!(peer, "no free slot, dropping connection");
                    return;
                };
                let new_peer = Peer { id: peer, slot, tx };
                self.send_snapshot(&new_peer, slot);
                let mut ship = Ship::new(self.world.tuning.ship);
                if self.world.started {
                    // Joined mid-game: spectate until the next run.
                    ship.lives = 0;
                }
                let lives = ship.lives;
                self.world.roster.insert(slot, ship);
                self.broadcast_except(
                    new_peer.id,
                    &Message::PlayerConn {
                        slot,
                        connected: true,
                    },
                );
                self.peers.push(new_peer);
                self.broadcast(&Message::ScoreLives {
                    slot,
                    score: 0,
                    lives,
                });
                tracing::info!(peer, slot, "peer joined");
            }
        }
    }

    /// Connect-time burst: the bare slot id, game state, a full asteroid
    /// resync, then occupancy and ship snapshots for every existing player.
    fn send_snapshot(&self, peer: &Peer, assigned_slot: usize) {
        send_line(peer, assigned_slot.to_string());
        send_line(
            peer,
            Message::Game {
                started: self.world.started,
                paused: self.world.paused,
            }
            .encode(),
        );
        send_line(peer, self.asteroid_resync().encode());
        for (slot, ship) in self.world.roster.occupied() {
            send_line(
                peer,
                Message::PlayerConn {
                    slot,
                    connected: true,
                }
                .encode(),
            );
            send_line(
                peer,
                Message::ScoreLives {
                    slot,
                    score: ship.score,
                    lives: ship.lives,
                }
                .encode(),
            );
            send_line(peer, ship_message(slot, ship).encode());
        }
    }

    fn on_disconnected(&mut self, peer: u64) {
        match self.role {
            Role::Client => {
                // Host gone; carry on alone with the local ship in slot 0.
                tracing::info!(peer, "host disconnected, reverting to standalone");
                self.peers.clear();
                self.awaiting_slot = false;
                let local = self.world.local_slot;
                let ship = self.world.roster.remove(local);
                self.world.roster.clear();
                if let Some(ship) = ship {
                    self.world.roster.insert(0, ship);
                }
                self.world.local_slot = 0;
                self.role = Role::Standalone;
                let mut report = TickReport::default();
                levels::stop_game(&mut self.world, true, &mut report);
            }
            Role::Standalone | Role::Host => {
                let Some(index) = self.peers.iter().position(|p| p.id == peer) else {
                    return;
                };
                let slot = self.peers.remove(index).slot;
                self.world.roster.remove(slot);
                tracing::info!(peer, slot, "peer left");
                self.broadcast(&Message::PlayerConn {
                    slot,
                    connected: false,
                });
            }
        }
    }

    fn on_line(&mut self, peer: u64, line: String) {
        if self.role == Role::Client && self.awaiting_slot {
            match line.trim().parse::<usize>() {
                Ok(slot) => self.adopt_slot(slot),
                Err(_) => tracing::warn!(peer, %line, "expected slot assignment"),
            }
            return;
        }
        let message = match Message::decode(&line) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(peer, %line, %error, "dropping malformed message");
                return;
            }
        };
        if self.role == Role::Host && message.host_only() {
            tracing::warn!(peer, ?message, "dropping host-only message from client");
            return;
        }
        self.apply_message(peer, message);
    }

    /// Handshake complete: move the local ship to its host-assigned slot.
    fn adopt_slot(&mut self, slot: usize) {
        let old = self.world.local_slot;
        if slot != old {
            if let Some(ship) = self.world.roster.remove(old) {
                self.world.roster.insert(slot, ship);
            }
            self.world.local_slot = slot;
        }
        self.awaiting_slot = false;
        tracing::info!(slot, "slot assigned");
    }

    fn apply_message(&mut self, peer: u64, message: Message) {
        match message {
            Message::Game { started, paused } => {
                let mut report = TickReport::default();
                if started != self.world.started {
                    if started {
                        levels::start_game(&mut self.world, false, true, &mut report);
                    } else {
                        levels::stop_game(&mut self.world, false, &mut report);
                    }
                }
                self.world.set_paused(paused);
            }
            Message::Level { level } => {
                let mut report = TickReport::default();
                if level == -1 {
                    levels::game_over(&mut self.world, &mut report);
                } else {
                    levels::start_level(&mut self.world, level, &mut report);
                }
            }
            Message::Asteroids { asteroids } => self.apply_asteroid_resync(asteroids),
            Message::PlayerConn { slot, connected } => {
                if slot == self.world.local_slot {
                    return;
                }
                if connected {
                    self.world
                        .roster
                        .insert(slot, Ship::new(self.world.tuning.ship));
                } else {
                    self.world.roster.remove(slot);
                }
            }
            Message::ScoreLives { slot, score, lives } => {
                if let Some(ship) = self.world.roster.get_mut(slot) {
                    ship.score = score;
                    ship.lives = lives;
                    ship.max_lives = ship.max_lives.max(lives);
                }
            }
            Message::Ship {
                slot,
                x,
                y,
                heading,
                thrust,
                vel_x,
                vel_y,
                rotation_rate,
                destroyed,
            } => {
                if self.role == Role::Host {
                    // Clients may only steer their own slot.
                    let owns = self.peers.iter().any(|p| p.id == peer && p.slot == slot);
                    if !owns {
                        tracing::warn!(peer, slot, "dropping ship update for foreign slot");
                        return;
                    }
                }
                let now = self.world.now_ms();
                let local = self.world.local_slot;
                let apply_destroyed = self.role == Role::Client;
                let mut cues = Vec::new();
                if let Some(ship) = self.world.roster.get_mut(slot) {
                    let thrust_changed =
                        ship.force_update(x, y, heading, thrust, vel_x, vel_y, rotation_rate);
                    if thrust_changed && slot != local {
                        cues.push(if thrust {
                            Cue::Loop(Sound::Thrust)
                        } else {
                            Cue::Stop(Sound::Thrust)
                        });
                    }
                    // Only the host's word destroys or revives a ship.
                    if apply_destroyed && destroyed != ship.is_destroyed() {
                        if destroyed {
                            ship.terminate();
                            cues.push(Cue::Play(Sound::ExplodePlayer));
                        } else {
                            ship.spawn(now, false);
                            cues.push(Cue::Play(Sound::Spawn));
                        }
                    }
                    ship.sync_dirty = false;
                }
                for cue in cues {
                    self.world.cue(cue);
                }
                if self.role == Role::Host {
                    self.relay_except(
                        peer,
                        &Message::Ship {
                            slot,
                            x,
                            y,
                            heading,
                            thrust,
                            vel_x,
                            vel_y,
                            rotation_rate,
                            destroyed,
                        },
                    );
                }
            }
            Message::BulletFire { slot, x, y, heading } => {
                let now = self.world.now_ms();
                let tuning = self.world.tuning.bullet;
                let mut fired = false;
                if let Some(ship) = self.world.roster.get_mut(slot) {
                    // Remote fire bypasses the pool cap; the owner already
                    // enforced it, and index-based removal must stay aligned.
                    ship.bullets.push(Bullet::new(slot, x, y, heading, now, &tuning));
                    fired = true;
                }
                if fired {
                    self.world.cue(Cue::Play(Sound::Shoot));
                }
                if self.role == Role::Host {
                    self.relay_except(peer, &Message::BulletFire { slot, x, y, heading });
                }
            }
            Message::BulletDestroy { slot, index } => {
                if let Some(ship) = self.world.roster.get_mut(slot) {
                    if index < ship.bullets.len() {
                        ship.bullets.remove(index);
                    } else {
                        // Stale index: the bullet already expired locally.
                        tracing::debug!(slot, index, "ignoring stale bullet removal");
                    }
                }
            }
        }
    }

    /// Full asteroid roster replacement. Records carry no identity, so the
    /// length delta only guesses which explosion class just happened.
    fn apply_asteroid_resync(&mut self, records: Vec<AsteroidRecord>) {
        let old_len = self.world.asteroids.len();
        let tuning = self.world.tuning.asteroid;
        self.world.asteroids = records
            .into_iter()
            .map(|record| record.into_asteroid(&tuning))
            .collect();
        // Sound guess from the length delta alone: an appended entry is a
        // split child, so its parent was one tier up; a vanished entry was a
        // small rock with no children. Large appendees are a fresh level and
        // stay silent.
        for index in old_len.min(self.world.asteroids.len())..old_len.max(self.world.asteroids.len())
        {
            if index >= old_len {
                match self.world.asteroids[index].size {
                    Size::Large => {}
                    Size::Medium => self.world.cue(Cue::Play(Sound::ExplodeLarge)),
                    Size::Small => self.world.cue(Cue::Play(Sound::ExplodeMedium)),
                }
            } else {
                self.world.cue(Cue::Play(Sound::ExplodeSmall));
            }
        }
    }

    /// One simulation step plus the outbound traffic it implies.
    pub fn tick(&mut self) {
        let authoritative = self.authoritative();
        let multiplayer = self.multiplayer();
        let report = simulation::simulate(&mut self.world, authoritative, multiplayer);
        self.flush(report);
    }

    fn flush(&mut self, report: TickReport) {
        if self.role == Role::Standalone {
            self.clear_dirty_flags();
            return;
        }
        if self.role == Role::Host {
            if report.game_state_changed {
                self.broadcast(&Message::Game {
                    started: self.world.started,
                    paused: self.world.paused,
                });
            }
            if let Some(level) = report.level_changed {
                self.broadcast(&Message::Level { level });
            }
            if report.asteroids_changed {
                self.broadcast(&self.asteroid_resync());
            }
            for (slot, index) in &report.destroyed_bullets {
                self.broadcast(&Message::BulletDestroy {
                    slot: *slot,
                    index: *index,
                });
            }
            for slot in &report.ship_events {
                if let Some(ship) = self.world.roster.get(*slot) {
                    self.broadcast(&ship_message(*slot, ship));
                }
            }
            for slot in &report.score_changes {
                if let Some(ship) = self.world.roster.get(*slot) {
                    self.broadcast(&Message::ScoreLives {
                        slot: *slot,
                        score: ship.score,
                        lives: ship.lives,
                    });
                }
            }
        }
        self.flush_ship_updates();
    }

    /// Sends kinematic updates for dirty ships, plus the periodic
    /// unconditional resync of everything this peer controls.
    fn flush_ship_updates(&mut self) {
        let now = self.world.now_ms();
        let resync = now.saturating_sub(self.last_ship_resync_ms) >= SHIP_RESYNC_INTERVAL_MS;
        if resync {
            self.last_ship_resync_ms = now;
        }
        let local = self.world.local_slot;
        let mut outbound = Vec::new();
        for (slot, ship) in self.world.roster.occupied_mut() {
            let controlled = match self.role {
                Role::Host => true,
                Role::Client => slot == local,
                Role::Standalone => false,
            };
            if !controlled {
                ship.sync_dirty = false;
                continue;
            }
            if ship.sync_dirty || resync {
                outbound.push(ship_message(slot, &*ship));
                ship.sync_dirty = false;
            }
        }
        for message in outbound {
            self.broadcast(&message);
        }
    }

    fn clear_dirty_flags(&mut self) {
        for (_, ship) in self.world.roster.occupied_mut() {
            ship.sync_dirty = false;
        }
    }

    fn asteroid_resync(&self) -> Message {
        Message::Asteroids {
            asteroids: self
                .world
                .asteroids
                .iter()
                .map(AsteroidRecord::from_asteroid)
                .collect(),
        }
    }

    fn broadcast(&self, message: &Message) {
        let line = message.encode();
        for peer in &self.peers {
            send_line(peer, line.clone());
        }
    }

    fn broadcast_except(&self, source: u64, message: &Message) {
        let line = message.encode();
        for peer in self.peers.iter().filter(|p| p.id != source) {
            send_line(peer, line.clone());
        }
    }

    fn relay_except(&self, source: u64, message: &Message) {
        self.broadcast_except(source, message);
    }

    // Local input surface, driven by whatever frontend embeds the session.

    pub fn set_thrust(&mut self, on: bool) {
        let changed = self
            .world
            .local_ship_mut()
            .is_some_and(|ship| ship.set_thrust(on));
        if changed {
            let cue = if on {
                Cue::Loop(Sound::Thrust)
            } else {
                Cue::Stop(Sound::Thrust)
            };
            self.world.cue(cue);
        }
    }

    pub fn rotate_left(&mut self) {
        if let Some(ship) = self.world.local_ship_mut() {
            ship.rotate_left();
        }
    }

    pub fn rotate_right(&mut self) {
        if let Some(ship) = self.world.local_ship_mut() {
            ship.rotate_right();
        }
    }

    pub fn rotate_stop(&mut self) {
        if let Some(ship) = self.world.local_ship_mut() {
            ship.rotate_stop();
        }
    }

    /// Fires from the local ship; announces the bullet to peers. A full pool
    /// makes this a silent no-op.
    pub fn fire(&mut self) {
        let now = self.world.now_ms();
        let tuning = self.world.tuning.bullet;
        let slot = self.world.local_slot;
        let fired = {
            let Some(ship) = self.world.local_ship_mut() else {
                return;
            };
            if ship.is_destroyed() {
                return;
            }
            ship.fire(now, &tuning)
                .map(|b| (b.body.x, b.body.y, b.body.heading))
        };
        let Some((x, y, heading)) = fired else {
            return;
        };
        self.world.cue(Cue::Play(Sound::Shoot));
        self.broadcast(&Message::BulletFire { slot, x, y, heading });
    }

    /// Starts a new run. Only an authoritative peer may start; a client
    /// waits for the host's GAME message.
    pub fn start_game(&mut self) {
        if !self.authoritative() {
            tracing::debug!("ignoring start request on client");
            return;
        }
        let mut report = TickReport::default();
        let multiplayer = self.multiplayer();
        levels::start_game(&mut self.world, true, multiplayer, &mut report);
        self.flush(report);
    }

    pub fn set_paused(&mut self, paused: bool) {
        if !self.authoritative() {
            tracing::debug!("ignoring pause request on client");
            return;
        }
        if self.world.set_paused(paused) {
            self.flush(TickReport {
                game_state_changed: true,
                ..TickReport::default()
            });
        }
    }
}

fn ship_message(slot: usize, ship: &Ship) -> Message {
    Message::Ship {
        slot,
        x: ship.body.x,
        y: ship.body.y,
        heading: ship.body.heading,
        thrust: ship.body.accelerating,
        vel_x: ship.body.vel_x,
        vel_y: ship.body.vel_y,
        rotation_rate: ship.body.rotation_rate,
        destroyed: ship.is_destroyed(),
    }
}

fn send_line(peer: &Peer, line: String) {
    if let Err(error) = peer.tx.try_send(line) {
        // Slow or gone; the writer task owns teardown.
        tracing::warn!(peer = peer.id, %error, "dropping outbound line");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asteroid::{Asteroid, generate_field};
    use crate::domain::tuning::Tuning;
    use rand::SeedableRng;

    fn world() -> World {
        World::with_seed(Tuning::default(), 7)
    }

    fn host_with_peer() -> (Session, mpsc::Receiver<String>) {
        let mut session = Session::new(world(), Role::Host);
        let (tx, rx) = mpsc::channel(64);
        session.handle_event(SessionEvent::Connected { peer: 1, tx });
        (session, rx)
    }

    fn connected_client() -> Session {
        let mut session = Session::new(world(), Role::Client);
        let (tx, _rx) = mpsc::channel(64);
        session.handle_event(SessionEvent::Connected { peer: 1, tx });
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: "1".to_string(),
        });
        session
    }

    #[test]
    fn host_assigns_first_free_slot_and_sends_snapshot() {
        let mut session = Session::new(world(), Role::Host);
        session.world.asteroids =
            generate_field(1, &mut session.world.rng, &session.world.tuning.asteroid);
        let (tx, mut rx) = mpsc::channel(64);
        session.handle_event(SessionEvent::Connected { peer: 9, tx });

        assert_eq!(rx.try_recv().unwrap(), "1");
        let game = Message::decode(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            game,
            Message::Game {
                started: false,
                paused: false
            }
        );
        match Message::decode(&rx.try_recv().unwrap()).unwrap() {
            Message::Asteroids { asteroids } => assert_eq!(asteroids.len(), 8),
            other => panic!("expected asteroid resync, got {other:?}"),
        }
        // Snapshot of the host's own slot follows.
        assert_eq!(
            Message::decode(&rx.try_recv().unwrap()).unwrap(),
            Message::PlayerConn {
                slot: 0,
                connected: true
            }
        );
        assert!(session.world.roster.get(1).is_some());
    }

    #[test]
    fn client_adopts_assigned_slot() {
        let session = connected_client();
        assert_eq!(session.world.local_slot, 1);
        assert!(session.world.roster.get(0).is_none());
        assert!(session.world.roster.get(1).is_some());
    }

    #[test]
    fn client_resyncs_full_asteroid_roster() {
        let mut session = connected_client();
        let mut host_world = world();
        host_world.asteroids =
            generate_field(1, &mut host_world.rng, &host_world.tuning.asteroid);
        let line = Message::Asteroids {
            asteroids: host_world
                .asteroids
                .iter()
                .map(AsteroidRecord::from_asteroid)
                .collect(),
        }
        .encode();

        session.handle_event(SessionEvent::Line { peer: 1, line });
        assert_eq!(session.world.asteroids.len(), 8);
        for (local, remote) in session.world.asteroids.iter().zip(&host_world.asteroids) {
            assert_eq!(local.size, remote.size);
            assert_eq!(local.body.x, remote.body.x);
            assert_eq!(local.body.y, remote.body.y);
        }
    }

    #[test]
    fn shrinking_resync_cues_an_explosion_per_vanished_rock() {
        let mut session = connected_client();
        session.world.asteroids = generate_field(
            1,
            &mut rand::rngs::StdRng::seed_from_u64(3),
            &session.world.tuning.asteroid,
        );
        let old_len = session.world.asteroids.len();
        session.world.take_cues();
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::Asteroids {
                asteroids: Vec::new(),
            }
            .encode(),
        });
        let cues = session.world.take_cues();
        assert_eq!(cues, vec![Cue::Play(Sound::ExplodeSmall); old_len]);
    }

    fn record(size: Size) -> AsteroidRecord {
        AsteroidRecord {
            x: 100.0,
            y: 100.0,
            heading: 0,
            speed: 0,
            size,
        }
    }

    #[test]
    fn growing_resync_cues_by_the_appended_child_size() {
        let mut session = connected_client();
        session.world.asteroids = vec![Asteroid::new(
            100.0,
            100.0,
            0,
            0,
            Size::Medium,
            &session.world.tuning.asteroid,
        )];
        session.world.take_cues();
        // One medium rock split into two small children: the surviving entry
        // plus one appended one. The appendee's size names the parent's tier.
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::Asteroids {
                asteroids: vec![record(Size::Small), record(Size::Small)],
            }
            .encode(),
        });
        assert_eq!(
            session.world.take_cues(),
            vec![Cue::Play(Sound::ExplodeMedium)]
        );

        // A large split appends a medium child.
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::Asteroids {
                asteroids: vec![record(Size::Small), record(Size::Small), record(Size::Medium)],
            }
            .encode(),
        });
        assert_eq!(
            session.world.take_cues(),
            vec![Cue::Play(Sound::ExplodeLarge)]
        );

        // Appended large rocks are a fresh level, not a split; no cue.
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::Asteroids {
                asteroids: Vec::new(),
            }
            .encode(),
        });
        session.world.take_cues();
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::Asteroids {
                asteroids: vec![record(Size::Large)],
            }
            .encode(),
        });
        assert!(session.world.take_cues().is_empty());
    }

    #[test]
    fn stale_bullet_destroy_index_is_ignored() {
        let mut session = connected_client();
        let now = session.world.now_ms();
        let tuning = session.world.tuning.bullet;
        {
            let ship = session.world.roster.get_mut(1).unwrap();
            ship.spawn(now, false);
            ship.fire(now, &tuning);
            ship.fire(now, &tuning);
        }
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::BulletDestroy { slot: 1, index: 5 }.encode(),
        });
        assert_eq!(session.world.roster.get(1).unwrap().bullets.len(), 2);

        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::BulletDestroy { slot: 1, index: 1 }.encode(),
        });
        assert_eq!(session.world.roster.get(1).unwrap().bullets.len(), 1);
    }

    #[test]
    fn host_drops_host_only_messages_from_clients() {
        let (mut session, _rx) = host_with_peer();
        let level_before = session.world.level;
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::Level { level: 7 }.encode(),
        });
        assert_eq!(session.world.level, level_before);
    }

    #[test]
    fn host_drops_ship_updates_for_foreign_slots() {
        let (mut session, _rx) = host_with_peer();
        let x_before = session.world.roster.get(0).unwrap().body.x;
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: ship_message(0, session.world.roster.get(0).unwrap()).encode(),
        });
        // Peer 1 owns slot 1; an update naming slot 0 must not land.
        assert_eq!(session.world.roster.get(0).unwrap().body.x, x_before);
        let mut moved = ship_message(1, session.world.roster.get(1).unwrap());
        if let Message::Ship { x, .. } = &mut moved {
            *x = 321.0;
        }
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: moved.encode(),
        });
        assert_eq!(session.world.roster.get(1).unwrap().body.x, 321.0);
    }

    #[test]
    fn remote_fire_bypasses_the_pool_cap() {
        let (mut session, _rx) = host_with_peer();
        for _ in 0..6 {
            session.handle_event(SessionEvent::Line {
                peer: 1,
                line: Message::BulletFire {
                    slot: 1,
                    x: 10.0,
                    y: 10.0,
                    heading: 0,
                }
                .encode(),
            });
        }
        assert_eq!(session.world.roster.get(1).unwrap().bullets.len(), 6);
    }

    #[test]
    fn client_applies_authoritative_destruction() {
        let mut session = connected_client();
        let now = session.world.now_ms();
        session.world.roster.get_mut(1).unwrap().spawn(now, false);
        let lives = session.world.roster.get(1).unwrap().lives;

        let mut dead = ship_message(1, session.world.roster.get(1).unwrap());
        if let Message::Ship { destroyed, .. } = &mut dead {
            *destroyed = true;
        }
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: dead.encode(),
        });
        let ship = session.world.roster.get(1).unwrap();
        assert!(ship.is_destroyed());
        // Life accounting is the host's job; the client must not touch it.
        assert_eq!(ship.lives, lives);
    }

    #[test]
    fn peer_disconnect_vacates_slot_and_broadcasts() {
        let (mut session, _rx1) = host_with_peer();
        let (tx2, mut rx2) = mpsc::channel(64);
        session.handle_event(SessionEvent::Connected { peer: 2, tx: tx2 });
        while rx2.try_recv().is_ok() {}

        session.handle_event(SessionEvent::Disconnected { peer: 1 });
        assert!(session.world.roster.get(1).is_none());
        assert_eq!(
            Message::decode(&rx2.try_recv().unwrap()).unwrap(),
            Message::PlayerConn {
                slot: 1,
                connected: false
            }
        );
    }

    #[test]
    fn host_disconnect_reverts_client_to_standalone() {
        let mut session = connected_client();
        session.handle_event(SessionEvent::Line {
            peer: 1,
            line: Message::PlayerConn {
                slot: 0,
                connected: true,
            }
            .encode(),
        });
        session.handle_event(SessionEvent::Disconnected { peer: 1 });
        assert_eq!(session.role(), Role::Standalone);
        assert_eq!(session.world.local_slot, 0);
        assert!(session.world.roster.get(0).is_some());
        assert!(session.world.roster.get(1).is_none());
    }

    #[test]
    fn periodic_resync_sends_ship_updates_without_input() {
        let (mut session, mut rx) = host_with_peer();
        while rx.try_recv().is_ok() {}
        session.start_game();
        while rx.try_recv().is_ok() {}

        let ticks = SHIP_RESYNC_INTERVAL_MS / crate::domain::tuning::TICK_MS;
        let mut saw_ship = false;
        for _ in 0..=ticks {
            session.tick();
            while let Ok(line) = rx.try_recv() {
                if matches!(Message::decode(&line), Ok(Message::Ship { .. })) {
                    saw_ship = true;
                }
            }
        }
        assert!(saw_ship);
    }

    #[test]
    fn mid_game_joiner_gets_zero_lives() {
        let mut session = Session::new(world(), Role::Host);
        session.start_game();
        let (tx, _rx) = mpsc::channel(64);
        session.handle_event(SessionEvent::Connected { peer: 5, tx });
        assert_eq!(session.world.roster.get(1).unwrap().lives, 0);
    }
}
