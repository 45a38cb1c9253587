use crate::domain::asteroid::Asteroid;
use crate::domain::roster::ShipRoster;
use crate::domain::ship::Ship;
use crate::domain::tuning::{TICK_MS, Tuning};

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Sounds the core asks its embedder to play. Decoding and playback live
/// outside the crate; the core only names the cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    MusicGame,
    MusicDeath,
    MusicHighscore,
    Thrust,
    Shoot,
    Spawn,
    ExplodePlayer,
    ExplodeLarge,
    ExplodeMedium,
    ExplodeSmall,
    ExtraLife,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Play(Sound),
    Loop(Sound),
    Stop(Sound),
}

/// Level progression phase, evaluated once per tick. Each timed phase
/// carries its start time; preconditions are re-tested on every evaluation so
/// a phase that no longer applies ends as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPhase {
    Idle,
    /// Waiting out the level banner before the field is generated.
    LevelStarting { since_ms: u64 },
    /// Sequencing the end of a run: a quiet delay, then the banner.
    GameOver { death_at_ms: u64 },
}

/// The whole session state: one instance per game, passed explicitly into
/// the simulation, protocol, and session layers. No process-wide registries.
#[derive(Debug)]
pub struct World {
    pub tuning: Tuning,
    /// Simulated time in ms; advances only on unpaused ticks.
    pub sim_time_ms: u64,
    pub started: bool,
    pub paused: bool,
    /// Current level, or -1 once the run has ended.
    pub level: i32,
    pub level_phase: LevelPhase,
    /// Whether the level or game-over banner should be drawn.
    pub show_level_text: bool,
    pub asteroids: Vec<Asteroid>,
    pub roster: ShipRoster,
    /// Slot owned by this process's player.
    pub local_slot: usize,
    pub rng: StdRng,
    cues: Vec<Cue>,
}

impl World {
    pub fn new(tuning: Tuning) -> Self {
        Self::with_rng(tuning, StdRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(tuning: Tuning, seed: u64) -> Self {
        Self::with_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tuning: Tuning, rng: StdRng) -> Self {
        let mut roster = ShipRoster::new();
        roster.insert(0, Ship::new(tuning.ship));
        Self {
            tuning,
            sim_time_ms: 0,
            started: false,
            paused: false,
            level: 1,
            level_phase: LevelPhase::Idle,
            show_level_text: false,
            asteroids: Vec::new(),
            roster,
            local_slot: 0,
            rng,
            cues: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.sim_time_ms
    }

    pub fn advance_clock(&mut self) {
        self.sim_time_ms += TICK_MS;
    }

    /// Flips the started flag, cueing game music. Returns true on change so
    /// the session layer can broadcast the new game state.
    pub fn set_started(&mut self, started: bool) -> bool {
        if self.started == started {
            return false;
        }
        self.started = started;
        if started {
            self.cue(Cue::Loop(Sound::MusicGame));
        } else {
            self.cue(Cue::Stop(Sound::MusicGame));
        }
        true
    }

    pub fn set_paused(&mut self, paused: bool) -> bool {
        if self.paused == paused {
            return false;
        }
        self.paused = paused;
        true
    }

    pub fn local_ship(&self) -> Option<&Ship> {
        self.roster.get(self.local_slot)
    }

    pub fn local_ship_mut(&mut self) -> Option<&mut Ship> {
        self.roster.get_mut(self.local_slot)
    }

    pub fn cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    /// Drains the audio cues accumulated since the last call; the embedder
    /// forwards them to its playback collaborator.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}
