use crate::domain::ship::Ship;
use crate::domain::tuning::{FIELD_HEIGHT, FIELD_WIDTH};

/// Player slots available per session: the host plus three remote peers.
pub const MAX_PLAYERS: usize = 4;

/// Sparse slot registry owning every ship in the session. `None` marks a
/// vacant or disconnected slot; slot 0 belongs to the hosting player.
#[derive(Debug, Default)]
pub struct ShipRoster {
    slots: Vec<Option<Ship>>,
}

impl ShipRoster {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Places a ship at `slot`, growing the registry with vacancies as
    /// needed. Replaces any ship already there.
    pub fn insert(&mut self, slot: usize, mut ship: Ship) {
        debug_assert!(slot < MAX_PLAYERS);
        while self.slots.len() <= slot {
            self.slots.push(None);
        }
        ship.set_owner_slot(slot);
        self.slots[slot] = Some(ship);
    }

    /// Vacates a slot, keeping the registry length so later slots keep their
    /// ids.
    pub fn remove(&mut self, slot: usize) -> Option<Ship> {
        self.slots.get_mut(slot).and_then(|s| s.take())
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn get(&self, slot: usize) -> Option<&Ship> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Ship> {
        self.slots.get_mut(slot).and_then(|s| s.as_mut())
    }

    /// Occupied slots in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Ship)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, ship)| ship.as_ref().map(|s| (slot, s)))
    }

    pub fn occupied_mut(&mut self) -> impl Iterator<Item = (usize, &mut Ship)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, ship)| ship.as_mut().map(|s| (slot, s)))
    }

    /// Lowest vacant slot id, or `None` when all four are taken.
    pub fn first_vacant(&self) -> Option<usize> {
        for slot in 0..MAX_PLAYERS {
            if self.get(slot).is_none() {
                return Some(slot);
            }
        }
        None
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Raw slot storage for the collision pass, which needs simultaneous
    /// mutable access to several ships.
    pub fn slots_mut(&mut self) -> &mut [Option<Ship>] {
        &mut self.slots
    }

    /// Spawn point for a slot: quarter positions in multiplayer so ships
    /// start apart, dead center otherwise.
    pub fn spawn_position(slot: usize, multiplayer: bool) -> (f32, f32) {
        if !multiplayer {
            return (FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0);
        }
        match slot {
            0 => (FIELD_WIDTH / 4.0, FIELD_HEIGHT / 4.0),
            1 => (FIELD_WIDTH * 3.0 / 4.0, FIELD_HEIGHT * 3.0 / 4.0),
            2 => (FIELD_WIDTH * 3.0 / 4.0, FIELD_HEIGHT / 4.0),
            _ => (FIELD_WIDTH / 4.0, FIELD_HEIGHT * 3.0 / 4.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::ShipTuning;

    fn ship() -> Ship {
        Ship::new(ShipTuning::default())
    }

    #[test]
    fn insert_grows_with_vacancies() {
        let mut roster = ShipRoster::new();
        roster.insert(2, ship());
        assert!(roster.get(0).is_none());
        assert!(roster.get(1).is_none());
        assert!(roster.get(2).is_some());
        assert_eq!(roster.first_vacant(), Some(0));
    }

    #[test]
    fn remove_keeps_later_slot_ids_stable() {
        let mut roster = ShipRoster::new();
        roster.insert(0, ship());
        roster.insert(1, ship());
        roster.insert(2, ship());
        roster.remove(1);
        assert!(roster.get(1).is_none());
        assert!(roster.get(2).is_some());
        assert_eq!(roster.first_vacant(), Some(1));
    }

    #[test]
    fn vacant_slot_reports_none_when_full() {
        let mut roster = ShipRoster::new();
        for slot in 0..MAX_PLAYERS {
            roster.insert(slot, ship());
        }
        assert_eq!(roster.first_vacant(), None);
    }

    #[test]
    fn multiplayer_spawn_points_are_distinct() {
        let points: Vec<_> = (0..MAX_PLAYERS)
            .map(|slot| ShipRoster::spawn_position(slot, true))
            .collect();
        for i in 0..points.len() {
            for j in i + 1..points.len() {
                assert_ne!(points[i], points[j]);
            }
        }
    }
}
