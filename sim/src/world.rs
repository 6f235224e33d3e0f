//! The single owned value holding the whole simulation: cells, rule,
//! overlays, history, and counters.  Every operation is a method here; the
//! engine crate drives it from exactly one thread.
use aeon_grid::{ByteStore, ChunkRect, ChunkStore};
use rand::Rng;

use crate::generator;
use crate::history::{HistoryEntry, HistoryRing};
use crate::overlay;
use crate::rule::Rule;

pub struct World {
    store: ChunkStore,
    rule: Rule,
    generation: u64,
    history: Option<HistoryRing>,
    ages: Option<ByteStore>,
    heat: Option<ByteStore>,
    /// Steps since the last heat decay tick.
    steps_since_decay: u64,
}

impl Default for World {
    fn default() -> Self {
        World {
            store: ChunkStore::new(),
            rule: Rule::life(),
            generation: 0,
            history: None,
            ages: None,
            heat: None,
            steps_since_decay: 0,
        }
    }
}

impl World {
    pub fn new() -> World {
        Default::default()
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn set_rule(&mut self, rule: Rule) {
        self.rule = rule;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> u64 {
        self.store.population()
    }

    pub fn bounding_rect(&mut self) -> Option<ChunkRect> {
        self.store.bounding_rect()
    }

    pub fn get_cell(&self, x: i64, y: i64) -> bool {
        self.store.get_cell(x, y)
    }

    /// Direct cell edit.  Bypasses the generator; overlays catch up on the
    /// next step rather than here.
    pub fn set_cell(&mut self, x: i64, y: i64, alive: bool) {
        self.store.set_cell(x, y, alive);
    }

    pub fn ages(&self) -> Option<&ByteStore> {
        self.ages.as_ref()
    }

    pub fn heat(&self) -> Option<&ByteStore> {
        self.heat.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.as_ref().map(|h| h.len()).unwrap_or(0)
    }

    pub fn history_enabled(&self) -> bool {
        self.history.is_some()
    }

    /// Enable or disable the undo ring.  Disabling drops all entries;
    /// re-enabling starts fresh.
    pub fn set_history(&mut self, enabled: bool, capacity: usize) {
        match (enabled, self.history.as_mut()) {
            (true, Some(ring)) => ring.set_capacity(capacity),
            (true, None) => self.history = Some(HistoryRing::new(capacity)),
            (false, _) => self.history = None,
        }
    }

    pub fn set_age_tracking(&mut self, enabled: bool) {
        self.ages = if enabled {
            Some(overlay::seed_ages(&self.store))
        } else {
            None
        };
    }

    pub fn set_heatmap(&mut self, enabled: bool) {
        self.heat = if enabled { Some(ByteStore::new()) } else { None };
        self.steps_since_decay = 0;
    }

    /// One generation forward, with history capture and overlay updates.
    pub fn step(&mut self) {
        let next = generator::step(&self.store, self.rule);

        if let Some(ring) = self.history.as_mut() {
            if let Some(entry) = HistoryEntry::diff(&self.store, &next, self.generation) {
                ring.push(entry);
            }
        }

        // Overlays see both sides of the step before the old store goes
        // away.
        if let Some(ages) = self.ages.as_ref() {
            self.ages = Some(overlay::advance_ages(ages, &next));
        }
        if let Some(heat) = self.heat.as_mut() {
            overlay::record_activity(heat, &self.store, &next);
            self.steps_since_decay += 1;
            if self.steps_since_decay >= overlay::HEATMAP_DECAY_INTERVAL {
                overlay::decay_heat(heat);
                self.steps_since_decay = 0;
            }
        }

        self.store = next;
        self.generation += 1;
    }

    /// One generation with no history, no overlays, no other bookkeeping.
    /// This is what jump-to-generation runs in a tight loop.
    pub fn step_silent(&mut self) {
        self.store = generator::step(&self.store, self.rule);
        self.generation += 1;
    }

    /// One generation backward.  Returns false (and does nothing) when
    /// history is disabled or exhausted.  Overlays are not rewound; they
    /// keep their last forward-pass values for the still-live cells.
    pub fn reverse(&mut self) -> bool {
        let entry = match self.history.as_mut().and_then(|h| h.pop()) {
            Some(e) => e,
            None => return false,
        };
        self.generation = entry.pre_generation;
        entry.revert(&mut self.store);
        // Ages for cells that differ from the restored state would violate
        // the pairing invariant, so rebuild from what's live now.
        if self.ages.is_some() {
            self.ages = Some(overlay::seed_ages(&self.store));
        }
        true
    }

    /// Rebuild the age overlay against the current cells.  Silent stepping
    /// leaves it stale; jump calls this once at the end instead of paying
    /// for overlay updates per generation.
    pub fn resync_overlays(&mut self) {
        if self.ages.is_some() {
            self.ages = Some(overlay::seed_ages(&self.store));
        }
    }

    /// Drop everything: cells, counters, overlays, history entries.  The
    /// enabled/disabled state of overlays and history survives.
    pub fn clear(&mut self) {
        self.store.clear();
        self.generation = 0;
        self.steps_since_decay = 0;
        if let Some(ring) = self.history.as_mut() {
            ring.clear();
        }
        if let Some(ages) = self.ages.as_mut() {
            ages.clear();
        }
        if let Some(heat) = self.heat.as_mut() {
            heat.clear();
        }
    }

    /// Replace every cell of a rectangle with an independent
    /// Bernoulli(`density`) draw.  Cells outside the rectangle are
    /// untouched.  History and overlays restart from the new state.
    pub fn randomize(
        &mut self,
        x: i64,
        y: i64,
        w: u32,
        h: u32,
        density: f64,
        rng: &mut impl Rng,
    ) {
        for gy in y..y + h as i64 {
            for gx in x..x + w as i64 {
                self.store.set_cell(gx, gy, rng.gen_bool(density));
            }
        }
        self.restart_tracking();
    }

    /// Install a pre-built store (from a loader), resetting the generation
    /// counter and restarting overlays and history.
    pub fn replace_store(&mut self, store: ChunkStore) {
        self.store = store;
        self.generation = 0;
        self.restart_tracking();
    }

    fn restart_tracking(&mut self) {
        self.steps_since_decay = 0;
        if let Some(ring) = self.history.as_mut() {
            ring.clear();
        }
        if self.ages.is_some() {
            self.ages = Some(overlay::seed_ages(&self.store));
        }
        if self.heat.is_some() {
            self.heat = Some(ByteStore::new());
        }
    }
}
