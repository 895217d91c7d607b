//! The game engine: owns all runtime state and orchestrates the tick
//! pipeline.
//!
//! # Architecture
//!
//! The `GameEngine` owns:
//! - A [`ContentRegistry`] (immutable definitions for the whole session)
//! - The mutable [`GameState`] for the current run
//! - A [`SimRng`] driving every random decision
//! - A [`CommandQueue`] of submitted player actions
//! - A [`NotificationQueue`] of player-facing notices
//! - A cached [`Bonuses`] aggregate, rebuilt when a bonus source changes
//!
//! # Tick Pipeline
//!
//! Each `tick()` runs, in order:
//! 1. **Commands** -- drain the queue and apply each action
//! 2. **Production** -- advance running generators, credit completed cycles
//! 3. **Events** -- spawn offers, expire the pending offer, expire the
//!    active event
//! 4. **Achievements** -- periodic predicate sweep
//! 5. **Notices** -- drop expired notices
//!
//! All externally-visible behavior is a function of the seed, the command
//! timeline and the clock values passed in; the engine never reads the
//! wall clock itself.

use crate::achievement;
use crate::bonus::Bonuses;
use crate::command::{Command, CommandQueue};
use crate::economy::{self, BuyAmount, Milestone};
use crate::event::{ActiveEvent, PendingEvent, schedule_next_spawn};
use crate::hash;
use crate::id::{DustUpgradeId, EventTypeId, GeneratorId, PlanetId, ResearchId};
use crate::migration::MigrationRegistry;
use crate::notify::{Notice, NotificationQueue};
use crate::offline::{self, OfflineGrant};
use crate::prestige;
use crate::registry::ContentRegistry;
use crate::research;
use crate::rng::SimRng;
use crate::serialize::{
    SaveData, SaveStore, SnapshotError, decode_snapshot_with_migrations, encode_snapshot,
};
use crate::state::{BuyQuantity, GameState, GeneratorState, PlanetState};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Checkpoint cadence for the host loop, in milliseconds.
pub const AUTO_SAVE_INTERVAL_MS: u64 = 30_000;

/// Frame deltas at or above this are ignored as clock glitches; long
/// absences go through offline catch-up instead.
pub const MAX_TICK_DELTA_SECS: f64 = 1.0;

/// How often the achievement sweep runs, in playtime seconds.
const ACHIEVEMENT_CHECK_PERIOD_SECS: f64 = 5.0;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The core game engine. Owns the state of one session and advances it
/// deterministically.
pub struct GameEngine {
    /// Immutable content definitions.
    pub registry: ContentRegistry,

    /// Mutable state of the current run.
    pub state: GameState,

    /// Deterministic random stream, persisted in saves.
    pub rng: SimRng,

    /// Player actions waiting for the next tick.
    pub commands: CommandQueue,

    /// Notices for the frontend to display.
    pub notices: NotificationQueue,

    /// Aggregate of every bonus source, rebuilt on change.
    bonuses: Bonuses,
}

impl GameEngine {
    /// Create an engine with a fresh run.
    pub fn new(registry: ContentRegistry, seed: u64, now_ms: u64) -> Self {
        let mut rng = SimRng::new(seed);
        let mut state = GameState::fresh(&registry);
        state.last_checkpoint_ms = now_ms;
        state.events.next_spawn_at = schedule_next_spawn(now_ms, &mut rng);

        let mut engine = GameEngine {
            registry,
            state,
            rng,
            commands: CommandQueue::new(),
            notices: NotificationQueue::default(),
            bonuses: Bonuses::default(),
        };
        engine.refresh_bonuses();
        tracing::debug!(seed, "engine created");
        engine
    }

    /// The current bonus aggregate.
    pub fn bonuses(&self) -> &Bonuses {
        &self.bonuses
    }

    fn refresh_bonuses(&mut self) {
        self.bonuses = Bonuses::live(&self.state, &self.registry);
        self.state.global_multiplier = self.bonuses.global_multiplier;
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    /// Advance the run by `delta_secs` of play at wall time `now_ms`.
    ///
    /// Non-positive, non-finite and oversized deltas are ignored; the
    /// offline path covers real absences.
    pub fn tick(&mut self, delta_secs: f64, now_ms: u64) {
        if !(delta_secs > 0.0) || delta_secs >= MAX_TICK_DELTA_SECS {
            return;
        }

        for command in self.commands.drain(now_ms) {
            self.apply_command(command, now_ms);
        }

        self.advance_generators(delta_secs);

        let before = (self.state.stats.playtime_seconds / ACHIEVEMENT_CHECK_PERIOD_SECS).floor();
        self.state.stats.playtime_seconds += delta_secs;
        let after = (self.state.stats.playtime_seconds / ACHIEVEMENT_CHECK_PERIOD_SECS).floor();

        self.advance_events(now_ms);

        if after > before {
            self.check_achievements(now_ms);
        }

        self.notices.expire(now_ms);
    }

    fn advance_generators(&mut self, delta_secs: f64) {
        let bonuses = self.bonuses;
        let thresholds = self.registry.milestones();
        let mut earned = 0.0;

        for (def, gs) in self
            .registry
            .generators()
            .iter()
            .zip(self.state.generators.iter_mut())
        {
            if !gs.running || gs.owned == 0 {
                continue;
            }
            let cycle = economy::effective_cycle_time(def, &bonuses);
            if cycle <= 0.0 {
                continue;
            }
            gs.progress += delta_secs / cycle;
            if gs.progress < 1.0 {
                continue;
            }

            let revenue = economy::generator_revenue(def, gs.owned, thresholds, &bonuses);
            let gained;
            if gs.has_manager {
                // Managed generators roll straight into the next cycle, so a
                // single tick can complete several.
                let extra_cycles = (gs.progress - 1.0).floor();
                gained = revenue * (1.0 + extra_cycles);
                gs.progress = (gs.progress - 1.0) - extra_cycles;
            } else {
                gained = revenue;
                gs.running = false;
                gs.progress = 0.0;
            }
            gs.lifetime_output += gained;
            earned += gained;
        }

        if earned > 0.0 {
            self.state.energy += earned;
            self.state.lifetime_energy += earned;
        }
    }

    fn advance_events(&mut self, now_ms: u64) {
        let can_spawn = self.state.events.pending.is_none()
            && self.state.events.active.is_none()
            && self.state.events.next_spawn_at != 0
            && now_ms >= self.state.events.next_spawn_at
            && self.registry.event_count() > 0;
        if can_spawn {
            if let Some(index) = self.rng.pick_index(self.registry.event_count()) {
                let event = EventTypeId(index as u32);
                self.state.events.pending = Some(PendingEvent {
                    event,
                    spawned_at: now_ms,
                    expires_at: now_ms + crate::event::EVENT_OFFER_WINDOW_MS,
                });
                self.state.events.next_spawn_at = schedule_next_spawn(now_ms, &mut self.rng);
                self.notices.push(Notice::EventOffered { event }, now_ms);
                tracing::debug!(event = %self.registry.event(event).name, "event offered");
            }
        }

        // Unanswered offers lapse silently.
        if let Some(pending) = &self.state.events.pending {
            if now_ms >= pending.expires_at {
                self.state.events.pending = None;
            }
        }

        let mut ended = false;
        if let Some(active) = &self.state.events.active {
            if now_ms >= active.ends_at {
                self.state.events.active = None;
                ended = true;
            }
        }
        if ended {
            self.refresh_bonuses();
        }
    }

    fn check_achievements(&mut self, now_ms: u64) {
        let unlocked =
            achievement::newly_satisfied(&self.state, &self.registry, &self.state.achievements);
        if unlocked.is_empty() {
            return;
        }
        for id in unlocked {
            self.state.achievements.insert(id);
            self.notices
                .push(Notice::AchievementUnlocked { achievement: id }, now_ms);
            tracing::debug!(
                achievement = %self.registry.achievement(id).name,
                "achievement unlocked"
            );
        }
        self.refresh_bonuses();
    }

    // -----------------------------------------------------------------------
    // Player intents
    // -----------------------------------------------------------------------

    /// Manually start a cycle. With auto-run research, one click also
    /// starts every other eligible generator. Returns whether the target
    /// generator started.
    pub fn run_generator(&mut self, id: GeneratorId) -> bool {
        let index = id.0 as usize;
        if index >= self.state.generators.len() {
            return false;
        }
        let auto_all = research::auto_run_all(&self.state.research, &self.registry);

        let started = {
            let gs = &mut self.state.generators[index];
            if gs.owned == 0 || gs.running || gs.has_manager {
                false
            } else {
                gs.running = true;
                gs.progress = 0.0;
                true
            }
        };
        if started {
            self.state.stats.manual_runs += 1;
            if auto_all {
                for gs in &mut self.state.generators {
                    if gs.owned > 0 && !gs.running && !gs.has_manager {
                        gs.running = true;
                        gs.progress = 0.0;
                    }
                }
            }
        }
        started
    }

    /// Buy generator units at the current buy quantity. Returns the
    /// executed purchase, zero when nothing could be bought.
    pub fn buy_generator(&mut self, id: GeneratorId, now_ms: u64) -> BuyAmount {
        let Some(plan) = self.plan_generator_buy(id) else {
            return BuyAmount::zero();
        };
        if plan.count == 0 {
            return plan;
        }
        self.state.energy -= plan.total_cost;
        self.state.generators[id.0 as usize].owned += plan.count;
        self.check_achievements(now_ms);
        plan
    }

    fn plan_generator_buy(&self, id: GeneratorId) -> Option<BuyAmount> {
        let index = id.0 as usize;
        if index >= self.registry.generator_count() {
            return None;
        }
        if research::generator_gated(&self.state.research, &self.registry, id.0) {
            return None;
        }
        let quantity = if research::bulk_buy_enabled(&self.state.research, &self.registry) {
            self.state.buy_quantity
        } else {
            BuyQuantity::One
        };
        Some(economy::buy_amount(
            self.registry.generator(id),
            self.state.generators[index].owned,
            self.state.energy,
            quantity,
            &self.bonuses,
        ))
    }

    /// Hire the manager for a generator. Managed generators keep cycling
    /// on their own.
    pub fn buy_manager(&mut self, id: GeneratorId) -> bool {
        let index = id.0 as usize;
        if index >= self.registry.generator_count() {
            return false;
        }
        let cost = self.registry.generator(id).manager_cost;
        if self.state.generators[index].has_manager || self.state.energy < cost {
            return false;
        }
        self.state.energy -= cost;
        let gs = &mut self.state.generators[index];
        gs.has_manager = true;
        if gs.owned > 0 && !gs.running {
            gs.running = true;
            gs.progress = 0.0;
        }
        true
    }

    /// Unlock a planet, paying its full cost and refunding the researched
    /// fraction afterwards.
    pub fn unlock_planet(&mut self, id: PlanetId, now_ms: u64) -> bool {
        let index = id.0 as usize;
        if index >= self.registry.planet_count() {
            return false;
        }
        if self.state.planets[index].unlocked {
            return false;
        }
        let cost = self.registry.planet(id).unlock_cost;
        if self.state.energy < cost {
            return false;
        }
        self.state.energy -= cost;
        let refund = research::planet_refund(&self.state.research, &self.registry);
        if refund > 0.0 {
            self.state.energy += cost * refund;
        }
        self.state.planets[index].unlocked = true;
        self.refresh_bonuses();
        self.check_achievements(now_ms);
        tracing::debug!(planet = %self.registry.planet(id).name, "planet unlocked");
        true
    }

    /// Purchase a research node. Prerequisites and cost are both checked.
    pub fn purchase_research(&mut self, id: ResearchId, now_ms: u64) -> bool {
        if id.0 as usize >= self.registry.research_count() {
            return false;
        }
        if !research::can_research(&self.state.research, &self.registry, id, self.state.energy) {
            return false;
        }
        self.state.energy -= self.registry.research(id).cost;
        self.state.research.insert(id);
        self.refresh_bonuses();
        self.check_achievements(now_ms);
        tracing::debug!(node = %self.registry.research(id).name, "research purchased");
        true
    }

    /// Buy one level of a dust upgrade with banked dust.
    pub fn purchase_dust_upgrade(&mut self, id: DustUpgradeId, now_ms: u64) -> bool {
        let index = id.0 as usize;
        if index >= self.registry.dust_upgrade_count() {
            return false;
        }
        let level = self.state.prestige.level(id);
        let Some(cost) = prestige::dust_upgrade_cost(self.registry.dust_upgrade(id), level) else {
            return false;
        };
        if self.state.prestige.dust < cost {
            return false;
        }
        self.state.prestige.dust -= cost;
        self.state.prestige.levels[index] += 1;
        self.refresh_bonuses();
        self.check_achievements(now_ms);
        true
    }

    /// Change the buy quantity. Always allowed; the bulk-buy gate applies
    /// at purchase time.
    pub fn set_buy_quantity(&mut self, quantity: BuyQuantity) {
        self.state.buy_quantity = quantity;
    }

    /// Accept the pending event. A lapsed offer is cleared and refused.
    pub fn activate_event(&mut self, now_ms: u64) -> bool {
        let Some(pending) = self.state.events.pending.take() else {
            return false;
        };
        if now_ms >= pending.expires_at {
            return false;
        }
        let duration_secs =
            self.registry.event(pending.event).duration + self.bonuses.event_duration_bonus;
        self.state.events.active = Some(ActiveEvent {
            event: pending.event,
            activated_at: now_ms,
            ends_at: now_ms + (duration_secs * 1_000.0) as u64,
        });
        tracing::debug!(event = %self.registry.event(pending.event).name, "event activated");
        self.refresh_bonuses();
        true
    }

    /// Decline the pending event.
    pub fn dismiss_event(&mut self) -> bool {
        self.state.events.pending.take().is_some()
    }

    // -----------------------------------------------------------------------
    // Prestige and resets
    // -----------------------------------------------------------------------

    /// Perform a stellar reset, trading run progress for dust.
    ///
    /// Refused below the dust floor. Research, achievements, dust levels,
    /// statistics and the buy quantity all survive; energy, generators,
    /// planets and events reset.
    pub fn stellar_reset(&mut self, now_ms: u64) -> Option<f64> {
        let gain = self.dust_gain_preview();
        if gain <= 0.0 {
            return None;
        }

        self.state.prestige.dust += gain;
        self.state.prestige.times_prestiged += 1;
        self.state.energy = prestige::starting_energy(&self.state.prestige, &self.registry);
        self.state.lifetime_energy = 0.0;
        for gs in &mut self.state.generators {
            *gs = GeneratorState::default();
        }
        for ps in &mut self.state.planets {
            *ps = PlanetState::default();
        }
        self.state.events = crate::event::EventState::new();
        self.state.events.next_spawn_at = schedule_next_spawn(now_ms, &mut self.rng);

        self.refresh_bonuses();
        self.notices.push(Notice::PrestigeCompleted { dust: gain }, now_ms);
        self.check_achievements(now_ms);
        tracing::info!(
            dust = gain,
            total = self.state.prestige.dust,
            "stellar reset"
        );
        Some(gain)
    }

    /// Wipe everything: the stored save and all progress including dust.
    /// The random stream continues, so a scripted session stays
    /// reproducible across a full reset.
    pub fn full_reset(&mut self, store: &mut dyn SaveStore, now_ms: u64) {
        if let Err(e) = store.clear() {
            tracing::warn!(error = %e, "failed to clear save during full reset");
        }
        self.state = GameState::fresh(&self.registry);
        self.state.last_checkpoint_ms = now_ms;
        self.state.events.next_spawn_at = schedule_next_spawn(now_ms, &mut self.rng);
        self.refresh_bonuses();
        self.notices.clear();
        self.commands.clear_pending();
        tracing::info!("full reset");
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write a checkpoint. The checkpoint time is recorded in the state
    /// before capture so offline catch-up measures from this save.
    pub fn save(&mut self, store: &mut dyn SaveStore, now_ms: u64) -> Result<(), SnapshotError> {
        self.state.last_checkpoint_ms = now_ms;
        let data = SaveData::capture(&self.state, &self.rng, &self.registry);
        let bytes = encode_snapshot(&data)?;
        store.save(&bytes)?;
        tracing::debug!(bytes = bytes.len(), "checkpoint written");
        Ok(())
    }

    /// Whether the auto-save interval has elapsed since the last checkpoint.
    pub fn needs_checkpoint(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.state.last_checkpoint_ms) >= AUTO_SAVE_INTERVAL_MS
    }

    /// Best-effort final save for teardown paths. Errors are logged and
    /// swallowed; shutdown proceeds regardless.
    pub fn shutdown(&mut self, store: &mut dyn SaveStore, now_ms: u64) {
        if let Err(e) = self.save(store, now_ms) {
            tracing::warn!(error = %e, "final save failed during shutdown");
        }
    }

    /// Build an engine from a decoded payload, applying offline catch-up.
    pub fn from_save_data(
        data: SaveData,
        registry: ContentRegistry,
        now_ms: u64,
    ) -> (Self, OfflineGrant) {
        let (mut state, rng) = data.into_state(&registry);

        let grant = offline::offline_progress(&state, &registry, now_ms);
        if !grant.is_none() {
            state.energy += grant.energy;
            state.lifetime_energy += grant.energy;
        }

        let mut engine = GameEngine {
            registry,
            state,
            rng,
            commands: CommandQueue::new(),
            notices: NotificationQueue::default(),
            bonuses: Bonuses::default(),
        };
        if engine.state.events.next_spawn_at == 0 {
            engine.state.events.next_spawn_at = schedule_next_spawn(now_ms, &mut engine.rng);
        }
        engine.refresh_bonuses();
        if !grant.is_none() {
            engine.notices.push(
                Notice::OfflineProgress {
                    energy: grant.energy,
                    seconds: grant.seconds,
                },
                now_ms,
            );
            tracing::info!(
                energy = grant.energy,
                seconds = grant.seconds,
                "offline progress granted"
            );
        }
        (engine, grant)
    }

    /// Decode an encoded save and build an engine from it.
    pub fn from_snapshot(
        bytes: &[u8],
        registry: ContentRegistry,
        migrations: &MigrationRegistry,
        now_ms: u64,
    ) -> Result<(Self, OfflineGrant), SnapshotError> {
        let data = decode_snapshot_with_migrations(bytes, migrations)?;
        Ok(Self::from_save_data(data, registry, now_ms))
    }

    /// Load from a store, falling back to a fresh run when the store is
    /// empty or the save cannot be used.
    pub fn restore(
        store: &dyn SaveStore,
        registry: ContentRegistry,
        migrations: &MigrationRegistry,
        seed: u64,
        now_ms: u64,
    ) -> (Self, OfflineGrant) {
        let data = match store.load() {
            Ok(Some(bytes)) => match decode_snapshot_with_migrations(&bytes, migrations) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!(error = %e, "save could not be decoded, starting fresh");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "save could not be read, starting fresh");
                None
            }
        };
        match data {
            Some(data) => Self::from_save_data(data, registry, now_ms),
            None => (Self::new(registry, seed, now_ms), OfflineGrant::none()),
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Queue a command for the next tick.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Apply one command immediately. Rejected actions are dropped, the
    /// same as clicking a disabled button.
    pub fn apply_command(&mut self, command: Command, now_ms: u64) {
        match command {
            Command::RunGenerator { generator } => {
                let _ = self.run_generator(generator);
            }
            Command::BuyGenerator { generator } => {
                let _ = self.buy_generator(generator, now_ms);
            }
            Command::BuyManager { generator } => {
                let _ = self.buy_manager(generator);
            }
            Command::UnlockPlanet { planet } => {
                let _ = self.unlock_planet(planet, now_ms);
            }
            Command::PurchaseResearch { node } => {
                let _ = self.purchase_research(node, now_ms);
            }
            Command::PurchaseDustUpgrade { upgrade } => {
                let _ = self.purchase_dust_upgrade(upgrade, now_ms);
            }
            Command::SetBuyQuantity { quantity } => self.set_buy_quantity(quantity),
            Command::ActivateEvent => {
                let _ = self.activate_event(now_ms);
            }
            Command::DismissEvent => {
                let _ = self.dismiss_event();
            }
            Command::StellarReset => {
                let _ = self.stellar_reset(now_ms);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// What `buy_generator` would execute right now, without mutating.
    pub fn generator_buy_preview(&self, id: GeneratorId) -> BuyAmount {
        self.plan_generator_buy(id).unwrap_or(BuyAmount::zero())
    }

    /// Cost of the next single unit of a generator.
    pub fn generator_cost(&self, id: GeneratorId) -> f64 {
        economy::generator_cost(
            self.registry.generator(id),
            self.state.generators[id.0 as usize].owned,
            &self.bonuses,
        )
    }

    /// The next milestone a generator has not yet reached.
    pub fn next_milestone(&self, id: GeneratorId) -> Option<Milestone> {
        economy::next_milestone(
            self.state.generators[id.0 as usize].owned,
            self.registry.milestones(),
        )
    }

    pub fn can_unlock_planet(&self, id: PlanetId) -> bool {
        let index = id.0 as usize;
        index < self.registry.planet_count()
            && !self.state.planets[index].unlocked
            && self.state.energy >= self.registry.planet(id).unlock_cost
    }

    pub fn can_research(&self, id: ResearchId) -> bool {
        (id.0 as usize) < self.registry.research_count()
            && research::can_research(&self.state.research, &self.registry, id, self.state.energy)
    }

    /// Cost of the next level of a dust upgrade, `None` once maxed.
    pub fn dust_upgrade_cost(&self, id: DustUpgradeId) -> Option<f64> {
        prestige::dust_upgrade_cost(self.registry.dust_upgrade(id), self.state.prestige.level(id))
    }

    /// Dust a reset would grant right now.
    pub fn dust_gain_preview(&self) -> f64 {
        prestige::dust_gain(
            self.state.lifetime_energy,
            self.bonuses.prestige_dust_bonus,
            research::prestige_multiplier(&self.state.research, &self.registry),
        )
    }

    /// Deterministic digest of persisted state plus the RNG position.
    pub fn state_hash(&self) -> u64 {
        hash::state_hash(&self.state, self.rng.state())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
