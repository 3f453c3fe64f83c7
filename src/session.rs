//! Shared minigame session state.
//!
//! [`MinigameSession`] is the single cross-component resource: the hook, the
//! barrier, the collectibles and the orchestrator all read and mutate it, one
//! system at a time.  Bevy's scheduler never runs two systems holding
//! `ResMut<MinigameSession>` concurrently, so every mutation is serialised
//! onto one logical thread per frame.
//!
//! ## Hook flags
//!
//! The hook's "shooting / returning / collecting" flags are a strict
//! containment (collecting ⇒ returning ⇒ shooting), so they are stored as one
//! [`HookPhase`] value and exposed through predicate methods.  An impossible
//! combination such as "collecting but not returning" cannot be represented.
//!
//! ## One contact per cast
//!
//! Each cast may resolve at most one hook contact: either a deflection off an
//! obstacle or the capture of one piece of scrap.  Once a contact has been
//! recorded in [`HookPhase::Returning`] every further overlap in that cast is
//! ignored.

use crate::config::MinigameConfig;
use bevy::prelude::*;

// ── Hook phase ────────────────────────────────────────────────────────────────

/// What the current cast has already run into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastContact {
    /// Bounced off an obstacle on the way out.
    Deflected,
    /// Dragging a collectible back to the ship.
    Collecting(Entity),
}

/// Flight state of the ship's hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookPhase {
    /// Docked on the ship; may be fired.
    #[default]
    Idle,
    /// Flying away from the launch point.
    Outbound,
    /// Flying back towards the ship, possibly carrying a contact.
    Returning { contact: Option<CastContact> },
}

impl HookPhase {
    /// `true` for every phase except [`HookPhase::Idle`].
    #[inline]
    pub fn is_shooting(self) -> bool {
        !matches!(self, HookPhase::Idle)
    }

    #[inline]
    pub fn is_returning(self) -> bool {
        matches!(self, HookPhase::Returning { .. })
    }

    #[inline]
    pub fn is_collecting(self) -> bool {
        self.pending_collection().is_some()
    }

    /// Entity currently being dragged back, if any.
    #[inline]
    pub fn pending_collection(self) -> Option<Entity> {
        match self {
            HookPhase::Returning {
                contact: Some(CastContact::Collecting(entity)),
            } => Some(entity),
            _ => None,
        }
    }

    /// Whether a new contact may still be resolved in this cast.
    #[inline]
    pub fn accepts_contact(self) -> bool {
        matches!(
            self,
            HookPhase::Outbound | HookPhase::Returning { contact: None }
        )
    }
}

/// Result of feeding a hook overlap into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Obstacle hit while outbound: reverse the hook, nothing collected.
    Deflected,
    /// Scrap captured.  `reverse_hook` is set when the hook was still outbound.
    Collecting { reverse_hook: bool },
    /// Overlap has no effect (inactive session, contact already spent, or an
    /// obstacle brushed on the way back).
    Ignored,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Last charge spent (fired or forfeited).
    ChargesDepleted,
    /// One charge left but no bonus scrap and both guaranteed pieces taken.
    ScrapExhausted,
    /// Cumulative session time exceeded the safety bound.
    Timeout,
}

// ── Charge timer ──────────────────────────────────────────────────────────────

/// The visual countdown ring around the ship.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerIndicator {
    pub radius: f32,
}

/// What a [`ChargeTimer::tick`] did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeTick {
    /// Nothing to do (hook out, barrier still growing, no indicator).
    Idle,
    /// A fresh indicator was created at full radius.
    IndicatorSpawned,
    /// Counting down; indicator shrinking.
    Counting,
    /// Countdown hit zero: one charge is forfeited and the indicator removed.
    Expired,
    /// Indicator growing back after a shot.
    Expanding,
    /// Indicator back at full size: the countdown may resume.
    Rearmed,
}

/// Per-charge countdown plus its visual indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeTimer {
    pub duration: f32,
    pub remaining: f32,
    /// Counting (or ready to count).  Cleared by a shot until the indicator
    /// has grown back to full size.
    pub ongoing: bool,
    pub indicator: Option<TimerIndicator>,
}

impl Default for ChargeTimer {
    fn default() -> Self {
        Self::new(crate::constants::CHARGE_TIMER_SECS)
    }
}

impl ChargeTimer {
    /// A stopped timer with no indicator.
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: duration,
            ongoing: false,
            indicator: None,
        }
    }

    /// A timer ready to create its indicator on the first eligible tick.
    pub fn armed(duration: f32) -> Self {
        Self {
            ongoing: true,
            ..Self::new(duration)
        }
    }

    /// Firing requires a visible indicator and a running countdown.
    #[inline]
    pub fn ready_to_fire(&self) -> bool {
        self.ongoing && self.indicator.is_some()
    }

    /// Stop the countdown; the indicator grows back before it resumes.
    pub fn on_fire(&mut self) {
        self.ongoing = false;
    }

    /// Remove the indicator and stop counting (session end).
    pub fn stop(&mut self) {
        self.indicator = None;
        self.ongoing = false;
        self.remaining = self.duration;
    }

    /// Advance the countdown by `dt` seconds.
    ///
    /// The countdown only runs while the hook is docked and the barrier is
    /// complete.  After a shot the indicator grows back at `expand_speed`
    /// before counting resumes, so the player cannot fire again until the
    /// indicator has visibly reset.
    pub fn tick(
        &mut self,
        dt: f32,
        hook_idle: bool,
        barrier_complete: bool,
        max_radius: f32,
        expand_speed: f32,
    ) -> ChargeTick {
        if hook_idle && barrier_complete && self.ongoing {
            if self.indicator.is_none() {
                self.indicator = Some(TimerIndicator { radius: max_radius });
                self.remaining = self.duration;
                return ChargeTick::IndicatorSpawned;
            }

            self.remaining -= dt;
            if self.remaining <= 0.0 {
                self.remaining = self.duration;
                self.indicator = None;
                return ChargeTick::Expired;
            }
            if let Some(indicator) = self.indicator.as_mut() {
                indicator.radius = self.remaining * (max_radius / self.duration);
            }
            return ChargeTick::Counting;
        }

        let Some(indicator) = self.indicator.as_mut() else {
            return ChargeTick::Idle;
        };

        if !self.ongoing && indicator.radius < max_radius {
            self.remaining = self.duration;
            indicator.radius = (indicator.radius + expand_speed * dt).min(max_radius);
            if indicator.radius >= max_radius {
                self.ongoing = true;
                return ChargeTick::Rearmed;
            }
            ChargeTick::Expanding
        } else if indicator.radius >= max_radius && !self.ongoing {
            self.ongoing = true;
            ChargeTick::Rearmed
        } else {
            ChargeTick::Idle
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// The singleton session shared by every minigame component.
///
/// Reset to [`Default`] whenever a session ends.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MinigameSession {
    pub playing: bool,
    pub hook: HookPhase,
    pub barrier_complete: bool,
    /// Any non-guaranteed ring slot holds real scrap.
    pub additional_scrap: bool,
    pub scrap_collected: u32,
    pub charges: u32,
    /// Seconds since the session started.
    pub elapsed: f32,
    pub charge_timer: ChargeTimer,
    /// Set by the first end request; later requests are ignored.
    pub ending: Option<EndReason>,
}

impl Default for MinigameSession {
    fn default() -> Self {
        Self {
            playing: false,
            hook: HookPhase::Idle,
            barrier_complete: false,
            additional_scrap: false,
            scrap_collected: 0,
            charges: crate::constants::MAX_CHARGES,
            elapsed: 0.0,
            charge_timer: ChargeTimer::default(),
            ending: None,
        }
    }
}

impl MinigameSession {
    /// Reset every counter for a fresh session and mark it playing.
    pub fn begin(&mut self, config: &MinigameConfig) {
        *self = Self {
            playing: true,
            charges: config.max_charges,
            charge_timer: ChargeTimer::armed(config.charge_timer_secs),
            ..Default::default()
        };
    }

    /// Restore defaults at session end.
    pub fn reset(&mut self, config: &MinigameConfig) {
        *self = Self {
            charges: config.max_charges,
            charge_timer: ChargeTimer::new(config.charge_timer_secs),
            ..Default::default()
        };
    }

    /// Playing and not already on the way out.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.playing && self.ending.is_none()
    }

    /// All firing preconditions: active session, docked hook, complete
    /// barrier, running countdown and at least one charge.
    pub fn can_fire(&self) -> bool {
        self.is_active()
            && self.hook == HookPhase::Idle
            && self.barrier_complete
            && self.charge_timer.ready_to_fire()
            && self.charges > 0
    }

    /// Spend a charge and launch.  Returns the remaining charge count, or
    /// `None` (and leaves everything untouched) when firing is not allowed.
    pub fn fire(&mut self) -> Option<u32> {
        if !self.can_fire() {
            return None;
        }
        self.charges -= 1;
        self.hook = HookPhase::Outbound;
        self.charge_timer.on_fire();
        Some(self.charges)
    }

    /// Outbound hook passed its range without touching anything.
    pub fn begin_return(&mut self) -> bool {
        if self.hook == HookPhase::Outbound {
            self.hook = HookPhase::Returning { contact: None };
            true
        } else {
            false
        }
    }

    /// Resolve an overlap between the hook and a static collectible.
    pub fn register_contact(&mut self, entity: Entity, is_obstacle: bool) -> ContactOutcome {
        if !self.is_active() || !self.hook.accepts_contact() {
            return ContactOutcome::Ignored;
        }
        let outbound = self.hook == HookPhase::Outbound;
        if is_obstacle {
            if !outbound {
                return ContactOutcome::Ignored;
            }
            self.hook = HookPhase::Returning {
                contact: Some(CastContact::Deflected),
            };
            ContactOutcome::Deflected
        } else {
            self.hook = HookPhase::Returning {
                contact: Some(CastContact::Collecting(entity)),
            };
            ContactOutcome::Collecting {
                reverse_hook: outbound,
            }
        }
    }

    /// Dock the hook.  Returns the entity that was being collected, if any.
    pub fn finish_cast(&mut self) -> Option<Entity> {
        let pending = self.hook.pending_collection();
        self.hook = HookPhase::Idle;
        pending
    }

    /// Forfeit one charge to the countdown.  Returns the remaining count.
    pub fn forfeit_charge(&mut self) -> u32 {
        self.charges = self.charges.saturating_sub(1);
        self.charges
    }

    /// End conditions evaluated whenever the hook docks or aborts.
    pub fn end_condition(&self) -> Option<EndReason> {
        if self.charges == 0 {
            Some(EndReason::ChargesDepleted)
        } else if self.charges == 1 && !self.additional_scrap && self.scrap_collected == 2 {
            Some(EndReason::ScrapExhausted)
        } else {
            None
        }
    }

    /// Accumulate session time; returns [`EndReason::Timeout`] once the
    /// safety bound is exceeded.
    pub fn tick_elapsed(&mut self, dt: f32, timeout_secs: f32) -> Option<EndReason> {
        self.elapsed += dt;
        (self.elapsed > timeout_secs).then_some(EndReason::Timeout)
    }

    /// Record an end request.  Returns `false` if the session is not playing
    /// or an end is already pending.
    pub fn request_end(&mut self, reason: EndReason) -> bool {
        if !self.is_active() {
            return false;
        }
        self.ending = Some(reason);
        true
    }
}

// ── Charge display ────────────────────────────────────────────────────────────

/// Change to apply to the three charge indicators and the music state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeDisplayUpdate {
    /// Every indicator returns to full brightness.
    pub reset_all: bool,
    /// Indicator slot to dim.
    pub dim_slot: Option<usize>,
    /// Value for the `Shots_Remaining` audio state group.
    pub music_state: &'static str,
    /// No charges left: stop the minigame music.
    pub depleted: bool,
}

/// Display change for a given remaining charge count.
///
/// `None` for counts outside 0–3, which leave the display untouched.
pub fn charge_display_update(charges: u32) -> Option<ChargeDisplayUpdate> {
    let update = match charges {
        3 => ChargeDisplayUpdate {
            reset_all: true,
            dim_slot: None,
            music_state: "Shots_Remaining_3",
            depleted: false,
        },
        2 => ChargeDisplayUpdate {
            reset_all: false,
            dim_slot: Some(2),
            music_state: "Shots_Remaining_2",
            depleted: false,
        },
        1 => ChargeDisplayUpdate {
            reset_all: false,
            dim_slot: Some(1),
            music_state: "Shots_Remaining_1",
            depleted: false,
        },
        0 => ChargeDisplayUpdate {
            reset_all: false,
            dim_slot: Some(0),
            music_state: "Shots_Remaining_3",
            depleted: true,
        },
        _ => return None,
    };
    Some(update)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn armed_session() -> MinigameSession {
        let config = MinigameConfig::default();
        let mut session = MinigameSession::default();
        session.begin(&config);
        session.barrier_complete = true;
        // First eligible tick creates the indicator.
        session.charge_timer.tick(DT, true, true, 20.0, 10.0);
        session
    }

    /// Distinct indices give distinct entities; equal indices compare equal.
    fn entity(index: u32) -> Entity {
        let mut world = World::new();
        for _ in 0..index {
            world.spawn_empty();
        }
        world.spawn_empty().id()
    }

    #[test]
    fn hook_flags_are_nested() {
        let phases = [
            HookPhase::Idle,
            HookPhase::Outbound,
            HookPhase::Returning { contact: None },
            HookPhase::Returning {
                contact: Some(CastContact::Deflected),
            },
            HookPhase::Returning {
                contact: Some(CastContact::Collecting(entity(1))),
            },
        ];
        for phase in phases {
            if phase.is_collecting() {
                assert!(phase.is_returning());
            }
            if phase.is_returning() {
                assert!(phase.is_shooting());
            }
        }
    }

    #[test]
    fn fire_requires_every_precondition() {
        let session = armed_session();
        assert!(session.can_fire());

        let mut no_barrier = session.clone();
        no_barrier.barrier_complete = false;
        assert_eq!(no_barrier.fire(), None);
        assert_eq!(no_barrier.charges, 3);

        let mut no_charges = session.clone();
        no_charges.charges = 0;
        assert_eq!(no_charges.fire(), None);

        let mut hook_out = session.clone();
        hook_out.hook = HookPhase::Outbound;
        assert_eq!(hook_out.fire(), None);
        assert_eq!(hook_out.charges, 3);

        let mut no_indicator = session.clone();
        no_indicator.charge_timer.indicator = None;
        assert_eq!(no_indicator.fire(), None);

        let mut not_playing = session;
        not_playing.playing = false;
        assert_eq!(not_playing.fire(), None);
    }

    #[test]
    fn fire_spends_charge_and_stops_countdown() {
        let mut session = armed_session();
        assert_eq!(session.fire(), Some(2));
        assert_eq!(session.hook, HookPhase::Outbound);
        assert!(!session.charge_timer.ongoing);
        assert!(session.charge_timer.indicator.is_some());
        // Cannot fire again while the hook is out.
        assert_eq!(session.fire(), None);
    }

    #[test]
    fn obstacle_deflects_only_when_outbound() {
        let mut session = armed_session();
        session.fire();
        let rock = entity(7);

        assert_eq!(
            session.register_contact(rock, true),
            ContactOutcome::Deflected
        );
        assert!(session.hook.is_returning());
        assert!(!session.hook.is_collecting());

        // Already deflected: a second obstacle cannot bounce the hook again.
        assert_eq!(session.register_contact(rock, true), ContactOutcome::Ignored);
    }

    #[test]
    fn obstacle_on_empty_return_is_ignored() {
        let mut session = armed_session();
        session.fire();
        assert!(session.begin_return());
        assert_eq!(
            session.register_contact(entity(3), true),
            ContactOutcome::Ignored
        );
        assert_eq!(session.hook, HookPhase::Returning { contact: None });
    }

    #[test]
    fn scrap_is_collected_once_per_cast() {
        let mut session = armed_session();
        session.fire();
        let first = entity(10);
        let second = entity(11);

        assert_eq!(
            session.register_contact(first, false),
            ContactOutcome::Collecting { reverse_hook: true }
        );
        assert_eq!(session.hook.pending_collection(), Some(first));
        assert_eq!(
            session.register_contact(second, false),
            ContactOutcome::Ignored
        );
        assert_eq!(session.hook.pending_collection(), Some(first));
    }

    #[test]
    fn scrap_caught_on_empty_return_keeps_direction() {
        let mut session = armed_session();
        session.fire();
        session.begin_return();
        assert_eq!(
            session.register_contact(entity(4), false),
            ContactOutcome::Collecting {
                reverse_hook: false
            }
        );
    }

    #[test]
    fn deflected_cast_cannot_collect_on_the_way_back() {
        let mut session = armed_session();
        session.fire();
        session.register_contact(entity(1), true);
        assert_eq!(
            session.register_contact(entity(2), false),
            ContactOutcome::Ignored
        );
    }

    #[test]
    fn contacts_are_ignored_once_end_is_requested() {
        let mut session = armed_session();
        session.fire();
        assert!(session.request_end(EndReason::Timeout));
        assert!(!session.request_end(EndReason::ChargesDepleted));
        assert_eq!(session.ending, Some(EndReason::Timeout));
        assert_eq!(
            session.register_contact(entity(1), false),
            ContactOutcome::Ignored
        );
    }

    #[test]
    fn finish_cast_returns_pending_entity_and_docks() {
        let mut session = armed_session();
        session.fire();
        session.register_contact(entity(5), false);
        assert_eq!(session.finish_cast(), Some(entity(5)));
        assert_eq!(session.hook, HookPhase::Idle);
        assert_eq!(session.finish_cast(), None);
    }

    #[test]
    fn end_conditions() {
        let mut session = armed_session();
        assert_eq!(session.end_condition(), None);

        session.charges = 0;
        assert_eq!(session.end_condition(), Some(EndReason::ChargesDepleted));

        session.charges = 1;
        session.scrap_collected = 2;
        session.additional_scrap = false;
        assert_eq!(session.end_condition(), Some(EndReason::ScrapExhausted));

        session.additional_scrap = true;
        assert_eq!(session.end_condition(), None);
    }

    #[test]
    fn countdown_forfeits_exactly_once_after_six_seconds() {
        let mut timer = ChargeTimer::armed(6.0);
        assert_eq!(
            timer.tick(DT, true, true, 20.0, 10.0),
            ChargeTick::IndicatorSpawned
        );

        let mut ticks = 0u32;
        loop {
            ticks += 1;
            if timer.tick(DT, true, true, 20.0, 10.0) == ChargeTick::Expired {
                break;
            }
            assert!(ticks < 400, "countdown never expired");
        }
        let elapsed = ticks as f32 * DT;
        assert!(elapsed >= 6.0 - DT, "expired early at {elapsed}");
        assert!(elapsed <= 6.0 + DT + 1e-4, "expired late at {elapsed}");
        assert!(timer.indicator.is_none());
        assert!(timer.ongoing);

        // The next tick brings the indicator back at full radius.
        assert_eq!(
            timer.tick(DT, true, true, 20.0, 10.0),
            ChargeTick::IndicatorSpawned
        );
        assert_eq!(timer.indicator.unwrap().radius, 20.0);
        assert_eq!(timer.remaining, 6.0);
    }

    #[test]
    fn countdown_waits_for_barrier_and_docked_hook() {
        let mut timer = ChargeTimer::armed(6.0);
        assert_eq!(timer.tick(DT, true, false, 20.0, 10.0), ChargeTick::Idle);
        assert!(timer.indicator.is_none());
        timer.tick(DT, true, true, 20.0, 10.0);
        let before = timer.remaining;
        timer.tick(1.0, false, true, 20.0, 10.0);
        assert_eq!(timer.remaining, before);
    }

    #[test]
    fn indicator_shrinks_with_remaining_time() {
        let mut timer = ChargeTimer::armed(6.0);
        timer.tick(DT, true, true, 20.0, 10.0);
        timer.tick(3.0, true, true, 20.0, 10.0);
        let radius = timer.indicator.unwrap().radius;
        assert!((radius - 10.0).abs() < 1e-4);
    }

    #[test]
    fn indicator_regrows_before_countdown_resumes() {
        let mut timer = ChargeTimer::armed(6.0);
        timer.tick(DT, true, true, 20.0, 10.0);
        timer.tick(3.0, true, true, 20.0, 10.0); // radius 10
        timer.on_fire();

        // While the hook is out the indicator grows back.
        assert_eq!(
            timer.tick(0.5, false, true, 20.0, 10.0),
            ChargeTick::Expanding
        );
        assert_eq!(
            timer.tick(0.2, false, true, 20.0, 10.0),
            ChargeTick::Expanding
        );
        assert!(!timer.ready_to_fire());
        assert_eq!(
            timer.tick(0.1, true, true, 20.0, 10.0),
            ChargeTick::Expanding
        );
        assert_eq!(timer.tick(0.9, true, true, 20.0, 10.0), ChargeTick::Rearmed);
        assert!(timer.ready_to_fire());
        assert_eq!(timer.remaining, 6.0);
    }

    #[test]
    fn timeout_fires_past_bound() {
        let mut session = armed_session();
        assert_eq!(session.tick_elapsed(20.0, 21.0), None);
        assert_eq!(session.tick_elapsed(1.5, 21.0), Some(EndReason::Timeout));
    }

    #[test]
    fn charge_display_dims_monotonically() {
        let mut dimmed = Vec::new();
        for charges in (0..=3).rev() {
            let update = charge_display_update(charges).unwrap();
            if let Some(slot) = update.dim_slot {
                assert!(!dimmed.contains(&slot));
                dimmed.push(slot);
            }
            assert_eq!(update.depleted, charges == 0);
        }
        assert_eq!(dimmed, vec![2, 1, 0]);
        assert!(charge_display_update(3).unwrap().reset_all);
        assert!(charge_display_update(4).is_none());
    }

    #[test]
    fn reset_restores_defaults() {
        let config = MinigameConfig::default();
        let mut session = armed_session();
        session.fire();
        session.scrap_collected = 2;
        session.request_end(EndReason::ChargesDepleted);
        session.reset(&config);
        assert!(!session.playing);
        assert_eq!(session.charges, 3);
        assert_eq!(session.scrap_collected, 0);
        assert_eq!(session.hook, HookPhase::Idle);
        assert_eq!(session.ending, None);
        assert!(!session.barrier_complete);
    }
}
