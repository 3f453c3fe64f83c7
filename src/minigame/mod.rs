//! The scrap-fishing minigame: session lifecycle and system wiring.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`orchestrator`] | Session start / end, fire input, charge countdown, timeout |
//! | [`rings`] | Ring formations, slot rolls, ring rotation |
//! | [`collection`] | Catalog resolution, inventory hand-off, passive pickup |
//!
//! A session is the [`MinigamePhase::Playing`] state: `OnEnter` runs
//! [`orchestrator::start_session`], `OnExit` runs [`orchestrator::end_session`].
//! Systems ask for an end through [`request_session_end`], which records the
//! first reason in the session and schedules the state change; later requests
//! in the same frame are no-ops.
//!
//! ## Frame order
//!
//! `Update` (playing): fire → charge countdown → ring rotation → timeout →
//! hook flight → barrier growth → anchor follow.
//! `PostUpdate`: hook contacts, barrier purge, passive pickup and node
//! proximity, all reading the same frame's `CollisionEvent`s.

pub mod collection;
pub mod orchestrator;
pub mod rings;

use crate::barrier::{barrier_expand_system, barrier_purge_system, setup_barrier};
use crate::collectible::{anchor_follow_system, collectible_lifetime_system, Destroyed, ScrapCatalog};
use crate::config::{load_minigame_config, MinigameConfig};
use crate::feedback::{AudioRequest, CameraShake, MinigameHud, MinigameInput, RingExplosion};
use crate::hook::{hook_contact_system, hook_flight_system};
use crate::scrap_node::{
    pending_start_system, scrap_node_ambient_system, scrap_node_interact_system,
    scrap_node_proximity_system,
};
use crate::session::{EndReason, MinigameSession};
use bevy::prelude::*;
use collection::{passive_collection_system, ScrapAdded};
use orchestrator::{
    charge_timer_system, end_session, fire_hook_system, session_timeout_system, start_session,
};
use rings::ring_rotation_system;

/// Whether the player is flying around or fishing.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinigamePhase {
    #[default]
    Roaming,
    Playing,
}

/// Tag for every entity that belongs to one session and must not outlive it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SessionSpawned;

/// Record an end request and schedule the transition out of
/// [`MinigamePhase::Playing`].  Returns `false` if an end was already pending
/// or no session is playing.
pub fn request_session_end(
    session: &mut MinigameSession,
    next_phase: &mut NextState<MinigamePhase>,
    reason: EndReason,
) -> bool {
    if !session.request_end(reason) {
        return false;
    }
    info!("Minigame session ending: {reason:?}");
    next_phase.set(MinigamePhase::Roaming);
    true
}

pub struct MinigamePlugin;

impl Plugin for MinigamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<MinigamePhase>()
            .init_resource::<MinigameConfig>()
            .init_resource::<MinigameSession>()
            .init_resource::<ScrapCatalog>()
            .init_resource::<MinigameHud>()
            .init_resource::<MinigameInput>()
            .add_message::<AudioRequest>()
            .add_message::<CameraShake>()
            .add_message::<RingExplosion>()
            .add_message::<ScrapAdded>()
            .add_message::<Destroyed>()
            .add_systems(
                Startup,
                (load_minigame_config, setup_barrier.after(load_minigame_config)),
            )
            .add_systems(OnEnter(MinigamePhase::Playing), start_session)
            .add_systems(OnExit(MinigamePhase::Playing), end_session)
            .add_systems(
                Update,
                (
                    fire_hook_system,
                    charge_timer_system,
                    ring_rotation_system,
                    session_timeout_system,
                    hook_flight_system,
                    barrier_expand_system,
                )
                    .chain()
                    .run_if(in_state(MinigamePhase::Playing)),
            )
            .add_systems(
                Update,
                (
                    scrap_node_interact_system,
                    pending_start_system,
                    scrap_node_ambient_system,
                    collectible_lifetime_system,
                    anchor_follow_system.after(ring_rotation_system),
                ),
            )
            .add_systems(
                PostUpdate,
                (
                    hook_contact_system.run_if(in_state(MinigamePhase::Playing)),
                    barrier_purge_system.run_if(in_state(MinigamePhase::Playing)),
                    passive_collection_system,
                    scrap_node_proximity_system,
                )
                    .chain(),
            );
    }
}
