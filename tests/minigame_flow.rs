//! Headless tests for a whole minigame session driven through
//! [`MinigamePhase`].
//!
//! These tests use [`MinimalPlugins`] (no window, no rendering, no physics)
//! so they run fast and deterministically in CI.  Collision events are never
//! produced (no Rapier pipeline), so only the state-driven parts of a session
//! are exercised here; contact handling is covered by the unit tests next to
//! each system.
//!
//! Covered scenarios:
//! 1. The game starts roaming.
//! 2. Entering `Playing` freezes the ship, opens the barrier and seeds both rings.
//! 3. Leaving `Playing` sweeps every session entity and restores the ship.
//! 4. A second session starts from a clean slate.
//! 5. The safety timeout ends a session on its own.
//! 6. Interacting with a scrap node schedules the session and consumes the node.
//! 7. Despawning the node before its countdown elapses cancels the start.

use bevy::ecs::message::Messages;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy_rapier2d::prelude::{CollisionEvent, ColliderDisabled, LockedAxes};
use salvage_hook::barrier::Barrier;
use salvage_hook::collectible::Collectible;
use salvage_hook::config::MinigameConfig;
use salvage_hook::feedback::{MinigameHud, MinigameInput, RingExplosion};
use salvage_hook::minigame::collection::PlayerInventory;
use salvage_hook::minigame::rings::RingFormation;
use salvage_hook::minigame::{MinigamePhase, MinigamePlugin, SessionSpawned};
use salvage_hook::scrap_node::{PendingMinigameStart, ScrapNode};
use salvage_hook::session::{EndReason, MinigameSession};
use salvage_hook::ship::{setup_ship, Ship, ShipLoadout};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Minimal headless app with the minigame plugin and a ship at the origin.
fn build_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.add_message::<CollisionEvent>();
    app.add_plugins(MinigamePlugin);
    app.init_resource::<PlayerInventory>();
    app.add_systems(Startup, setup_ship);
    app.update(); // Startup + settle into Roaming
    app
}

fn set_phase(app: &mut App, phase: MinigamePhase) {
    app.world_mut()
        .resource_mut::<NextState<MinigamePhase>>()
        .set(phase);
    app.update();
}

fn phase(app: &App) -> MinigamePhase {
    *app.world().resource::<State<MinigamePhase>>().get()
}

fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query_filtered::<Entity, F>().iter(world).count()
}

fn ship(app: &mut App) -> Entity {
    let world = app.world_mut();
    world
        .query_filtered::<Entity, With<Ship>>()
        .single(world)
        .expect("exactly one ship")
}

fn barrier(app: &mut App) -> (Entity, Barrier, Visibility) {
    let world = app.world_mut();
    let mut query = world.query::<(Entity, &Barrier, &Visibility)>();
    let (entity, barrier, visibility) = query.single(world).expect("exactly one barrier");
    (entity, *barrier, *visibility)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn game_starts_roaming_with_an_idle_session() {
    let mut app = build_app();
    assert_eq!(phase(&app), MinigamePhase::Roaming);

    let session = app.world().resource::<MinigameSession>();
    assert!(!session.playing);
    assert_eq!(session.charges, 3);

    let (entity, _, visibility) = barrier(&mut app);
    assert_eq!(visibility, Visibility::Hidden);
    assert!(app.world().get::<ColliderDisabled>(entity).is_some());
}

#[test]
fn entering_playing_sets_the_session_up() {
    let mut app = build_app();
    set_phase(&mut app, MinigamePhase::Playing);
    assert_eq!(phase(&app), MinigamePhase::Playing);

    let session = app.world().resource::<MinigameSession>();
    assert!(session.playing);
    assert_eq!(session.charges, 3);
    assert_eq!(session.scrap_collected, 0);

    assert_eq!(count::<With<RingFormation>>(&mut app), 2);
    // Two rings of eight slots each with the default layouts.
    assert_eq!(
        count::<(With<Collectible>, With<SessionSpawned>)>(&mut app),
        16
    );

    let ship = ship(&mut app);
    let axes = *app.world().get::<LockedAxes>(ship).unwrap();
    assert!(axes.contains(LockedAxes::TRANSLATION_LOCKED));
    assert!(!axes.contains(LockedAxes::ROTATION_LOCKED));
    assert!(!app.world().get::<ShipLoadout>(ship).unwrap().turrets_enabled);

    let (entity, _, visibility) = barrier(&mut app);
    assert_eq!(visibility, Visibility::Visible);
    assert!(app.world().get::<ColliderDisabled>(entity).is_none());

    let hud = app.world().resource::<MinigameHud>();
    assert!(hud.overlay_visible);
    assert!(hud.charges_visible);
}

#[test]
fn leaving_playing_sweeps_the_session() {
    let mut app = build_app();
    set_phase(&mut app, MinigamePhase::Playing);
    set_phase(&mut app, MinigamePhase::Roaming);

    assert_eq!(count::<With<SessionSpawned>>(&mut app), 0);
    assert_eq!(count::<With<RingFormation>>(&mut app), 0);
    assert_eq!(count::<With<Collectible>>(&mut app), 0);

    let explosions = app.world().resource::<Messages<RingExplosion>>();
    assert_eq!(explosions.iter_current_update_messages().count(), 1);

    let ship = ship(&mut app);
    assert_eq!(
        *app.world().get::<LockedAxes>(ship).unwrap(),
        LockedAxes::empty()
    );
    assert_eq!(
        *app.world().get::<ShipLoadout>(ship).unwrap(),
        ShipLoadout::default()
    );

    let (entity, barrier, visibility) = barrier(&mut app);
    assert_eq!(visibility, Visibility::Hidden);
    assert_eq!(barrier.radius, barrier.start_radius);
    assert!(app.world().get::<ColliderDisabled>(entity).is_some());

    let session = app.world().resource::<MinigameSession>();
    assert!(!session.playing);
    assert!(session.charge_timer.indicator.is_none());
    assert!(!app.world().resource::<MinigameHud>().overlay_visible);
}

#[test]
fn restarted_session_begins_clean() {
    let mut app = build_app();
    set_phase(&mut app, MinigamePhase::Playing);
    {
        let mut session = app.world_mut().resource_mut::<MinigameSession>();
        session.charges = 1;
        session.scrap_collected = 2;
    }
    set_phase(&mut app, MinigamePhase::Roaming);
    set_phase(&mut app, MinigamePhase::Playing);

    let session = app.world().resource::<MinigameSession>();
    assert_eq!(session.charges, 3);
    assert_eq!(session.scrap_collected, 0);
    assert_eq!(session.ending, None);

    // Exactly one session's worth of pieces: nothing leaked from the first.
    assert_eq!(count::<With<RingFormation>>(&mut app), 2);
    assert_eq!(count::<With<Collectible>>(&mut app), 16);

    let (_, barrier, _) = barrier(&mut app);
    assert!(!barrier.complete);
    assert!(barrier.radius < barrier.range);
}

#[test]
fn safety_timeout_ends_the_session() {
    let mut app = build_app();
    set_phase(&mut app, MinigamePhase::Playing);

    let timeout = app
        .world()
        .resource::<MinigameConfig>()
        .session_timeout_secs();
    app.world_mut().resource_mut::<MinigameSession>().elapsed = timeout + 1.0;

    app.update(); // timeout detected, end requested
    assert_eq!(
        app.world().resource::<MinigameSession>().ending,
        Some(EndReason::Timeout)
    );
    app.update(); // OnExit runs
    assert_eq!(phase(&app), MinigamePhase::Roaming);
    assert!(!app.world().resource::<MinigameSession>().playing);
    assert_eq!(count::<With<SessionSpawned>>(&mut app), 0);
}

#[test]
fn scrap_node_interaction_starts_a_session() {
    let mut app = build_app();
    let config = app.world().resource::<MinigameConfig>().clone();
    let node = app
        .world_mut()
        .spawn((
            ScrapNode {
                ship_in_range: true,
                ..ScrapNode::new(&config)
            },
            Transform::default(),
        ))
        .id();

    app.world_mut().resource_mut::<MinigameInput>().interact = true;
    app.update();
    app.world_mut().resource_mut::<MinigameInput>().interact = false;

    let ship = ship(&mut app);
    assert!(app
        .world()
        .get::<LockedAxes>(ship)
        .unwrap()
        .contains(LockedAxes::TRANSLATION_LOCKED));
    assert!(!app.world().resource::<MinigameHud>().interact_prompt_visible);

    app.world_mut()
        .get_mut::<PendingMinigameStart>(node)
        .expect("start scheduled on the node")
        .remaining_secs = 0.0;
    app.update(); // countdown elapses, node consumed
    assert!(app.world().get_entity(node).is_err());

    app.update(); // transition into Playing
    assert_eq!(phase(&app), MinigamePhase::Playing);
    assert!(app.world().resource::<MinigameSession>().playing);
}

#[test]
fn despawning_the_node_early_cancels_the_start() {
    let mut app = build_app();
    let config = app.world().resource::<MinigameConfig>().clone();
    let node = app
        .world_mut()
        .spawn((
            ScrapNode {
                ship_in_range: true,
                ..ScrapNode::new(&config)
            },
            Transform::default(),
        ))
        .id();

    app.world_mut().resource_mut::<MinigameInput>().interact = true;
    app.update();
    app.world_mut().resource_mut::<MinigameInput>().interact = false;
    assert!(app.world().get::<PendingMinigameStart>(node).is_some());

    app.world_mut().despawn(node);
    for _ in 0..3 {
        app.update();
    }

    assert_eq!(phase(&app), MinigamePhase::Roaming);
    assert!(!app.world().resource::<MinigameSession>().playing);
    assert_eq!(count::<With<PendingMinigameStart>>(&mut app), 0);
    assert_eq!(count::<With<RingFormation>>(&mut app), 0);
}
