//! Session lifecycle and per-frame session bookkeeping.
//!
//! | System | Schedule | Job |
//! |--------|----------|-----|
//! | [`start_session`] | `OnEnter(Playing)` | freeze ship, open barrier, roll rings |
//! | [`end_session`] | `OnExit(Playing)` | explode rings, restore ship, reset everything |
//! | [`fire_hook_system`] | `Update` | spend a charge and launch the hook |
//! | [`charge_timer_system`] | `Update` | per-charge countdown and indicator |
//! | [`session_timeout_system`] | `Update` | force an end after the safety bound |

use crate::barrier::{activate_barrier, deactivate_barrier, Barrier};
use crate::collectible::ScrapCatalog;
use crate::config::MinigameConfig;
use crate::feedback::{
    post_cue, show_charges, AudioRequest, CameraShake, MinigameHud, MinigameInput, RingExplosion,
};
use crate::hook::{deactivate_hook, launch_hook, Hook, HookItem};
use crate::minigame::rings::{
    has_additional_scrap, pick_layout, roll_ring_slots, roll_rotation_speed, spawn_ring_formation,
    RingFormation, RingTier,
};
use crate::minigame::{request_session_end, MinigamePhase, SessionSpawned};
use crate::scrap_node::ScrapNode;
use crate::session::{charge_display_update, ChargeTick, EndReason, HookPhase, MinigameSession};
use crate::ship::{session_locked_axes, Ship, ShipLoadout};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

type ShipItem = (
    &'static Transform,
    &'static mut Velocity,
    &'static mut LockedAxes,
    &'static mut ShipLoadout,
);

type BarrierItem = (Entity, &'static mut Barrier, &'static mut Visibility);

/// Push the display change for `charges` to the HUD and the music state.
fn refresh_charges(
    hud: &mut MinigameHud,
    audio: &mut MessageWriter<AudioRequest>,
    config: &MinigameConfig,
    charges: u32,
) {
    if let Some(update) = charge_display_update(charges) {
        show_charges(
            hud,
            audio,
            &update,
            config.audio.play_music.as_deref(),
            config.audio.stop_music.as_deref(),
        );
    }
}

/// Roll and spawn one tier's ring.  Returns whether any non-guaranteed slot
/// holds real scrap.
fn populate_ring(
    commands: &mut Commands,
    tier: RingTier,
    config: &MinigameConfig,
    catalog: &ScrapCatalog,
    center: Vec2,
    rng: &mut impl Rng,
) -> bool {
    let (layouts, chance, max_speed) = match tier {
        RingTier::Inner => (
            &config.inner_ring_layouts,
            config.inner_ring_scrap_chance,
            config.inner_ring_max_rotation_speed,
        ),
        RingTier::Outer => (
            &config.outer_ring_layouts,
            config.outer_ring_scrap_chance,
            config.outer_ring_max_rotation_speed,
        ),
    };
    let Some(layout) = pick_layout(layouts, rng) else {
        warn!("No {tier:?} ring layout configured; ring skipped");
        return false;
    };
    let rotation_speed = roll_rotation_speed(
        rng,
        config.ring_min_rotation_speed,
        max_speed,
        config.ring_rotation_direction,
    );
    let fills = roll_ring_slots(layout.slot_count, chance, rng);
    let formation = RingFormation {
        tier,
        layout: layout.clone(),
        angle_deg: 0.0,
        rotation_speed,
    };
    spawn_ring_formation(commands, formation, center, &fills, catalog, rng);
    has_additional_scrap(&fills)
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// Open a session around the ship.
#[allow(clippy::too_many_arguments)]
pub fn start_session(
    mut commands: Commands,
    config: Res<MinigameConfig>,
    catalog: Res<ScrapCatalog>,
    mut session: ResMut<MinigameSession>,
    mut hud: ResMut<MinigameHud>,
    mut audio: MessageWriter<AudioRequest>,
    mut q_ship: Query<ShipItem, With<Ship>>,
    mut q_barrier: Query<BarrierItem, Without<Ship>>,
    mut q_nodes: Query<&mut ScrapNode>,
) {
    session.begin(&config);

    let center = match q_ship.single_mut() {
        Ok((transform, mut velocity, mut axes, mut loadout)) => {
            *axes = session_locked_axes(false);
            *velocity = Velocity::zero();
            loadout.stow();
            transform.translation.truncate()
        }
        Err(_) => {
            warn!("No ship present; minigame rings centred on the origin");
            Vec2::ZERO
        }
    };

    hud.overlay_visible = true;
    hud.charges_visible = true;
    hud.interact_prompt_visible = false;

    for (entity, mut barrier, mut visibility) in q_barrier.iter_mut() {
        activate_barrier(&mut commands, entity, &mut barrier, &mut visibility);
    }
    post_cue(&mut audio, config.audio.portal_open.as_deref());
    refresh_charges(&mut hud, &mut audio, &config, session.charges);

    let mut rng = rand::thread_rng();
    let inner = populate_ring(&mut commands, RingTier::Inner, &config, &catalog, center, &mut rng);
    let outer = populate_ring(&mut commands, RingTier::Outer, &config, &catalog, center, &mut rng);
    session.additional_scrap = inner || outer;

    for mut node in q_nodes.iter_mut() {
        node.paused = true;
    }

    info!(
        "Minigame session started at ({:.1}, {:.1}); bonus scrap: {}",
        center.x, center.y, session.additional_scrap
    );
}

/// Tear the session down and put everything back the way it was.
#[allow(clippy::too_many_arguments)]
pub fn end_session(
    mut commands: Commands,
    config: Res<MinigameConfig>,
    mut session: ResMut<MinigameSession>,
    mut hud: ResMut<MinigameHud>,
    mut audio: MessageWriter<AudioRequest>,
    mut explosion: MessageWriter<RingExplosion>,
    mut q_ship: Query<ShipItem, With<Ship>>,
    mut q_barrier: Query<BarrierItem, (Without<Ship>, Without<Hook>)>,
    mut q_hook: Query<HookItem, (Without<Ship>, Without<Barrier>)>,
    q_spawned: Query<Entity, With<SessionSpawned>>,
    mut q_nodes: Query<&mut ScrapNode>,
) {
    let reason = session.ending;

    let ship_pos = match q_ship.single_mut() {
        Ok((transform, _, mut axes, mut loadout)) => {
            *axes = LockedAxes::empty();
            loadout.restore();
            transform.translation.truncate()
        }
        Err(_) => Vec2::ZERO,
    };
    explosion.write(RingExplosion { at: ship_pos });

    session.charge_timer.stop();
    hud.overlay_visible = false;
    hud.charges_visible = false;

    for (entity, mut barrier, mut visibility) in q_barrier.iter_mut() {
        deactivate_barrier(&mut commands, entity, &mut barrier, &mut visibility);
    }
    for (entity, mut hook, _, mut transform, mut velocity, mut visibility) in q_hook.iter_mut() {
        if hook.active {
            deactivate_hook(
                &mut commands,
                entity,
                &mut hook,
                &mut transform,
                &mut velocity,
                &mut visibility,
                ship_pos,
            );
        }
    }
    post_cue(&mut audio, config.audio.portal_close.as_deref());

    let mut swept = 0usize;
    for entity in q_spawned.iter() {
        commands.entity(entity).despawn();
        swept += 1;
    }
    for mut node in q_nodes.iter_mut() {
        node.paused = false;
    }

    session.reset(&config);
    info!("Minigame session ended ({reason:?}); {swept} entities swept");
}

// ── Per-frame ─────────────────────────────────────────────────────────────────

/// Fire input: spend a charge and launch the hook when every precondition
/// holds.  A no-op otherwise.
#[allow(clippy::too_many_arguments)]
pub fn fire_hook_system(
    mut commands: Commands,
    input: Res<MinigameInput>,
    config: Res<MinigameConfig>,
    mut session: ResMut<MinigameSession>,
    mut hud: ResMut<MinigameHud>,
    mut audio: MessageWriter<AudioRequest>,
    mut q_ship: Query<(Entity, &Transform, &Velocity, &mut LockedAxes), With<Ship>>,
    mut q_hook: Query<HookItem, Without<Ship>>,
) {
    if !input.fire || !session.can_fire() {
        return;
    }
    let Ok((ship, ship_tf, ship_vel, mut axes)) = q_ship.single_mut() else {
        return;
    };
    let Some((entity, mut hook, mut rope, mut transform, mut velocity, mut visibility)) =
        q_hook.iter_mut().find(|(_, hook, ..)| hook.owner == ship)
    else {
        warn!("Ship {ship:?} has no hook; fire ignored");
        return;
    };
    let Some(remaining) = session.fire() else {
        return;
    };

    post_cue(&mut audio, config.audio.hookshot_fired.as_deref());
    launch_hook(
        &mut commands,
        entity,
        &mut hook,
        &mut rope,
        &mut transform,
        &mut velocity,
        &mut visibility,
        ship_tf,
        ship_vel.linvel,
        &config,
    );
    *axes = session_locked_axes(true);
    refresh_charges(&mut hud, &mut audio, &config, remaining);
    debug!("Hook fired; {remaining} charges left");
}

/// Per-charge countdown.  Forfeits a charge on expiry and ends the session
/// when none are left.
pub fn charge_timer_system(
    time: Res<Time>,
    config: Res<MinigameConfig>,
    mut session: ResMut<MinigameSession>,
    mut hud: ResMut<MinigameHud>,
    mut audio: MessageWriter<AudioRequest>,
    mut shake: MessageWriter<CameraShake>,
    mut next_phase: ResMut<NextState<MinigamePhase>>,
) {
    if !session.is_active() {
        return;
    }
    let hook_idle = session.hook == HookPhase::Idle;
    let barrier_complete = session.barrier_complete;
    let tick = session.charge_timer.tick(
        time.delta_secs(),
        hook_idle,
        barrier_complete,
        config.timer_indicator_max_radius,
        config.timer_indicator_expand_speed,
    );

    if tick == ChargeTick::Expired {
        shake.write(CameraShake {
            intensity: config.timeout_shake_intensity,
        });
        let remaining = session.forfeit_charge();
        refresh_charges(&mut hud, &mut audio, &config, remaining);
        info!("Charge timer ran out; {remaining} charges left");
        if remaining == 0 {
            request_session_end(&mut session, &mut next_phase, EndReason::ChargesDepleted);
        }
    }
}

/// Accumulate session time and force an end past the safety bound.
pub fn session_timeout_system(
    time: Res<Time>,
    config: Res<MinigameConfig>,
    mut session: ResMut<MinigameSession>,
    mut next_phase: ResMut<NextState<MinigamePhase>>,
) {
    if !session.is_active() {
        return;
    }
    if let Some(reason) = session.tick_elapsed(time.delta_secs(), config.session_timeout_secs()) {
        error!(
            "Minigame ran past {:.1}s; terminating session",
            config.session_timeout_secs()
        );
        request_session_end(&mut session, &mut next_phase, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookRope;

    fn fire_app() -> (App, Entity, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<AudioRequest>();
        app.insert_resource(MinigameConfig::default());
        app.insert_resource(MinigameHud::default());
        app.insert_resource(MinigameInput {
            fire: true,
            interact: false,
        });
        let config = MinigameConfig::default();
        let mut session = MinigameSession::default();
        session.begin(&config);
        app.insert_resource(session);

        let ship = app
            .world_mut()
            .spawn((
                Ship,
                Transform::default(),
                Velocity::zero(),
                session_locked_axes(false),
            ))
            .id();
        let hook = app
            .world_mut()
            .spawn((
                Hook {
                    owner: ship,
                    ..Default::default()
                },
                HookRope::default(),
                Transform::default(),
                Velocity::zero(),
                Visibility::Hidden,
            ))
            .id();
        app.add_systems(Update, fire_hook_system);
        (app, ship, hook)
    }

    fn arm(app: &mut App) {
        let mut session = app.world_mut().resource_mut::<MinigameSession>();
        session.barrier_complete = true;
        session.charge_timer.tick(0.0, true, true, 20.0, 10.0);
    }

    #[test]
    fn fire_is_a_noop_until_the_barrier_completes() {
        let (mut app, _, hook) = fire_app();
        app.update();
        let session = app.world().resource::<MinigameSession>();
        assert_eq!(session.charges, 3);
        assert_eq!(session.hook, HookPhase::Idle);
        assert!(!app.world().get::<Hook>(hook).unwrap().active);
    }

    #[test]
    fn fire_launches_hook_forward_and_locks_rotation() {
        let (mut app, ship, hook) = fire_app();
        arm(&mut app);
        app.update();

        let session = app.world().resource::<MinigameSession>();
        assert_eq!(session.charges, 2);
        assert_eq!(session.hook, HookPhase::Outbound);

        let state = app.world().get::<Hook>(hook).unwrap();
        assert!(state.active);
        assert!((state.launch_origin - Vec2::new(0.0, 1.4)).length() < 1e-5);
        let vel = app.world().get::<Velocity>(hook).unwrap().linvel;
        assert!((vel - Vec2::new(0.0, 9.0)).length() < 1e-5);

        let axes = *app.world().get::<LockedAxes>(ship).unwrap();
        assert!(axes.contains(LockedAxes::ROTATION_LOCKED));

        let hud = app.world().resource::<MinigameHud>();
        assert_eq!(hud.charge_tints[2], crate::feedback::ChargeTint::Dimmed);
    }

    #[test]
    fn held_fire_does_not_spend_a_second_charge_mid_flight() {
        let (mut app, _, _) = fire_app();
        arm(&mut app);
        app.update();
        app.update();
        assert_eq!(app.world().resource::<MinigameSession>().charges, 2);
    }

    #[test]
    fn last_charge_expiring_ends_the_session() {
        use bevy::state::app::StatesPlugin;

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.insert_state(MinigamePhase::Playing);
        app.add_message::<AudioRequest>();
        app.add_message::<CameraShake>();
        app.insert_resource(MinigameConfig::default());
        app.insert_resource(MinigameHud::default());

        let mut session = MinigameSession::default();
        session.begin(&MinigameConfig::default());
        session.barrier_complete = true;
        session.charges = 1;
        session.charge_timer.tick(0.0, true, true, 20.0, 10.0);
        // Countdown already run down: the next tick expires it.
        session.charge_timer.remaining = 0.0;
        app.insert_resource(session);
        app.add_systems(Update, charge_timer_system);

        app.update();
        let session = app.world().resource::<MinigameSession>();
        assert_eq!(session.charges, 0);
        assert_eq!(session.ending, Some(EndReason::ChargesDepleted));
        assert!(session.charge_timer.indicator.is_none());

        app.update(); // state transition applied
        assert_eq!(
            *app.world().resource::<State<MinigamePhase>>().get(),
            MinigamePhase::Roaming
        );
    }
}
