//! The ship's grappling hook.
//!
//! ## Flight
//!
//! ```text
//!  Idle ──fire──► Outbound ──range / obstacle / scrap──► Returning ──ship──► Idle
//!                                                           │
//!                                                range + margin
//!                                                           ▼
//!                                                     Idle (abort)
//! ```
//!
//! The phase itself lives in [`MinigameSession::hook`]; this module owns the
//! hook entity (a kinematic sensor spawned once alongside the ship and toggled
//! with `ColliderDisabled` / `Visibility`) and the systems that move the phase
//! forward.
//!
//! Contacts are resolved in `PostUpdate` from `CollisionEvent::Started`, the
//! same frame the hook moved, so a catch is never a frame late.

use crate::collectible::{Anchor, Collectible, EntityRole};
use crate::config::MinigameConfig;
use crate::constants::HOOK_COLLIDER_RADIUS;
use crate::feedback::{post_cue, AudioRequest, CameraShake};
use crate::minigame::collection::ScrapCollector;
use crate::minigame::{request_session_end, MinigamePhase};
use crate::session::{ContactOutcome, EndReason, HookPhase, MinigameSession};
use crate::ship::{session_locked_axes, Ship};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

const HOOK_Z: f32 = 0.4;

/// The hook tip.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Hook {
    /// Ship that fired (and exclusively owns) this hook.
    pub owner: Entity,
    /// Distance from `launch_origin` at which an outbound hook turns back.
    pub range: f32,
    pub launch_origin: Vec2,
    pub active: bool,
}

impl Default for Hook {
    fn default() -> Self {
        Self {
            owner: Entity::PLACEHOLDER,
            range: crate::constants::HOOK_RANGE,
            launch_origin: Vec2::ZERO,
            active: false,
        }
    }
}

/// Rope drawn from the launch point to the hook tip.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct HookRope {
    pub start: Vec2,
    pub end: Vec2,
}

/// What the flight check decided this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStep {
    Cruise,
    /// Outbound hook reached its range: start reeling in empty.
    TurnBack,
    /// Returning hook overshot the ship: force it home.
    Abort,
}

/// Range checks for a hook `traveled` units from its launch point.
pub fn flight_step(phase: HookPhase, traveled: f32, range: f32, abort_distance: f32) -> FlightStep {
    match phase {
        HookPhase::Outbound if traveled >= range => FlightStep::TurnBack,
        HookPhase::Returning { .. } if traveled >= abort_distance => FlightStep::Abort,
        _ => FlightStep::Cruise,
    }
}

/// Point in front of the ship the hook launches from.
pub fn fire_point(ship: &Transform, offset: f32) -> Vec2 {
    let forward = (ship.rotation * Vec3::Y).truncate();
    ship.translation.truncate() + forward * offset
}

// ── Spawn / activate / deactivate ─────────────────────────────────────────────

/// Spawn the inactive hook owned by `owner`.
pub fn spawn_hook(
    commands: &mut Commands,
    owner: Entity,
    position: Vec2,
    config: &MinigameConfig,
) -> Entity {
    commands
        .spawn((
            Hook {
                owner,
                range: config.hook_range,
                launch_origin: position,
                active: false,
            },
            HookRope::default(),
            EntityRole::Hook,
            RigidBody::KinematicVelocityBased,
            Velocity::zero(),
            Collider::ball(HOOK_COLLIDER_RADIUS),
            Sensor,
            ActiveCollisionTypes::all(),
            ActiveEvents::COLLISION_EVENTS,
            ColliderDisabled,
            Transform::from_translation(position.extend(HOOK_Z)),
            Visibility::Hidden,
        ))
        .id()
}

/// Everything needed to move one hook entity around.
pub type HookItem = (
    Entity,
    &'static mut Hook,
    &'static mut HookRope,
    &'static mut Transform,
    &'static mut Velocity,
    &'static mut Visibility,
);

/// Launch from the ship's fire point with the ship's velocity plus
/// `config.hook_speed` along its facing.
#[allow(clippy::too_many_arguments)]
pub fn launch_hook(
    commands: &mut Commands,
    entity: Entity,
    hook: &mut Hook,
    rope: &mut HookRope,
    transform: &mut Transform,
    velocity: &mut Velocity,
    visibility: &mut Visibility,
    ship_transform: &Transform,
    ship_velocity: Vec2,
    config: &MinigameConfig,
) {
    let origin = fire_point(ship_transform, config.hook_fire_point_offset);
    let forward = (ship_transform.rotation * Vec3::Y).truncate();

    hook.launch_origin = origin;
    hook.range = config.hook_range;
    hook.active = true;
    *rope = HookRope {
        start: origin,
        end: origin,
    };
    transform.translation = origin.extend(HOOK_Z);
    transform.rotation = ship_transform.rotation;
    velocity.linvel = ship_velocity + forward * config.hook_speed;
    velocity.angvel = 0.0;
    *visibility = Visibility::Visible;
    commands.entity(entity).remove::<ColliderDisabled>();
}

/// Park the hook on the ship, hidden and inert.
pub fn deactivate_hook(
    commands: &mut Commands,
    entity: Entity,
    hook: &mut Hook,
    transform: &mut Transform,
    velocity: &mut Velocity,
    visibility: &mut Visibility,
    dock_at: Vec2,
) {
    hook.active = false;
    transform.translation = dock_at.extend(HOOK_Z);
    *velocity = Velocity::zero();
    *visibility = Visibility::Hidden;
    commands.entity(entity).insert(ColliderDisabled);
}

/// Dock the hook in the session, hand any catch to the collector and check
/// whether the session is over.
pub fn conclude_cast(
    commands: &mut Commands,
    session: &mut MinigameSession,
    collector: &mut ScrapCollector,
) -> Option<EndReason> {
    let pending = session.finish_cast();
    if pending.is_some() {
        match collector.collect(commands, session, pending) {
            Ok(definition) => info!("Reeled in '{}'", definition.name),
            Err(err) => warn!("Cast resolved without inventory change: {err}"),
        }
    }
    session.end_condition()
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Keep the rope attached, turn the hook back at range and abort runaway
/// returns.
#[allow(clippy::too_many_arguments)]
pub fn hook_flight_system(
    mut commands: Commands,
    mut session: ResMut<MinigameSession>,
    mut collector: ScrapCollector,
    config: Res<MinigameConfig>,
    mut audio: MessageWriter<AudioRequest>,
    mut next_phase: ResMut<NextState<MinigamePhase>>,
    mut q_hook: Query<HookItem, Without<Ship>>,
    mut q_ship: Query<(&Transform, &mut LockedAxes), With<Ship>>,
) {
    for (entity, mut hook, mut rope, mut transform, mut velocity, mut visibility) in
        q_hook.iter_mut()
    {
        if !hook.active {
            continue;
        }
        let pos = transform.translation.truncate();
        rope.start = hook.launch_origin;
        rope.end = pos;

        let traveled = pos.distance(hook.launch_origin);
        match flight_step(session.hook, traveled, hook.range, config.hook_abort_distance()) {
            FlightStep::Cruise => {}
            FlightStep::TurnBack => {
                if session.begin_return() {
                    velocity.linvel *= config.hook_return_velocity_scale;
                    post_cue(&mut audio, config.audio.hook_return.as_deref());
                    post_cue(&mut audio, config.audio.hook_miss.as_deref());
                }
            }
            FlightStep::Abort => {
                debug!("Hook overshot the ship at {traveled:.1}; aborting cast");
                let end = conclude_cast(&mut commands, &mut session, &mut collector);
                let dock_at = match q_ship.get_mut(hook.owner) {
                    Ok((ship_tf, mut axes)) => {
                        *axes = session_locked_axes(false);
                        ship_tf.translation.truncate()
                    }
                    Err(_) => hook.launch_origin,
                };
                deactivate_hook(
                    &mut commands,
                    entity,
                    &mut hook,
                    &mut transform,
                    &mut velocity,
                    &mut visibility,
                    dock_at,
                );
                if let Some(reason) = end {
                    request_session_end(&mut session, &mut next_phase, reason);
                }
            }
        }
    }
}

/// Resolve hook overlaps: obstacles deflect, scrap gets attached, and the
/// ship catches a returning hook.
#[allow(clippy::too_many_arguments)]
pub fn hook_contact_system(
    mut commands: Commands,
    mut collision_events: MessageReader<CollisionEvent>,
    mut session: ResMut<MinigameSession>,
    mut collector: ScrapCollector,
    config: Res<MinigameConfig>,
    mut audio: MessageWriter<AudioRequest>,
    mut shake: MessageWriter<CameraShake>,
    mut next_phase: ResMut<NextState<MinigamePhase>>,
    mut q_hook: Query<HookItem, Without<Ship>>,
    mut q_ship: Query<(&Transform, &mut LockedAxes), With<Ship>>,
    mut q_items: Query<(&Collectible, &mut Anchor)>,
) {
    for event in collision_events.read() {
        let (e1, e2) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2),
            CollisionEvent::Stopped(..) => continue,
        };

        let (hook_entity, other) = if q_hook.contains(e1) {
            (e1, e2)
        } else if q_hook.contains(e2) {
            (e2, e1)
        } else {
            continue;
        };
        let Ok((entity, mut hook, _, mut transform, mut velocity, mut visibility)) =
            q_hook.get_mut(hook_entity)
        else {
            continue;
        };
        if !hook.active {
            continue;
        }

        // ── Caught by the ship ────────────────────────────────────────────────
        if other == hook.owner {
            if !session.hook.is_returning() {
                continue;
            }
            let collecting = session.hook.is_collecting();
            audio.write(AudioRequest::post("Mini_HookshotReady"));
            audio.write(AudioRequest::post("Mini_HookShotRealing_Stop"));
            let end = conclude_cast(&mut commands, &mut session, &mut collector);
            if collecting {
                post_cue(&mut audio, config.audio.hook_success.as_deref());
            } else {
                post_cue(&mut audio, config.audio.hook_fail.as_deref());
            }

            let dock_at = match q_ship.get_mut(other) {
                Ok((ship_tf, mut axes)) => {
                    *axes = session_locked_axes(false);
                    ship_tf.translation.truncate()
                }
                Err(_) => hook.launch_origin,
            };
            deactivate_hook(
                &mut commands,
                entity,
                &mut hook,
                &mut transform,
                &mut velocity,
                &mut visibility,
                dock_at,
            );
            if let Some(reason) = end {
                request_session_end(&mut session, &mut next_phase, reason);
            }
            continue;
        }

        // ── Ring-seated scrap or obstacle ─────────────────────────────────────
        let Ok((collectible, mut anchor)) = q_items.get_mut(other) else {
            continue;
        };
        if !collectible.is_static() {
            continue;
        }
        match session.register_contact(other, collectible.is_obstacle()) {
            ContactOutcome::Deflected => {
                shake.write(CameraShake {
                    intensity: config.obstacle_shake_intensity,
                });
                post_cue(&mut audio, config.audio.hit_obstacle.as_deref());
                audio.write(AudioRequest::post("Mini_HittingRock"));
                velocity.linvel *= config.hook_return_velocity_scale;
                audio.write(AudioRequest::post("Mini_HookshotRealing"));
            }
            ContactOutcome::Collecting { reverse_hook } => {
                anchor.transfer_ownership(Anchor::Hook(entity));
                debug!("Hooked '{}'", collectible.name);
                if reverse_hook {
                    velocity.linvel *= config.hook_return_velocity_scale;
                    audio.write(AudioRequest::post("Mini_HookshotRealing"));
                }
            }
            ContactOutcome::Ignored => {}
        }
    }
}
