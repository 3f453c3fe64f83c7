//! The protective barrier that opens around the ship during a session.
//!
//! The barrier is a kinematic sensor spawned once at startup and parked with
//! `ColliderDisabled` between sessions.  While a session plays it is centred
//! on the ship and grows linearly until it reaches its range, at which point
//! [`MinigameSession::barrier_complete`] is raised (once) and the hook may be
//! fired.
//!
//! Anything that wanders into it is dealt with per [`purge_action`]: the
//! player's ship is exempt, anything with [`Health`] is destroyed outright on
//! the player's behalf, hostile projectiles, powerups and drifting scrap are
//! removed.

use crate::collectible::{purge_action, Collectible, DamageSource, Destroyed, EntityRole, Health, PurgeAction};
use crate::config::MinigameConfig;
use crate::session::MinigameSession;
use crate::ship::Ship;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::HashSet;

const BARRIER_Z: f32 = 0.1;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Barrier {
    pub radius: f32,
    pub range: f32,
    pub speed: f32,
    pub start_radius: f32,
    pub complete: bool,
    /// Centred on the ship for the current session.
    pub initialized: bool,
}

impl Barrier {
    pub fn new(config: &MinigameConfig) -> Self {
        Self {
            radius: config.barrier_start_radius,
            range: config.barrier_range,
            speed: config.barrier_speed,
            start_radius: config.barrier_start_radius,
            complete: false,
            initialized: false,
        }
    }

    /// Grow by `dt` seconds.  Returns `true` on the one frame the barrier
    /// becomes complete.
    ///
    /// Completion is detected the frame after the radius first reaches the
    /// range, matching how the radius and flag are observed by other systems.
    pub fn grow(&mut self, dt: f32) -> bool {
        if self.radius < self.range {
            self.radius += dt * self.speed;
            false
        } else if !self.complete {
            self.complete = true;
            true
        } else {
            false
        }
    }

    /// Back to the start radius, uncentred and incomplete.
    pub fn reset(&mut self) {
        self.radius = self.start_radius;
        self.complete = false;
        self.initialized = false;
    }
}

// ── Spawn / toggle ────────────────────────────────────────────────────────────

/// Startup system: spawn the parked barrier.
pub fn setup_barrier(mut commands: Commands, config: Res<MinigameConfig>) {
    let barrier = Barrier::new(&config);
    commands.spawn((
        barrier,
        RigidBody::KinematicPositionBased,
        Collider::ball(barrier.radius),
        Sensor,
        ActiveCollisionTypes::all(),
        ActiveEvents::COLLISION_EVENTS,
        ColliderDisabled,
        Transform::from_translation(Vec3::new(0.0, 0.0, BARRIER_Z)),
        Visibility::Hidden,
    ));
}

/// Reset and switch the barrier on for a new session.
pub fn activate_barrier(
    commands: &mut Commands,
    entity: Entity,
    barrier: &mut Barrier,
    visibility: &mut Visibility,
) {
    barrier.reset();
    *visibility = Visibility::Visible;
    commands
        .entity(entity)
        .insert(Collider::ball(barrier.radius))
        .remove::<ColliderDisabled>();
}

/// Reset and park the barrier at session end.
pub fn deactivate_barrier(
    commands: &mut Commands,
    entity: Entity,
    barrier: &mut Barrier,
    visibility: &mut Visibility,
) {
    barrier.reset();
    *visibility = Visibility::Hidden;
    commands
        .entity(entity)
        .insert((Collider::ball(barrier.radius), ColliderDisabled));
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Centre the barrier on the ship and grow it towards its range.
pub fn barrier_expand_system(
    mut commands: Commands,
    time: Res<Time>,
    mut session: ResMut<MinigameSession>,
    q_ship: Query<&Transform, With<Ship>>,
    mut q_barrier: Query<(Entity, &mut Barrier, &mut Transform), Without<Ship>>,
) {
    if !session.playing {
        return;
    }
    let dt = time.delta_secs();
    for (entity, mut barrier, mut transform) in q_barrier.iter_mut() {
        if !barrier.initialized {
            if let Ok(ship_tf) = q_ship.single() {
                transform.translation.x = ship_tf.translation.x;
                transform.translation.y = ship_tf.translation.y;
            }
            barrier.initialized = true;
        }

        let before = barrier.radius;
        if barrier.grow(dt) {
            session.barrier_complete = true;
            info!("Barrier complete at radius {:.1}", barrier.radius);
        }
        if barrier.radius != before {
            commands.entity(entity).insert(Collider::ball(barrier.radius));
        }
    }
}

/// Purge whatever crosses the barrier's edge.
pub fn barrier_purge_system(
    mut commands: Commands,
    mut collision_events: MessageReader<CollisionEvent>,
    mut destroyed: MessageWriter<Destroyed>,
    q_barrier: Query<Entity, With<Barrier>>,
    mut q_targets: Query<
        (
            Option<&EntityRole>,
            Option<&mut Health>,
            Option<&Collectible>,
            Has<Ship>,
        ),
        Without<Barrier>,
    >,
) {
    let mut processed: HashSet<Entity> = HashSet::new();

    for event in collision_events.read() {
        let (e1, e2) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2),
            CollisionEvent::Stopped(..) => continue,
        };
        let intruder = if q_barrier.contains(e1) {
            e2
        } else if q_barrier.contains(e2) {
            e1
        } else {
            continue;
        };
        if processed.contains(&intruder) {
            continue;
        }
        let Ok((role, health, collectible, is_ship)) = q_targets.get_mut(intruder) else {
            continue;
        };
        let role = if is_ship { Some(EntityRole::Ship) } else { role.copied() };
        let static_movement = collectible.is_some_and(|c| c.is_static());

        match purge_action(role, health.is_some(), static_movement) {
            PurgeAction::Destroy => {
                if let Some(mut health) = health {
                    let max_hp = health.max_hp;
                    health.take_damage(max_hp);
                }
                destroyed.write(Destroyed {
                    entity: intruder,
                    by: DamageSource::Player,
                });
                debug!("Barrier destroyed {intruder:?}");
                commands.entity(intruder).despawn();
                processed.insert(intruder);
            }
            PurgeAction::Remove => {
                commands.entity(intruder).despawn();
                processed.insert(intruder);
            }
            PurgeAction::Exempt | PurgeAction::Keep => {}
        }
    }
}
