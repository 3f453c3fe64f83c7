//! Scrap and obstacle entities.
//!
//! ## Flow
//!
//! 1. Ring-seated pieces are spawned by the ring formation with
//!    [`MovementPolicy::Static`]: a `KinematicPositionBased` sensor whose
//!    transform is driven entirely by its [`Anchor`].
//! 2. Ambient pieces are spawned by scrap nodes with
//!    [`MovementPolicy::Floating`]: a `KinematicVelocityBased` sensor drifting
//!    and spinning on its own until its time-to-live runs out.
//! 3. A piece changes hands through [`Anchor::transfer_ownership`]: ring slot
//!    → hook while being reeled in, or free → orchestrator when the ship
//!    scoops up ambient scrap.  [`anchor_follow_system`] keeps the world
//!    position glued to whatever currently owns it.
//!
//! ## Roles
//!
//! Every entity the minigame cares about carries one [`EntityRole`], resolved
//! once at spawn time.  The barrier consults [`purge_action`] instead of
//! probing for a zoo of marker components.

use crate::config::MinigameConfig;
use crate::constants::{COLLECTIBLE_COLLIDER_RADIUS, OBSTACLE_NAME};
use crate::hook::Hook;
use crate::minigame::rings::RingFormation;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

/// Z layer for scrap and obstacles (above the barrier, below the ship).
const COLLECTIBLE_Z: f32 = 0.2;

// ── Roles & health ────────────────────────────────────────────────────────────

/// What an entity is, as far as the minigame is concerned.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRole {
    Scrap,
    Obstacle,
    Ship,
    Hook,
    Projectile,
    Powerup,
    Hostile,
}

impl EntityRole {
    /// Role of a collectible with the given identifier.
    pub fn for_collectible(name: &str) -> Self {
        if name == OBSTACLE_NAME {
            EntityRole::Obstacle
        } else {
            EntityRole::Scrap
        }
    }
}

/// Destructible hit points.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub hp: f32,
    pub max_hp: f32,
}

impl Health {
    pub fn new(max_hp: f32) -> Self {
        Self { hp: max_hp, max_hp }
    }

    /// Subtract `amount`; returns `true` once the entity is out of hit points.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.hp = (self.hp - amount).max(0.0);
        self.hp <= 0.0
    }
}

/// Who dealt the killing blow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Player,
}

/// An entity with [`Health`] was destroyed outright.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destroyed {
    pub entity: Entity,
    pub by: DamageSource,
}

/// What the barrier does with something that crossed its edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeAction {
    /// The player's ship: never touched.
    Exempt,
    /// Deal full-health damage, then remove.
    Destroy,
    /// Remove without ceremony.
    Remove,
    /// Leave alone.
    Keep,
}

/// Barrier purge rule for an entity with the given capabilities.
///
/// `static_movement` only matters for collectibles: ring-seated pieces belong
/// inside the barrier, drifting ones do not.
pub fn purge_action(role: Option<EntityRole>, has_health: bool, static_movement: bool) -> PurgeAction {
    if role == Some(EntityRole::Ship) {
        return PurgeAction::Exempt;
    }
    if has_health {
        return PurgeAction::Destroy;
    }
    match role {
        Some(EntityRole::Projectile) | Some(EntityRole::Powerup) => PurgeAction::Remove,
        Some(EntityRole::Scrap) | Some(EntityRole::Obstacle) if !static_movement => {
            PurgeAction::Remove
        }
        _ => PurgeAction::Keep,
    }
}

// ── Collectible ───────────────────────────────────────────────────────────────

/// Free-floating motion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Units per second.
    pub speed: f32,
    /// Degrees per second.
    pub rotation_speed: f32,
}

impl Drift {
    pub fn velocity(&self) -> Velocity {
        Velocity {
            linvel: self.direction * self.speed,
            angvel: self.rotation_speed.to_radians(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementPolicy {
    /// Seated in a ring slot.  Motion is disabled, not merely zero.
    Static,
    Floating(Drift),
}

/// One piece of scrap or one obstacle.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Collectible {
    pub name: String,
    pub high_value: bool,
    pub movement: MovementPolicy,
    /// Seconds left before a floating piece removes itself.
    pub time_to_live: f32,
}

impl Collectible {
    #[inline]
    pub fn is_obstacle(&self) -> bool {
        self.name == OBSTACLE_NAME
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self.movement, MovementPolicy::Static)
    }

    /// Age a floating piece by `dt`.  Returns `true` once it has expired.
    /// Static pieces never expire.
    pub fn tick_lifetime(&mut self, dt: f32) -> bool {
        if self.is_static() {
            return false;
        }
        self.time_to_live -= dt;
        self.time_to_live <= 0.0
    }
}

/// Roll a random drift: one of the eight compass directions, a speed within
/// the configured bounds and a spin in either direction.
pub fn random_drift(rng: &mut impl Rng, config: &MinigameConfig) -> Drift {
    let direction = loop {
        let candidate = Vec2::new(
            rng.gen_range(-1..=1) as f32,
            rng.gen_range(-1..=1) as f32,
        );
        if candidate != Vec2::ZERO {
            break candidate.normalize();
        }
    };
    let speed = if config.scrap_max_speed > config.scrap_min_speed {
        rng.gen_range(config.scrap_min_speed..config.scrap_max_speed)
    } else {
        config.scrap_min_speed
    };
    let spin = config.scrap_max_rotation_speed.abs();
    let rotation_speed = if spin > 0.0 {
        rng.gen_range(-spin..=spin)
    } else {
        0.0
    };
    Drift {
        direction,
        speed,
        rotation_speed,
    }
}

// ── Ownership ─────────────────────────────────────────────────────────────────

/// Logical owner a collectible's world position is anchored to.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Owned by the world; moves on its own.
    #[default]
    Free,
    /// Seated in `slot` of a ring formation.
    RingSlot { ring: Entity, slot: usize },
    /// Being reeled in by a hook.
    Hook(Entity),
    /// Handed to the orchestrator for inventory resolution.
    Orchestrator,
}

impl Anchor {
    /// Hand the collectible to `owner`, returning the previous owner.
    pub fn transfer_ownership(&mut self, owner: Anchor) -> Anchor {
        std::mem::replace(self, owner)
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// A known kind of scrap.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapDefinition {
    pub name: String,
    pub value: u32,
    pub high_value: bool,
}

impl ScrapDefinition {
    pub fn new(name: &str, value: u32, high_value: bool) -> Self {
        Self {
            name: name.to_string(),
            value,
            high_value,
        }
    }
}

/// Every scrap kind a collectible can resolve to, matched by name.
#[derive(Resource, Debug, Clone)]
pub struct ScrapCatalog {
    pub definitions: Vec<ScrapDefinition>,
}

impl Default for ScrapCatalog {
    fn default() -> Self {
        Self {
            definitions: vec![
                ScrapDefinition::new("Copper Coil", 5, false),
                ScrapDefinition::new("Hull Plating", 8, false),
                ScrapDefinition::new("Circuit Board", 12, false),
                ScrapDefinition::new("Fuel Cell", 15, false),
                ScrapDefinition::new("Reactor Core", 40, true),
            ],
        }
    }
}

impl ScrapCatalog {
    pub fn find(&self, name: &str) -> Option<&ScrapDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Any definition, uniformly.  `None` on an empty catalog.
    pub fn pick(&self, rng: &mut impl Rng) -> Option<&ScrapDefinition> {
        if self.definitions.is_empty() {
            return None;
        }
        self.definitions.get(rng.gen_range(0..self.definitions.len()))
    }
}

// ── Spawn helpers ─────────────────────────────────────────────────────────────

fn sensor_bundle() -> impl Bundle {
    (
        Collider::ball(COLLECTIBLE_COLLIDER_RADIUS),
        Sensor,
        // Kinematic sensors must also report kinematic partners (the hook).
        ActiveCollisionTypes::all(),
        ActiveEvents::COLLISION_EVENTS,
    )
}

/// Spawn a ring-seated scrap piece or obstacle.
pub fn spawn_static_collectible(
    commands: &mut Commands,
    name: &str,
    high_value: bool,
    position: Vec2,
    anchor: Anchor,
) -> Entity {
    commands
        .spawn((
            Collectible {
                name: name.to_string(),
                high_value,
                movement: MovementPolicy::Static,
                time_to_live: 0.0,
            },
            EntityRole::for_collectible(name),
            anchor,
            Transform::from_translation(position.extend(COLLECTIBLE_Z)),
            Visibility::default(),
            RigidBody::KinematicPositionBased,
            sensor_bundle(),
        ))
        .id()
}

/// Spawn an ambient floating piece of scrap.
pub fn spawn_floating_collectible(
    commands: &mut Commands,
    definition: &ScrapDefinition,
    position: Vec2,
    drift: Drift,
    time_to_live: f32,
) -> Entity {
    commands
        .spawn((
            Collectible {
                name: definition.name.clone(),
                high_value: definition.high_value,
                movement: MovementPolicy::Floating(drift),
                time_to_live,
            },
            EntityRole::Scrap,
            Anchor::Free,
            Transform::from_translation(position.extend(COLLECTIBLE_Z)),
            Visibility::default(),
            RigidBody::KinematicVelocityBased,
            drift.velocity(),
            sensor_bundle(),
        ))
        .id()
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Count down floating scrap and despawn expired pieces.
pub fn collectible_lifetime_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Collectible)>,
) {
    let dt = time.delta_secs();
    for (entity, mut collectible) in query.iter_mut() {
        if collectible.tick_lifetime(dt) {
            debug!("Floating '{}' expired", collectible.name);
            commands.entity(entity).despawn();
        }
    }
}

/// Snap every anchored collectible onto its owner's current position.
pub fn anchor_follow_system(
    q_rings: Query<(&Transform, &RingFormation), Without<Collectible>>,
    q_hooks: Query<&Transform, (With<Hook>, Without<Collectible>)>,
    mut q_items: Query<(&Anchor, &mut Transform), With<Collectible>>,
) {
    for (anchor, mut transform) in q_items.iter_mut() {
        let target = match *anchor {
            Anchor::RingSlot { ring, slot } => q_rings
                .get(ring)
                .ok()
                .map(|(ring_tf, formation)| ring_tf.translation.truncate() + formation.slot_offset(slot)),
            Anchor::Hook(hook) => q_hooks.get(hook).ok().map(|t| t.translation.truncate()),
            Anchor::Free | Anchor::Orchestrator => None,
        };
        if let Some(pos) = target {
            transform.translation.x = pos.x;
            transform.translation.y = pos.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn floating(ttl: f32) -> Collectible {
        Collectible {
            name: "Fuel Cell".into(),
            high_value: false,
            movement: MovementPolicy::Floating(Drift {
                direction: Vec2::X,
                speed: 0.1,
                rotation_speed: 1.0,
            }),
            time_to_live: ttl,
        }
    }

    #[test]
    fn floating_scrap_expires_at_its_time_to_live_never_earlier() {
        // 1/64 s is exact in binary, so the countdown carries no drift.
        const DT: f32 = 1.0 / 64.0;
        let mut scrap = floating(120.0);
        let mut ticks = 0u32;
        while !scrap.tick_lifetime(DT) {
            ticks += 1;
            assert!(ticks < 10_000);
        }
        let elapsed = (ticks + 1) as f32 * DT;
        assert!(elapsed >= 120.0, "expired early at {elapsed}");
        assert!(elapsed <= 120.0 + DT);
    }

    #[test]
    fn static_pieces_never_expire() {
        let mut rock = Collectible {
            name: OBSTACLE_NAME.into(),
            high_value: false,
            movement: MovementPolicy::Static,
            time_to_live: 0.0,
        };
        assert!(!rock.tick_lifetime(1000.0));
        assert!(rock.is_obstacle());
    }

    #[test]
    fn roles_follow_identifier() {
        assert_eq!(EntityRole::for_collectible("Obstacle"), EntityRole::Obstacle);
        assert_eq!(EntityRole::for_collectible("Fuel Cell"), EntityRole::Scrap);
    }

    #[test]
    fn purge_rules() {
        use EntityRole::*;
        assert_eq!(purge_action(Some(Ship), true, false), PurgeAction::Exempt);
        assert_eq!(purge_action(Some(Hostile), true, false), PurgeAction::Destroy);
        assert_eq!(purge_action(None, true, false), PurgeAction::Destroy);
        assert_eq!(purge_action(Some(Projectile), false, false), PurgeAction::Remove);
        assert_eq!(purge_action(Some(Powerup), false, false), PurgeAction::Remove);
        assert_eq!(purge_action(Some(Scrap), false, false), PurgeAction::Remove);
        assert_eq!(purge_action(Some(Scrap), false, true), PurgeAction::Keep);
        assert_eq!(purge_action(Some(Obstacle), false, true), PurgeAction::Keep);
        assert_eq!(purge_action(Some(Hook), false, false), PurgeAction::Keep);
        assert_eq!(purge_action(None, false, false), PurgeAction::Keep);
    }

    #[test]
    fn ownership_transfer_returns_previous_owner() {
        let mut world = World::new();
        let ring = world.spawn_empty().id();
        let hook = world.spawn_empty().id();

        let mut anchor = Anchor::RingSlot { ring, slot: 3 };
        assert_eq!(
            anchor.transfer_ownership(Anchor::Hook(hook)),
            Anchor::RingSlot { ring, slot: 3 }
        );
        assert_eq!(anchor, Anchor::Hook(hook));
    }

    #[test]
    fn random_drift_stays_within_bounds() {
        let config = MinigameConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let drift = random_drift(&mut rng, &config);
            assert!((drift.direction.length() - 1.0).abs() < 1e-5);
            assert!(drift.speed >= config.scrap_min_speed && drift.speed < config.scrap_max_speed);
            assert!(drift.rotation_speed.abs() <= config.scrap_max_rotation_speed);
        }
    }

    #[test]
    fn catalog_lookup_by_name() {
        let catalog = ScrapCatalog::default();
        assert!(catalog.find("Reactor Core").is_some_and(|d| d.high_value));
        assert!(catalog.find(OBSTACLE_NAME).is_none());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(catalog.pick(&mut rng).is_some());
        let empty = ScrapCatalog {
            definitions: Vec::new(),
        };
        assert!(empty.pick(&mut rng).is_none());
    }

    #[test]
    fn expired_floating_scrap_is_despawned() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, collectible_lifetime_system);

        let spent = app.world_mut().spawn(floating(-1.0)).id();
        let fresh = app.world_mut().spawn(floating(120.0)).id();

        app.update();

        assert!(app.world().get_entity(spent).is_err());
        assert!(app.world().get_entity(fresh).is_ok());
    }

    #[test]
    fn hooked_collectible_follows_hook() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, anchor_follow_system);

        let hook = app
            .world_mut()
            .spawn((
                Hook::default(),
                Transform::from_translation(Vec3::new(4.0, -2.0, 0.0)),
            ))
            .id();
        let scrap = app
            .world_mut()
            .spawn((floating(10.0), Anchor::Hook(hook), Transform::default()))
            .id();

        app.update();

        let pos = app.world().get::<Transform>(scrap).unwrap().translation;
        assert_eq!(pos.truncate(), Vec2::new(4.0, -2.0));
    }
}
