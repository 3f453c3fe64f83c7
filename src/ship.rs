//! The player's ship: spawn, input intent and the freeze helpers used by the
//! minigame.
//!
//! Input follows an intent-based pipeline so that the minigame can override
//! movement without knowing where input came from:
//!
//! 1. [`ship_intent_clear_system`] resets [`ShipIntent`] and `ExternalForce`.
//! 2. [`keyboard_to_ship_intent_system`] fills intent from W/S/A/D.
//! 3. [`apply_ship_intent_system`] turns intent into force and spin.
//!
//! While a session plays the ship carries `LockedAxes::TRANSLATION_LOCKED`, so
//! thrust is swallowed by the solver but the player can still turn to aim.
//! Firing the hook adds `ROTATION_LOCKED` until the hook docks.

use crate::collectible::EntityRole;
use crate::config::MinigameConfig;
use crate::constants::*;
use crate::hook::spawn_hook;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Marker for the player's ship.
#[derive(Component, Debug, Clone, Copy)]
pub struct Ship;

/// Cosmetic and weapon state the minigame stows while it plays.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipLoadout {
    pub thrusters_visible: bool,
    pub turrets_enabled: bool,
}

impl Default for ShipLoadout {
    fn default() -> Self {
        Self {
            thrusters_visible: true,
            turrets_enabled: true,
        }
    }
}

impl ShipLoadout {
    /// Hide booster effects and disable turrets.
    pub fn stow(&mut self) {
        self.thrusters_visible = false;
        self.turrets_enabled = false;
    }

    pub fn restore(&mut self) {
        *self = Self::default();
    }
}

/// Axes locked while a session plays.  The hook being out also locks rotation.
pub fn session_locked_axes(hook_out: bool) -> LockedAxes {
    if hook_out {
        LockedAxes::TRANSLATION_LOCKED | LockedAxes::ROTATION_LOCKED
    } else {
        LockedAxes::TRANSLATION_LOCKED
    }
}

/// Frame-local movement intent for the ship.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipIntent {
    /// Forward thrust multiplier in `[-1, 1]`.
    pub thrust: f32,
    /// Angular velocity override in rad/s.
    pub angvel: Option<f32>,
}

// ── Spawn ─────────────────────────────────────────────────────────────────────

/// Spawn the ship at `position` along with its (inactive) hook.
pub fn spawn_ship(commands: &mut Commands, position: Vec2, config: &MinigameConfig) -> Entity {
    let ship = commands
        .spawn((
            Ship,
            ShipLoadout::default(),
            EntityRole::Ship,
            RigidBody::Dynamic,
            Collider::ball(SHIP_COLLIDER_RADIUS),
            Velocity::zero(),
            ExternalForce::default(),
            Damping {
                linear_damping: SHIP_LINEAR_DAMPING,
                angular_damping: SHIP_ANGULAR_DAMPING,
            },
            LockedAxes::empty(),
            ActiveEvents::COLLISION_EVENTS,
            Transform::from_translation(position.extend(0.5)),
            Visibility::default(),
        ))
        .id();
    spawn_hook(commands, ship, position, config);
    ship
}

/// Startup system: ship at the origin.
pub fn setup_ship(mut commands: Commands, config: Res<MinigameConfig>) {
    spawn_ship(&mut commands, Vec2::ZERO, &config);
    println!("[SETUP] Ship spawned at origin");
}

// ── Input ─────────────────────────────────────────────────────────────────────

pub fn ship_intent_clear_system(
    mut intent: ResMut<ShipIntent>,
    mut q: Query<&mut ExternalForce, With<Ship>>,
) {
    *intent = ShipIntent::default();
    for mut force in q.iter_mut() {
        force.force = Vec2::ZERO;
        force.torque = 0.0;
    }
}

/// W/S thrust, A/D rotate (A counter-clockwise).
pub fn keyboard_to_ship_intent_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut intent: ResMut<ShipIntent>,
) {
    if keys.pressed(KeyCode::KeyW) {
        intent.thrust += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        intent.thrust -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        intent.angvel = Some(SHIP_ROTATION_SPEED);
    } else if keys.pressed(KeyCode::KeyD) {
        intent.angvel = Some(-SHIP_ROTATION_SPEED);
    }
}

/// Thrust acts along the ship's local +Y axis.
pub fn apply_ship_intent_system(
    intent: Res<ShipIntent>,
    mut q: Query<(&Transform, &mut ExternalForce, &mut Velocity), With<Ship>>,
) {
    let Ok((transform, mut force, mut velocity)) = q.single_mut() else {
        return;
    };
    let forward = (transform.rotation * Vec3::Y).truncate();
    if intent.thrust != 0.0 {
        force.force += forward * SHIP_THRUST * intent.thrust;
    }
    if let Some(av) = intent.angvel {
        velocity.angvel = av;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<ShipIntent>();
        app.add_systems(Update, apply_ship_intent_system);
        app
    }

    #[test]
    fn thrust_is_along_local_y() {
        let mut app = build_test_app();
        let ship = app
            .world_mut()
            .spawn((
                Ship,
                Transform::from_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
                ExternalForce::default(),
                Velocity::zero(),
            ))
            .id();
        app.world_mut().resource_mut::<ShipIntent>().thrust = 1.0;
        app.update();

        let force = app.world().get::<ExternalForce>(ship).unwrap().force;
        // Rotated a quarter turn CCW, local +Y points along world -X.
        assert!((force - Vec2::new(-SHIP_THRUST, 0.0)).length() < 1e-4);
    }

    #[test]
    fn angvel_override_sets_velocity() {
        let mut app = build_test_app();
        let ship = app
            .world_mut()
            .spawn((Ship, Transform::default(), ExternalForce::default(), Velocity::zero()))
            .id();
        app.world_mut().resource_mut::<ShipIntent>().angvel = Some(SHIP_ROTATION_SPEED);
        app.update();
        let angvel = app.world().get::<Velocity>(ship).unwrap().angvel;
        assert!((angvel - SHIP_ROTATION_SPEED).abs() < 1e-5);
    }

    #[test]
    fn loadout_stow_and_restore() {
        let mut loadout = ShipLoadout::default();
        loadout.stow();
        assert!(!loadout.thrusters_visible && !loadout.turrets_enabled);
        loadout.restore();
        assert_eq!(loadout, ShipLoadout::default());
    }

    #[test]
    fn session_axes_lock_rotation_only_while_hook_is_out() {
        assert_eq!(session_locked_axes(false), LockedAxes::TRANSLATION_LOCKED);
        assert!(session_locked_axes(true).contains(LockedAxes::ROTATION_LOCKED));
    }
}
