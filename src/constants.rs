//! Centralised minigame tuning constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place.  [`crate::config::MinigameConfig::default`] copies
//! every value below, and `assets/minigame.toml` can override any subset at
//! startup.
//!
//! Distances are world units (the ship collider is a little under one unit
//! across); speeds are units per second; ring rotation is degrees per second.

// ── Charges & Timer ───────────────────────────────────────────────────────────

/// Hook charges granted at the start of every session.
pub const MAX_CHARGES: u32 = 3;

/// Seconds the player has to fire before a charge is forfeited.
pub const CHARGE_TIMER_SECS: f32 = 6.0;

/// Radius of the visual timer indicator when the countdown is full.
///
/// The indicator shrinks linearly to 0 as the countdown runs out.
pub const TIMER_INDICATOR_MAX_RADIUS: f32 = 20.0;

/// Growth rate of the timer indicator after a shot (radius units / s).
///
/// At 10/s a fully-collapsed indicator takes 2 s to grow back, which is the
/// minimum gap between consecutive shots.
pub const TIMER_INDICATOR_EXPAND_SPEED: f32 = 10.0;

/// A session is force-terminated once its cumulative time exceeds
/// `CHARGE_TIMER_SECS × SESSION_TIMEOUT_FACTOR`.
pub const SESSION_TIMEOUT_FACTOR: f32 = 3.5;

// ── Rings ─────────────────────────────────────────────────────────────────────

/// Lower bound of the randomised ring rotation speed (°/s).
pub const RING_MIN_ROTATION_SPEED: f32 = 5.0;

/// Upper bound of the randomised inner ring rotation speed (°/s).
pub const INNER_RING_MAX_ROTATION_SPEED: f32 = 60.0;

/// Upper bound of the randomised outer ring rotation speed (°/s).
pub const OUTER_RING_MAX_ROTATION_SPEED: f32 = 60.0;

/// Ring rotation direction: `1.0` counter-clockwise, `-1.0` clockwise.
pub const RING_ROTATION_DIRECTION: f32 = 1.0;

/// Chance out of 10 that a non-guaranteed inner slot holds real scrap.
pub const INNER_RING_SCRAP_CHANCE: u32 = 3;

/// Chance out of 10 that a non-guaranteed outer slot holds real scrap.
pub const OUTER_RING_SCRAP_CHANCE: u32 = 5;

/// Default inner ring radius.  Must sit inside `HOOK_RANGE` to be reachable.
pub const INNER_RING_RADIUS: f32 = 4.5;

/// Default outer ring radius.
pub const OUTER_RING_RADIUS: f32 = 8.0;

/// Default slot count for both ring tiers.
pub const RING_SLOT_COUNT: usize = 8;

// ── Hook ──────────────────────────────────────────────────────────────────────

/// Launch speed of the hook along the ship's forward axis.
pub const HOOK_SPEED: f32 = 9.0;

/// Distance from the launch point at which an outbound hook turns around.
pub const HOOK_RANGE: f32 = 10.0;

/// Extra distance past `HOOK_RANGE` a returning hook may travel before it is
/// force-deactivated.
pub const HOOK_ABORT_MARGIN: f32 = 10.0;

/// Velocity multiplier applied whenever the hook reverses direction.
pub const HOOK_RETURN_VELOCITY_SCALE: f32 = -1.5;

/// Distance in front of the ship's centre where the hook spawns.
///
/// Kept larger than ship + hook radii so a fresh launch does not start inside
/// the ship's collider.
pub const HOOK_FIRE_POINT_OFFSET: f32 = 1.4;

/// Radius of the hook tip sensor.
pub const HOOK_COLLIDER_RADIUS: f32 = 0.3;

// ── Barrier ───────────────────────────────────────────────────────────────────

/// Maximum barrier radius; hitting it marks the barrier complete.
pub const BARRIER_RANGE: f32 = 12.0;

/// Barrier growth rate (units / s).
pub const BARRIER_SPEED: f32 = 10.0;

/// Barrier radius at session start and after every reset.
pub const BARRIER_START_RADIUS: f32 = 1.0;

// ── Collectibles ──────────────────────────────────────────────────────────────

/// Identifier shared by every obstacle; anything else is real scrap.
pub const OBSTACLE_NAME: &str = "Obstacle";

/// Lifetime of ambient floating scrap (seconds).
pub const SCRAP_TIME_TO_LIVE: f32 = 120.0;

/// Floating scrap drift speed bounds (units / s).
pub const SCRAP_MIN_SPEED: f32 = 0.05;
pub const SCRAP_MAX_SPEED: f32 = 0.5;

/// Maximum spin of floating scrap (°/s, either direction).
pub const SCRAP_MAX_ROTATION_SPEED: f32 = 2.5;

/// Radius of a collectible's trigger sensor.
pub const COLLECTIBLE_COLLIDER_RADIUS: f32 = 0.45;

// ── Scrap Nodes ───────────────────────────────────────────────────────────────

/// Delay between pressing interact and the session actually starting.
pub const NODE_TRANSITION_DELAY_SECS: f32 = 1.5;

/// Seconds until a fresh node spawns its first floating scrap.
pub const NODE_FIRST_SPAWN_SECS: f32 = 5.0;

/// Bounds of the randomised interval between ambient spawns (seconds).
pub const NODE_SPAWN_INTERVAL_MIN: f32 = 50.0;
pub const NODE_SPAWN_INTERVAL_MAX: f32 = 70.0;

/// Half-extent of the square around a node where ambient scrap appears.
pub const NODE_SPAWN_RADIUS: f32 = 5.0;

/// Radius of the node's proximity sensor.
pub const NODE_INTERACT_RADIUS: f32 = 3.0;

// ── Ship ──────────────────────────────────────────────────────────────────────

pub const SHIP_COLLIDER_RADIUS: f32 = 0.8;
pub const SHIP_THRUST: f32 = 6.0;
pub const SHIP_ROTATION_SPEED: f32 = 2.5;
pub const SHIP_LINEAR_DAMPING: f32 = 0.8;
pub const SHIP_ANGULAR_DAMPING: f32 = 4.0;

// ── Feedback ──────────────────────────────────────────────────────────────────

/// Camera shake when the hook glances off an obstacle.
pub const OBSTACLE_SHAKE_INTENSITY: f32 = 0.5;

/// Camera shake when a charge is forfeited to the timer.
pub const TIMEOUT_SHAKE_INTENSITY: f32 = 1.0;

/// Seconds the end-of-session ring explosion stays on screen.
pub const RING_EXPLOSION_LIFETIME: f32 = 8.0;

/// Audio state group that tracks the remaining shot count.
pub const MUSIC_STATE_GROUP: &str = "Shots_Remaining";
