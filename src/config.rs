//! Runtime minigame configuration loaded from `assets/minigame.toml`.
//!
//! [`MinigameConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_minigame_config`] reads
//! `assets/minigame.toml` and overwrites the defaults with any values present
//! in the file.  Missing keys fall back to the compile-time defaults, so a
//! minimal TOML can override just the values you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<MinigameConfig>` to any system parameter list and read
//! values with `config.charge_timer_secs`, `config.hook_range`, etc.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `MinigameConfig::default()`.

use crate::constants::*;
use crate::error::validate_config;
use bevy::prelude::*;
use serde::Deserialize;

/// Geometry of one ring formation: slot count, radius and angular phase.
///
/// Slots are spaced evenly; slot 0 sits at `phase_deg` before any rotation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RingLayout {
    pub radius: f32,
    pub slot_count: usize,
    #[serde(default)]
    pub phase_deg: f32,
}

impl RingLayout {
    pub fn new(radius: f32, slot_count: usize, phase_deg: f32) -> Self {
        Self {
            radius,
            slot_count,
            phase_deg,
        }
    }

    /// Angle of `slot` in degrees relative to the ring's own rotation.
    pub fn slot_angle_deg(&self, slot: usize) -> f32 {
        if self.slot_count == 0 {
            return self.phase_deg;
        }
        self.phase_deg + slot as f32 * 360.0 / self.slot_count as f32
    }

    /// Offset of `slot` from the ring centre once the ring has rotated by
    /// `ring_angle_deg`.
    pub fn slot_offset(&self, slot: usize, ring_angle_deg: f32) -> Vec2 {
        let angle = (ring_angle_deg + self.slot_angle_deg(slot)).to_radians();
        Vec2::from_angle(angle) * self.radius
    }
}

/// Named audio events posted by the minigame.
///
/// Every cue is optional: a `None` cue is skipped silently.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioCues {
    pub play_music: Option<String>,
    pub stop_music: Option<String>,
    pub hookshot_fired: Option<String>,
    pub portal_open: Option<String>,
    pub portal_close: Option<String>,
    pub hook_return: Option<String>,
    pub hook_miss: Option<String>,
    pub hook_success: Option<String>,
    pub hook_fail: Option<String>,
    pub hit_obstacle: Option<String>,
    pub collect_floating_scrap: Option<String>,
    pub ambience_stop: Option<String>,
}

impl Default for AudioCues {
    fn default() -> Self {
        Self {
            play_music: Some("Play_Minigame_Music".into()),
            stop_music: Some("Stop_Minigame_Music".into()),
            hookshot_fired: Some("Mini_HookshotFire".into()),
            portal_open: Some("Mini_PortalOpen".into()),
            portal_close: Some("Mini_PortalClose".into()),
            hook_return: None,
            hook_miss: Some("Mini_HookshotMiss".into()),
            hook_success: Some("Mini_HookshotSuccess".into()),
            hook_fail: Some("Mini_HookshotFail".into()),
            hit_obstacle: None,
            collect_floating_scrap: None,
            ambience_stop: Some("Ambience_Stop".into()),
        }
    }
}

/// Runtime-tunable minigame configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset by setting the value in
/// `assets/minigame.toml`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinigameConfig {
    // ── Charges & Timer ───────────────────────────────────────────────────────
    pub max_charges: u32,
    pub charge_timer_secs: f32,
    pub timer_indicator_max_radius: f32,
    pub timer_indicator_expand_speed: f32,
    pub session_timeout_factor: f32,

    // ── Rings ─────────────────────────────────────────────────────────────────
    pub ring_min_rotation_speed: f32,
    pub inner_ring_max_rotation_speed: f32,
    pub outer_ring_max_rotation_speed: f32,
    pub ring_rotation_direction: f32,
    pub inner_ring_scrap_chance: u32,
    pub outer_ring_scrap_chance: u32,
    pub inner_ring_layouts: Vec<RingLayout>,
    pub outer_ring_layouts: Vec<RingLayout>,

    // ── Hook ──────────────────────────────────────────────────────────────────
    pub hook_speed: f32,
    pub hook_range: f32,
    pub hook_abort_margin: f32,
    pub hook_return_velocity_scale: f32,
    pub hook_fire_point_offset: f32,

    // ── Barrier ───────────────────────────────────────────────────────────────
    pub barrier_range: f32,
    pub barrier_speed: f32,
    pub barrier_start_radius: f32,

    // ── Collectibles ──────────────────────────────────────────────────────────
    pub scrap_time_to_live: f32,
    pub scrap_min_speed: f32,
    pub scrap_max_speed: f32,
    pub scrap_max_rotation_speed: f32,

    // ── Scrap Nodes ───────────────────────────────────────────────────────────
    pub node_transition_delay_secs: f32,
    pub node_first_spawn_secs: f32,
    pub node_spawn_interval_min: f32,
    pub node_spawn_interval_max: f32,
    pub node_spawn_radius: f32,

    // ── Feedback ──────────────────────────────────────────────────────────────
    pub obstacle_shake_intensity: f32,
    pub timeout_shake_intensity: f32,
    pub audio: AudioCues,
}

impl Default for MinigameConfig {
    fn default() -> Self {
        Self {
            // Charges & Timer
            max_charges: MAX_CHARGES,
            charge_timer_secs: CHARGE_TIMER_SECS,
            timer_indicator_max_radius: TIMER_INDICATOR_MAX_RADIUS,
            timer_indicator_expand_speed: TIMER_INDICATOR_EXPAND_SPEED,
            session_timeout_factor: SESSION_TIMEOUT_FACTOR,
            // Rings
            ring_min_rotation_speed: RING_MIN_ROTATION_SPEED,
            inner_ring_max_rotation_speed: INNER_RING_MAX_ROTATION_SPEED,
            outer_ring_max_rotation_speed: OUTER_RING_MAX_ROTATION_SPEED,
            ring_rotation_direction: RING_ROTATION_DIRECTION,
            inner_ring_scrap_chance: INNER_RING_SCRAP_CHANCE,
            outer_ring_scrap_chance: OUTER_RING_SCRAP_CHANCE,
            inner_ring_layouts: vec![
                RingLayout::new(INNER_RING_RADIUS, RING_SLOT_COUNT, 0.0),
                RingLayout::new(INNER_RING_RADIUS, RING_SLOT_COUNT, 22.5),
            ],
            outer_ring_layouts: vec![
                RingLayout::new(OUTER_RING_RADIUS, RING_SLOT_COUNT, 0.0),
                RingLayout::new(OUTER_RING_RADIUS, RING_SLOT_COUNT, 22.5),
            ],
            // Hook
            hook_speed: HOOK_SPEED,
            hook_range: HOOK_RANGE,
            hook_abort_margin: HOOK_ABORT_MARGIN,
            hook_return_velocity_scale: HOOK_RETURN_VELOCITY_SCALE,
            hook_fire_point_offset: HOOK_FIRE_POINT_OFFSET,
            // Barrier
            barrier_range: BARRIER_RANGE,
            barrier_speed: BARRIER_SPEED,
            barrier_start_radius: BARRIER_START_RADIUS,
            // Collectibles
            scrap_time_to_live: SCRAP_TIME_TO_LIVE,
            scrap_min_speed: SCRAP_MIN_SPEED,
            scrap_max_speed: SCRAP_MAX_SPEED,
            scrap_max_rotation_speed: SCRAP_MAX_ROTATION_SPEED,
            // Scrap Nodes
            node_transition_delay_secs: NODE_TRANSITION_DELAY_SECS,
            node_first_spawn_secs: NODE_FIRST_SPAWN_SECS,
            node_spawn_interval_min: NODE_SPAWN_INTERVAL_MIN,
            node_spawn_interval_max: NODE_SPAWN_INTERVAL_MAX,
            node_spawn_radius: NODE_SPAWN_RADIUS,
            // Feedback
            obstacle_shake_intensity: OBSTACLE_SHAKE_INTENSITY,
            timeout_shake_intensity: TIMEOUT_SHAKE_INTENSITY,
            audio: AudioCues::default(),
        }
    }
}

impl MinigameConfig {
    /// Cumulative session time after which a session is force-terminated.
    #[inline]
    pub fn session_timeout_secs(&self) -> f32 {
        self.charge_timer_secs * self.session_timeout_factor
    }

    /// Distance past the launch point at which a returning hook is aborted.
    #[inline]
    pub fn hook_abort_distance(&self) -> f32 {
        self.hook_range + self.hook_abort_margin
    }
}

/// Parse a TOML document into a validated [`MinigameConfig`].
pub fn parse_minigame_config(contents: &str) -> Result<MinigameConfig, String> {
    let config = toml::from_str::<MinigameConfig>(contents).map_err(|e| e.to_string())?;
    validate_config(&config).map_err(|e| e.to_string())?;
    Ok(config)
}

/// Startup system: attempt to load `assets/minigame.toml` and overwrite the
/// `MinigameConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse and validation errors
/// are logged but do not abort the game.  A missing file is not an error.
pub fn load_minigame_config(mut config: ResMut<MinigameConfig>) {
    let path = "assets/minigame.toml";
    match std::fs::read_to_string(path) {
        Ok(contents) => match parse_minigame_config(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded minigame config from {path}");
            }
            Err(e) => {
                warn!("Failed to load {path}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {path} found; using compiled defaults");
        }
    }
}
