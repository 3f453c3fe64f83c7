//! Minigame-specific error types.
//!
//! Nothing in the minigame is fatal: systems log these errors and degrade to a
//! clean state instead of panicking.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salvage_hook::error::MinigameError;
//!
//! if let Err(err) = collector.collect(&mut commands, &mut session, pending) {
//!     warn!("Scrap not collected: {err}");
//! }
//! ```

use crate::config::MinigameConfig;
use crate::constants::MAX_CHARGES;
use bevy::prelude::Entity;
use std::fmt;

/// Top-level error enum for the scrap minigame.
#[derive(Debug, Clone, PartialEq)]
pub enum MinigameError {
    /// A collection was resolved but no entity was attached to the hook.
    NothingToCollect,

    /// The collected entity no longer exists or is not a collectible.
    /// Usually a despawn race with the session-end sweep or the barrier.
    CollectibleNotFound {
        entity: Entity,
    },

    /// The collected entity's name matches no definition in the catalog.
    UnknownScrap {
        name: String,
    },

    /// A definition matched but no inventory is present in the world.
    InventoryUnavailable {
        name: String,
    },

    /// A configuration value is outside its supported range.
    InvalidConfig {
        /// Name of the field (for logging).
        field: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },
}

impl fmt::Display for MinigameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinigameError::NothingToCollect => {
                write!(f, "collection resolved with no entity attached to the hook")
            }
            MinigameError::CollectibleNotFound { entity } => {
                write!(f, "collectible {:?} not found", entity)
            }
            MinigameError::UnknownScrap { name } => {
                write!(f, "no scrap definition named '{}'", name)
            }
            MinigameError::InventoryUnavailable { name } => {
                write!(f, "'{}' not added: no inventory present", name)
            }
            MinigameError::InvalidConfig {
                field,
                value,
                expected,
            } => write!(f, "config '{}' = {} is outside {}", field, value, expected),
        }
    }
}

impl std::error::Error for MinigameError {}

/// Convenience alias: a `Result` using `MinigameError` as the error type.
pub type MinigameResult<T> = Result<T, MinigameError>;

// ── Validation helpers ────────────────────────────────────────────────────────

fn require_positive(field: &'static str, value: f32) -> MinigameResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(MinigameError::InvalidConfig {
            field,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

fn require_chance(field: &'static str, value: u32) -> MinigameResult<()> {
    if value <= 10 {
        Ok(())
    } else {
        Err(MinigameError::InvalidConfig {
            field,
            value: value as f32,
            expected: "[0, 10]",
        })
    }
}

/// Reject configurations that would stall or break a session.
pub fn validate_config(config: &MinigameConfig) -> MinigameResult<()> {
    require_positive("charge_timer_secs", config.charge_timer_secs)?;
    require_positive("timer_indicator_max_radius", config.timer_indicator_max_radius)?;
    require_positive("timer_indicator_expand_speed", config.timer_indicator_expand_speed)?;
    require_positive("session_timeout_factor", config.session_timeout_factor)?;
    require_positive("hook_speed", config.hook_speed)?;
    require_positive("hook_range", config.hook_range)?;
    require_positive("barrier_speed", config.barrier_speed)?;
    require_positive("barrier_start_radius", config.barrier_start_radius)?;
    require_chance("inner_ring_scrap_chance", config.inner_ring_scrap_chance)?;
    require_chance("outer_ring_scrap_chance", config.outer_ring_scrap_chance)?;

    // The HUD has exactly three charge slots and three shot cues.
    if config.max_charges != MAX_CHARGES {
        return Err(MinigameError::InvalidConfig {
            field: "max_charges",
            value: config.max_charges as f32,
            expected: "exactly 3",
        });
    }
    if config.barrier_range < config.barrier_start_radius {
        return Err(MinigameError::InvalidConfig {
            field: "barrier_range",
            value: config.barrier_range,
            expected: "[barrier_start_radius, ∞)",
        });
    }
    if config.inner_ring_layouts.is_empty() || config.outer_ring_layouts.is_empty() {
        return Err(MinigameError::InvalidConfig {
            field: "ring_layouts",
            value: 0.0,
            expected: "at least one layout per ring tier",
        });
    }
    if config
        .inner_ring_layouts
        .iter()
        .chain(config.outer_ring_layouts.iter())
        .any(|layout| layout.slot_count == 0)
    {
        return Err(MinigameError::InvalidConfig {
            field: "slot_count",
            value: 0.0,
            expected: "[1, ∞)",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&MinigameConfig::default()).is_ok());
    }

    #[test]
    fn zero_timer_is_rejected_with_field_name() {
        let config = MinigameConfig {
            charge_timer_secs: 0.0,
            ..Default::default()
        };
        match validate_config(&config) {
            Err(MinigameError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "charge_timer_secs")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn charge_count_other_than_three_is_rejected() {
        for max_charges in [0, 2, 4, 5] {
            let config = MinigameConfig {
                max_charges,
                ..Default::default()
            };
            match validate_config(&config) {
                Err(MinigameError::InvalidConfig { field, .. }) => {
                    assert_eq!(field, "max_charges")
                }
                other => panic!("max_charges = {max_charges}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn empty_ring_layouts_are_rejected() {
        let config = MinigameConfig {
            outer_ring_layouts: Vec::new(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
