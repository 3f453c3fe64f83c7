//! Ring formations: the rotating slot layouts scrap and obstacles sit in.
//!
//! Each session picks one layout per tier, rolls every slot and spawns one
//! static piece per slot.  Slot 0 is always real scrap; the rest are real
//! scrap with probability `chance / 10`, otherwise an obstacle.

use crate::collectible::{spawn_static_collectible, Anchor, ScrapCatalog};
use crate::config::RingLayout;
use crate::constants::OBSTACLE_NAME;
use crate::minigame::SessionSpawned;
use bevy::prelude::*;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingTier {
    Inner,
    Outer,
}

/// One rotating ring of slots centred on the ship.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct RingFormation {
    pub tier: RingTier,
    pub layout: RingLayout,
    /// Current rotation in degrees.
    pub angle_deg: f32,
    /// Degrees per second, sign included.
    pub rotation_speed: f32,
}

impl RingFormation {
    pub fn slot_offset(&self, slot: usize) -> Vec2 {
        self.layout.slot_offset(slot, self.angle_deg)
    }

    pub fn rotate(&mut self, dt: f32) {
        self.angle_deg = (self.angle_deg + self.rotation_speed * dt).rem_euclid(360.0);
    }
}

/// What a rolled slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFill {
    Scrap,
    Obstacle,
}

/// Roll `slot_count` slots: slot 0 is guaranteed scrap, every other slot is
/// scrap when a d10 roll lands under `chance`.
pub fn roll_ring_slots(slot_count: usize, chance: u32, rng: &mut impl Rng) -> Vec<SlotFill> {
    (0..slot_count)
        .map(|slot| {
            if slot == 0 || rng.gen_range(0..10) < chance {
                SlotFill::Scrap
            } else {
                SlotFill::Obstacle
            }
        })
        .collect()
}

/// Any slot past the guaranteed one holding real scrap.
pub fn has_additional_scrap(fills: &[SlotFill]) -> bool {
    fills.iter().skip(1).any(|f| *f == SlotFill::Scrap)
}

/// Random rotation speed in `[min, max)` degrees per second, signed by
/// `direction`.
pub fn roll_rotation_speed(rng: &mut impl Rng, min: f32, max: f32, direction: f32) -> f32 {
    let speed = if max > min { rng.gen_range(min..max) } else { min };
    speed * direction.signum()
}

/// Pick one of a tier's candidate layouts.
pub fn pick_layout<'a>(layouts: &'a [RingLayout], rng: &mut impl Rng) -> Option<&'a RingLayout> {
    if layouts.is_empty() {
        return None;
    }
    layouts.get(rng.gen_range(0..layouts.len()))
}

/// Spawn a ring formation at `center` and populate it from `fills`.
///
/// Returns the ring entity.  Every spawned entity is tagged
/// [`SessionSpawned`] so the end-of-session sweep removes it.
pub fn spawn_ring_formation(
    commands: &mut Commands,
    formation: RingFormation,
    center: Vec2,
    fills: &[SlotFill],
    catalog: &ScrapCatalog,
    rng: &mut impl Rng,
) -> Entity {
    let ring = commands
        .spawn((
            Transform::from_translation(center.extend(0.0)),
            Visibility::default(),
            SessionSpawned,
        ))
        .id();

    for (slot, fill) in fills.iter().enumerate() {
        let position = center + formation.slot_offset(slot);
        let anchor = Anchor::RingSlot { ring, slot };
        let (name, high_value) = match fill {
            SlotFill::Obstacle => (OBSTACLE_NAME.to_string(), false),
            SlotFill::Scrap => match catalog.pick(rng) {
                Some(definition) => (definition.name.clone(), definition.high_value),
                None => {
                    warn!("Scrap catalog is empty; slot {slot} gets an obstacle");
                    (OBSTACLE_NAME.to_string(), false)
                }
            },
        };
        let piece = spawn_static_collectible(commands, &name, high_value, position, anchor);
        commands.entity(piece).insert(SessionSpawned);
    }

    commands.entity(ring).insert(formation);
    ring
}

/// Spin every ring by its own speed.
pub fn ring_rotation_system(time: Res<Time>, mut q_rings: Query<&mut RingFormation>) {
    let dt = time.delta_secs();
    for mut ring in q_rings.iter_mut() {
        ring.rotate(dt);
    }
}
