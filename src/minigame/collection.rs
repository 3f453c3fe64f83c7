//! Resolving caught scrap against the catalog and the player's inventory.
//!
//! Both collection paths end up in [`ScrapCollector::collect`]:
//!
//! | Path | Trigger | Owner before resolution |
//! |------|---------|-------------------------|
//! | Hook | hook docks (or aborts) carrying a piece | [`Anchor::Hook`] |
//! | Passive | ship touches floating scrap outside a session | [`Anchor::Orchestrator`] |
//!
//! The two are mutually exclusive: hook contacts need a playing session and
//! [`passive_collection_system`] needs one that is not.

use crate::collectible::{Anchor, Collectible, ScrapCatalog, ScrapDefinition};
use crate::config::MinigameConfig;
use crate::error::{MinigameError, MinigameResult};
use crate::feedback::{post_cue, AudioRequest};
use crate::session::MinigameSession;
use crate::ship::Ship;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::HashMap;

/// The player's scrap stash.
///
/// Optional: a world without it still plays the minigame, collections just
/// leave no trace.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerInventory {
    items: HashMap<String, u32>,
    total_value: u32,
}

impl PlayerInventory {
    pub fn add_to_player_inventory(&mut self, definition: &ScrapDefinition) {
        *self.items.entry(definition.name.clone()).or_insert(0) += 1;
        self.total_value += definition.value;
    }

    pub fn count(&self, name: &str) -> u32 {
        self.items.get(name).copied().unwrap_or(0)
    }

    pub fn total_value(&self) -> u32 {
        self.total_value
    }
}

/// Notification that a piece of scrap reached the inventory.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ScrapAdded {
    pub definition: ScrapDefinition,
}

/// Everything needed to turn a caught entity into inventory.
#[derive(SystemParam)]
pub struct ScrapCollector<'w, 's> {
    catalog: Res<'w, ScrapCatalog>,
    inventory: Option<ResMut<'w, PlayerInventory>>,
    added: MessageWriter<'w, ScrapAdded>,
    q_collectibles: Query<'w, 's, &'static Collectible>,
}

impl ScrapCollector<'_, '_> {
    /// Count a collection and resolve `target`.
    ///
    /// The collected counter always increments.  A found entity is always
    /// despawned, even when it matches nothing in the catalog; a missing one
    /// is left alone.  Every failure is soft: the caller logs it.
    pub fn collect(
        &mut self,
        commands: &mut Commands,
        session: &mut MinigameSession,
        target: Option<Entity>,
    ) -> MinigameResult<ScrapDefinition> {
        session.scrap_collected += 1;

        let entity = target.ok_or(MinigameError::NothingToCollect)?;
        let name = self
            .q_collectibles
            .get(entity)
            .map(|c| c.name.clone())
            .map_err(|_| MinigameError::CollectibleNotFound { entity })?;
        commands.entity(entity).despawn();

        let definition = self
            .catalog
            .find(&name)
            .cloned()
            .ok_or_else(|| MinigameError::UnknownScrap { name: name.clone() })?;
        let Some(inventory) = self.inventory.as_mut() else {
            return Err(MinigameError::InventoryUnavailable { name });
        };
        inventory.add_to_player_inventory(&definition);
        self.added.write(ScrapAdded {
            definition: definition.clone(),
        });
        Ok(definition)
    }
}

/// Scoop up ambient scrap the ship flies through while no session plays.
#[allow(clippy::too_many_arguments)]
pub fn passive_collection_system(
    mut commands: Commands,
    mut collision_events: MessageReader<CollisionEvent>,
    mut session: ResMut<MinigameSession>,
    mut collector: ScrapCollector,
    config: Res<MinigameConfig>,
    mut audio: MessageWriter<AudioRequest>,
    q_ship: Query<Entity, With<Ship>>,
    mut q_anchors: Query<&mut Anchor, With<Collectible>>,
) {
    if session.playing {
        // Drain so stale contacts are not replayed after the session.
        collision_events.clear();
        return;
    }
    let mut processed: std::collections::HashSet<Entity> = Default::default();

    for event in collision_events.read() {
        let (e1, e2) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2),
            CollisionEvent::Stopped(..) => continue,
        };
        let scrap = if q_ship.contains(e1) && q_anchors.contains(e2) {
            e2
        } else if q_ship.contains(e2) && q_anchors.contains(e1) {
            e1
        } else {
            continue;
        };
        if !processed.insert(scrap) {
            continue;
        }
        if let Ok(mut anchor) = q_anchors.get_mut(scrap) {
            anchor.transfer_ownership(Anchor::Orchestrator);
        }
        match collector.collect(&mut commands, &mut session, Some(scrap)) {
            Ok(definition) => info!("Picked up floating '{}'", definition.name),
            Err(err) => warn!("Floating scrap not collected: {err}"),
        }
        post_cue(&mut audio, config.audio.collect_floating_scrap.as_deref());
        audio.write(AudioRequest::post("Mini_Ball_Correct"));
    }
}
