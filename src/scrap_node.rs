//! Scrap nodes: the world objects that open a minigame session and seed the
//! surrounding space with floating scrap.
//!
//! ## Flow
//!
//! 1. The ship enters a node's proximity sensor → interaction prompt shows.
//! 2. Interact → prompt hides, ship freezes, a [`PendingMinigameStart`]
//!    countdown is attached to the node itself.
//! 3. When the countdown elapses the session starts and the node is
//!    despawned.  Despawning the node earlier cancels the start, since the
//!    countdown goes with it.
//!
//! Between sessions every node also runs an ambient spawn timer and drops one
//! floating piece of scrap near itself each time it fires.

use crate::collectible::{random_drift, spawn_floating_collectible, ScrapCatalog};
use crate::config::MinigameConfig;
use crate::constants::NODE_INTERACT_RADIUS;
use crate::feedback::{post_cue, AudioRequest, MinigameHud, MinigameInput};
use crate::minigame::MinigamePhase;
use crate::session::MinigameSession;
use crate::ship::{session_locked_axes, Ship};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ScrapNode {
    /// Seconds until the next ambient spawn.
    pub spawn_timer: f32,
    /// Half-extent of the square ambient scrap appears in.
    pub spawn_radius: f32,
    pub ship_in_range: bool,
    /// Idle animation paused while a session plays.
    pub paused: bool,
}

impl ScrapNode {
    pub fn new(config: &MinigameConfig) -> Self {
        Self {
            spawn_timer: config.node_first_spawn_secs,
            spawn_radius: config.node_spawn_radius,
            ship_in_range: false,
            paused: false,
        }
    }

    /// Advance the ambient spawn timer.  Returns `true` when a piece should
    /// spawn now; the timer is then re-rolled within `interval`.
    pub fn tick_spawn(
        &mut self,
        dt: f32,
        playing: bool,
        interval: (f32, f32),
        rng: &mut impl Rng,
    ) -> bool {
        if playing {
            return false;
        }
        self.spawn_timer -= dt;
        if self.spawn_timer > 0.0 {
            return false;
        }
        let (min, max) = interval;
        self.spawn_timer = if max > min { rng.gen_range(min..max) } else { min };
        true
    }
}

/// A session start scheduled on a node.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PendingMinigameStart {
    pub remaining_secs: f32,
}

impl PendingMinigameStart {
    /// Returns `true` once the delay has elapsed.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining_secs -= dt;
        self.remaining_secs <= 0.0
    }
}

// ── Spawn ─────────────────────────────────────────────────────────────────────

pub fn spawn_scrap_node(commands: &mut Commands, position: Vec2, config: &MinigameConfig) -> Entity {
    commands
        .spawn((
            ScrapNode::new(config),
            RigidBody::Fixed,
            Collider::ball(NODE_INTERACT_RADIUS),
            Sensor,
            ActiveCollisionTypes::all(),
            ActiveEvents::COLLISION_EVENTS,
            Transform::from_translation(position.extend(0.0)),
            Visibility::default(),
        ))
        .id()
}

/// Startup system: scatter a handful of nodes around the origin.
pub fn setup_scrap_nodes(mut commands: Commands, config: Res<MinigameConfig>) {
    let positions = [
        Vec2::new(12.0, 6.0),
        Vec2::new(-14.0, -8.0),
        Vec2::new(4.0, -18.0),
    ];
    for pos in positions {
        spawn_scrap_node(&mut commands, pos, &config);
    }
    println!("[SETUP] {} scrap nodes spawned", positions.len());
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Show / hide the interaction prompt as the ship enters / leaves a node.
pub fn scrap_node_proximity_system(
    mut collision_events: MessageReader<CollisionEvent>,
    session: Res<MinigameSession>,
    mut hud: ResMut<MinigameHud>,
    q_ship: Query<Entity, With<Ship>>,
    mut q_nodes: Query<&mut ScrapNode>,
) {
    let mut changed = false;
    for event in collision_events.read() {
        let (e1, e2, entered) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2, true),
            CollisionEvent::Stopped(e1, e2, _) => (*e1, *e2, false),
        };
        let node = if q_ship.contains(e1) && q_nodes.contains(e2) {
            e2
        } else if q_ship.contains(e2) && q_nodes.contains(e1) {
            e1
        } else {
            continue;
        };
        if session.playing {
            continue;
        }
        if let Ok(mut node) = q_nodes.get_mut(node) {
            node.ship_in_range = entered;
            changed = true;
        }
    }
    // Overlapping nodes: leaving one must not hide the prompt of another.
    if changed {
        hud.interact_prompt_visible = q_nodes.iter().any(|node| node.ship_in_range);
    }
}

/// Interact while in range: freeze the ship and schedule the session start.
#[allow(clippy::too_many_arguments)]
pub fn scrap_node_interact_system(
    mut commands: Commands,
    input: Res<MinigameInput>,
    session: Res<MinigameSession>,
    config: Res<MinigameConfig>,
    mut hud: ResMut<MinigameHud>,
    mut audio: MessageWriter<AudioRequest>,
    q_pending: Query<(), With<PendingMinigameStart>>,
    q_nodes: Query<(Entity, &ScrapNode)>,
    mut q_ship: Query<(&mut LockedAxes, &mut Velocity), With<Ship>>,
) {
    if !input.interact || session.playing || !q_pending.is_empty() {
        return;
    }
    let Some((node, _)) = q_nodes.iter().find(|(_, n)| n.ship_in_range) else {
        return;
    };

    hud.interact_prompt_visible = false;
    if let Ok((mut axes, mut velocity)) = q_ship.single_mut() {
        *axes = session_locked_axes(false);
        *velocity = Velocity::zero();
    }
    post_cue(&mut audio, config.audio.ambience_stop.as_deref());
    commands.entity(node).insert(PendingMinigameStart {
        remaining_secs: config.node_transition_delay_secs,
    });
    info!(
        "Scrap node {node:?} engaged; session starts in {:.1}s",
        config.node_transition_delay_secs
    );
}

/// Count down scheduled starts; start the session and consume the node.
pub fn pending_start_system(
    mut commands: Commands,
    time: Res<Time>,
    session: Res<MinigameSession>,
    mut next_phase: ResMut<NextState<MinigamePhase>>,
    mut q_pending: Query<(Entity, &mut PendingMinigameStart)>,
) {
    let dt = time.delta_secs();
    for (entity, mut pending) in q_pending.iter_mut() {
        if session.playing {
            commands.entity(entity).remove::<PendingMinigameStart>();
            continue;
        }
        if pending.tick(dt) {
            next_phase.set(MinigamePhase::Playing);
            commands.entity(entity).despawn();
        }
    }
}

/// Pause node animations during a session and drop ambient scrap otherwise.
pub fn scrap_node_ambient_system(
    mut commands: Commands,
    time: Res<Time>,
    session: Res<MinigameSession>,
    config: Res<MinigameConfig>,
    catalog: Res<ScrapCatalog>,
    mut q_nodes: Query<(&Transform, &mut ScrapNode)>,
) {
    let dt = time.delta_secs();
    let mut rng = rand::thread_rng();
    let interval = (config.node_spawn_interval_min, config.node_spawn_interval_max);

    for (transform, mut node) in q_nodes.iter_mut() {
        node.paused = session.playing;
        if !node.tick_spawn(dt, session.playing, interval, &mut rng) {
            continue;
        }
        let Some(definition) = catalog.pick(&mut rng) else {
            warn!("Scrap catalog is empty; no ambient scrap spawned");
            continue;
        };
        let r = node.spawn_radius;
        let offset = Vec2::new(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
        let drift = random_drift(&mut rng, &config);
        spawn_floating_collectible(
            &mut commands,
            definition,
            transform.translation.truncate() + offset,
            drift,
            config.scrap_time_to_live,
        );
    }
}
