//! Rendering: camera rig, collectible meshes, gizmo overlays, HUD and the
//! end-of-session explosion.
//!
//! ## Layer Model
//!
//! | Layer              | Technology | Shown while          |
//! |--------------------|------------|----------------------|
//! | Collectible fills  | `Mesh2d`   | always               |
//! | Ship outline       | Gizmos     | always               |
//! | Hook + rope        | Gizmos     | hook active          |
//! | Barrier edge       | Gizmos     | barrier visible      |
//! | Ring guides        | Gizmos     | session playing      |
//! | Timer indicator    | Gizmos     | indicator present    |
//! | Scrap node halo    | Gizmos     | node not paused      |
//! | Ring explosion     | Gizmos     | 8 s after a session  |
//! | Charge indicators  | Bevy UI    | `charges_visible`    |
//! | Session overlay    | Bevy UI    | `overlay_visible`    |
//! | Interact prompt    | Bevy UI    | `interact_prompt_visible` |
//!
//! ## System Responsibilities
//!
//! | System                           | Schedule | Purpose                          |
//! |----------------------------------|----------|----------------------------------|
//! | `setup_camera`                   | Startup  | Spawn the zoomed 2D camera       |
//! | `setup_minigame_hud`             | Startup  | Spawn overlay, charges, prompt   |
//! | `setup_collectible_visuals`      | Startup  | Shared diamond meshes and tints  |
//! | `attach_collectible_mesh_system` | Update   | Diamond fill on new collectibles |
//! | `camera_shake_system`            | Update   | Follow the ship, apply shake     |
//! | `ring_explosion_system`          | Update   | Spawn and age explosion effects  |
//! | `hud_sync_system`                | Update   | Mirror `MinigameHud` onto the UI |
//! | `audio_log_system`               | Update   | Log every audio request          |
//! | `gizmo_rendering_system`         | Update   | Draw every gizmo layer           |

use crate::barrier::Barrier;
use crate::collectible::Collectible;
use crate::constants::RING_EXPLOSION_LIFETIME;
use crate::feedback::{AudioRequest, CameraShake, MinigameHud, RingExplosion};
use crate::hook::{Hook, HookRope};
use crate::minigame::rings::RingFormation;
use crate::scrap_node::ScrapNode;
use crate::session::MinigameSession;
use crate::ship::Ship;
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};
use rand::Rng;

/// World units per screen pixel for the main camera.
const CAMERA_SCALE: f32 = 0.04;

/// Largest camera offset a full-strength shake produces (world units).
const MAX_SHAKE_OFFSET: f32 = 0.6;

/// Fraction of shake kept each frame.
const SHAKE_DECAY: f32 = 0.9;

// ── Camera ────────────────────────────────────────────────────────────────────

/// Current camera shake strength in `[0, 1]`.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ShakeState {
    pub trauma: f32,
}

impl ShakeState {
    pub fn add(&mut self, intensity: f32) {
        self.trauma = (self.trauma + intensity.max(0.0)).min(1.0);
    }

    /// Decay one frame and snap to zero once negligible.
    pub fn decay(&mut self) {
        self.trauma *= SHAKE_DECAY;
        if self.trauma < 0.01 {
            self.trauma = 0.0;
        }
    }

    pub fn max_offset(&self) -> f32 {
        self.trauma * MAX_SHAKE_OFFSET
    }
}

/// Setup the 2D camera zoomed in to world units.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: CAMERA_SCALE,
            ..OrthographicProjection::default_2d()
        }),
    ));
    println!("[SETUP] Camera spawned");
}

/// Keep the camera on the ship and jitter it while shaking.
pub fn camera_shake_system(
    mut shakes: MessageReader<CameraShake>,
    mut shake: ResMut<ShakeState>,
    q_ship: Query<&Transform, (With<Ship>, Without<Camera2d>)>,
    mut q_camera: Query<&mut Transform, With<Camera2d>>,
) {
    for event in shakes.read() {
        shake.add(event.intensity);
    }
    let Ok(mut camera) = q_camera.single_mut() else {
        return;
    };
    let focus = q_ship
        .single()
        .map(|t| t.translation.truncate())
        .unwrap_or(Vec2::ZERO);

    let jitter = if shake.trauma > 0.0 {
        let mut rng = rand::thread_rng();
        let max = shake.max_offset();
        Vec2::new(rng.gen_range(-max..=max), rng.gen_range(-max..=max))
    } else {
        Vec2::ZERO
    };
    camera.translation.x = focus.x + jitter.x;
    camera.translation.y = focus.y + jitter.y;
    shake.decay();
}

// ── Collectible meshes ────────────────────────────────────────────────────────

/// Build a filled diamond (rhombus) mesh with the given half-extents.
pub fn diamond_mesh(half_w: f32, half_h: f32) -> Mesh {
    let positions: Vec<[f32; 3]> = vec![
        [0.0, half_h, 0.0],
        [half_w, 0.0, 0.0],
        [0.0, -half_h, 0.0],
        [-half_w, 0.0, 0.0],
    ];
    let indices = Indices::U32(vec![0, 1, 3, 1, 2, 3]);
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_indices(indices);
    mesh
}

const SCRAP_COLOR: Color = Color::srgb(0.55, 0.85, 0.95);
const VALUABLE_COLOR: Color = Color::srgb(1.0, 0.78, 0.2);
const OBSTACLE_COLOR: Color = Color::srgb(0.45, 0.38, 0.32);


/// Shared diamond meshes and tints for collectibles (created once at startup).
#[derive(Resource, Debug, Clone)]
pub struct CollectibleVisuals {
    pub scrap: (Handle<Mesh>, Handle<ColorMaterial>),
    pub valuable: (Handle<Mesh>, Handle<ColorMaterial>),
    pub obstacle: (Handle<Mesh>, Handle<ColorMaterial>),
}

impl CollectibleVisuals {
    pub fn for_collectible(&self, collectible: &Collectible) -> &(Handle<Mesh>, Handle<ColorMaterial>) {
        if collectible.is_obstacle() {
            &self.obstacle
        } else if collectible.high_value {
            &self.valuable
        } else {
            &self.scrap
        }
    }
}

pub fn setup_collectible_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let piece = meshes.add(diamond_mesh(0.3, 0.45));
    let rock = meshes.add(diamond_mesh(0.5, 0.5));
    let mut tint = |color: Color| materials.add(ColorMaterial::from_color(color));
    commands.insert_resource(CollectibleVisuals {
        scrap: (piece.clone(), tint(SCRAP_COLOR)),
        valuable: (piece, tint(VALUABLE_COLOR)),
        obstacle: (rock, tint(OBSTACLE_COLOR)),
    });
}

/// Give every newly spawned collectible a diamond fill.
pub fn attach_collectible_mesh_system(
    mut commands: Commands,
    visuals: Res<CollectibleVisuals>,
    query: Query<(Entity, &Collectible), Added<Collectible>>,
) {
    for (entity, collectible) in query.iter() {
        let (mesh, material) = visuals.for_collectible(collectible);
        commands
            .entity(entity)
            .insert((Mesh2d(mesh.clone()), MeshMaterial2d(material.clone())));
    }
}

// ── Ring explosion ────────────────────────────────────────────────────────────

/// Expanding shock rings left behind when a session's rings blow up.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct RingExplosionEffect {
    pub age: f32,
    pub lifetime: f32,
}

impl RingExplosionEffect {
    pub fn new() -> Self {
        Self {
            age: 0.0,
            lifetime: RING_EXPLOSION_LIFETIME,
        }
    }

    /// Age the effect.  Returns `true` once it should be removed.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.age >= self.lifetime
    }

    /// 0 at birth, 1 at the end of the lifetime.
    pub fn progress(&self) -> f32 {
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

impl Default for RingExplosionEffect {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn an effect for every explosion and despawn expired ones.
pub fn ring_explosion_system(
    mut commands: Commands,
    time: Res<Time>,
    mut explosions: MessageReader<RingExplosion>,
    mut q_effects: Query<(Entity, &mut RingExplosionEffect)>,
) {
    let dt = time.delta_secs();
    for (entity, mut effect) in q_effects.iter_mut() {
        if effect.tick(dt) {
            commands.entity(entity).despawn();
        }
    }
    for explosion in explosions.read() {
        commands.spawn((
            RingExplosionEffect::new(),
            Transform::from_translation(explosion.at.extend(0.3)),
        ));
    }
}

// ── HUD ───────────────────────────────────────────────────────────────────────

/// Root of the "salvage in progress" overlay.
#[derive(Component)]
pub struct SessionOverlay;

/// Root of the three charge indicators.
#[derive(Component)]
pub struct ChargeBar;

/// One charge indicator, by slot.
#[derive(Component)]
pub struct ChargeIndicator(pub usize);

/// "Press E" prompt near a scrap node.
#[derive(Component)]
pub struct InteractPrompt;

/// Spawn the minigame HUD, hidden.
pub fn setup_minigame_hud(mut commands: Commands) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            ..default()
        },
        Text::new("SALVAGE IN PROGRESS"),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::srgb(0.95, 0.88, 0.45)),
        SessionOverlay,
        Visibility::Hidden,
    ));

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(10.0),
                top: Val::Px(10.0),
                column_gap: Val::Px(6.0),
                ..default()
            },
            ChargeBar,
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            for slot in 0..3 {
                parent.spawn((
                    Node {
                        width: Val::Px(18.0),
                        height: Val::Px(18.0),
                        ..default()
                    },
                    BackgroundColor(Color::WHITE),
                    ChargeIndicator(slot),
                ));
            }
        });

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(40.0),
            left: Val::Percent(42.0),
            ..default()
        },
        Text::new("Press E to salvage"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::WHITE),
        InteractPrompt,
        Visibility::Hidden,
    ));
    println!("[SETUP] Minigame HUD spawned");
}

fn shown(visible: bool) -> Visibility {
    if visible {
        Visibility::Visible
    } else {
        Visibility::Hidden
    }
}

/// Mirror [`MinigameHud`] onto the UI nodes.  Only runs work when it changed.
#[allow(clippy::type_complexity)]
pub fn hud_sync_system(
    hud: Res<MinigameHud>,
    mut q_overlay: Query<
        &mut Visibility,
        (With<SessionOverlay>, Without<ChargeBar>, Without<InteractPrompt>),
    >,
    mut q_bar: Query<&mut Visibility, (With<ChargeBar>, Without<InteractPrompt>)>,
    mut q_prompt: Query<&mut Visibility, With<InteractPrompt>>,
    mut q_indicators: Query<(&ChargeIndicator, &mut BackgroundColor)>,
) {
    if !hud.is_changed() {
        return;
    }
    for mut v in q_overlay.iter_mut() {
        *v = shown(hud.overlay_visible);
    }
    for mut v in q_bar.iter_mut() {
        *v = shown(hud.charges_visible);
    }
    for mut v in q_prompt.iter_mut() {
        *v = shown(hud.interact_prompt_visible);
    }
    for (indicator, mut color) in q_indicators.iter_mut() {
        if let Some(tint) = hud.charge_tints.get(indicator.0) {
            color.0 = tint.color();
        }
    }
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Stand-in for the audio middleware: log every request.
pub fn audio_log_system(mut requests: MessageReader<AudioRequest>) {
    for request in requests.read() {
        match request {
            AudioRequest::Post(name) => debug!("audio post: {name}"),
            AudioRequest::SetState { group, value } => debug!("audio state: {group} = {value}"),
        }
    }
}

// ── Gizmos ────────────────────────────────────────────────────────────────────

/// Draw every gizmo layer.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn gizmo_rendering_system(
    mut gizmos: Gizmos,
    session: Res<MinigameSession>,
    q_ship: Query<&Transform, With<Ship>>,
    q_hook: Query<(&Hook, &HookRope, &Transform), Without<Ship>>,
    q_barrier: Query<(&Barrier, &Transform, &Visibility), (Without<Ship>, Without<Hook>)>,
    q_rings: Query<(&RingFormation, &Transform), (Without<Ship>, Without<Hook>, Without<Barrier>)>,
    q_nodes: Query<(&ScrapNode, &Transform), (Without<Ship>, Without<Hook>, Without<Barrier>)>,
    q_effects: Query<(&RingExplosionEffect, &Transform), (Without<Ship>, Without<Hook>)>,
) {
    // ── Ship ──────────────────────────────────────────────────────────────────
    let ship_pos = q_ship.single().ok().map(|ship| {
        let pos = ship.translation.truncate();
        let rot = ship.rotation;
        let tip = pos + rot.mul_vec3(Vec3::new(0.0, 1.0, 0.0)).truncate();
        let left = pos + rot.mul_vec3(Vec3::new(-0.6, -0.7, 0.0)).truncate();
        let right = pos + rot.mul_vec3(Vec3::new(0.6, -0.7, 0.0)).truncate();
        let color = Color::srgb(0.9, 0.9, 1.0);
        gizmos.line_2d(tip, right, color);
        gizmos.line_2d(right, left, color);
        gizmos.line_2d(left, tip, color);
        pos
    });

    // ── Hook ──────────────────────────────────────────────────────────────────
    for (hook, rope, transform) in q_hook.iter() {
        if !hook.active {
            continue;
        }
        let color = if session.hook.is_collecting() {
            Color::srgb(0.3, 1.0, 0.4)
        } else {
            Color::srgb(1.0, 0.6, 0.2)
        };
        gizmos.line_2d(rope.start, rope.end, Color::srgba(0.8, 0.8, 0.8, 0.7));
        gizmos.circle_2d(transform.translation.truncate(), 0.3, color);
    }

    // ── Barrier ───────────────────────────────────────────────────────────────
    for (barrier, transform, visibility) in q_barrier.iter() {
        if *visibility == Visibility::Hidden {
            continue;
        }
        let alpha = if barrier.complete { 0.8 } else { 0.4 };
        gizmos.circle_2d(
            transform.translation.truncate(),
            barrier.radius,
            Color::srgba(0.3, 0.7, 1.0, alpha),
        );
    }

    // ── Rings ─────────────────────────────────────────────────────────────────
    for (ring, transform) in q_rings.iter() {
        gizmos.circle_2d(
            transform.translation.truncate(),
            ring.layout.radius,
            Color::srgba(1.0, 1.0, 1.0, 0.12),
        );
    }

    // ── Timer indicator ───────────────────────────────────────────────────────
    if let (Some(indicator), Some(pos)) = (session.charge_timer.indicator, ship_pos) {
        if indicator.radius > 0.0 {
            gizmos.circle_2d(pos, indicator.radius, Color::srgba(1.0, 0.3, 0.3, 0.6));
        }
    }

    // ── Scrap nodes ───────────────────────────────────────────────────────────
    for (node, transform) in q_nodes.iter() {
        if node.paused {
            continue;
        }
        let color = if node.ship_in_range {
            Color::srgb(1.0, 0.85, 0.3)
        } else {
            Color::srgba(0.8, 0.7, 0.3, 0.6)
        };
        gizmos.circle_2d(transform.translation.truncate(), 1.2, color);
    }

    // ── Explosions ────────────────────────────────────────────────────────────
    for (effect, transform) in q_effects.iter() {
        let t = effect.progress();
        let pos = transform.translation.truncate();
        let alpha = 1.0 - t;
        gizmos.circle_2d(pos, 2.0 + t * 18.0, Color::srgba(1.0, 0.55, 0.15, alpha));
        gizmos.circle_2d(pos, 1.0 + t * 10.0, Color::srgba(1.0, 0.9, 0.5, alpha * 0.7));
    }
}

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShakeState>()
            .add_systems(
                Startup,
                (setup_camera, setup_minigame_hud, setup_collectible_visuals),
            )
            .add_systems(
                Update,
                (
                    attach_collectible_mesh_system,
                    camera_shake_system,
                    ring_explosion_system,
                    hud_sync_system,
                    audio_log_system,
                    gizmo_rendering_system,
                ),
            );
    }
}
