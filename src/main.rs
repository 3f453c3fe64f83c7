use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;
use salvage_hook::minigame::collection::PlayerInventory;
use salvage_hook::minigame::orchestrator::fire_hook_system;
use salvage_hook::minigame::MinigamePlugin;
use salvage_hook::scrap_node::scrap_node_interact_system;
use salvage_hook::{config, feedback, rendering, scrap_node, ship};

/// Configure Rapier physics: disable gravity for open space.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Salvage Hook".into(),
                resolution: WindowResolution::new(1200, 680),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.05)))
        // MinigameConfig is inserted with compiled defaults by MinigamePlugin;
        // load_minigame_config overwrites it from assets/minigame.toml (if
        // present) in the Startup schedule.
        //
        // pixels_per_meter(1.0) keeps world units and physics units identical,
        // so collider radii and hook speeds read the same in both.
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
        .add_plugins(MinigamePlugin)
        .add_plugins(rendering::RenderingPlugin)
        .init_resource::<PlayerInventory>()
        .init_resource::<ship::ShipIntent>()
        .add_systems(
            Startup,
            (
                // MinigamePlugin loads the config; order after it so every
                // startup system sees the final values.
                ship::setup_ship.after(config::load_minigame_config),
                scrap_node::setup_scrap_nodes.after(config::load_minigame_config),
                setup_physics_config,
            ),
        )
        .add_systems(
            Update,
            (
                ship::ship_intent_clear_system,
                ship::keyboard_to_ship_intent_system,
                ship::apply_ship_intent_system,
                feedback::keyboard_to_minigame_input_system,
            )
                .chain()
                .before(fire_hook_system)
                .before(scrap_node_interact_system),
        )
        .run();
}
