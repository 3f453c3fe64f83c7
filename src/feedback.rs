//! Collaborator surfaces the minigame drives but does not implement.
//!
//! | Surface | Type | Consumer |
//! |---------|------|----------|
//! | Audio middleware | [`AudioRequest`] message | audio bridge (fire-and-forget) |
//! | Camera | [`CameraShake`] message | camera rig in `rendering` |
//! | Effects | [`RingExplosion`] message | effect spawner in `rendering` |
//! | UI | [`MinigameHud`] resource | HUD drawing in `rendering` |
//! | Input | [`MinigameInput`] resource | filled once per frame by the binary |
//!
//! Nothing here fails: a message nobody reads is simply dropped.

use crate::constants::MUSIC_STATE_GROUP;
use crate::session::ChargeDisplayUpdate;
use bevy::prelude::*;

// ── Messages ──────────────────────────────────────────────────────────────────

/// A request for the audio middleware.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum AudioRequest {
    /// Post a named event.
    Post(String),
    /// Set a state group to a value.
    SetState { group: String, value: String },
}

impl AudioRequest {
    pub fn post(name: impl Into<String>) -> Self {
        AudioRequest::Post(name.into())
    }

    pub fn set_state(group: impl Into<String>, value: impl Into<String>) -> Self {
        AudioRequest::SetState {
            group: group.into(),
            value: value.into(),
        }
    }
}

/// Post `cue` only when it is configured.
pub fn post_cue(audio: &mut MessageWriter<AudioRequest>, cue: Option<&str>) {
    if let Some(name) = cue {
        audio.write(AudioRequest::post(name));
    }
}

/// Shake the main camera.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CameraShake {
    pub intensity: f32,
}

/// The ring formation blew up at the end of a session.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct RingExplosion {
    pub at: Vec2,
}

// ── HUD ───────────────────────────────────────────────────────────────────────

/// Tint of one hook-charge indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeTint {
    #[default]
    Lit,
    Dimmed,
}

impl ChargeTint {
    pub fn color(self) -> Color {
        match self {
            ChargeTint::Lit => Color::srgba(1.0, 1.0, 1.0, 1.0),
            ChargeTint::Dimmed => Color::srgba(0.3, 0.3, 0.3, 1.0),
        }
    }
}

/// Visibility toggles and tints for the minigame's UI widgets.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct MinigameHud {
    pub overlay_visible: bool,
    pub charges_visible: bool,
    pub charge_tints: [ChargeTint; 3],
    pub interact_prompt_visible: bool,
}

impl MinigameHud {
    /// Apply a charge display change to the indicator tints.
    pub fn apply_charges(&mut self, update: &ChargeDisplayUpdate) {
        if update.reset_all {
            self.charge_tints = [ChargeTint::Lit; 3];
        }
        if let Some(tint) = update
            .dim_slot
            .and_then(|slot| self.charge_tints.get_mut(slot))
        {
            *tint = ChargeTint::Dimmed;
        }
    }
}

/// Push a charge display change to the HUD and the music state.
pub fn show_charges(
    hud: &mut MinigameHud,
    audio: &mut MessageWriter<AudioRequest>,
    update: &ChargeDisplayUpdate,
    play_music: Option<&str>,
    stop_music: Option<&str>,
) {
    hud.apply_charges(update);
    audio.write(AudioRequest::set_state(MUSIC_STATE_GROUP, update.music_state));
    if update.reset_all {
        post_cue(audio, play_music);
    }
    if update.depleted {
        post_cue(audio, stop_music);
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Discrete minigame inputs for the current frame.
///
/// The binary fills this from the keyboard each frame; tests set it directly.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinigameInput {
    /// Fire held this frame.
    pub fire: bool,
    /// Interact pressed this frame.
    pub interact: bool,
}

/// Translate Space / E into [`MinigameInput`].
pub fn keyboard_to_minigame_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut input: ResMut<MinigameInput>,
) {
    input.fire = keys.pressed(KeyCode::Space);
    input.interact = keys.just_pressed(KeyCode::KeyE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::charge_display_update;

    #[test]
    fn hud_tints_follow_charge_count() {
        let mut hud = MinigameHud::default();
        for charges in [2, 1] {
            hud.apply_charges(&charge_display_update(charges).unwrap());
        }
        assert_eq!(
            hud.charge_tints,
            [ChargeTint::Lit, ChargeTint::Dimmed, ChargeTint::Dimmed]
        );

        hud.apply_charges(&charge_display_update(0).unwrap());
        assert_eq!(hud.charge_tints, [ChargeTint::Dimmed; 3]);

        hud.apply_charges(&charge_display_update(3).unwrap());
        assert_eq!(hud.charge_tints, [ChargeTint::Lit; 3]);
    }
}
