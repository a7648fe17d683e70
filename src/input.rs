use std::collections::{HashMap, HashSet};

use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::entity::Entity;

/// Game actions driven by held keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    RotateLeft,
    RotateRight,
    Thrust,
    Quit,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::RotateLeft,
        Action::RotateRight,
        Action::Thrust,
        Action::Quit,
    ];
}

/// Physical key to action map. Several keys may share one action.
pub struct KeyBindings {
    map: HashMap<KeyCode, Action>,
    /// Reverse lookup: action → first key bound to it.
    reverse: HashMap<Action, KeyCode>,
}

impl KeyBindings {
    /// A/D rotate, W thrusts, Q quits; arrows and Escape as alternates.
    pub fn defaults() -> Self {
        let bindings = [
            (KeyCode::KeyA, Action::RotateLeft),
            (KeyCode::KeyD, Action::RotateRight),
            (KeyCode::KeyW, Action::Thrust),
            (KeyCode::KeyQ, Action::Quit),
            (KeyCode::ArrowLeft, Action::RotateLeft),
            (KeyCode::ArrowRight, Action::RotateRight),
            (KeyCode::ArrowUp, Action::Thrust),
            (KeyCode::Escape, Action::Quit),
        ];

        let mut map = HashMap::new();
        let mut reverse = HashMap::new();
        for (key, action) in bindings {
            map.insert(key, action);
            reverse.entry(action).or_insert(key);
        }
        Self { map, reverse }
    }

    pub fn lookup(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// Display label for the primary key of an action (e.g. "W", "Esc").
    pub fn label_for(&self, action: Action) -> Option<&'static str> {
        self.reverse.get(&action).map(|&key| key_name(key))
    }

    /// One-line summary of the primary bindings, for the startup log.
    pub fn summary(&self) -> String {
        Action::ALL
            .iter()
            .filter_map(|&action| {
                self.label_for(action)
                    .map(|label| format!("{:?}={}", action, label))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn key_name(key: KeyCode) -> &'static str {
    match key {
        KeyCode::KeyA => "A",
        KeyCode::KeyD => "D",
        KeyCode::KeyQ => "Q",
        KeyCode::KeyW => "W",
        KeyCode::ArrowLeft => "Left",
        KeyCode::ArrowRight => "Right",
        KeyCode::ArrowUp => "Up",
        KeyCode::Escape => "Esc",
        _ => "?",
    }
}

/// Keys currently held down, fed from window keyboard events.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    /// Forget everything held, e.g. when the window loses focus and
    /// release events will not arrive.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True if any held key is bound to `action`.
    pub fn is_active(&self, bindings: &KeyBindings, action: Action) -> bool {
        self.held
            .iter()
            .any(|&key| bindings.lookup(key) == Some(action))
    }
}

/// Translate held actions into player intent for this frame. Intent from
/// the previous frame is cleared first and gravity restored, so releasing
/// a key takes effect immediately. Left rotation wins over right.
///
/// Returns true when quit is requested.
pub fn apply_controls(
    player: &mut Entity,
    input: &InputState,
    bindings: &KeyBindings,
    gravity: f32,
) -> bool {
    player.reset_movement();
    player.set_acceleration(Vec2::new(0.0, gravity));

    if input.is_active(bindings, Action::RotateLeft) {
        player.rotate_left();
    } else if input.is_active(bindings, Action::RotateRight) {
        player.rotate_right();
    }

    if input.is_active(bindings, Action::Thrust) {
        player.boost();
    }

    input.is_active(bindings, Action::Quit)
}
