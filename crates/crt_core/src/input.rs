//! Polled input with edge detection over two cached device snapshots.
//!
//! The platform layer keeps a *live* `KeyboardState` (fed by window events)
//! and produces a `GamePadState` by polling the first gamepad. Once per frame
//! the main loop hands both to `Input::update`, which shifts the current
//! snapshots into the "last" slot. Every query is then answered by comparing
//! the two snapshots:
//!
//! - **down:** the control is down in the current snapshot.
//! - **pressed:** down now, up in the previous snapshot.
//! - **released:** up now, down in the previous snapshot.
//!
//! Actions are an indirection on top: each action maps to an `InputList` of
//! keys and buttons, and an action query is true if *any* bound control
//! satisfies it.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Space,
    Enter,
    Tab,
    Backspace,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Back,
    Start,
    Guide,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

/// Which keys are down at the moment the snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    down: HashSet<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        self.down.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.down.remove(&key);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    pub fn is_key_up(&self, key: Key) -> bool {
        !self.is_key_down(key)
    }

    /// Release everything. Used when the window loses focus, since the
    /// matching key-up events will never arrive.
    pub fn clear(&mut self) {
        self.down.clear();
    }
}

/// Snapshot of the first connected gamepad. A disconnected pad reports no
/// buttons and centred sticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePadState {
    pub connected: bool,
    buttons: HashSet<Button>,
    pub left_stick: Vec2,
    pub right_stick: Vec2,
}

impl GamePadState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn set_button(&mut self, button: Button, down: bool) {
        if down {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn is_button_down(&self, button: Button) -> bool {
        self.buttons.contains(&button)
    }

    pub fn is_button_up(&self, button: Button) -> bool {
        !self.is_button_down(button)
    }
}

/// The keys and gamepad buttons bound to a single action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputList {
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl InputList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub fn add_button(&mut self, button: Button) {
        self.buttons.push(button);
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.add_key(key);
        self
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.add_button(button);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.buttons.is_empty()
    }
}

pub struct Input<A> {
    keyboard: KeyboardState,
    last_keyboard: KeyboardState,
    gamepad: GamePadState,
    last_gamepad: GamePadState,
    action_maps: HashMap<A, InputList>,
}

impl<A: Eq + Hash> Input<A> {
    /// `initial_keyboard` becomes the current snapshot so that keys already
    /// held at startup do not register as pressed on the first update.
    pub fn new(initial_keyboard: KeyboardState) -> Self {
        Self {
            keyboard: initial_keyboard,
            last_keyboard: KeyboardState::default(),
            gamepad: GamePadState::default(),
            last_gamepad: GamePadState::default(),
            action_maps: HashMap::new(),
        }
    }

    /// Shift current snapshots into the previous slot and store the new ones.
    /// Call exactly once per frame, before any query.
    pub fn update(&mut self, keyboard: &KeyboardState, gamepad: &GamePadState) {
        self.last_keyboard = std::mem::replace(&mut self.keyboard, keyboard.clone());
        self.last_gamepad = std::mem::replace(&mut self.gamepad, gamepad.clone());
    }

    // --- Action map ---------------------------------------------------------

    pub fn set_action(&mut self, action: A, list: InputList) {
        self.action_maps.insert(action, list);
    }

    pub fn remove_action(&mut self, action: &A) -> Option<InputList> {
        self.action_maps.remove(action)
    }

    pub fn clear_actions(&mut self) {
        self.action_maps.clear();
    }

    pub fn has_action(&self, action: &A) -> bool {
        self.action_maps.contains_key(action)
    }

    pub fn is_pressed(&self, action: &A) -> bool {
        self.any_bound(action, Self::is_key_pressed, Self::is_button_pressed)
    }

    pub fn is_down(&self, action: &A) -> bool {
        self.any_bound(action, Self::is_key_down, Self::is_button_down)
    }

    pub fn is_released(&self, action: &A) -> bool {
        self.any_bound(action, Self::is_key_released, Self::is_button_released)
    }

    fn any_bound(
        &self,
        action: &A,
        key_query: fn(&Self, Key) -> bool,
        button_query: fn(&Self, Button) -> bool,
    ) -> bool {
        let Some(list) = self.action_maps.get(action) else {
            log::debug!("Input query for an action with no binding");
            return false;
        };
        list.keys.iter().any(|&key| key_query(self, key))
            || list.buttons.iter().any(|&button| button_query(self, button))
    }

    // --- Keyboard -----------------------------------------------------------

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keyboard.is_key_down(key) && self.last_keyboard.is_key_up(key)
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keyboard.is_key_down(key)
    }

    pub fn is_key_released(&self, key: Key) -> bool {
        self.keyboard.is_key_up(key) && self.last_keyboard.is_key_down(key)
    }

    // --- GamePad ------------------------------------------------------------

    pub fn is_button_pressed(&self, button: Button) -> bool {
        self.gamepad.is_button_down(button) && self.last_gamepad.is_button_up(button)
    }

    pub fn is_button_down(&self, button: Button) -> bool {
        self.gamepad.is_button_down(button)
    }

    pub fn is_button_released(&self, button: Button) -> bool {
        self.gamepad.is_button_up(button) && self.last_gamepad.is_button_down(button)
    }

    pub fn left_thumbstick(&self) -> Vec2 {
        self.gamepad.left_stick
    }

    pub fn right_thumbstick(&self) -> Vec2 {
        self.gamepad.right_stick
    }

    pub fn gamepad_connected(&self) -> bool {
        self.gamepad.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Action {
        Jump,
        Quit,
        Unbound,
    }

    fn keys(down: &[Key]) -> KeyboardState {
        let mut state = KeyboardState::new();
        for &key in down {
            state.key_down(key);
        }
        state
    }

    fn pad(down: &[Button]) -> GamePadState {
        let mut state = GamePadState::connected();
        for &button in down {
            state.set_button(button, true);
        }
        state
    }

    fn idle() -> GamePadState {
        GamePadState::disconnected()
    }

    #[test]
    fn key_pressed_only_on_first_frame_down() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        input.update(&keys(&[Key::T]), &idle());
        assert!(input.is_key_pressed(Key::T));
        assert!(input.is_key_down(Key::T));

        input.update(&keys(&[Key::T]), &idle());
        assert!(!input.is_key_pressed(Key::T));
        assert!(input.is_key_down(Key::T));
    }

    #[test]
    fn key_released_only_on_first_frame_up() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        input.update(&keys(&[Key::T]), &idle());
        input.update(&keys(&[]), &idle());
        assert!(input.is_key_released(Key::T));
        assert!(!input.is_key_down(Key::T));

        input.update(&keys(&[]), &idle());
        assert!(!input.is_key_released(Key::T));
    }

    #[test]
    fn pressed_and_released_are_exclusive() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        let frames = [keys(&[Key::A]), keys(&[]), keys(&[Key::A]), keys(&[Key::A])];
        for frame in &frames {
            input.update(frame, &idle());
            assert!(!(input.is_key_pressed(Key::A) && input.is_key_released(Key::A)));
        }
    }

    #[test]
    fn key_held_at_startup_is_not_pressed() {
        let mut input: Input<Action> = Input::new(keys(&[Key::Escape]));
        input.update(&keys(&[Key::Escape]), &idle());
        assert!(input.is_key_down(Key::Escape));
        assert!(!input.is_key_pressed(Key::Escape));
    }

    #[test]
    fn snapshot_is_copied_on_update() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        let mut live = keys(&[Key::Space]);
        input.update(&live, &idle());
        live.key_up(Key::Space);
        // The live state changed after polling; this frame's answers must not.
        assert!(input.is_key_down(Key::Space));
        assert!(input.is_key_pressed(Key::Space));
    }

    #[test]
    fn button_edges() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        input.update(&keys(&[]), &pad(&[Button::Y]));
        assert!(input.is_button_pressed(Button::Y));
        assert!(input.is_button_down(Button::Y));

        input.update(&keys(&[]), &pad(&[Button::Y]));
        assert!(!input.is_button_pressed(Button::Y));

        input.update(&keys(&[]), &pad(&[]));
        assert!(input.is_button_released(Button::Y));
        assert!(!input.is_button_down(Button::Y));
    }

    #[test]
    fn gamepad_disconnect_releases_buttons() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        input.update(&keys(&[]), &pad(&[Button::A]));
        input.update(&keys(&[]), &idle());
        assert!(input.is_button_released(Button::A));
        assert!(!input.gamepad_connected());
    }

    #[test]
    fn thumbsticks_read_current_snapshot() {
        let mut input: Input<Action> = Input::new(KeyboardState::new());
        let mut state = GamePadState::connected();
        state.left_stick = Vec2::new(0.5, -1.0);
        state.right_stick = Vec2::new(-0.25, 0.75);
        input.update(&keys(&[]), &state);
        assert_eq!(input.left_thumbstick(), Vec2::new(0.5, -1.0));
        assert_eq!(input.right_thumbstick(), Vec2::new(-0.25, 0.75));

        input.update(&keys(&[]), &idle());
        assert_eq!(input.left_thumbstick(), Vec2::ZERO);
    }

    #[test]
    fn action_matches_any_bound_control() {
        let mut input = Input::new(KeyboardState::new());
        input.set_action(
            Action::Jump,
            InputList::new()
                .with_key(Key::Space)
                .with_key(Key::W)
                .with_button(Button::A),
        );

        input.update(&keys(&[Key::W]), &idle());
        assert!(input.is_pressed(&Action::Jump));
        assert!(input.is_down(&Action::Jump));

        input.update(&keys(&[]), &pad(&[Button::A]));
        // W released and A pressed in the same frame: both edges fire.
        assert!(input.is_pressed(&Action::Jump));
        assert!(input.is_released(&Action::Jump));
        assert!(input.is_down(&Action::Jump));
    }

    #[test]
    fn unbound_action_is_never_active() {
        let mut input = Input::new(KeyboardState::new());
        input.set_action(Action::Quit, InputList::new().with_key(Key::Escape));
        input.update(&keys(&[Key::Escape]), &idle());
        assert!(!input.is_pressed(&Action::Unbound));
        assert!(!input.is_down(&Action::Unbound));
        assert!(!input.is_released(&Action::Unbound));
    }

    #[test]
    fn empty_list_is_never_active() {
        let mut input = Input::new(KeyboardState::new());
        input.set_action(Action::Quit, InputList::new());
        input.update(&keys(&[Key::Escape]), &pad(&[Button::Back]));
        assert!(!input.is_down(&Action::Quit));
        assert!(!input.is_pressed(&Action::Quit));
    }

    #[test]
    fn set_action_replaces_existing_binding() {
        let mut input = Input::new(KeyboardState::new());
        input.set_action(Action::Quit, InputList::new().with_key(Key::Escape));
        input.set_action(Action::Quit, InputList::new().with_key(Key::Q));
        input.update(&keys(&[Key::Escape]), &idle());
        assert!(!input.is_down(&Action::Quit));
        input.update(&keys(&[Key::Q]), &idle());
        assert!(input.is_down(&Action::Quit));
    }

    #[test]
    fn remove_and_clear_actions() {
        let mut input = Input::new(KeyboardState::new());
        input.set_action(Action::Quit, InputList::new().with_key(Key::Escape));
        input.set_action(Action::Jump, InputList::new().with_key(Key::Space));

        let removed = input.remove_action(&Action::Quit);
        assert_eq!(removed, Some(InputList::new().with_key(Key::Escape)));
        assert!(!input.has_action(&Action::Quit));
        assert!(input.has_action(&Action::Jump));

        input.clear_actions();
        assert!(!input.has_action(&Action::Jump));
    }

    #[test]
    fn action_ids_need_only_eq_and_hash() {
        #[derive(PartialEq, Eq, Hash)]
        struct Slot(u8);

        let mut input = Input::new(KeyboardState::new());
        input.set_action(Slot(1), InputList::new().with_key(Key::Enter));
        input.update(&keys(&[Key::Enter]), &idle());
        assert!(input.is_pressed(&Slot(1)));
        assert!(!input.is_pressed(&Slot(2)));
    }

    #[test]
    fn keyboard_clear_releases_all_keys() {
        let mut live = keys(&[Key::A, Key::D]);
        live.clear();
        assert!(live.is_key_up(Key::A));
        assert!(live.is_key_up(Key::D));
    }

    #[test]
    fn input_list_deserializes_with_missing_fields() {
        let list: InputList = serde_json::from_str(r#"{ "keys": ["T", "Escape"] }"#)
            .expect("input list should parse");
        assert_eq!(list.keys, vec![Key::T, Key::Escape]);
        assert!(list.buttons.is_empty());

        let list: InputList =
            serde_json::from_str(r#"{ "buttons": ["Y"] }"#).expect("input list should parse");
        assert!(list.keys.is_empty());
        assert_eq!(list.buttons, vec![Button::Y]);
        assert!(!list.is_empty());
    }
}
