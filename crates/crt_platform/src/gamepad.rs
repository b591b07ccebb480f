//! Polls the first connected gamepad into a `GamePadState` snapshot.
//!
//! With the `gamepad` feature disabled the poller still exists but always
//! reports a disconnected pad, so callers never need to cfg-gate.

use crt_core::input::GamePadState;

#[cfg(feature = "gamepad")]
mod backend {
    use crt_core::input::{Button, GamePadState};
    use gilrs::{Axis, EventType, GamepadId, Gilrs};
    use glam::Vec2;

    /// Physical gilrs button -> engine button, using the Xbox face layout.
    pub(super) const BUTTON_MAP: &[(gilrs::Button, Button)] = &[
        (gilrs::Button::South, Button::A),
        (gilrs::Button::East, Button::B),
        (gilrs::Button::West, Button::X),
        (gilrs::Button::North, Button::Y),
        (gilrs::Button::Select, Button::Back),
        (gilrs::Button::Start, Button::Start),
        (gilrs::Button::Mode, Button::Guide),
        (gilrs::Button::LeftTrigger, Button::LeftShoulder),
        (gilrs::Button::RightTrigger, Button::RightShoulder),
        (gilrs::Button::LeftTrigger2, Button::LeftTrigger),
        (gilrs::Button::RightTrigger2, Button::RightTrigger),
        (gilrs::Button::LeftThumb, Button::LeftStick),
        (gilrs::Button::RightThumb, Button::RightStick),
        (gilrs::Button::DPadUp, Button::DPadUp),
        (gilrs::Button::DPadDown, Button::DPadDown),
        (gilrs::Button::DPadLeft, Button::DPadLeft),
        (gilrs::Button::DPadRight, Button::DPadRight),
    ];

    pub struct Backend {
        gilrs: Gilrs,
        active: Option<GamepadId>,
    }

    impl Backend {
        pub fn new() -> Option<Self> {
            match Gilrs::new() {
                Ok(gilrs) => {
                    let active = gilrs.gamepads().next().map(|(id, pad)| {
                        log::info!("Gamepad: using '{}'", pad.name());
                        id
                    });
                    Some(Self { gilrs, active })
                }
                Err(err) => {
                    log::warn!("Gamepad support unavailable: {err}");
                    None
                }
            }
        }

        pub fn poll(&mut self) -> GamePadState {
            while let Some(event) = self.gilrs.next_event() {
                match event.event {
                    EventType::Connected => {
                        if self.active.is_none() {
                            log::info!(
                                "Gamepad connected: '{}'",
                                self.gilrs.gamepad(event.id).name()
                            );
                            self.active = Some(event.id);
                        }
                    }
                    EventType::Disconnected => {
                        if self.active == Some(event.id) {
                            log::info!("Gamepad disconnected");
                            self.active = self.gilrs.gamepads().next().map(|(id, _)| id);
                        }
                    }
                    _ => {}
                }
            }

            let Some(pad) = self
                .active
                .and_then(|id| self.gilrs.connected_gamepad(id))
            else {
                return GamePadState::disconnected();
            };

            let mut state = GamePadState::connected();
            for &(physical, button) in BUTTON_MAP {
                state.set_button(button, pad.is_pressed(physical));
            }
            state.left_stick = stick(pad.value(Axis::LeftStickX), pad.value(Axis::LeftStickY));
            state.right_stick = stick(pad.value(Axis::RightStickX), pad.value(Axis::RightStickY));
            state
        }
    }

    fn stick(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y).clamp(Vec2::splat(-1.0), Vec2::ONE)
    }
}

pub struct GamepadPoller {
    #[cfg(feature = "gamepad")]
    backend: Option<backend::Backend>,
}

impl GamepadPoller {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "gamepad")]
            backend: backend::Backend::new(),
        }
    }

    pub fn poll(&mut self) -> GamePadState {
        #[cfg(feature = "gamepad")]
        {
            if let Some(backend) = self.backend.as_mut() {
                return backend.poll();
            }
        }
        GamePadState::disconnected()
    }
}

impl Default for GamepadPoller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, feature = "gamepad"))]
mod tests {
    use super::backend::BUTTON_MAP;
    use crt_core::input::Button;
    use std::collections::HashSet;

    #[test]
    fn every_engine_button_is_mapped_once() {
        let engine: Vec<Button> = BUTTON_MAP.iter().map(|&(_, b)| b).collect();
        let unique: HashSet<Button> = engine.iter().copied().collect();
        assert_eq!(engine.len(), unique.len());
        assert_eq!(unique.len(), 17);
    }

    #[test]
    fn face_buttons_follow_xbox_layout() {
        let lookup = |physical: gilrs::Button| {
            BUTTON_MAP
                .iter()
                .find(|&&(p, _)| p == physical)
                .map(|&(_, b)| b)
        };
        assert_eq!(lookup(gilrs::Button::South), Some(Button::A));
        assert_eq!(lookup(gilrs::Button::North), Some(Button::Y));
        assert_eq!(lookup(gilrs::Button::Select), Some(Button::Back));
    }
}
