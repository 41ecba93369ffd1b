//! Manual copter piloting: joystick mapping and the takeoff/land button

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PilotingState {
    Unavailable,
    Idle,
    Active,
}

/// What a smart takeoff/land request would do right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmartTakeOffLandAction {
    None,
    TakeOff,
    ThrownTakeOff,
    Land,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotingSnapshot {
    pub state: PilotingState,
    pub smart_action: SmartTakeOffLandAction,
}

/// Manual copter piloting interface of the SDK.
///
/// Piloting commands are percentages in [-100, 100].
pub trait ManualPiloting: Send + Sync {
    fn snapshot(&self) -> PilotingSnapshot;

    /// Take off, land, or arm a thrown takeoff, depending on the flight state.
    fn smart_take_off_land(&self);

    fn set_pitch(&self, value: i8);

    fn set_roll(&self, value: i8);

    fn set_vertical_speed(&self, value: i8);

    fn set_yaw_rotation_speed(&self, value: i8);
}

/// Virtual joystick position, each axis in [-1, 1], y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StickPosition {
    pub x: f32,
    pub y: f32,
}

impl StickPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

fn percent(axis: f32) -> i8 {
    (axis.clamp(-1.0, 1.0) * 100.0).round() as i8
}

/// Left stick: forward/back tilts the nose (pitch is inverted), sideways rolls.
/// Returns false when piloting is not active and nothing was sent.
pub fn apply_left_stick(piloting: &dyn ManualPiloting, position: StickPosition) -> bool {
    if piloting.snapshot().state != PilotingState::Active {
        return false;
    }
    piloting.set_pitch(percent(-position.y));
    piloting.set_roll(percent(position.x));
    debug!("Left stick {:?}", position);
    true
}

/// Right stick: up/down climbs or descends, sideways yaws.
/// Returns false when piloting is not active and nothing was sent.
pub fn apply_right_stick(piloting: &dyn ManualPiloting, position: StickPosition) -> bool {
    if piloting.snapshot().state != PilotingState::Active {
        return false;
    }
    piloting.set_vertical_speed(percent(position.y));
    piloting.set_yaw_rotation_speed(percent(position.x));
    debug!("Right stick {:?}", position);
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonIcon {
    TakeOff,
    Land,
    Hand,
}

/// Presentation state of the takeoff/land button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeoffButton {
    pub visible: bool,
    pub enabled: bool,
    pub icon: Option<ButtonIcon>,
}

impl TakeoffButton {
    pub const HIDDEN: TakeoffButton = TakeoffButton {
        visible: false,
        enabled: false,
        icon: None,
    };

    /// Button for the given piloting snapshot. With no smart action available
    /// the button keeps `current_icon` and is disabled.
    pub fn for_snapshot(snapshot: Option<&PilotingSnapshot>, current_icon: Option<ButtonIcon>) -> Self {
        let Some(snapshot) = snapshot.filter(|s| s.state == PilotingState::Active) else {
            return Self {
                icon: current_icon,
                ..Self::HIDDEN
            };
        };

        let icon = match snapshot.smart_action {
            SmartTakeOffLandAction::Land => Some(ButtonIcon::Land),
            SmartTakeOffLandAction::TakeOff => Some(ButtonIcon::TakeOff),
            SmartTakeOffLandAction::ThrownTakeOff => Some(ButtonIcon::Hand),
            SmartTakeOffLandAction::None => current_icon,
        };

        Self {
            visible: true,
            enabled: snapshot.smart_action != SmartTakeOffLandAction::None,
            icon,
        }
    }
}
