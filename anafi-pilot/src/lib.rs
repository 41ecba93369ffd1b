//! anafi-pilot: drone side of the Anafi detection app
//!
//! Contracts for the vendor drone SDK, the drone list screen logic
//! (selection, connection, password prompt, navigation) and the HUD session
//! that owns a connected drone, its manual piloting interface and the
//! detection overlay loop.

pub mod error;
pub mod home;
pub mod hud;
pub mod piloting;
pub mod sdk;

pub use error::PilotError;
pub use home::{Alert, DroneRow, HomeController, HomeEvent, PasswordPrompt, SelectOutcome};
pub use hud::{HudEvent, HudSession};
pub use piloting::{
    ButtonIcon, ManualPiloting, PilotingSnapshot, PilotingState, SmartTakeOffLandAction, StickPosition,
    TakeoffButton,
};
pub use sdk::{
    ConnectionState, ConnectionStateCause, ConnectorTechnology, DeviceConnector, DeviceState, Drone, DroneEntry,
    DroneModel, DroneSdk,
};
