//! Contracts of the vendor drone SDK
//!
//! Observation is modeled as subscriptions: every observable piece of SDK
//! state is handed out as a `watch::Receiver` carrying the latest snapshot.
//! A drone that disappears from the SDK closes its state channel.

use crate::piloting::{ManualPiloting, PilotingSnapshot};
use anafi_eye::FrameSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Why the drone reached its current connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStateCause {
    None,
    UserRequest,
    ConnectionLost,
    RefusedByDevice,
    BadPassword,
    Failure,
}

impl fmt::Display for ConnectionStateCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStateCause::None => "none",
            ConnectionStateCause::UserRequest => "userRequest",
            ConnectionStateCause::ConnectionLost => "connectionLost",
            ConnectionStateCause::RefusedByDevice => "refusedByDevice",
            ConnectionStateCause::BadPassword => "badPassword",
            ConnectionStateCause::Failure => "failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorTechnology {
    Wifi,
    Usb,
    Ble,
}

/// A way of reaching the drone: directly over wifi, or through a controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceConnector {
    pub uid: String,
    pub technology: ConnectorTechnology,
}

impl DeviceConnector {
    pub fn new(uid: impl Into<String>, technology: ConnectorTechnology) -> Self {
        Self {
            uid: uid.into(),
            technology,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub connection_state: ConnectionState,
    pub cause: ConnectionStateCause,
    pub connectors: Vec<DeviceConnector>,
}

impl DeviceState {
    pub fn disconnected(connectors: Vec<DeviceConnector>) -> Self {
        Self {
            connection_state: ConnectionState::Disconnected,
            cause: ConnectionStateCause::None,
            connectors,
        }
    }

    pub fn with(&self, connection_state: ConnectionState, cause: ConnectionStateCause) -> Self {
        Self {
            connection_state,
            cause,
            connectors: self.connectors.clone(),
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.connection_state, self.cause)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DroneModel {
    Anafi4k,
    AnafiThermal,
    AnafiUsa,
    AnafiAi,
    Unknown,
}

impl fmt::Display for DroneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DroneModel::Anafi4k => "anafi4k",
            DroneModel::AnafiThermal => "anafiThermal",
            DroneModel::AnafiUsa => "anafiUsa",
            DroneModel::AnafiAi => "anafiAi",
            DroneModel::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One drone as seen in the SDK's list of known and discovered drones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneEntry {
    pub uid: String,
    pub name: String,
    pub model: DroneModel,
    pub state: DeviceState,
}

/// Entry point of the vendor SDK
pub trait DroneSdk: Send + Sync {
    /// Live list of known and discovered drones.
    fn drone_list(&self) -> watch::Receiver<Vec<DroneEntry>>;

    fn drone(&self, uid: &str) -> Option<Arc<dyn Drone>>;
}

/// A drone handle obtained from the SDK
pub trait Drone: Send + Sync {
    fn uid(&self) -> &str;

    fn state(&self) -> DeviceState;

    /// Connection state updates. The channel closes when the drone is removed.
    fn subscribe_state(&self) -> watch::Receiver<DeviceState>;

    /// Start connecting. Returns false when the request was refused outright.
    fn connect(&self, connector: &DeviceConnector, password: Option<&str>) -> bool;

    fn disconnect(&self) -> bool;

    /// Manual copter piloting interface, when the drone exposes one.
    fn piloting(&self) -> Option<Arc<dyn ManualPiloting>>;

    /// Piloting interface state; `None` while it is unavailable.
    fn subscribe_piloting(&self) -> watch::Receiver<Option<PilotingSnapshot>>;

    /// Live camera stream, once the stream server is up.
    fn live_stream(&self) -> Option<Arc<dyn FrameSource>>;
}
