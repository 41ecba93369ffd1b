//! Drone list screen: rows, selection, connection and navigation to the HUD

use crate::error::PilotError;
use crate::sdk::{ConnectionState, ConnectionStateCause, DeviceConnector, DeviceState, Drone, DroneEntry, DroneSdk};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One row of the drone list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneRow {
    pub name: String,
    pub uid: String,
    pub model: String,
    /// `"<state>-<cause>"`
    pub connection: String,
}

impl From<&DroneEntry> for DroneRow {
    fn from(entry: &DroneEntry) -> Self {
        Self {
            name: entry.name.clone(),
            uid: entry.uid.clone(),
            model: entry.model.to_string(),
            connection: entry.state.to_string(),
        }
    }
}

/// Message box shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub message: &'static str,
}

impl Alert {
    pub const NO_CONNECTOR: Alert = Alert {
        title: "No means of connection",
        message: "To connect to your drone, remember to connect to the Anafi WiFi signal first.",
    };
}

/// Request for the drone password after a refused connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPrompt {
    pub uid: String,
    pub connector: DeviceConnector,
}

/// What tapping a row did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Connecting,
    PasswordRequired(PasswordPrompt),
    NoConnector(Alert),
    Disconnecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeEvent {
    ListUpdated(Vec<DroneRow>),
    StateChanged { uid: String, state: DeviceState },
    /// The selected drone just became connected and can be piloted.
    NavigateToHud { uid: String },
}

struct Selection {
    uid: String,
    watcher: JoinHandle<()>,
}

/// Drives the drone list screen. Events go out on the channel returned by
/// [`HomeController::new`].
pub struct HomeController {
    sdk: Arc<dyn DroneSdk>,
    drones: watch::Receiver<Vec<DroneEntry>>,
    events: mpsc::Sender<HomeEvent>,
    selection: Mutex<Option<Selection>>,
    // Survives reselection so that a drone already seen as connected does
    // not navigate again on its first state callback.
    last_state: Arc<Mutex<Option<ConnectionState>>>,
    list_watcher: JoinHandle<()>,
}

impl HomeController {
    /// Must be called from within a tokio runtime.
    pub fn new(sdk: Arc<dyn DroneSdk>, buffer: usize) -> (Self, mpsc::Receiver<HomeEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let drones = sdk.drone_list();
        let list_watcher = tokio::spawn(watch_list(drones.clone(), tx.clone()));

        let controller = Self {
            sdk,
            drones,
            events: tx,
            selection: Mutex::new(None),
            last_state: Arc::new(Mutex::new(None)),
            list_watcher,
        };
        (controller, rx)
    }

    pub fn rows(&self) -> Vec<DroneRow> {
        self.drones.borrow().iter().map(DroneRow::from).collect()
    }

    pub fn row_count(&self) -> usize {
        self.drones.borrow().len()
    }

    pub fn selected_uid(&self) -> Option<String> {
        self.selection.lock().as_ref().map(|s| s.uid.clone())
    }

    /// Handle a tap on row `index`: connect a disconnected drone (asking for
    /// a password after a bad one), disconnect any other.
    pub fn select(&self, index: usize) -> Result<SelectOutcome, PilotError> {
        let entry = self
            .drones
            .borrow()
            .get(index)
            .cloned()
            .ok_or(PilotError::NoSuchRow(index))?;
        let drone = self
            .sdk
            .drone(&entry.uid)
            .ok_or_else(|| PilotError::DroneNotFound(entry.uid.clone()))?;

        self.watch_selected(drone.clone());

        let state = drone.state();
        if state.connection_state != ConnectionState::Disconnected {
            info!("Disconnecting drone {}", entry.uid);
            if !drone.disconnect() {
                warn!("Drone {} refused to disconnect", entry.uid);
                return Err(PilotError::ConnectionRejected(entry.uid));
            }
            return Ok(SelectOutcome::Disconnecting);
        }

        let Some(connector) = state.connectors.first() else {
            warn!("Drone {} has no connector", entry.uid);
            return Ok(SelectOutcome::NoConnector(Alert::NO_CONNECTOR));
        };

        if state.cause == ConnectionStateCause::BadPassword {
            return Ok(SelectOutcome::PasswordRequired(PasswordPrompt {
                uid: entry.uid,
                connector: connector.clone(),
            }));
        }

        connect(drone.as_ref(), connector, None)?;
        Ok(SelectOutcome::Connecting)
    }

    /// Retry the connection behind `prompt` with the password the user typed.
    pub fn submit_password(&self, prompt: &PasswordPrompt, password: &str) -> Result<(), PilotError> {
        let drone = self
            .sdk
            .drone(&prompt.uid)
            .ok_or_else(|| PilotError::DroneNotFound(prompt.uid.clone()))?;
        connect(drone.as_ref(), &prompt.connector, Some(password))
    }

    fn watch_selected(&self, drone: Arc<dyn Drone>) {
        let uid = drone.uid().to_string();
        let watcher = tokio::spawn(watch_state(drone, self.last_state.clone(), self.events.clone()));
        let previous = self.selection.lock().replace(Selection { uid, watcher });
        if let Some(previous) = previous {
            previous.watcher.abort();
        }
    }
}

impl Drop for HomeController {
    fn drop(&mut self) {
        self.list_watcher.abort();
        if let Some(selection) = self.selection.lock().take() {
            selection.watcher.abort();
        }
    }
}

fn connect(drone: &dyn Drone, connector: &DeviceConnector, password: Option<&str>) -> Result<(), PilotError> {
    info!("Connecting drone {} through {}", drone.uid(), connector.uid);
    if drone.connect(connector, password) {
        Ok(())
    } else {
        Err(PilotError::ConnectionRejected(drone.uid().to_string()))
    }
}

async fn watch_list(mut drones: watch::Receiver<Vec<DroneEntry>>, events: mpsc::Sender<HomeEvent>) {
    loop {
        let rows: Vec<DroneRow> = drones.borrow_and_update().iter().map(DroneRow::from).collect();
        if events.send(HomeEvent::ListUpdated(rows)).await.is_err() {
            break;
        }
        if drones.changed().await.is_err() {
            debug!("Drone list closed");
            break;
        }
    }
}

async fn watch_state(
    drone: Arc<dyn Drone>,
    last_state: Arc<Mutex<Option<ConnectionState>>>,
    events: mpsc::Sender<HomeEvent>,
) {
    let uid = drone.uid().to_string();
    let mut states = drone.subscribe_state();
    loop {
        let state = states.borrow_and_update().clone();
        let previous = last_state.lock().replace(state.connection_state);

        let became_connected =
            state.connection_state == ConnectionState::Connected && previous != Some(ConnectionState::Connected);

        let changed = HomeEvent::StateChanged {
            uid: uid.clone(),
            state,
        };
        if events.send(changed).await.is_err() {
            break;
        }

        if became_connected && drone.piloting().is_some() {
            info!("Drone {} connected, opening HUD", uid);
            if events.send(HomeEvent::NavigateToHud { uid: uid.clone() }).await.is_err() {
                break;
            }
        }

        if states.changed().await.is_err() {
            debug!("Drone {} removed", uid);
            break;
        }
    }
}
