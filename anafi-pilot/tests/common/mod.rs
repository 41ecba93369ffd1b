//! In-memory drone SDK used by the anafi-pilot integration tests

#![allow(dead_code)]

use anafi_eye::{Color, Detection, Detector, FrameSource, Rect, VisionError};
use anafi_pilot::{
    ConnectionState, ConnectionStateCause, ConnectorTechnology, DeviceConnector, DeviceState, Drone, DroneEntry,
    DroneModel, DroneSdk, ManualPiloting, PilotingSnapshot, PilotingState, SmartTakeOffLandAction,
};
use async_trait::async_trait;
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{timeout, Duration};

pub const PASSWORD: &str = "secret";

pub struct SimulatedPiloting {
    snapshot: watch::Sender<Option<PilotingSnapshot>>,
    pub commands: Mutex<Vec<(&'static str, i8)>>,
    pub smart_requests: Mutex<usize>,
}

impl SimulatedPiloting {
    pub fn set(&self, state: PilotingState, smart_action: SmartTakeOffLandAction) {
        self.snapshot.send_replace(Some(PilotingSnapshot { state, smart_action }));
    }
}

impl ManualPiloting for SimulatedPiloting {
    fn snapshot(&self) -> PilotingSnapshot {
        (*self.snapshot.borrow()).unwrap_or(PilotingSnapshot {
            state: PilotingState::Unavailable,
            smart_action: SmartTakeOffLandAction::None,
        })
    }

    fn smart_take_off_land(&self) {
        *self.smart_requests.lock() += 1;
    }

    fn set_pitch(&self, value: i8) {
        self.commands.lock().push(("pitch", value));
    }

    fn set_roll(&self, value: i8) {
        self.commands.lock().push(("roll", value));
    }

    fn set_vertical_speed(&self, value: i8) {
        self.commands.lock().push(("vertical", value));
    }

    fn set_yaw_rotation_speed(&self, value: i8) {
        self.commands.lock().push(("yaw", value));
    }
}

pub struct StillStream {
    pub size: (u32, u32),
    pub playable: bool,
}

#[async_trait]
impl FrameSource for StillStream {
    async fn snapshot(&self) -> Option<RgbaImage> {
        Some(RgbaImage::new(self.size.0, self.size.1))
    }

    fn play(&self) -> bool {
        self.playable
    }
}

pub struct SimulatedDrone {
    uid: String,
    state: Mutex<Option<watch::Sender<DeviceState>>>,
    last_state: Mutex<DeviceState>,
    password: Option<String>,
    pub piloting: Option<Arc<SimulatedPiloting>>,
    piloting_tx: watch::Sender<Option<PilotingSnapshot>>,
    pub stream: Option<Arc<StillStream>>,
    pub connect_calls: Mutex<Vec<(String, Option<String>)>>,
    pub disconnect_calls: Mutex<usize>,
    pub refuse_disconnect: Mutex<bool>,
    list: Arc<watch::Sender<Vec<DroneEntry>>>,
}

impl SimulatedDrone {
    pub fn set_state(&self, connection_state: ConnectionState, cause: ConnectionStateCause) {
        let next = self.last_state.lock().with(connection_state, cause);
        *self.last_state.lock() = next.clone();
        if let Some(tx) = self.state.lock().as_ref() {
            tx.send_replace(next.clone());
        }
        let uid = self.uid.clone();
        self.list.send_modify(|entries| {
            if let Some(entry) = entries.iter_mut().find(|e| e.uid == uid) {
                entry.state = next;
            }
        });
    }

    /// Drop the state channel, as the SDK does when a drone is forgotten.
    pub fn remove(&self) {
        self.state.lock().take();
    }
}

impl Drone for SimulatedDrone {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn state(&self) -> DeviceState {
        self.last_state.lock().clone()
    }

    fn subscribe_state(&self) -> watch::Receiver<DeviceState> {
        match self.state.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            // Already removed: hand out a closed channel.
            None => watch::channel(self.state()).1,
        }
    }

    fn connect(&self, connector: &DeviceConnector, password: Option<&str>) -> bool {
        self.connect_calls
            .lock()
            .push((connector.uid.clone(), password.map(str::to_string)));
        self.set_state(ConnectionState::Connecting, ConnectionStateCause::UserRequest);
        match (&self.password, password) {
            (Some(expected), Some(given)) if expected == given => {
                self.set_state(ConnectionState::Connected, ConnectionStateCause::UserRequest)
            }
            (Some(_), _) => self.set_state(ConnectionState::Disconnected, ConnectionStateCause::BadPassword),
            (None, _) => self.set_state(ConnectionState::Connected, ConnectionStateCause::UserRequest),
        }
        true
    }

    fn disconnect(&self) -> bool {
        *self.disconnect_calls.lock() += 1;
        if *self.refuse_disconnect.lock() {
            return false;
        }
        self.set_state(ConnectionState::Disconnecting, ConnectionStateCause::UserRequest);
        self.set_state(ConnectionState::Disconnected, ConnectionStateCause::UserRequest);
        true
    }

    fn piloting(&self) -> Option<Arc<dyn ManualPiloting>> {
        self.piloting.clone().map(|p| p as Arc<dyn ManualPiloting>)
    }

    fn subscribe_piloting(&self) -> watch::Receiver<Option<PilotingSnapshot>> {
        self.piloting_tx.subscribe()
    }

    fn live_stream(&self) -> Option<Arc<dyn FrameSource>> {
        self.stream.clone().map(|s| s as Arc<dyn FrameSource>)
    }
}

pub struct DroneSetup {
    pub uid: &'static str,
    pub name: &'static str,
    pub connectors: Vec<DeviceConnector>,
    pub password: Option<&'static str>,
    pub piloting: bool,
    pub stream: Option<StillStream>,
}

impl DroneSetup {
    pub fn anafi(uid: &'static str) -> Self {
        Self {
            uid,
            name: "ANAFI-0001",
            connectors: vec![DeviceConnector::new("local-wifi", ConnectorTechnology::Wifi)],
            password: None,
            piloting: true,
            stream: Some(StillStream {
                size: (640, 480),
                playable: true,
            }),
        }
    }
}

pub struct SimulatedSdk {
    drones: Mutex<HashMap<String, Arc<SimulatedDrone>>>,
    list: Arc<watch::Sender<Vec<DroneEntry>>>,
}

impl SimulatedSdk {
    pub fn new() -> Self {
        Self {
            drones: Mutex::new(HashMap::new()),
            list: Arc::new(watch::channel(Vec::new()).0),
        }
    }

    pub fn add(&self, setup: DroneSetup) -> Arc<SimulatedDrone> {
        let state = DeviceState::disconnected(setup.connectors);
        let (piloting_tx, _) = watch::channel(None);
        let piloting = setup.piloting.then(|| {
            Arc::new(SimulatedPiloting {
                snapshot: piloting_tx.clone(),
                commands: Mutex::new(Vec::new()),
                smart_requests: Mutex::new(0),
            })
        });
        let drone = Arc::new(SimulatedDrone {
            uid: setup.uid.to_string(),
            state: Mutex::new(Some(watch::channel(state.clone()).0)),
            last_state: Mutex::new(state.clone()),
            password: setup.password.map(str::to_string),
            piloting,
            piloting_tx,
            stream: setup.stream.map(Arc::new),
            connect_calls: Mutex::new(Vec::new()),
            disconnect_calls: Mutex::new(0),
            refuse_disconnect: Mutex::new(false),
            list: self.list.clone(),
        });
        self.drones.lock().insert(setup.uid.to_string(), drone.clone());
        self.list.send_modify(|entries| {
            entries.push(DroneEntry {
                uid: setup.uid.to_string(),
                name: setup.name.to_string(),
                model: DroneModel::Anafi4k,
                state,
            })
        });
        drone
    }

    /// Drop the drone handle while leaving its entry in the list.
    pub fn detach(&self, uid: &str) {
        self.drones.lock().remove(uid);
    }

    pub fn forget(&self, uid: &str) {
        if let Some(drone) = self.drones.lock().remove(uid) {
            drone.remove();
        }
        self.list.send_modify(|entries| entries.retain(|e| e.uid != uid));
    }
}

impl DroneSdk for SimulatedSdk {
    fn drone_list(&self) -> watch::Receiver<Vec<DroneEntry>> {
        self.list.subscribe()
    }

    fn drone(&self, uid: &str) -> Option<Arc<dyn Drone>> {
        self.drones.lock().get(uid).cloned().map(|d| d as Arc<dyn Drone>)
    }
}

/// Always finds the same drone in the top-left quarter of the frame.
pub struct QuarterDetector;

impl Detector for QuarterDetector {
    fn detect(&self, frame: &RgbaImage) -> Result<Option<Vec<Detection>>, VisionError> {
        let (w, h) = frame.dimensions();
        Ok(Some(vec![Detection::new(
            Rect::new(0.0, 0.0, w as f64 / 4.0, h as f64 / 4.0),
            "drone",
            0.91,
            Color::rgb(0, 0, 255),
        )]))
    }
}

pub async fn recv_until<T, F>(rx: &mut tokio::sync::mpsc::Receiver<T>, mut wanted: F) -> T
where
    F: FnMut(&T) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Some(event) if wanted(&event) => return event,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
