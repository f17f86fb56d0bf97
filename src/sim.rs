// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Simulated vehicle link and scripted operator for headless runs.
//!
//! Each simulated vehicle circles a point, reports position and attitude at
//! a fixed rate, announces its mission on start and periodically re-reports
//! one mission item with a small shift, the way a vehicle echoes edits.

use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use mapview_core::{
    Coordinate, GroundClock, MapSurface, MapView, OperatorInput, SystemType, TelemetryEvent,
    VehicleId, Waypoint,
};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Radius of each simulated vehicle's orbit.
const ORBIT_RADIUS_M: f64 = 400.0;
/// Angular speed of the orbit in degrees per second.
const ORBIT_DEG_PER_SEC: f64 = 6.0;
/// Spacing between orbit centers of consecutive vehicles.
const VEHICLE_SPACING_M: f64 = 1_500.0;
/// Seconds between re-reported mission items.
const ECHO_PERIOD_SECS: u64 = 5;
/// Shortest tick period; faster rates are capped here.
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Configuration for the simulated feed.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub vehicles: u32,
    pub rate_hz: u32,
    pub origin: Coordinate,
    /// Channel buffer size for telemetry events.
    pub buffer_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            vehicles: 2,
            rate_hz: 10,
            origin: Coordinate::new(47.376_889, 8.548_056),
            buffer_size: 1024,
        }
    }
}

/// Handle to the running simulation task.
pub struct SimFeed {
    event_rx: mpsc::Receiver<TelemetryEvent>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for SimFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimFeed")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl SimFeed {
    /// Spawn the simulation on the current tokio runtime.
    #[must_use]
    pub fn spawn(config: SimConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size.max(1));
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            sim_loop(config, event_tx, task_cancel).await;
        });

        Self {
            event_rx,
            cancel_token,
        }
    }

    /// Receive the next telemetry event, or `None` once the feed stopped.
    pub async fn recv(&mut self) -> Option<TelemetryEvent> {
        self.event_rx.recv().await
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for SimFeed {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

struct SimVehicle {
    id: VehicleId,
    center: Coordinate,
    phase_deg: f64,
    mission: Vec<Waypoint>,
}

impl SimVehicle {
    fn new(id: VehicleId, origin: Coordinate) -> Self {
        let center = origin.destination(90.0, VEHICLE_SPACING_M * f64::from(id - 1));
        let mission = [0.0, 90.0, 180.0, 270.0]
            .iter()
            .enumerate()
            .map(|(i, bearing)| Waypoint::new(i, center.destination(*bearing, ORBIT_RADIUS_M), 120.0))
            .collect();
        Self {
            id,
            center,
            phase_deg: 0.0,
            mission,
        }
    }

    fn position(&self) -> Coordinate {
        self.center.destination(self.phase_deg, ORBIT_RADIUS_M)
    }

    fn system_type(&self) -> SystemType {
        if self.id % 2 == 0 {
            SystemType::FixedWing
        } else {
            SystemType::Quadrotor
        }
    }
}

/// Tick period for `rate_hz` reports per second, never zero.
fn tick_period(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1))).max(MIN_TICK_PERIOD)
}

fn timestamp_us() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
}

async fn sim_loop(
    config: SimConfig,
    event_tx: mpsc::Sender<TelemetryEvent>,
    cancel_token: CancellationToken,
) {
    let mut vehicles: Vec<SimVehicle> = (1..=config.vehicles)
        .map(|id| SimVehicle::new(id, config.origin))
        .collect();
    let rate_hz = config.rate_hz.max(1);
    let step_deg = ORBIT_DEG_PER_SEC / f64::from(rate_hz);
    let echo_every = ECHO_PERIOD_SECS * u64::from(rate_hz);

    let mut startup = Vec::new();
    for vehicle in &vehicles {
        startup.push(TelemetryEvent::Heartbeat {
            vehicle_id: vehicle.id,
            system_type: vehicle.system_type(),
        });
        startup.push(TelemetryEvent::WaypointList {
            vehicle_id: vehicle.id,
            waypoints: vehicle.mission.clone(),
        });
    }
    for event in startup {
        if event_tx.send(event).await.is_err() {
            return; // Receiver dropped
        }
    }
    info!("Simulating {} vehicles at {} Hz", vehicles.len(), rate_hz);

    let mut ticker = interval(tick_period(rate_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Simulation cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }
        tick += 1;

        for vehicle in &mut vehicles {
            vehicle.phase_deg = (vehicle.phase_deg + step_deg) % 360.0;
            let position = vehicle.position();
            let events = [
                TelemetryEvent::GlobalPosition {
                    vehicle_id: vehicle.id,
                    latitude: position.lat,
                    longitude: position.lon,
                    altitude: 120.0,
                    timestamp_us: timestamp_us(),
                },
                TelemetryEvent::Attitude {
                    vehicle_id: vehicle.id,
                    roll: 0.0,
                    pitch: 0.0,
                    yaw: (vehicle.phase_deg + 90.0) % 360.0,
                    timestamp_us: timestamp_us(),
                },
            ];
            for event in events {
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }

            if tick % echo_every == 0 {
                let len = vehicle.mission.len();
                let index = usize::try_from(tick / echo_every).unwrap_or(0) % len.max(1);
                if let Some(item) = vehicle.mission.get_mut(index) {
                    item.coordinate = item.coordinate.destination(45.0, 20.0);
                    debug!("Vehicle {} re-reports waypoint {}", vehicle.id, index);
                    let event = TelemetryEvent::WaypointChanged {
                        vehicle_id: vehicle.id,
                        waypoint: item.clone(),
                    };
                    if event_tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Scripted operator: one gesture sequence per call to [`OperatorScript::step`].
#[derive(Debug, Default)]
pub struct OperatorScript {
    step: u32,
}

impl OperatorScript {
    /// Perform the next scripted action. Returns `false` once the script is done.
    pub fn step<S: MapSurface, C: GroundClock>(&mut self, map: &mut MapView<S, C>) -> bool {
        self.step += 1;
        match self.step {
            2 => {
                info!("Operator arms path creation and appends two waypoints");
                map.set_create_path(true);
                let anchor = map.view().center;
                for bearing in [30.0, 60.0] {
                    map.handle_input(OperatorInput::MapClicked {
                        coordinate: anchor.offset_nm(bearing, 0.5),
                    });
                }
            }
            4 => {
                let Some(proxy) = map.sync().proxy(0).cloned() else {
                    return true;
                };
                info!("Operator drags waypoint 0");
                map.handle_input(OperatorInput::GeometryClicked { id: proxy.icon });
                let target = proxy.coordinate.destination(180.0, 150.0);
                map.handle_input(OperatorInput::GeometryDragged {
                    id: proxy.icon,
                    coordinate: proxy.coordinate.destination(180.0, 75.0),
                });
                map.handle_input(OperatorInput::GeometryDragEnded {
                    id: proxy.icon,
                    coordinate: target,
                });
            }
            5 => {
                map.set_create_path(false);
                map.handle_input(OperatorInput::Wheel { delta: -240 });
            }
            7 => {
                if let Some(other) = map.fleet().ids().into_iter().find(|id| Some(*id) != map.active_vehicle()) {
                    info!("Operator switches to vehicle {}", other);
                    if let Err(e) = map.select_vehicle(other) {
                        info!("Vehicle switch failed: {}", e);
                    }
                }
            }
            9 => {
                map.clear_trails();
                map.handle_input(OperatorInput::Wheel { delta: 240 });
            }
            _ => {}
        }
        self.step < 10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_tick_period_is_never_zero() {
        assert_eq!(tick_period(10), Duration::from_millis(100));
        assert_eq!(tick_period(0), Duration::from_secs(1));
        assert_eq!(tick_period(1_000), Duration::from_millis(1));
        assert_eq!(tick_period(2_000), MIN_TICK_PERIOD);
        assert_eq!(tick_period(u32::MAX), MIN_TICK_PERIOD);
    }

    #[tokio::test]
    async fn test_feed_keeps_running_above_one_khz() {
        let mut feed = SimFeed::spawn(SimConfig {
            vehicles: 1,
            rate_hz: 2_000,
            ..Default::default()
        });

        // heartbeat + mission, then position/attitude pairs
        let mut positions = 0;
        for _ in 0..12 {
            let event = timeout(Duration::from_secs(2), feed.recv())
                .await
                .expect("feed stalled")
                .expect("feed stopped");
            if matches!(event, TelemetryEvent::GlobalPosition { .. }) {
                positions += 1;
            }
        }
        assert_eq!(positions, 5);
        feed.shutdown();
    }
}
