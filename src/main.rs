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

//! Headless ground station map view.
//!
//! Runs the map view core against a simulated vehicle feed and a scripted
//! operator, logging what would be drawn.

mod config;
mod log_surface;
mod sim;

use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use mapview_core::{Layer, MapView};
use tokio::time::{interval, sleep};

use config::AppConfig;
use log_surface::LogSurface;
use sim::{OperatorScript, SimConfig, SimFeed};

#[derive(Parser, Debug)]
#[command(name = "gcs-mapview")]
#[command(about = "Headless ground station map view with a simulated vehicle feed", long_about = None)]
struct Args {
    /// Re-center the map on the active vehicle
    #[arg(long)]
    follow: Option<bool>,

    /// Draw vehicle trails
    #[arg(long)]
    trails: Option<bool>,

    /// Number of simulated vehicles
    #[arg(long)]
    vehicles: Option<u32>,

    /// Position reports per second per vehicle
    #[arg(long)]
    rate_hz: Option<u32>,

    /// Stop after this many seconds
    #[arg(long, default_value = "15")]
    duration_secs: u64,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut app_config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    if let Some(follow) = args.follow {
        app_config.follow_vehicle = follow;
    }
    if let Some(trails) = args.trails {
        app_config.show_trails = trails;
    }
    if let Some(vehicles) = args.vehicles {
        app_config.sim_vehicles = vehicles;
    }
    if let Some(rate_hz) = args.rate_hz {
        app_config.sim_rate_hz = rate_hz;
    }

    if args.save_config {
        match app_config.save() {
            Ok(()) => {
                if let Ok(path) = AppConfig::get_config_path() {
                    info!("Saved configuration to {}", path.display());
                }
            }
            Err(e) => warn!("Failed to save config: {}", e),
        }
    }

    let map_config = app_config.to_map_view_config();
    let mut map = MapView::new(LogSurface::default(), map_config.clone());
    let mut feed = SimFeed::spawn(SimConfig {
        vehicles: app_config.sim_vehicles,
        rate_hz: app_config.sim_rate_hz,
        origin: map_config.default_center,
        ..Default::default()
    });

    let mut script = OperatorScript::default();
    let mut script_running = true;
    let mut operator_tick = interval(Duration::from_secs(1));
    let deadline = sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    info!("Map view running for {} seconds", args.duration_secs);

    loop {
        tokio::select! {
            event = feed.recv() => match event {
                Some(event) => map.handle_telemetry(event),
                None => {
                    warn!("Simulated feed stopped");
                    break;
                }
            },
            _ = operator_tick.tick() => {
                if script_running {
                    script_running = script.step(&mut map);
                }
                match map.take_pending_uploads() {
                    Ok(waypoints) if !waypoints.is_empty() => {
                        for wp in &waypoints {
                            info!("Uploading waypoint {} at {} alt {:.0} m", wp.index, wp.coordinate, wp.altitude);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Upload skipped: {}", e),
                }
            }
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    feed.shutdown();

    let surface = map.surface().surface();
    info!(
        "Done: {} vehicles, {} tracks, {} waypoint proxies for vehicle {:?}",
        map.fleet().len(),
        map.tracks().len(),
        map.sync().proxy_count(),
        map.active_vehicle()
    );
    info!(
        "Surface: {} waypoint-layer geometries, {} trails, {} region redraws, {} full redraws, {} recenters",
        surface.count_on(Layer::Waypoints),
        surface.count_on(Layer::Tracking),
        surface.region_redraws(),
        surface.full_redraws(),
        surface.recenters()
    );
}
