//! Headless movement simulation
//!
//! Spawns a handful of agents on a shared navigation mesh and drives them with
//! seeded random orders, knockbacks and stuns.
//!
//! Usage: `move-agent [config.json] [seed]`

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use move_agent::{ChangeCallbacks, MovementAgent, MovementConfig, StraightLineNav};

const AGENT_COUNT: u32 = 8;
const TOTAL_TICKS: u32 = 1200;
/// Radius around the origin used for random orders (meters)
const ORDER_RADIUS: f32 = 40.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match MovementConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => MovementConfig::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42u64);
    log::info!("Starting headless movement simulation (seed: {})", seed);

    let mesh = Arc::new(config.nav_mesh());
    let mut rng = Pcg32::seed_from_u64(seed);
    let position_events = Rc::new(Cell::new(0u64));
    let velocity_events = Rc::new(Cell::new(0u64));

    let mut agents: Vec<MovementAgent<StraightLineNav>> = (0..AGENT_COUNT)
        .map(|id| {
            let spawn = random_point(&mut rng);
            let nav = StraightLineNav::from_config(mesh.clone(), spawn, &config);
            let mut agent = MovementAgent::new(id, nav, &config);

            let positions = position_events.clone();
            let velocities = velocity_events.clone();
            agent.set_callbacks(
                ChangeCallbacks::default()
                    .with_position_changed(move |_, _| positions.set(positions.get() + 1))
                    .with_velocity_changed(move |_, _| velocities.set(velocities.get() + 1)),
            );
            agent
        })
        .collect();

    for tick in 0..TOTAL_TICKS {
        for agent in agents.iter_mut() {
            if tick % 40 == agent.id() % 40 {
                issue_random_order(agent, &mut rng);
            }
            agent.tick(config.tick_ms);
        }

        if tick % 200 == 0 {
            for agent in &agents {
                match serde_json::to_string(&agent.snapshot()) {
                    Ok(json) => log::info!("tick {}: {}", tick, json),
                    Err(e) => log::warn!("tick {}: snapshot failed: {}", tick, e),
                }
            }
        }
    }

    log::info!(
        "Simulation complete: {} position changes, {} velocity changes",
        position_events.get(),
        velocity_events.get()
    );
}

fn random_point(rng: &mut Pcg32) -> Vec3 {
    Vec3::new(
        rng.random_range(-ORDER_RADIUS..ORDER_RADIUS),
        0.0,
        rng.random_range(-ORDER_RADIUS..ORDER_RADIUS),
    )
}

fn random_direction(rng: &mut Pcg32) -> Vec3 {
    move_agent::heading_to_direction(rng.random_range(-std::f32::consts::PI..std::f32::consts::PI))
}

fn issue_random_order(agent: &mut MovementAgent<StraightLineNav>, rng: &mut Pcg32) {
    let result = match rng.random_range(0..10) {
        0 => agent.force_move_line_along(random_direction(rng), 8.0, 400),
        1 => agent.force_move_sky(random_direction(rng), 3.0, 800),
        2 => {
            agent.immobilize(Some(rng.random_range(200..1500)));
            Ok(())
        }
        3 => {
            agent.request_stop();
            Ok(())
        }
        4 => {
            let heading = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
            agent.request_move_to_direction(heading)
        }
        _ => agent.request_move_to_position(random_point(rng)),
    };
    if let Err(e) = result {
        log::warn!("agent {}: order failed: {}", agent.id(), e);
    }
}
