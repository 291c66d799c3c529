// Local planner simulation
//
// Flies a vehicle through a field of pillars toward a goal, running one
// planning cycle per step on a noisy synthetic depth cloud.
//
// usage: local_planner_sim [config.toml]
// RUST_LOG=debug shows the per-cycle summaries.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use local_planner::common::{PointCloud, PolarPoint, Pose3D};
use local_planner::config::PlannerConfig;
use local_planner::geometry::{polar_to_cartesian, DEG_TO_RAD};
use local_planner::planner::{LocalPlanner, PlannerInput};
use local_planner::utils::PolarPlot;

const STEP: f64 = 0.5;
const MAX_CYCLES: usize = 80;
const GOAL_TOLERANCE: f64 = 1.0;

struct Pillar {
    x: f64,
    y: f64,
    radius: f64,
    height: f64,
}

fn scene() -> Vec<Pillar> {
    vec![
        Pillar { x: 0.3, y: 8.0, radius: 0.8, height: 5.0 },
        Pillar { x: -2.5, y: 12.0, radius: 0.6, height: 5.0 },
        Pillar { x: 2.0, y: 16.0, radius: 0.7, height: 5.0 },
        Pillar { x: -0.5, y: 21.0, radius: 1.0, height: 5.0 },
    ]
}

// Surface samples of every pillar, with range noise
fn sense(pillars: &[Pillar], noise: &Normal<f64>, rng: &mut StdRng) -> PointCloud {
    let mut cloud = PointCloud::new();
    for p in pillars {
        let n_height = (p.height / 0.2) as usize;
        for (k, h) in itertools::iproduct!(0..36, 0..=n_height) {
            let a = (k * 10) as f64 * DEG_TO_RAD;
            let r = p.radius + noise.sample(rng);
            cloud.push(Vector3::new(p.x + r * a.cos(), p.y + r * a.sin(), 0.2 * h as f64));
        }
    }
    cloud
}

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match PlannerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}, using defaults", path, e);
                PlannerConfig::default()
            }
        },
        None => PlannerConfig::default(),
    };

    let mut planner = LocalPlanner::new(config);
    let pillars = scene();
    let noise = match Normal::new(0.0, 0.02) {
        Ok(n) => n,
        Err(e) => {
            log::error!("Invalid sensor noise: {}", e);
            return;
        }
    };
    let mut rng = StdRng::seed_from_u64(7);

    let goal = Vector3::new(0.0, 28.0, 2.0);
    let mut pose = Pose3D::new(Vector3::new(0.0, 0.0, 2.0), std::f64::consts::FRAC_PI_2, 0.0);
    let mut last_sent_waypoint = goal;
    let mut last_output = None;

    for cycle in 0..MAX_CYCLES {
        let input = PlannerInput::new(pose, goal)
            .with_clouds(vec![sense(&pillars, &noise, &mut rng)])
            .with_last_sent_waypoint(last_sent_waypoint);
        let output = planner.run_cycle(&input);

        let best = match output.best_candidate() {
            Some(best) => *best,
            None => break,
        };
        let step = PolarPoint::new(best.elevation(), best.azimuth(), STEP);
        let next = polar_to_cartesian(&step, &pose.position);
        println!(
            "cycle {:2}: pos ({:6.2}, {:6.2}, {:5.2}) -> e {:6.1} z {:6.1} cost {:8.2}, backoff {}",
            cycle,
            pose.position.x,
            pose.position.y,
            pose.position.z,
            best.elevation(),
            best.azimuth(),
            best.cost,
            output.counter_backoff
        );

        last_sent_waypoint = next;
        pose = Pose3D::new(next, (90.0 - best.azimuth()) * DEG_TO_RAD, 0.0);
        last_output = Some(output);

        if (goal - pose.position).norm() < GOAL_TOLERANCE {
            println!("Goal reached after {} cycles", cycle + 1);
            break;
        }
    }

    if let Some(output) = last_output {
        println!("Last combined histogram (top row = +90 deg elevation):");
        print!("{}", output.histogram);

        let mut plot = PolarPlot::new("Local planner cost");
        plot.plot_cost_matrix(&output.cost_matrix)
            .plot_histogram(&output.histogram)
            .plot_candidates(&output.candidates);
        if let Err(e) = plot.save_svg("./local_planner.svg") {
            log::warn!("Could not save plot: {}", e);
        }
    }
}
