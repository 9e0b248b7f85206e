use std::time::Instant;

use log::{debug, info, warn};

use crate::error::Result;
use crate::simulation::scenario::Scenario;
use crate::visualization::viewport::Viewport;

/// How often (in ticks) the runner reports progress.
const REPORT_EVERY: u64 = 100;

/// Margin around the view, in normalized units, before a particle is culled.
const CULL_MARGIN: f32 = 0.05;

/// Summary of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub ticks: u64,
    pub seconds: f64,
    pub ups: f64, // committed ticks per wall-clock second
    pub visible: usize, // particles a renderer would draw after the last tick
}

/// Number of particles with at least one visible image.
pub fn visible_count(scenario: &Scenario, viewport: &Viewport) -> usize {
    let world = scenario.world();
    scenario
        .particles()
        .iter()
        .filter(|p| viewport.any_image_visible(&p.position, world, CULL_MARGIN))
        .count()
}

/// Run `ticks` ticks with the engine step, standing in for the render loop.
///
/// Stops at the first rejected tick and returns its error; the scenario
/// keeps the last committed state.
pub fn run_headless(scenario: &mut Scenario, ticks: u64) -> Result<RunReport> {
    let viewport = scenario.viewport.unwrap_or_default();
    info!("run_headless: {} particles, {} ticks, dt {}", scenario.particles().len(), ticks, scenario.engine.dt());

    let start = Instant::now();
    let mut window = Instant::now();
    for i in 1..=ticks {
        if let Err(e) = scenario.step() {
            warn!("run stopped after {} ticks", i - 1);
            return Err(e);
        }
        if i % REPORT_EVERY == 0 {
            let ups = REPORT_EVERY as f64 / window.elapsed().as_secs_f64();
            window = Instant::now();
            debug!(
                "tick {i}: t = {:.3}, {:.1} ups, {} visible",
                scenario.time(),
                ups,
                visible_count(scenario, &viewport)
            );
        }
    }

    let seconds = start.elapsed().as_secs_f64();
    let report = RunReport {
        ticks,
        seconds,
        ups: if seconds > 0.0 { ticks as f64 / seconds } else { 0.0 },
        visible: visible_count(scenario, &viewport),
    };
    info!("finished {} ticks in {:.3} s ({:.1} ups)", report.ticks, report.seconds, report.ups);
    Ok(report)
}
