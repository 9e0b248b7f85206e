//! Fixed-step time integrator for the particle-life system
//!
//! One tick is a single force evaluation followed by a damped explicit Euler
//! update written into the back buffer:
//!
//! - `v' = v * 0.5^(dt / half_life) + F * dt`
//! - `x' = wrap(x + v' * dt)`
//!
//! The back buffer is committed only if every particle stayed finite.

use rayon::prelude::*;

use super::forces::{ForceAccumulator, Interaction};
use super::states::{NVec2, Particle, System};
use crate::error::{ConfigError, Result, SimulationError};

/// Advance `sys` by one step of length `dt` with half-life damping.
///
/// On a non-finite result the published buffer, `sys.t` and `sys.ticks` are
/// left as they were and `NumericDegeneration` names the first bad particle.
pub fn half_life_integrator(
    sys: &mut System,
    accumulator: &(dyn ForceAccumulator + Send + Sync),
    interaction: &Interaction<'_>,
    dt: f32,
    parallel: bool,
) -> Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ConfigError::InvalidTimeStep(dt).into());
    }
    interaction.setting.validate()?;
    let tick = sys.ticks;
    if sys.is_empty() {
        sys.t += dt;
        sys.ticks += 1;
        return Ok(());
    }

    let decay = interaction.setting.decay_factor(dt);
    let world = interaction.world;
    let (front, back, forces, counts) = sys.split_mut();

    // F_i from the frozen front buffer
    accumulator.accumulate(interaction, front, forces, counts);

    let step = |(((next, cur), f), c): (((&mut Particle, &Particle), &NVec2), &u32)| {
        let v = cur.velocity * decay + *f * dt;
        next.color = cur.color;
        next.velocity = v;
        next.position = world.wrap_position(&(cur.position + v * dt));
        next.attractor_count = *c;
    };
    if parallel {
        back.par_iter_mut()
            .zip(front.par_iter())
            .zip(forces.par_iter())
            .zip(counts.par_iter())
            .for_each(step);
    } else {
        back.iter_mut()
            .zip(front.iter())
            .zip(forces.iter())
            .zip(counts.iter())
            .for_each(step);
    }

    if let Some(index) = back.iter().position(|p| !p.is_finite()) {
        return Err(SimulationError::NumericDegeneration { index, tick });
    }

    sys.swap();
    sys.t += dt;
    sys.ticks += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::attraction::AttractionMatrix;
    use crate::simulation::forces::DirectSum;
    use crate::simulation::params::{VelocityUpdateSetting, World};

    #[test]
    fn zero_rules_only_decay() {
        let setting = VelocityUpdateSetting::default();
        let rules = AttractionMatrix::new(1);
        let world = World::toroidal(1.0);
        let interaction = Interaction { setting: &setting, rules: &rules, world: &world };

        let p = Particle::with_velocity(0, NVec2::new(0.0, 0.0), NVec2::new(1.0, 0.0));
        let mut sys = System::new(vec![p]).unwrap();
        let dt = setting.velocity_half_life;
        half_life_integrator(&mut sys, &DirectSum::default(), &interaction, dt, false).unwrap();

        let q = sys.particles()[0];
        assert!((q.velocity.x - 0.5).abs() < 1e-6);
        assert!((q.position.x - 0.5 * dt).abs() < 1e-6);
        assert_eq!(sys.ticks, 1);
    }

    #[test]
    fn positions_wrap_into_the_torus() {
        let setting = VelocityUpdateSetting::default();
        let rules = AttractionMatrix::new(1);
        let world = World::toroidal(1.0);
        let interaction = Interaction { setting: &setting, rules: &rules, world: &world };

        let p = Particle::with_velocity(0, NVec2::new(0.99, 0.0), NVec2::new(10.0, 0.0));
        let mut sys = System::new(vec![p]).unwrap();
        half_life_integrator(&mut sys, &DirectSum::default(), &interaction, 0.01, false).unwrap();
        let x = sys.particles()[0].position.x;
        assert!((-1.0..1.0).contains(&x));
        assert!(x < 0.0);
    }

    #[test]
    fn rejects_bad_time_step() {
        let setting = VelocityUpdateSetting::default();
        let rules = AttractionMatrix::new(1);
        let world = World::default();
        let interaction = Interaction { setting: &setting, rules: &rules, world: &world };
        let mut sys = System::new(vec![Particle::new(0, NVec2::zeros())]).unwrap();

        for dt in [0.0, -0.1, f32::NAN] {
            let err = half_life_integrator(&mut sys, &DirectSum::default(), &interaction, dt, false);
            assert!(matches!(err, Err(SimulationError::Config(ConfigError::InvalidTimeStep(_)))));
        }
        assert_eq!(sys.ticks, 0);
    }

    #[test]
    fn rejects_growing_velocity_setting() {
        let setting = VelocityUpdateSetting {
            velocity_half_life: -0.04,
            ..VelocityUpdateSetting::default()
        };
        let rules = AttractionMatrix::new(1);
        let world = World::default();
        let interaction = Interaction { setting: &setting, rules: &rules, world: &world };
        let p = Particle::with_velocity(0, NVec2::zeros(), NVec2::new(1.0, 0.0));
        let mut sys = System::new(vec![p]).unwrap();

        let err = half_life_integrator(&mut sys, &DirectSum::default(), &interaction, 0.01, false);
        assert!(matches!(err, Err(SimulationError::Config(ConfigError::InvalidHalfLife(_)))));
        assert_eq!(sys.particles()[0], p);
        assert_eq!(sys.ticks, 0);
    }
}
