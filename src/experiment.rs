//! Run an [`ExperimentPlan`] against a controller.

use crate::adapters::Transport;
use crate::config::ExperimentPlan;
use crate::controller::LightController;
use crate::error::{LightError, LightResult};
use crate::pulse::PulseParams;
use tracing::info;

/// Register every pulse, send every link, then start the measurement.
///
/// Blocks until the device reports inactive when the plan asks to wait.
pub fn run_plan<T: Transport>(
    leds: &mut LightController<T>,
    plan: &ExperimentPlan,
) -> LightResult<()> {
    info!(
        "Configuring {} pulses and {} links",
        plan.pulses.len(),
        plan.links.len()
    );

    for pulse in &plan.pulses {
        leds.add_digital_pulse(&pulse.params)?;
    }

    for link in &plan.links {
        let primary = lookup(plan, &link.primary)?;
        let secondary = lookup(plan, &link.secondary)?;
        leds.set_secondary(primary, secondary)?;
    }

    leds.start_measurement(plan.duration_ms)?;

    if plan.wait {
        leds.wait()?;
    }
    Ok(())
}

fn lookup<'a>(plan: &'a ExperimentPlan, name: &str) -> LightResult<&'a PulseParams> {
    plan.pulse(name)
        .ok_or_else(|| LightError::Config(format!("unknown pulse '{}'", name)))
}
