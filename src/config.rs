//! Configuration for the reflow engine.

use crate::calendar::DEFAULT_GUARD_MAX_STEPS;
use crate::logging::VERBOSITY_SILENT;

/// Knobs for one reflow pass.
#[derive(Clone, Copy, Debug)]
pub struct ReflowConfig {
    /// Step budget handed to every calendar placement in the pass.
    /// Must be positive; small values bound worst-case latency for
    /// pathological constraint sets.
    pub guard_max_steps: u32,
    /// Logging verbosity (0 silent .. 3 debug); see [`crate::logging`].
    pub verbosity: u8,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            guard_max_steps: DEFAULT_GUARD_MAX_STEPS,
            verbosity: VERBOSITY_SILENT,
        }
    }
}
