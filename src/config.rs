//! Engine configuration builder.

use crate::attractor::AttractorVariant;
use crate::camera::{AMBIENT_ROTATION, DEFAULT_SCALE, MAX_SCALE, MIN_SCALE};
use crate::error::ConfigError;

/// Default point capacity. 262144 points at 60 fps and 20 iterations per
/// frame fill in a little under four minutes.
pub const DEFAULT_CAPACITY: u32 = 262_144;
/// Default solver iterations per frame.
pub const DEFAULT_ITERATIONS: u32 = 20;
/// Default side of the square frame image, in pixels.
pub const DEFAULT_RESOLUTION: u32 = 1024;
/// Threads per workgroup for every kernel.
pub const WORKGROUP_SIZE: u32 = 256;
/// Largest workgroup count the device guarantees in one grid dimension.
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// Settings for a [`Session`](crate::Session).
///
/// Use method chaining to configure:
///
/// ```
/// use strange_attractor::{AttractorVariant, EngineConfig};
///
/// let config = EngineConfig::new()
///     .with_capacity(65_536)
///     .with_iterations(40)
///     .with_variant(AttractorVariant::Halvorsen);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fixed point-store capacity.
    pub capacity: u32,
    /// Solver iterations per frame.
    pub iterations: u32,
    /// Side of the square frame image in pixels.
    pub resolution: u32,
    /// Zoom scale at startup.
    pub initial_scale: f32,
    /// Angle added per frame while not panning.
    pub ambient_rotation: f32,
    /// Attractor shown at startup.
    pub variant: AttractorVariant,
    /// Seed for the trajectory seed sampler. `None` draws from entropy.
    pub rng_seed: Option<u64>,
}

impl EngineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            iterations: DEFAULT_ITERATIONS,
            resolution: DEFAULT_RESOLUTION,
            initial_scale: DEFAULT_SCALE,
            ambient_rotation: AMBIENT_ROTATION,
            variant: AttractorVariant::default(),
            rng_seed: None,
        }
    }

    /// Set the point-store capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of sequential solver iterations per frame.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the side of the square frame image.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_initial_scale(mut self, scale: f32) -> Self {
        self.initial_scale = scale;
        self
    }

    pub fn with_ambient_rotation(mut self, radians_per_frame: f32) -> Self {
        self.ambient_rotation = radians_per_frame;
        self
    }

    /// Set the attractor shown at startup.
    pub fn with_variant(mut self, variant: AttractorVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Make trajectory seeds reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Largest capacity a single capacity-sized grid can cover.
    pub fn max_capacity() -> u32 {
        WORKGROUP_SIZE * MAX_WORKGROUPS_PER_DIMENSION
    }

    /// Workgroups in the capacity-sized dispatch grid.
    pub fn workgroups(&self) -> u32 {
        self.capacity.div_ceil(WORKGROUP_SIZE)
    }

    /// Check the configuration before any resources are allocated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.capacity > Self::max_capacity() {
            return Err(ConfigError::CapacityTooLarge {
                capacity: self.capacity,
                max: Self::max_capacity(),
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.initial_scale) {
            return Err(ConfigError::ScaleOutOfRange(self.initial_scale));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.capacity, 262_144);
        assert_eq!(config.iterations, 20);
        assert_eq!(config.initial_scale, 20.0);
        assert_eq!(config.ambient_rotation, 0.005);
        assert_eq!(config.workgroups(), 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            EngineConfig::new().with_capacity(0).validate(),
            Err(ConfigError::ZeroCapacity)
        );
        assert_eq!(
            EngineConfig::new().with_iterations(0).validate(),
            Err(ConfigError::ZeroIterations)
        );
        assert_eq!(
            EngineConfig::new().with_resolution(0).validate(),
            Err(ConfigError::ZeroResolution)
        );
        assert_eq!(
            EngineConfig::new().with_initial_scale(5.0).validate(),
            Err(ConfigError::ScaleOutOfRange(5.0))
        );
        assert!(matches!(
            EngineConfig::new().with_capacity(u32::MAX).validate(),
            Err(ConfigError::CapacityTooLarge { .. })
        ));
    }

    #[test]
    fn test_workgroups_round_up() {
        assert_eq!(EngineConfig::new().with_capacity(8).workgroups(), 1);
        assert_eq!(EngineConfig::new().with_capacity(257).workgroups(), 2);
    }
}
