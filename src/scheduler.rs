//! Per-frame orchestration of the solver and compositor.
//!
//! Each frame walks the same phases:
//!
//! ```text
//! Idle -> Resetting? -> Simulating -> Rendering -> Presenting -> Idle
//! ```
//!
//! Solver steps within a frame form the recurrence `P[n] = F(P[n-1])`, so
//! they are handed to the device as an ordered batch and the valid count is
//! committed only once they have all completed. The compositor therefore
//! always sees a count that includes exactly this frame's growth.
//!
//! Device failures are absorbed here: the remaining phases are skipped and
//! whatever trajectory growth was already committed is kept.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::attractor::AttractorVariant;
use crate::camera::CameraState;
use crate::device::{CompositeParams, ComputeDevice, SolverStep};
use crate::error::{ConfigError, DeviceError};
use crate::point_store::PointStore;

/// Phase the scheduler is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Resetting,
    Simulating,
    Rendering,
    Presenting,
}

/// How a frame ended.
#[derive(Debug)]
pub enum FrameOutcome {
    /// The frame reached the display.
    Presented,
    /// A device failure stopped the frame in `phase`.
    Skipped { phase: FramePhase, error: DeviceError },
}

/// Summary of one frame.
#[derive(Debug)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Seed of the new trajectory if this frame reset the store.
    pub reset: Option<Vec3>,
    /// Points appended by this frame's solver steps.
    pub appended: u32,
    /// Valid points after the frame.
    pub valid_count: u32,
    pub outcome: FrameOutcome,
}

impl FrameReport {
    pub fn presented(&self) -> bool {
        matches!(self.outcome, FrameOutcome::Presented)
    }
}

/// Drives a [`ComputeDevice`] one frame at a time.
pub struct FrameScheduler<D: ComputeDevice> {
    device: D,
    store: PointStore<D::Points>,
    variant: AttractorVariant,
    iterations: u32,
    rng: StdRng,
    phase: FramePhase,
    frame: u64,
    steps: Vec<SolverStep>,
    saturation_logged: bool,
}

impl<D: ComputeDevice> FrameScheduler<D> {
    /// Allocate the point buffer on `device` and seed the first trajectory.
    ///
    /// Rejects a zero `capacity` or zero `iterations`.
    pub fn new(
        mut device: D,
        capacity: u32,
        iterations: u32,
        variant: AttractorVariant,
        rng_seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        let mut rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seed = sample_seed(&mut rng);
        let points = device.allocate_points(capacity);
        let store = PointStore::new(points, seed).map_err(|_| ConfigError::ZeroCapacity)?;
        log::debug!("seeded {} at {:?} (capacity {})", variant, seed, capacity);

        Ok(Self {
            device,
            store,
            variant,
            iterations,
            rng,
            phase: FramePhase::Idle,
            frame: 0,
            steps: Vec::with_capacity(iterations as usize),
            saturation_logged: false,
        })
    }

    /// Run one frame.
    ///
    /// `pending` is the variant of a reset requested since the last frame.
    /// `camera` is this frame's camera; it is copied before any dispatch.
    pub fn run_frame(&mut self, pending: Option<AttractorVariant>, camera: &CameraState) -> FrameReport {
        self.frame += 1;
        let params = CompositeParams::from(camera);

        let reset = pending.map(|variant| {
            self.phase = FramePhase::Resetting;
            self.reset(variant)
        });

        self.phase = FramePhase::Simulating;
        let appended = match self.simulate() {
            Ok(appended) => appended,
            Err(error) => return self.skip(reset, 0, error),
        };

        self.phase = FramePhase::Rendering;
        let target = match self.render(&params) {
            Ok(target) => target,
            Err(error) => return self.skip(reset, appended, error),
        };

        self.phase = FramePhase::Presenting;
        if let Err(error) = self.device.present(target) {
            return self.skip(reset, appended, error);
        }

        self.phase = FramePhase::Idle;
        FrameReport {
            frame: self.frame,
            reset,
            appended,
            valid_count: self.store.valid_count(),
            outcome: FrameOutcome::Presented,
        }
    }

    fn reset(&mut self, variant: AttractorVariant) -> Vec3 {
        let seed = sample_seed(&mut self.rng);
        self.store.seed(seed);
        self.variant = variant;
        self.saturation_logged = false;
        log::info!("reset to {} with seed ({:.3}, {:.3}, {:.3})", variant, seed.x, seed.y, seed.z);
        seed
    }

    fn simulate(&mut self) -> Result<u32, DeviceError> {
        let range = self.store.reserve(self.iterations);
        if range.is_empty() {
            if !self.saturation_logged {
                log::info!(
                    "point store full at {} points, trajectory frozen",
                    self.store.capacity()
                );
                self.saturation_logged = true;
            }
            return Ok(0);
        }

        let variant = self.variant;
        self.steps.clear();
        self.steps
            .extend(range.clone().map(|index| SolverStep { index, variant }));
        self.device.solve(self.store.buffer_mut(), &self.steps)?;

        let appended = range.end - range.start;
        self.store.commit(range);
        Ok(appended)
    }

    fn render(&mut self, params: &CompositeParams) -> Result<D::Target, DeviceError> {
        let mut target = self.device.acquire_target()?;
        self.device.composite(self.store.snapshot(), params, &mut target)?;
        Ok(target)
    }

    fn skip(&mut self, reset: Option<Vec3>, appended: u32, error: DeviceError) -> FrameReport {
        let phase = self.phase;
        log::warn!("frame {} skipped during {:?}: {}", self.frame, phase, error);
        self.phase = FramePhase::Idle;
        FrameReport {
            frame: self.frame,
            reset,
            appended,
            valid_count: self.store.valid_count(),
            outcome: FrameOutcome::Skipped { phase, error },
        }
    }

    /// Current phase; `Idle` between frames.
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Variant of the running trajectory.
    pub fn variant(&self) -> AttractorVariant {
        self.variant
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.iterations = iterations;
    }

    pub fn store(&self) -> &PointStore<D::Points> {
        &self.store
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Draw a trajectory seed with each component uniform in `[1, 2)`.
pub fn sample_seed<R: Rng>(rng: &mut R) -> Vec3 {
    Vec3::new(
        1.0 + rng.gen::<f32>(),
        1.0 + rng.gen::<f32>(),
        1.0 + rng.gen::<f32>(),
    )
}
