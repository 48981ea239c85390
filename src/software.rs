//! Host reference implementation of the compute device.
//!
//! Runs both kernels on the calling thread. The compositor walks the full
//! capacity-sized grid exactly as the GPU kernel does; the solver only runs
//! the invocation that writes, since the others are no-ops by contract.
//! Used by tests and benchmarks, and as the semantic reference the WGSL
//! kernels are checked against.

use glam::Vec3;

use crate::config::WORKGROUP_SIZE;
use crate::device::{CompositeParams, ComputeDevice, SolverStep};
use crate::error::DeviceError;
use crate::point_store::{HostPoints, PointBuffer, PointsView};

/// Square image of per-pixel hit counts.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    side: u32,
    counts: Vec<u32>,
}

impl FrameImage {
    pub fn new(side: u32) -> Self {
        Self {
            side,
            counts: vec![0; (side as usize) * (side as usize)],
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Hit count at pixel `(x, y)`.
    pub fn count(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.side && y < self.side {
            Some(self.counts[(y * self.side + x) as usize])
        } else {
            None
        }
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Sum of all hits.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    fn clear(&mut self) {
        self.counts.fill(0);
    }

    fn accumulate(&mut self, x: u32, y: u32) {
        let i = (y * self.side + x) as usize;
        self.counts[i] = self.counts[i].saturating_add(1);
    }
}

/// Failure injection for exercising the scheduler's skip path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Refuse the next `n` target acquisitions.
    pub unavailable_targets: u32,
    /// Fail the next `n` solver dispatches.
    pub failed_solves: u32,
}

/// Compute device backed by host memory.
#[derive(Debug)]
pub struct SoftwareDevice {
    side: u32,
    grid_size: u32,
    faults: FaultPlan,
    presented: Option<FrameImage>,
    frames_presented: u64,
    solver_dispatches: u64,
}

impl SoftwareDevice {
    /// A device rendering `side`×`side` frames over points stored in
    /// buffers of `capacity`.
    ///
    /// The compositor grid follows the most recent
    /// [`allocate_points`](ComputeDevice::allocate_points) call.
    pub fn new(side: u32, capacity: u32) -> Self {
        Self {
            side,
            grid_size: capacity.div_ceil(WORKGROUP_SIZE) * WORKGROUP_SIZE,
            faults: FaultPlan::default(),
            presented: None,
            frames_presented: 0,
            solver_dispatches: 0,
        }
    }

    pub fn inject_faults(&mut self, faults: FaultPlan) {
        self.faults = faults;
    }

    /// Most recently presented frame.
    pub fn last_frame(&self) -> Option<&FrameImage> {
        self.presented.as_ref()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Total solver steps executed.
    pub fn solver_dispatches(&self) -> u64 {
        self.solver_dispatches
    }

    /// Invocations per dispatch grid.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }
}

impl ComputeDevice for SoftwareDevice {
    type Points = HostPoints;
    type Target = FrameImage;

    fn allocate_points(&mut self, capacity: u32) -> HostPoints {
        self.grid_size = capacity.div_ceil(WORKGROUP_SIZE) * WORKGROUP_SIZE;
        HostPoints::new(capacity)
    }

    fn solve(&mut self, points: &mut HostPoints, steps: &[SolverStep]) -> Result<(), DeviceError> {
        if self.faults.failed_solves > 0 {
            self.faults.failed_solves -= 1;
            return Err(DeviceError::Dispatch("injected solver failure".to_string()));
        }
        for step in steps {
            if step.index == 0 || step.index >= points.capacity() {
                continue;
            }
            let previous = points.read(step.index - 1).unwrap_or(Vec3::ZERO);
            points.write(step.index, step.variant.step(previous));
            self.solver_dispatches += 1;
        }
        Ok(())
    }

    fn acquire_target(&mut self) -> Result<FrameImage, DeviceError> {
        if self.faults.unavailable_targets > 0 {
            self.faults.unavailable_targets -= 1;
            return Err(DeviceError::SurfaceUnavailable(wgpu::SurfaceError::Timeout));
        }
        let mut image = self.presented.take().unwrap_or_else(|| FrameImage::new(self.side));
        image.clear();
        Ok(image)
    }

    fn composite(
        &mut self,
        points: PointsView<'_, HostPoints>,
        params: &CompositeParams,
        target: &mut FrameImage,
    ) -> Result<(), DeviceError> {
        let (sin, cos) = params.angle.sin_cos();
        let valid = points.points();
        for gid in 0..self.grid_size {
            let Some(point) = valid.get(gid as usize) else {
                continue;
            };
            let p = Vec3::from(*point);
            let sx = params.center.x + (p.x * cos - p.z * sin) * params.scale;
            let sy = params.center.y - p.y * params.scale;
            // also rejects NaN from a diverged trajectory
            if !(sx >= 0.0 && sy >= 0.0) {
                continue;
            }
            let (px, py) = (sx as u32, sy as u32);
            if px < target.side && py < target.side {
                target.accumulate(px, py);
            }
        }
        Ok(())
    }

    fn present(&mut self, target: FrameImage) -> Result<(), DeviceError> {
        self.presented = Some(target);
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attractor::AttractorVariant;
    use crate::camera::CameraState;
    use crate::point_store::PointStore;

    #[test]
    fn test_grid_rounds_up_to_workgroups() {
        assert_eq!(SoftwareDevice::new(8, 8).grid_size(), 256);
        assert_eq!(SoftwareDevice::new(8, 300).grid_size(), 512);
    }

    #[test]
    fn test_grid_follows_allocated_buffer() {
        let mut device = SoftwareDevice::new(8, 8);
        let points = device.allocate_points(600);
        assert_eq!(points.capacity(), 600);
        assert_eq!(device.grid_size(), 768);
    }

    #[test]
    fn test_solve_chains_steps() {
        let mut device = SoftwareDevice::new(16, 8);
        let seed = Vec3::new(1.0, 1.0, 1.0);
        let mut store = PointStore::new(HostPoints::new(8), seed).unwrap();
        let v = AttractorVariant::Lorenz;
        let steps: Vec<SolverStep> = (1..4).map(|index| SolverStep { index, variant: v }).collect();
        device.solve(store.buffer_mut(), &steps).unwrap();
        store.commit(1..4);

        assert_eq!(store.get(1), Some(v.step(seed)));
        assert_eq!(store.get(2), Some(v.step(v.step(seed))));
        assert_eq!(store.get(3), Some(v.step(v.step(v.step(seed)))));
    }

    #[test]
    fn test_composite_accumulates_each_valid_point() {
        let mut device = SoftwareDevice::new(64, 16);
        let mut store = PointStore::new(HostPoints::new(16), Vec3::ZERO).unwrap();
        store.append(Vec3::ZERO).unwrap();
        store.append(Vec3::new(0.5, 0.0, 0.0)).unwrap();

        let camera = CameraState::new(64);
        let mut target = device.acquire_target().unwrap();
        device
            .composite(store.snapshot(), &CompositeParams::from(&camera), &mut target)
            .unwrap();

        // two points on the center pixel, one ten pixels to the right
        assert_eq!(target.count(32, 32), Some(2));
        assert_eq!(target.count(42, 32), Some(1));
        assert_eq!(target.total(), 3);
    }

    #[test]
    fn test_composite_clips_offscreen_points() {
        let mut device = SoftwareDevice::new(32, 4);
        let mut store = PointStore::new(HostPoints::new(4), Vec3::new(100.0, 0.0, 0.0)).unwrap();
        store.append(Vec3::new(-100.0, 0.0, 0.0)).unwrap();
        let camera = CameraState::new(32);
        let mut target = device.acquire_target().unwrap();
        device
            .composite(store.snapshot(), &CompositeParams::from(&camera), &mut target)
            .unwrap();
        assert_eq!(target.total(), 0);
    }

    #[test]
    fn test_acquired_target_is_cleared() {
        let mut device = SoftwareDevice::new(8, 4);
        let store = PointStore::new(HostPoints::new(4), Vec3::ZERO).unwrap();
        let params = CompositeParams::from(&CameraState::new(8));
        let mut target = device.acquire_target().unwrap();
        device.composite(store.snapshot(), &params, &mut target).unwrap();
        device.present(target).unwrap();
        assert_eq!(device.last_frame().unwrap().total(), 1);

        let target = device.acquire_target().unwrap();
        assert_eq!(target.total(), 0);
    }

    #[test]
    fn test_injected_faults_are_consumed() {
        let mut device = SoftwareDevice::new(8, 4);
        device.inject_faults(FaultPlan {
            unavailable_targets: 1,
            failed_solves: 0,
        });
        assert!(device.acquire_target().is_err());
        assert!(device.acquire_target().is_ok());
    }
}
