//! The compute-device seam.
//!
//! The frame scheduler drives two kernels through this trait: the solver,
//! which extends the trajectory one point per step, and the compositor,
//! which projects every valid point into a frame target. Both are
//! dispatched over a grid sized to the point capacity; invocations outside
//! the work of a dispatch return immediately.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::attractor::AttractorVariant;
use crate::camera::CameraState;
use crate::error::DeviceError;
use crate::point_store::{PointBuffer, PointsView};

/// One solver dispatch: read `points[index - 1]`, write `points[index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverStep {
    pub index: u32,
    pub variant: AttractorVariant,
}

/// Solver parameters as laid out in the kernel's uniform slot.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct SolverUniforms {
    pub point_index: u32,
    pub variant: u32,
    pub _padding: [u32; 2],
}

impl From<SolverStep> for SolverUniforms {
    fn from(step: SolverStep) -> Self {
        Self {
            point_index: step.index,
            variant: step.variant.device_index(),
            _padding: [0; 2],
        }
    }
}

/// Per-frame compositor inputs, copied from the camera before the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParams {
    pub angle: f32,
    pub scale: f32,
    pub center: Vec2,
}

impl From<&CameraState> for CompositeParams {
    fn from(camera: &CameraState) -> Self {
        Self {
            angle: camera.angle,
            scale: camera.scale(),
            center: camera.center(),
        }
    }
}

/// Compositor parameters as laid out in the kernel's uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct CompositeUniforms {
    pub center: [f32; 2],
    pub angle: f32,
    pub scale: f32,
    pub point_count: u32,
    pub width: u32,
    pub height: u32,
    pub _padding: u32,
}

impl CompositeUniforms {
    pub fn new(params: &CompositeParams, point_count: u32, width: u32, height: u32) -> Self {
        Self {
            center: params.center.to_array(),
            angle: params.angle,
            scale: params.scale,
            point_count,
            width,
            height,
            _padding: 0,
        }
    }
}

/// A device able to run the solver and compositor kernels.
pub trait ComputeDevice {
    /// Point storage living on this device.
    type Points: PointBuffer;
    /// A writable, presentable frame image.
    type Target;

    /// Allocate the fixed-capacity point buffer. Called once at startup.
    fn allocate_points(&mut self, capacity: u32) -> Self::Points;

    /// Run `steps` in order. Each step observes the point written by the
    /// step before it. Returns once every step has completed.
    fn solve(&mut self, points: &mut Self::Points, steps: &[SolverStep]) -> Result<(), DeviceError>;

    /// Acquire and clear the frame target for this frame.
    fn acquire_target(&mut self) -> Result<Self::Target, DeviceError>;

    /// Project and accumulate `points` into `target`. Returns once the
    /// dispatch has completed.
    fn composite(
        &mut self,
        points: PointsView<'_, Self::Points>,
        params: &CompositeParams,
        target: &mut Self::Target,
    ) -> Result<(), DeviceError>;

    /// Hand a finished target to the display.
    fn present(&mut self, target: Self::Target) -> Result<(), DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layouts_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<SolverUniforms>(), 16);
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 32);
    }

    #[test]
    fn test_solver_uniforms_from_step() {
        let u = SolverUniforms::from(SolverStep {
            index: 42,
            variant: AttractorVariant::Hadley,
        });
        assert_eq!(u.point_index, 42);
        assert_eq!(u.variant, 4);
    }
}
