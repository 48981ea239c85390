//! # Strange Attractor
//!
//! Real-time strange attractors on the GPU.
//!
//! A single trajectory of a chaotic vector field is extended a fixed number
//! of steps every frame, each step computed from the one before it, and the
//! whole accumulated trajectory is projected into a rotating, zoomable
//! point cloud.
//!
//! ## Quick Start
//!
//! ```ignore
//! use strange_attractor::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     run(EngineConfig::new().with_variant(AttractorVariant::Rossler))
//! }
//! ```
//!
//! ## Headless frames
//!
//! The frame loop is generic over a [`ComputeDevice`]. [`SoftwareDevice`]
//! runs both kernels on the host and is what the tests drive:
//!
//! ```
//! use strange_attractor::prelude::*;
//!
//! let config = EngineConfig::new()
//!     .with_capacity(1024)
//!     .with_iterations(20)
//!     .with_resolution(128)
//!     .with_rng_seed(1);
//! let device = SoftwareDevice::new(config.resolution, config.capacity);
//! let mut session = Session::new(&config, device).unwrap();
//!
//! session.frame();
//! assert_eq!(session.store().valid_count(), 21);
//!
//! session.select_by_name("Halvorsen").unwrap();
//! let report = session.frame();
//! assert!(report.reset.is_some());
//! assert_eq!(session.store().valid_count(), 21);
//! ```
//!
//! ## Frame anatomy
//!
//! | Phase      | Work                                                       |
//! |------------|------------------------------------------------------------|
//! | Resetting  | only after a new selection: fresh seed at index 0          |
//! | Simulating | `iterations` solver steps, strictly in order               |
//! | Rendering  | one compositor pass over every valid point                 |
//! | Presenting | hand the frame to the display                              |
//!
//! After the frame the camera turns by the ambient rotation unless the user
//! is dragging. Device failures skip the rest of the frame; points already
//! appended are kept.
//!
//! ## Attractors
//!
//! | Variant      | Parameters                   |
//! |--------------|------------------------------|
//! | Lorenz       | sigma 10, rho 28, beta 8/3   |
//! | Chen Lee     | alpha 5, beta -10, delta -0.38 |
//! | Halvorsen    | a 1.4                        |
//! | Lü Chen      | a 36, b 3, c 20              |
//! | Hadley       | a 0.2, b 4, f 8, g 1         |
//! | Rössler      | a 0.2, b 0.2, c 5.7          |
//! | Lorenz Mod 2 | a 0.9, b 5, c 9.9, d 1       |

pub mod attractor;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod device;
pub mod error;
pub mod gesture;
mod gpu;
pub mod point_store;
pub mod scheduler;
pub mod session;
mod shader;
pub mod software;
pub mod time;
mod window;

pub use attractor::AttractorVariant;
pub use camera::CameraState;
pub use catalog::AttractorCatalog;
pub use config::EngineConfig;
pub use device::{CompositeParams, ComputeDevice, SolverStep};
pub use error::{AppError, CapacityExhausted, ConfigError, DeviceError, GpuError, SelectionError};
pub use gesture::{Gesture, GestureController, GesturePhase, GestureState};
pub use glam::{Vec2, Vec3};
pub use gpu::{GpuDevice, GpuFrame, GpuPoints};
pub use point_store::{HostPoints, PointBuffer, PointStore, PointsView};
pub use scheduler::{FrameOutcome, FramePhase, FrameReport, FrameScheduler};
pub use session::{InputEvent, Session};
pub use software::{FaultPlan, FrameImage, SoftwareDevice};
pub use window::run;

/// Convenient re-exports for common usage.
///
/// This imports:
/// - [`run`] - open the viewer
/// - [`EngineConfig`] - the configuration builder
/// - [`Session`] - the frame loop
/// - [`AttractorVariant`] - the attractor catalog
/// - [`SoftwareDevice`] - the host device
/// - [`Vec2`], [`Vec3`] - glam vector types
pub mod prelude {
    pub use crate::attractor::AttractorVariant;
    pub use crate::camera::CameraState;
    pub use crate::config::EngineConfig;
    pub use crate::device::ComputeDevice;
    pub use crate::error::AppError;
    pub use crate::gesture::{Gesture, GesturePhase};
    pub use crate::scheduler::FrameReport;
    pub use crate::session::{InputEvent, Session};
    pub use crate::software::SoftwareDevice;
    pub use crate::window::run;
    pub use crate::{Vec2, Vec3};
}
