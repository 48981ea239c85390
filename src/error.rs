//! Error types for the attractor engine.
//!
//! Setup failures ([`GpuError`], [`ConfigError`], [`AppError`]) abort
//! initialisation. Per-frame failures ([`DeviceError`]) are absorbed by the
//! frame scheduler, which skips the rest of the frame.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter(wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    NoSurfaceFormat,
    /// The point buffer would exceed the device's storage binding limit.
    PointBufferTooLarge { bytes: u64, max: u64 },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter(e) => write!(f, "No compatible GPU adapter found ({}). Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.", e),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::NoSurfaceFormat => write!(f, "Surface exposes no texture formats"),
            GpuError::PointBufferTooLarge { bytes, max } => {
                write!(f, "Point buffer of {} bytes exceeds the device limit of {} bytes", bytes, max)
            }
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::NoAdapter(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoSurfaceFormat | GpuError::PointBufferTooLarge { .. } => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        GpuError::NoAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Frame-scoped device failures.
///
/// None of these are fatal: the scheduler logs them, skips the remaining
/// phases of the frame and tries again on the next tick.
#[derive(Debug)]
pub enum DeviceError {
    /// The display surface had no presentable texture this frame.
    SurfaceUnavailable(wgpu::SurfaceError),
    /// The surface must be reconfigured before it can be used again.
    SurfaceLost,
    /// Submitting or waiting for a dispatch failed.
    Dispatch(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::SurfaceUnavailable(e) => write!(f, "Frame target unavailable: {}", e),
            DeviceError::SurfaceLost => write!(f, "Surface lost or outdated"),
            DeviceError::Dispatch(msg) => write!(f, "Dispatch failed: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::SurfaceUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::SurfaceError> for DeviceError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => DeviceError::SurfaceLost,
            other => DeviceError::SurfaceUnavailable(other),
        }
    }
}

impl From<wgpu::PollError> for DeviceError {
    fn from(e: wgpu::PollError) -> Self {
        DeviceError::Dispatch(e.to_string())
    }
}

/// The point store is full; nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExhausted {
    /// Capacity of the store that refused the write.
    pub capacity: u32,
}

impl fmt::Display for CapacityExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point store is full ({} points)", self.capacity)
    }
}

impl std::error::Error for CapacityExhausted {}

/// Rejected attractor selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Index outside the fixed catalog.
    UnknownVariant(usize),
    /// Name that matches no catalog entry.
    UnknownName(String),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::UnknownVariant(index) => {
                write!(f, "No attractor at index {} (catalog has {} entries)", index, crate::attractor::AttractorVariant::COUNT)
            }
            SelectionError::UnknownName(name) => write!(f, "Unknown attractor '{}'", name),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Point store capacity must be at least one.
    ZeroCapacity,
    /// At least one solver iteration per frame is required.
    ZeroIterations,
    /// The capacity-sized grid would exceed the per-dimension workgroup limit.
    CapacityTooLarge { capacity: u32, max: u32 },
    /// The frame image needs a non-zero side.
    ZeroResolution,
    /// Initial scale must lie inside the clamp range.
    ScaleOutOfRange(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => write!(f, "Point capacity must be greater than zero"),
            ConfigError::ZeroIterations => write!(f, "Iterations per frame must be greater than zero"),
            ConfigError::CapacityTooLarge { capacity, max } => {
                write!(f, "Point capacity {} exceeds the dispatchable maximum of {}", capacity, max)
            }
            ConfigError::ZeroResolution => write!(f, "Frame resolution must be greater than zero"),
            ConfigError::ScaleOutOfRange(scale) => write!(f, "Initial scale {} is outside [10, 400]", scale),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur when running the viewer.
#[derive(Debug)]
pub enum AppError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            AppError::Window(e) => write!(f, "Failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "GPU error: {}", e),
            AppError::Config(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Gpu(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}
