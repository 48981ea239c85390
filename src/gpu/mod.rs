//! wgpu implementation of the compute device.
//!
//! Three pipelines share one point storage buffer and one accumulation
//! buffer:
//!
//! - **solver**: compute, one pass per iteration, each pass reading its
//!   parameters from its own dynamic-offset slot of a uniform buffer. All
//!   iterations of a frame go out in a single submission; pass order gives
//!   the read-after-write ordering the recurrence needs.
//! - **composite**: compute, projects the valid points and counts hits per
//!   pixel with `atomicAdd` into a `side * side` buffer of `u32`.
//! - **present**: fullscreen triangle that tone-maps the counts onto the
//!   surface, with the square frame centred.
//!
//! Every submission is followed by a blocking poll, so the host never runs
//! ahead of the device.

use std::mem::size_of;
use std::sync::Arc;

use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::WORKGROUP_SIZE;
use crate::device::{
    CompositeParams, CompositeUniforms, ComputeDevice, SolverStep, SolverUniforms,
};
use crate::error::{DeviceError, GpuError};
use crate::point_store::{GpuPoint, PointBuffer, PointsView};
use crate::shader::{
    PresentUniforms, COMPOSITE_SOURCE, DEFAULT_EXPOSURE, PRESENT_SOURCE, SOLVER_SOURCE,
};

/// Solver slots allocated up front; grows on demand.
const INITIAL_SOLVER_SLOTS: u32 = 32;

/// Point storage buffer on the GPU.
///
/// Host writes go through the queue and land before the next submission.
pub struct GpuPoints {
    buffer: wgpu::Buffer,
    queue: wgpu::Queue,
    capacity: u32,
}

impl PointBuffer for GpuPoints {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn write(&mut self, index: u32, point: Vec3) {
        let offset = index as wgpu::BufferAddress * size_of::<GpuPoint>() as wgpu::BufferAddress;
        self.queue
            .write_buffer(&self.buffer, offset, bytemuck::bytes_of(&GpuPoint::from(point)));
    }
}

/// A surface texture acquired for one frame.
pub struct GpuFrame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Bind groups that reference the point buffer.
struct PointBindings {
    points: wgpu::Buffer,
    solver: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

/// Compute device backed by a wgpu adapter and a window surface.
pub struct GpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    side: u32,
    workgroups: u32,

    solver_pipeline: wgpu::ComputePipeline,
    solver_layout: wgpu::BindGroupLayout,
    solver_uniforms: wgpu::Buffer,
    solver_stride: wgpu::BufferAddress,
    solver_slots: u32,
    solver_staging: Vec<u8>,

    composite_pipeline: wgpu::ComputePipeline,
    composite_layout: wgpu::BindGroupLayout,
    composite_uniforms: wgpu::Buffer,
    counts: wgpu::Buffer,

    present_pipeline: wgpu::RenderPipeline,
    present_bind_group: wgpu::BindGroup,
    present_uniforms: wgpu::Buffer,

    bindings: Option<PointBindings>,
}

impl GpuDevice {
    /// Set up the adapter, surface and pipelines for a `side`×`side` frame
    /// image over a point buffer of `capacity` points.
    pub async fn new(window: Arc<Window>, side: u32, capacity: u32) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let limits = device.limits();
        let point_bytes = capacity as u64 * size_of::<GpuPoint>() as u64;
        let max = limits.max_storage_buffer_binding_size as u64;
        if point_bytes > max {
            return Err(GpuError::PointBufferTooLarge { bytes: point_bytes, max });
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Solver
        let solver_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Solver Bind Group Layout"),
            entries: &[
                storage_entry(0, wgpu::ShaderStages::COMPUTE, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(size_of::<SolverUniforms>() as u64),
                    },
                    count: None,
                },
            ],
        });
        let solver_pipeline = compute_pipeline(&device, "Solver", SOLVER_SOURCE, &solver_layout);
        let solver_stride = uniform_stride(
            size_of::<SolverUniforms>() as u64,
            limits.min_uniform_buffer_offset_alignment as u64,
        );
        let solver_uniforms = solver_uniform_buffer(&device, solver_stride, INITIAL_SOLVER_SLOTS);

        // Compositor
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                storage_entry(0, wgpu::ShaderStages::COMPUTE, true),
                uniform_entry(1, wgpu::ShaderStages::COMPUTE),
                storage_entry(2, wgpu::ShaderStages::COMPUTE, false),
            ],
        });
        let composite_pipeline =
            compute_pipeline(&device, "Composite", COMPOSITE_SOURCE, &composite_layout);
        let composite_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Composite Uniforms"),
            contents: bytemuck::bytes_of(&CompositeUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let counts = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Hit Counts"),
            size: side as u64 * side as u64 * size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Present
        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Present Bind Group Layout"),
            entries: &[
                storage_entry(0, wgpu::ShaderStages::FRAGMENT, true),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let present_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Present Uniforms"),
            contents: bytemuck::bytes_of(&present_params(&config, side)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let present_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Present Bind Group"),
            layout: &present_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: counts.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: present_uniforms.as_entire_binding(),
                },
            ],
        });
        let present_pipeline = present_pipeline(&device, &present_layout, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            side,
            workgroups: capacity.div_ceil(WORKGROUP_SIZE),
            solver_pipeline,
            solver_layout,
            solver_uniforms,
            solver_stride,
            solver_slots: INITIAL_SOLVER_SLOTS,
            solver_staging: Vec::new(),
            composite_pipeline,
            composite_layout,
            composite_uniforms,
            counts,
            present_pipeline,
            present_bind_group,
            present_uniforms,
            bindings: None,
        })
    }

    /// Reconfigure the surface after a window resize.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.queue.write_buffer(
                &self.present_uniforms,
                0,
                bytemuck::bytes_of(&present_params(&self.config, self.side)),
            );
        }
    }

    /// Side of the square frame image.
    pub fn side(&self) -> u32 {
        self.side
    }

    fn reconfigure(&mut self) {
        log::debug!("reconfiguring surface {}x{}", self.config.width, self.config.height);
        self.surface.configure(&self.device, &self.config);
    }

    fn wait(&self) -> Result<(), DeviceError> {
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        Ok(())
    }

    fn solver_bind_group(&self, points: &wgpu::Buffer) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Solver Bind Group"),
            layout: &self.solver_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: points.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.solver_uniforms,
                        offset: 0,
                        size: wgpu::BufferSize::new(size_of::<SolverUniforms>() as u64),
                    }),
                },
            ],
        })
    }

    /// Make room for `steps` uniform slots.
    fn ensure_solver_slots(&mut self, steps: u32) {
        if steps <= self.solver_slots {
            return;
        }
        self.solver_slots = steps.next_power_of_two();
        self.solver_uniforms = solver_uniform_buffer(&self.device, self.solver_stride, self.solver_slots);
        if let Some(points) = self.bindings.as_ref().map(|b| b.points.clone()) {
            let solver = self.solver_bind_group(&points);
            if let Some(bindings) = self.bindings.as_mut() {
                bindings.solver = solver;
            }
        }
        log::debug!("solver uniform slots grown to {}", self.solver_slots);
    }
}

impl ComputeDevice for GpuDevice {
    type Points = GpuPoints;
    type Target = GpuFrame;

    fn allocate_points(&mut self, capacity: u32) -> GpuPoints {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Buffer"),
            size: capacity as u64 * size_of::<GpuPoint>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.workgroups = capacity.div_ceil(WORKGROUP_SIZE);

        let solver = self.solver_bind_group(&buffer);
        let composite = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.composite_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.counts.as_entire_binding(),
                },
            ],
        });
        self.bindings = Some(PointBindings {
            points: buffer.clone(),
            solver,
            composite,
        });

        GpuPoints {
            buffer,
            queue: self.queue.clone(),
            capacity,
        }
    }

    fn solve(&mut self, _points: &mut GpuPoints, steps: &[SolverStep]) -> Result<(), DeviceError> {
        if steps.is_empty() {
            return Ok(());
        }
        self.ensure_solver_slots(steps.len() as u32);

        let stride = self.solver_stride as usize;
        self.solver_staging.clear();
        self.solver_staging.resize(steps.len() * stride, 0);
        for (slot, step) in self.solver_staging.chunks_exact_mut(stride).zip(steps) {
            let uniforms = SolverUniforms::from(*step);
            slot[..size_of::<SolverUniforms>()].copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        self.queue
            .write_buffer(&self.solver_uniforms, 0, &self.solver_staging);

        let bindings = self
            .bindings
            .as_ref()
            .ok_or_else(|| DeviceError::Dispatch("point buffer not allocated".to_string()))?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Solver Encoder"),
            });
        for i in 0..steps.len() {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Solver Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.solver_pipeline);
            pass.set_bind_group(0, &bindings.solver, &[(i * stride) as u32]);
            pass.dispatch_workgroups(self.workgroups, 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.wait()
    }

    fn acquire_target(&mut self) -> Result<GpuFrame, DeviceError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.reconfigure();
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        encoder.clear_buffer(&self.counts, 0, None);
        self.queue.submit(std::iter::once(encoder.finish()));

        Ok(GpuFrame { output, view })
    }

    fn composite(
        &mut self,
        points: PointsView<'_, GpuPoints>,
        params: &CompositeParams,
        _target: &mut GpuFrame,
    ) -> Result<(), DeviceError> {
        let bindings = self
            .bindings
            .as_ref()
            .ok_or_else(|| DeviceError::Dispatch("point buffer not allocated".to_string()))?;
        let uniforms = CompositeUniforms::new(params, points.count, self.side, self.side);
        self.queue
            .write_buffer(&self.composite_uniforms, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Composite Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Composite Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.composite_pipeline);
            pass.set_bind_group(0, &bindings.composite, &[]);
            pass.dispatch_workgroups(self.workgroups, 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.wait()
    }

    fn present(&mut self, target: GpuFrame) -> Result<(), DeviceError> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.present_pipeline);
            render_pass.set_bind_group(0, &self.present_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        target.output.present();
        Ok(())
    }
}

/// Round `size` up to the dynamic-offset alignment.
fn uniform_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

fn present_params(config: &wgpu::SurfaceConfiguration, side: u32) -> PresentUniforms {
    PresentUniforms {
        surface_size: [config.width as f32, config.height as f32],
        side,
        exposure: DEFAULT_EXPOSURE,
    }
}

fn storage_entry(binding: u32, visibility: wgpu::ShaderStages, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn solver_uniform_buffer(device: &wgpu::Device, stride: u64, slots: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Solver Uniforms"),
        size: stride * slots as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

fn present_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Present Shader"),
        source: wgpu::ShaderSource::Wgsl(PRESENT_SOURCE.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Present Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Present Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
