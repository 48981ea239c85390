//! Windowed viewer.
//!
//! Maps winit input onto the session's event queue:
//!
//! | Input                 | Event                                         |
//! |-----------------------|-----------------------------------------------|
//! | left drag             | pan, translation measured from the press      |
//! | trackpad pinch        | pinch, factor accumulated over the gesture    |
//! | mouse wheel           | one complete pinch of `1.1^lines`             |
//! | keys `1`-`7`          | select attractor                              |
//! | `Escape`              | quit                                          |

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::attractor::AttractorVariant;
use crate::config::EngineConfig;
use crate::error::{AppError, DeviceError};
use crate::gesture::GesturePhase;
use crate::gpu::GpuDevice;
use crate::scheduler::FrameOutcome;
use crate::session::Session;

/// Zoom per wheel line.
const WHEEL_ZOOM: f32 = 1.1;
/// Pixels of smooth scrolling that count as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

/// Open a window and run the attractor until it is closed.
pub fn run(config: EngineConfig) -> Result<(), AppError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    config: EngineConfig,
    window: Option<Arc<Window>>,
    session: Option<Session<GpuDevice>>,
    error: Option<AppError>,
    cursor_x: f64,
    drag_start_x: Option<f64>,
    pinch_factor: f32,
    title_variant: Option<AttractorVariant>,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            window: None,
            session: None,
            error: None,
            cursor_x: 0.0,
            drag_start_x: None,
            pinch_factor: 1.0,
            title_variant: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let side = self.config.resolution;
        let window_attrs = Window::default_attributes()
            .with_title(window_title(self.config.variant))
            .with_inner_size(winit::dpi::PhysicalSize::new(side, side));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let device = pollster::block_on(GpuDevice::new(window.clone(), side, self.config.capacity))?;
        let mut session = Session::new(&self.config, device)?;
        session.set_viewport_width(window.inner_size().width as f32);

        self.title_variant = Some(self.config.variant);
        self.session = Some(session);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn keyboard(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };
        match event.logical_key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character(ref text) => {
                let digit = text.chars().next().and_then(|c| c.to_digit(10));
                if let Some(digit @ 1..=9) = digit {
                    if let Err(e) = session.select(digit as usize - 1) {
                        log::warn!("{}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = &mut self.session else {
            return;
        };
        let report = session.frame();

        if let FrameOutcome::Skipped {
            error: DeviceError::SurfaceUnavailable(wgpu::SurfaceError::OutOfMemory),
            ..
        } = report.outcome
        {
            log::error!("surface out of memory, exiting");
            event_loop.exit();
            return;
        }

        let active = session.catalog().active();
        if self.title_variant != Some(active) {
            self.title_variant = Some(active);
            if let Some(window) = &self.window {
                window.set_title(&window_title(active));
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(session) = &mut self.session {
                    session.device_mut().resize(physical_size);
                    session.set_viewport_width(physical_size.width as f32);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.keyboard(event_loop, event),
            WindowEvent::MouseInput { state, button, .. } => {
                if button != MouseButton::Left {
                    return;
                }
                let Some(session) = &mut self.session else {
                    return;
                };
                match state {
                    ElementState::Pressed => {
                        self.drag_start_x = Some(self.cursor_x);
                        session.pan(GesturePhase::Began, 0.0);
                    }
                    ElementState::Released => {
                        if let Some(start) = self.drag_start_x.take() {
                            session.pan(GesturePhase::Ended, (self.cursor_x - start) as f32);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_x = position.x;
                if let (Some(start), Some(session)) = (self.drag_start_x, &mut self.session) {
                    session.pan(GesturePhase::Changed, (position.x - start) as f32);
                }
            }
            WindowEvent::PinchGesture { delta, phase, .. } => {
                let Some(session) = &mut self.session else {
                    return;
                };
                match phase {
                    TouchPhase::Started => {
                        self.pinch_factor = 1.0;
                        session.pinch(GesturePhase::Began, 1.0);
                    }
                    TouchPhase::Moved => {
                        self.pinch_factor *= 1.0 + delta as f32;
                        session.pinch(GesturePhase::Changed, self.pinch_factor);
                    }
                    TouchPhase::Ended => session.pinch(GesturePhase::Ended, self.pinch_factor),
                    TouchPhase::Cancelled => session.pinch(GesturePhase::Cancelled, self.pinch_factor),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                if let Some(session) = &mut self.session {
                    let factor = WHEEL_ZOOM.powf(lines);
                    session.pinch(GesturePhase::Began, 1.0);
                    session.pinch(GesturePhase::Changed, factor);
                    session.pinch(GesturePhase::Ended, factor);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn window_title(variant: AttractorVariant) -> String {
    format!("Strange Attractor: {}", variant)
}
