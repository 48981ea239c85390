//! The interaction layer and frame loop entry point.
//!
//! A [`Session`] owns the camera, the gesture state machine, the attractor
//! catalog and the frame scheduler. Input never touches the camera
//! directly: it is queued by [`Session::push`] and drained at the start of
//! the next [`Session::frame`], so a frame always renders with the camera
//! as it stood when the frame began.

use std::collections::VecDeque;

use crate::attractor::AttractorVariant;
use crate::camera::CameraState;
use crate::catalog::AttractorCatalog;
use crate::config::EngineConfig;
use crate::device::ComputeDevice;
use crate::error::{ConfigError, SelectionError};
use crate::gesture::{Gesture, GestureController, GesturePhase};
use crate::point_store::PointStore;
use crate::scheduler::{FrameReport, FrameScheduler};
use crate::time::FrameClock;

/// A queued input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Gesture(Gesture),
    /// Select the catalog entry at this index.
    SelectVariant(usize),
}

impl From<Gesture> for InputEvent {
    fn from(gesture: Gesture) -> Self {
        InputEvent::Gesture(gesture)
    }
}

/// A running attractor visualisation on a [`ComputeDevice`].
pub struct Session<D: ComputeDevice> {
    scheduler: FrameScheduler<D>,
    camera: CameraState,
    gestures: GestureController,
    catalog: AttractorCatalog,
    queue: VecDeque<InputEvent>,
    clock: FrameClock,
    ambient_rotation: f32,
}

impl<D: ComputeDevice> Session<D> {
    /// Validate `config` and set up a session rendering through `device`.
    pub fn new(config: &EngineConfig, device: D) -> Result<Self, ConfigError> {
        config.validate()?;

        let scheduler = FrameScheduler::new(
            device,
            config.capacity,
            config.iterations,
            config.variant,
            config.rng_seed,
        )?;
        let mut camera = CameraState::new(config.resolution);
        camera.set_scale(config.initial_scale);

        log::info!(
            "session: {} points, {} iterations per frame, {}x{} frame, {}",
            config.capacity,
            config.iterations,
            config.resolution,
            config.resolution,
            config.variant
        );

        Ok(Self {
            scheduler,
            camera,
            gestures: GestureController::new(config.resolution as f32),
            catalog: AttractorCatalog::new(config.variant),
            queue: VecDeque::new(),
            clock: FrameClock::new(),
            ambient_rotation: config.ambient_rotation,
        })
    }

    /// Queue an input event for the next frame.
    ///
    /// Selections are checked against the catalog here so that a bad index
    /// is reported to the caller instead of vanishing inside the frame.
    pub fn push(&mut self, event: InputEvent) -> Result<(), SelectionError> {
        if let InputEvent::SelectVariant(index) = event {
            if index >= AttractorVariant::COUNT {
                return Err(SelectionError::UnknownVariant(index));
            }
        }
        self.queue.push_back(event);
        Ok(())
    }

    pub fn pan(&mut self, phase: GesturePhase, translation: f32) {
        self.queue
            .push_back(InputEvent::Gesture(Gesture::Pan { phase, translation }));
    }

    pub fn pinch(&mut self, phase: GesturePhase, factor: f32) {
        self.queue
            .push_back(InputEvent::Gesture(Gesture::Pinch { phase, factor }));
    }

    pub fn select(&mut self, index: usize) -> Result<(), SelectionError> {
        self.push(InputEvent::SelectVariant(index))
    }

    /// Queue a selection by variant name.
    pub fn select_by_name(&mut self, name: &str) -> Result<(), SelectionError> {
        let variant = AttractorVariant::from_name(name)
            .ok_or_else(|| SelectionError::UnknownName(name.to_string()))?;
        self.select(variant.index())
    }

    /// Run one frame: apply queued input, simulate, render, present, then
    /// advance the ambient rotation.
    pub fn frame(&mut self) -> FrameReport {
        self.drain_input();

        let pending = self.catalog.take_pending();
        let camera = self.camera;
        let report = self.scheduler.run_frame(pending, &camera);

        self.camera
            .advance(self.gestures.is_panning(), self.ambient_rotation);
        self.clock.tick(report.valid_count);
        report
    }

    fn drain_input(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            match event {
                InputEvent::Gesture(gesture) => self.gestures.apply(&mut self.camera, gesture),
                InputEvent::SelectVariant(index) => match self.catalog.select(index) {
                    Ok(true) => log::debug!("selected {}", self.catalog.selected()),
                    Ok(false) => {}
                    Err(e) => log::warn!("{}", e),
                },
            }
        }
    }

    /// Width a full-width pan is measured against.
    pub fn set_viewport_width(&mut self, width: f32) {
        self.gestures.set_viewport_width(width);
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    pub fn catalog(&self) -> &AttractorCatalog {
        &self.catalog
    }

    /// Events waiting for the next frame.
    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    pub fn scheduler(&self) -> &FrameScheduler<D> {
        &self.scheduler
    }

    pub fn store(&self) -> &PointStore<D::Points> {
        self.scheduler.store()
    }

    pub fn device(&self) -> &D {
        self.scheduler.device()
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.scheduler.device_mut()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }
}
