//! Pan and pinch gesture handling.
//!
//! Gestures arrive as discrete phases. Each channel snapshots the camera
//! field it drives when it begins and applies the cumulative gesture
//! payload relative to that snapshot, so a stream of `Changed` events never
//! accumulates rounding drift.
//!
//! | Gesture | Began                  | Changed                                | Ended / Cancelled |
//! |---------|------------------------|----------------------------------------|-------------------|
//! | Pan     | snapshot angle, panning | `angle = start + PI * dx / width`      | panning = false   |
//! | Pinch   | snapshot scale          | `scale = clamp(start * factor)`        | drop snapshot     |

use std::f32::consts::PI;

use crate::camera::CameraState;

/// Phase of a continuous gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// A single gesture update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Horizontal drag. `translation` is measured from where the pan began,
    /// in the same units as the viewport width.
    Pan { phase: GesturePhase, translation: f32 },
    /// Two-finger pinch. `factor` is the cumulative scale since the pinch
    /// began (1.0 = unchanged).
    Pinch { phase: GesturePhase, factor: f32 },
}

/// Transient per-gesture state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureState {
    /// True between pan Began and pan Ended.
    pub panning: bool,
    /// Camera angle when the current pan began.
    pub pan_start_angle: f32,
    /// Camera scale when the current pinch began.
    pub pinch_start_scale: Option<f32>,
}

/// Converts gesture phases into camera updates.
#[derive(Debug, Clone)]
pub struct GestureController {
    state: GestureState,
    viewport_width: f32,
}

impl GestureController {
    /// Create a controller for a viewport `viewport_width` units wide.
    pub fn new(viewport_width: f32) -> Self {
        Self {
            state: GestureState::default(),
            viewport_width: viewport_width.max(1.0),
        }
    }

    /// Width a full-width drag is measured against.
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    /// Update the viewport width. An in-flight pan keeps its start angle.
    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width.max(1.0);
    }

    /// Whether a pan is in progress.
    #[inline]
    pub fn is_panning(&self) -> bool {
        self.state.panning
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Apply one gesture update to `camera`.
    pub fn apply(&mut self, camera: &mut CameraState, gesture: Gesture) {
        match gesture {
            Gesture::Pan { phase, translation } => self.pan(camera, phase, translation),
            Gesture::Pinch { phase, factor } => self.pinch(camera, phase, factor),
        }
    }

    fn pan(&mut self, camera: &mut CameraState, phase: GesturePhase, translation: f32) {
        match phase {
            GesturePhase::Began => {
                self.state.panning = true;
                self.state.pan_start_angle = camera.angle;
            }
            GesturePhase::Changed => {
                if !self.state.panning {
                    log::trace!("pan change without a began phase, ignored");
                    return;
                }
                let sweep = PI * translation / self.viewport_width;
                if sweep.is_finite() {
                    camera.angle = self.state.pan_start_angle + sweep;
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.state.panning = false;
            }
        }
    }

    fn pinch(&mut self, camera: &mut CameraState, phase: GesturePhase, factor: f32) {
        match phase {
            GesturePhase::Began => {
                self.state.pinch_start_scale = Some(camera.scale());
            }
            GesturePhase::Changed => match self.state.pinch_start_scale {
                Some(start) => {
                    let scale = start * factor;
                    if scale.is_finite() {
                        camera.set_scale(scale);
                    }
                }
                None => log::trace!("pinch change without a began phase, ignored"),
            },
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.state.pinch_start_scale = None;
            }
        }
    }
}
