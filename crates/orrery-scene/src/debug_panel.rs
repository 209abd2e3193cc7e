//! Live-adjustable numeric fields bound to the camera position.

use serde::Serialize;

use crate::camera::PerspectiveCamera;

/// Axis of the camera position a field writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A bounded numeric control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericField {
    pub name: &'static str,
    pub axis: Axis,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl NumericField {
    /// Round to the step grid and clamp into `[min, max]`.
    pub fn constrain(&self, value: f32) -> f32 {
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    pub fn read(&self, camera: &PerspectiveCamera) -> f32 {
        match self.axis {
            Axis::X => camera.position.x,
            Axis::Y => camera.position.y,
            Axis::Z => camera.position.z,
        }
    }

    fn write(&self, camera: &mut PerspectiveCamera, value: f32) {
        match self.axis {
            Axis::X => camera.position.x = value,
            Axis::Y => camera.position.y = value,
            Axis::Z => camera.position.z = value,
        }
    }
}

/// Outcome of a successful panel write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelWrite {
    pub field: &'static str,
    pub requested: f32,
    pub applied: f32,
    /// True when `applied` differs from `requested`.
    pub adjusted: bool,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PanelError {
    #[error("unknown panel field '{0}'")]
    UnknownField(String),
    #[error("value for '{field}' must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
}

/// The set of fields exposed for live editing.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    fields: Vec<NumericField>,
}

impl DebugPanel {
    pub const CAMERA_MIN: f32 = -100.0;
    pub const CAMERA_MAX: f32 = 150.0;
    pub const CAMERA_STEP: f32 = 1.0;

    /// Camera `z`, `y` and `x`, each in `[-100, 150]` with step 1.
    pub fn camera_position() -> Self {
        let field = |name, axis| NumericField {
            name,
            axis,
            min: Self::CAMERA_MIN,
            max: Self::CAMERA_MAX,
            step: Self::CAMERA_STEP,
        };
        Self {
            fields: vec![field("z", Axis::Z), field("y", Axis::Y), field("x", Axis::X)],
        }
    }

    pub fn fields(&self) -> &[NumericField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&NumericField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Current value of every field, in panel order.
    pub fn values(&self, camera: &PerspectiveCamera) -> Vec<(&'static str, f32)> {
        self.fields.iter().map(|f| (f.name, f.read(camera))).collect()
    }

    /// Write `value` to the named field, constrained to its range and step.
    pub fn apply(
        &self,
        camera: &mut PerspectiveCamera,
        field: &str,
        value: f32,
    ) -> Result<PanelWrite, PanelError> {
        let target = self
            .field(field)
            .ok_or_else(|| PanelError::UnknownField(field.to_string()))?;

        if !value.is_finite() {
            return Err(PanelError::NotFinite {
                field: target.name,
                value,
            });
        }

        let applied = target.constrain(value);
        target.write(camera, applied);

        if applied != value {
            tracing::debug!(
                "panel field '{}' adjusted from {value} to {applied}",
                target.name
            );
        }

        Ok(PanelWrite {
            field: target.name,
            requested: value,
            applied,
            adjusted: applied != value,
        })
    }
}
