//! Build parameters for skin generation.

use crate::error::{BuildError, Result};
use crate::math::Vector3;

/// Offset step applied to a failing junction ring before retrying, as a
/// fraction of the free distance between the junction and its neighbor.
pub const WRAP_STEP_BACK_FACTOR: f64 = 0.1;

/// Junction rings whose vertices are closer than `radius` times this
/// factor are welded together.
pub const WRAP_WELD_FACTOR: f64 = 0.01;

/// Axes that take part in base normal computation.
///
/// A disabled axis is zeroed in every neighbor offset before the normal
/// is derived, which pins base normals for flat or constrained skeletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseNormalAxes {
    /// Use the X component.
    pub x: bool,
    /// Use the Y component.
    pub y: bool,
    /// Use the Z component.
    pub z: bool,
}

impl Default for BaseNormalAxes {
    fn default() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
        }
    }
}

impl BaseNormalAxes {
    /// Zeroes the disabled components of `v`.
    #[must_use]
    pub fn mask(&self, v: &Vector3) -> Vector3 {
        Vector3::new(
            if self.x { v.x } else { 0.0 },
            if self.y { v.y } else { 0.0 },
            if self.z { v.z } else { 0.0 },
        )
    }
}

/// Grayscale displacement image sampled by traverse rank (columns) and
/// angle around the ring (rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeformMap {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl DeformMap {
    /// Creates a map from row-major gray values.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the pixel count
    /// does not match `width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BuildError::InvalidDeformMap(format!(
                "dimensions must be nonzero, got {width}x{height}"
            ))
            .into());
        }
        if pixels.len() != width * height {
            return Err(BuildError::InvalidDeformMap(format!(
                "expected {} pixels, got {}",
                width * height,
                pixels.len()
            ))
            .into());
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Signed displacement in `[-1, 1]` at a pixel; mid-gray (127) is zero.
    /// Coordinates are clamped to the image.
    #[must_use]
    pub fn gray(&self, x: usize, y: usize) -> f64 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        (f64::from(self.pixels[y * self.width + x]) - 127.0) / 127.0
    }
}

/// Parameters for [`BuildSkin`](super::BuildSkin).
///
/// # Example
///
/// ```
/// use skinmesh::skin::SkinParams;
///
/// let params = SkinParams::default()
///     .with_deform_thickness(0.5)
///     .with_hollow_thickness(0.2);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SkinParams {
    /// Axes used when deriving base normals.
    pub base_normal_axes: BaseNormalAxes,
    /// Replace every derived base normal with one radius-weighted average.
    pub average_base_normals: bool,
    /// Scale along each node's base normal. `1.0` disables it.
    pub deform_thickness: f64,
    /// Scale across the base normal within the ring plane. `1.0` disables it.
    pub deform_width: f64,
    /// Optional displacement image.
    pub deform_map: Option<DeformMap>,
    /// Strength of the displacement image.
    pub deform_map_scale: f64,
    /// Shell thickness as a fraction of the ray from node center. `0.0`
    /// produces a solid skin.
    pub hollow_thickness: f64,
    /// Junction offset retry step, in `(0, 1)`.
    pub wrap_step_back_factor: f64,
    /// Junction weld distance as a fraction of the junction radius.
    pub wrap_weld_factor: f64,
}

impl Default for SkinParams {
    fn default() -> Self {
        Self {
            base_normal_axes: BaseNormalAxes::default(),
            average_base_normals: false,
            deform_thickness: 1.0,
            deform_width: 1.0,
            deform_map: None,
            deform_map_scale: 0.0,
            hollow_thickness: 0.0,
            wrap_step_back_factor: WRAP_STEP_BACK_FACTOR,
            wrap_weld_factor: WRAP_WELD_FACTOR,
        }
    }
}

impl SkinParams {
    /// Sets the axes used for base normals.
    #[must_use]
    pub fn with_base_normal_axes(mut self, axes: BaseNormalAxes) -> Self {
        self.base_normal_axes = axes;
        self
    }

    /// Enables or disables global base normal averaging.
    #[must_use]
    pub fn with_average_base_normals(mut self, average: bool) -> Self {
        self.average_base_normals = average;
        self
    }

    /// Sets the thickness deform factor.
    #[must_use]
    pub fn with_deform_thickness(mut self, thickness: f64) -> Self {
        self.deform_thickness = thickness;
        self
    }

    /// Sets the width deform factor.
    #[must_use]
    pub fn with_deform_width(mut self, width: f64) -> Self {
        self.deform_width = width;
        self
    }

    /// Sets the displacement image and its strength.
    #[must_use]
    pub fn with_deform_map(mut self, map: DeformMap, scale: f64) -> Self {
        self.deform_map = Some(map);
        self.deform_map_scale = scale;
        self
    }

    /// Sets the hollow shell thickness.
    #[must_use]
    pub fn with_hollow_thickness(mut self, thickness: f64) -> Self {
        self.hollow_thickness = thickness;
        self
    }

    /// Sets the junction offset retry step.
    #[must_use]
    pub fn with_wrap_step_back_factor(mut self, factor: f64) -> Self {
        self.wrap_step_back_factor = factor;
        self
    }

    /// Sets the junction weld factor.
    #[must_use]
    pub fn with_wrap_weld_factor(mut self, factor: f64) -> Self {
        self.wrap_weld_factor = factor;
        self
    }

    /// Checks that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidParameters`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("deform_thickness", self.deform_thickness),
            ("deform_width", self.deform_width),
            ("deform_map_scale", self.deform_map_scale),
            ("hollow_thickness", self.hollow_thickness),
            ("wrap_step_back_factor", self.wrap_step_back_factor),
            ("wrap_weld_factor", self.wrap_weld_factor),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(BuildError::InvalidParameters(format!("{name} is not finite: {value}")).into());
        }
        if !(0.0..1.0).contains(&self.hollow_thickness) {
            return Err(BuildError::InvalidParameters(format!(
                "hollow_thickness must be in [0, 1), got {}",
                self.hollow_thickness
            ))
            .into());
        }
        if self.wrap_step_back_factor <= 0.0 || self.wrap_step_back_factor >= 1.0 {
            return Err(BuildError::InvalidParameters(format!(
                "wrap_step_back_factor must be in (0, 1), got {}",
                self.wrap_step_back_factor
            ))
            .into());
        }
        if self.wrap_weld_factor < 0.0 {
            return Err(BuildError::InvalidParameters(format!(
                "wrap_weld_factor must not be negative, got {}",
                self.wrap_weld_factor
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SkinError;

    #[test]
    fn defaults_are_valid() {
        let params = SkinParams::default();
        assert!(params.validate().is_ok());
        assert!((params.wrap_step_back_factor - 0.1).abs() < f64::EPSILON);
        assert!((params.wrap_weld_factor - 0.01).abs() < f64::EPSILON);
        assert!(params.deform_map.is_none());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            SkinParams::default().with_hollow_thickness(1.0),
            SkinParams::default().with_hollow_thickness(-0.1),
            SkinParams::default().with_wrap_step_back_factor(0.0),
            SkinParams::default().with_wrap_weld_factor(-1.0),
            SkinParams::default().with_deform_width(f64::NAN),
        ];
        for params in cases {
            assert!(matches!(
                params.validate(),
                Err(SkinError::Build(BuildError::InvalidParameters(_)))
            ));
        }
    }

    #[test]
    fn axis_mask_zeroes_components() {
        let axes = BaseNormalAxes {
            x: true,
            y: false,
            z: true,
        };
        assert_eq!(axes.mask(&Vector3::new(1.0, 2.0, 3.0)), Vector3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn deform_map_validates_and_samples() {
        assert!(DeformMap::new(2, 2, vec![0; 3]).is_err());
        assert!(DeformMap::new(0, 2, vec![]).is_err());

        let map = DeformMap::new(2, 1, vec![127, 254]).unwrap();
        assert!(map.gray(0, 0).abs() < 1e-12);
        assert!((map.gray(1, 0) - 1.0).abs() < 1e-12);
        // Out-of-range coordinates clamp to the last pixel.
        assert!((map.gray(5, 9) - 1.0).abs() < 1e-12);
    }
}
