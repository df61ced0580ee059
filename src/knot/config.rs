//! Generation parameters.
//!
//! `KnotConfig` is a plain serde value so hosts can pass it as JSON (or a JS
//! object through `serde-wasm-bindgen`). Every field has a default; missing
//! fields fall back to [`KnotConfig::default`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::geom::SweepProfile;

/// Cross-section of the extruded strands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Profile {
    /// Round tube.
    Pipe { radius: f64 },
    /// Flat band lying on the framework surface. A zero `thickness` yields a
    /// single-sided strip.
    Ribbon { width: f64, thickness: f64 },
}

/// Discriminant of [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Pipe,
    Ribbon,
}

impl Profile {
    #[must_use]
    pub fn profile_type(self) -> ProfileType {
        match self {
            Profile::Pipe { .. } => ProfileType::Pipe,
            Profile::Ribbon { .. } => ProfileType::Ribbon,
        }
    }

    /// Extent of the profile along the surface normal, used as the default
    /// over/under lift.
    #[must_use]
    pub fn height(self) -> f64 {
        match self {
            Profile::Pipe { radius } => 2.0 * radius,
            Profile::Ribbon { width, thickness } => thickness.max(0.25 * width),
        }
    }

    #[must_use]
    pub fn to_sweep_profile(self) -> SweepProfile {
        match self {
            Profile::Pipe { radius } => SweepProfile::Circle { radius },
            Profile::Ribbon { width, thickness } if thickness > 0.0 => {
                SweepProfile::Rectangle { width, thickness }
            }
            Profile::Ribbon { width, .. } => SweepProfile::Strip { width },
        }
    }

    #[must_use]
    pub fn from_sweep_profile(profile: SweepProfile) -> Self {
        match profile {
            SweepProfile::Circle { radius } => Profile::Pipe { radius },
            SweepProfile::Rectangle { width, thickness } => Profile::Ribbon { width, thickness },
            SweepProfile::Strip { width } => Profile::Ribbon { width, thickness: 0.0 },
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Pipe { radius: 0.05 }
    }
}

/// How Bézier handle directions are chosen at each weave node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HandleMode {
    /// Neighbour-difference tangent estimate.
    #[default]
    Auto,
    /// The framework edge direction turned by `crossing_angle` radians towards
    /// the surface binormal.
    Aligned { crossing_angle: f64 },
}

/// Skip count used when pairing strand ends around a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    pub default: usize,
    /// Per-vertex overrides keyed by framework vertex index.
    pub overrides: BTreeMap<usize, usize>,
}

impl GapConfig {
    #[must_use]
    pub fn uniform(gap: usize) -> Self {
        Self {
            default: gap,
            overrides: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn for_vertex(&self, vertex: usize) -> usize {
        self.overrides.get(&vertex).copied().unwrap_or(self.default)
    }
}

impl Default for GapConfig {
    fn default() -> Self {
        Self::uniform(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnotConfig {
    pub profile: Profile,
    /// Handle length relative to the adjacent anchor spacing.
    pub handle_length: f64,
    /// 1 uses the mean of both neighbouring spans for every handle, 0 uses
    /// each side's own span.
    pub corner_smoothness: f64,
    pub handle_mode: HandleMode,
    pub gap: GapConfig,
    /// Seed for the over/under choice of each independent crossing component.
    pub alternation_seed: u64,
    /// Lift of an over pass along the surface normal; defaults to half the
    /// profile height.
    pub weave_up: Option<f64>,
    /// Drop of an under pass; defaults to half the profile height.
    pub weave_down: Option<f64>,
    pub samples_per_segment: usize,
    pub radial_segments: usize,
    /// Stop after curve fitting.
    pub curves_only: bool,
    /// Also concatenate every strand solid into one mesh.
    pub merge_output: bool,
    pub tolerance: f64,
}

impl Default for KnotConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            handle_length: 0.35,
            corner_smoothness: 1.0,
            handle_mode: HandleMode::Auto,
            gap: GapConfig::default(),
            alternation_seed: 0,
            weave_up: None,
            weave_down: None,
            samples_per_segment: 12,
            radial_segments: 16,
            curves_only: false,
            merge_output: false,
            tolerance: 1e-9,
        }
    }
}

impl KnotConfig {
    #[must_use]
    pub fn weave_up(&self) -> f64 {
        self.weave_up.unwrap_or(0.5 * self.profile.height())
    }

    #[must_use]
    pub fn weave_down(&self) -> f64 {
        self.weave_down.unwrap_or(0.5 * self.profile.height())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NotPositive { field, value })
            }
        }
        fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Negative { field, value })
            }
        }

        match self.profile {
            Profile::Pipe { radius } => positive("profile.radius", radius)?,
            Profile::Ribbon { width, thickness } => {
                positive("profile.width", width)?;
                non_negative("profile.thickness", thickness)?;
            }
        }
        non_negative("handle_length", self.handle_length)?;
        if !(0.0..=1.0).contains(&self.corner_smoothness) {
            return Err(ConfigError::SmoothnessOutOfRange(self.corner_smoothness));
        }
        if let HandleMode::Aligned { crossing_angle } = self.handle_mode {
            if !crossing_angle.is_finite() {
                return Err(ConfigError::NonFinite {
                    field: "handle_mode.crossing_angle",
                    value: crossing_angle,
                });
            }
        }
        if let Some(up) = self.weave_up {
            non_negative("weave_up", up)?;
        }
        if let Some(down) = self.weave_down {
            non_negative("weave_down", down)?;
        }
        if self.samples_per_segment < 2 {
            return Err(ConfigError::TooFew {
                field: "samples_per_segment",
                min: 2,
                value: self.samples_per_segment,
            });
        }
        if self.radial_segments < 3 {
            return Err(ConfigError::TooFew {
                field: "radial_segments",
                min: 3,
                value: self.radial_segments,
            });
        }
        positive("tolerance", self.tolerance)
    }
}
