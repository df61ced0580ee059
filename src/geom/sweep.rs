//! Profile sweeps along polyline rails.
//!
//! A profile is placed on every rail sample using rotation-minimising frames
//! from [`super::frame`]. Consecutive rings are stitched into quads, open
//! rails get fan caps for closed profiles, and the result goes through
//! `finalize_mesh` for welding and orientation.
//!
//! Before building, the radius guard shrinks the profile until it fits inside
//! the tightest bend of the rail (and any external limit supplied by the
//! caller). The shrink is reported, never silently applied.

use super::curve::circumradius;
use super::diagnostics::GeomMeshDiagnostics;
use super::frame::{FrenetFrame, compute_rail_frames};
use super::mesh::{GeomMesh, finalize_mesh};
use super::{Point3, Tolerance, Vec3};

/// Fraction of the tightest bend radius a profile may occupy.
const CURVATURE_SAFETY: f64 = 0.95;

/// A dot product below this between consecutive chords is a reversal.
const REVERSAL_DOT: f64 = -0.999;

/// Cross-section swept along the rail. Local `x` follows the frame normal,
/// local `y` the binormal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepProfile {
    Circle { radius: f64 },
    /// Closed rectangle, `thickness` along the normal and `width` along the binormal.
    Rectangle { width: f64, thickness: f64 },
    /// Zero-thickness band of the given width.
    Strip { width: f64 },
}

impl SweepProfile {
    /// Half-extent used by the radius guard.
    #[must_use]
    pub fn guard_radius(self) -> f64 {
        match self {
            Self::Circle { radius } => radius,
            Self::Rectangle { width, thickness } => 0.5 * width.max(thickness),
            Self::Strip { width } => 0.5 * width,
        }
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Self::Circle { radius } => Self::Circle { radius: radius * factor },
            Self::Rectangle { width, thickness } => Self::Rectangle {
                width: width * factor,
                thickness: thickness * factor,
            },
            Self::Strip { width } => Self::Strip { width: width * factor },
        }
    }

    /// Whether the outline closes on itself (and can therefore be capped).
    #[must_use]
    pub fn is_closed_outline(self) -> bool {
        !matches!(self, Self::Strip { .. })
    }

    fn is_valid(self, tol: Tolerance) -> bool {
        let positive = |v: f64| v.is_finite() && v > tol.eps;
        match self {
            Self::Circle { radius } => positive(radius),
            Self::Rectangle { width, thickness } => positive(width) && positive(thickness),
            Self::Strip { width } => positive(width),
        }
    }

    /// Outline points in local `(x, y)` coordinates, counter-clockwise.
    fn outline(self, radial_segments: usize) -> Vec<(f64, f64)> {
        match self {
            Self::Circle { radius } => (0..radial_segments)
                .map(|seg| {
                    let angle = 2.0 * std::f64::consts::PI * seg as f64 / radial_segments as f64;
                    (radius * angle.cos(), radius * angle.sin())
                })
                .collect(),
            Self::Rectangle { width, thickness } => {
                let (hx, hy) = (0.5 * thickness, 0.5 * width);
                vec![(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)]
            }
            Self::Strip { width } => vec![(0.0, -0.5 * width), (0.0, 0.5 * width)],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    /// Segments around a circular profile.
    pub radial_segments: usize,
    /// Cap both ends of an open rail (closed outlines only).
    pub caps: bool,
    /// Upper bound on the profile half-extent imposed by the caller.
    pub max_guard_radius: Option<f64>,
    /// Preferred direction of the first frame normal.
    pub up: Option<Vec3>,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            radial_segments: 16,
            caps: true,
            max_guard_radius: None,
            up: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("rail requires at least 2 distinct points")]
    RailTooShort,
    #[error("rail must have finite points")]
    NonFiniteRail,
    #[error("profile dimensions must be finite and > 0")]
    InvalidProfile,
    #[error("sweep requires at least 3 radial segments")]
    NotEnoughRadialSegments,
    #[error("rail reverses direction at sample {index}; profile cannot be placed")]
    CuspNotSupported { index: usize },
}

/// Record of a profile shrunk by the radius guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusClamp {
    /// Sample of the caller's rail where the limiting bend was found, `None`
    /// when the caller's limit was the binding one.
    pub sample: Option<usize>,
    pub requested: f64,
    pub applied: f64,
}

#[derive(Debug, Clone)]
pub struct SweepResult {
    pub mesh: GeomMesh,
    pub diagnostics: GeomMeshDiagnostics,
    pub profile: SweepProfile,
    pub clamp: Option<RadiusClamp>,
}

/// Drops repeated samples. Returns the kept points with the index each one had
/// in `points`.
fn clean_rail(points: &[Point3], closed: bool, tol: Tolerance) -> Result<(Vec<Point3>, Vec<usize>), SweepError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(SweepError::NonFiniteRail);
    }

    let mut cleaned: Vec<Point3> = Vec::with_capacity(points.len());
    let mut source: Vec<usize> = Vec::with_capacity(points.len());
    for (index, p) in points.iter().copied().enumerate() {
        if cleaned.last().is_some_and(|prev| tol.approx_eq_point3(*prev, p)) {
            continue;
        }
        cleaned.push(p);
        source.push(index);
    }
    if closed && cleaned.len() > 2 && tol.approx_eq_point3(cleaned[0], cleaned[cleaned.len() - 1]) {
        cleaned.pop();
        source.pop();
    }

    let min_len = if closed { 3 } else { 2 };
    if cleaned.len() < min_len {
        return Err(SweepError::RailTooShort);
    }
    Ok((cleaned, source))
}

/// Sweeps `profile` along `rail`.
pub fn sweep_profile(
    rail: &[Point3],
    closed: bool,
    profile: SweepProfile,
    options: SweepOptions,
    tol: Tolerance,
) -> Result<SweepResult, SweepError> {
    if options.radial_segments < 3 {
        return Err(SweepError::NotEnoughRadialSegments);
    }
    if !profile.is_valid(tol) {
        return Err(SweepError::InvalidProfile);
    }

    let (rail, source) = clean_rail(rail, closed, tol)?;
    let ring_count = rail.len();

    let mut warnings = Vec::new();
    let clamp = apply_radius_guard(&rail, &source, closed, profile, options.max_guard_radius, tol)?;
    let profile = match clamp {
        Some(clamp) => {
            warnings.push(format!(
                "profile clamped from {:.6} to {:.6}",
                clamp.requested, clamp.applied
            ));
            profile.scaled(clamp.applied / clamp.requested)
        }
        None => profile,
    };

    let (frames, frame_warnings) = compute_rail_frames(&rail, closed, options.up, tol);
    warnings.extend(frame_warnings);

    let arc_lengths = compute_arc_lengths(&rail);
    let total_arc_length = arc_lengths.last().copied().unwrap_or(0.0).max(tol.eps);

    let outline = profile.outline(options.radial_segments);
    let outline_len = outline.len();
    let mut vertices: Vec<Point3> = Vec::with_capacity(ring_count * outline_len);
    let mut uvs: Vec<[f64; 2]> = Vec::with_capacity(ring_count * outline_len);

    for ring_idx in 0..ring_count {
        let u = arc_lengths[ring_idx] / total_arc_length;
        for (seg, local) in outline.iter().enumerate() {
            vertices.push(place(rail[ring_idx], &frames[ring_idx], *local));
            uvs.push([u, seg as f64 / outline_len as f64]);
        }
    }

    let rail_edge_count = if closed { ring_count } else { ring_count - 1 };
    let outline_edge_count = if profile.is_closed_outline() {
        outline_len
    } else {
        outline_len - 1
    };
    let mut indices: Vec<u32> = Vec::with_capacity(rail_edge_count * outline_edge_count * 6);

    for r in 0..rail_edge_count {
        let r_next = (r + 1) % ring_count;
        for seg in 0..outline_edge_count {
            let seg_next = (seg + 1) % outline_len;

            let i0 = (r * outline_len + seg) as u32;
            let i1 = (r * outline_len + seg_next) as u32;
            let i2 = (r_next * outline_len + seg_next) as u32;
            let i3 = (r_next * outline_len + seg) as u32;

            indices.extend_from_slice(&[i0, i1, i2]);
            indices.extend_from_slice(&[i0, i2, i3]);
        }
    }

    if options.caps && !closed && profile.is_closed_outline() {
        let last = ring_count - 1;
        add_cap(&mut vertices, &mut uvs, &mut indices, rail[0], &frames[0], &outline, true);
        add_cap(&mut vertices, &mut uvs, &mut indices, rail[last], &frames[last], &outline, false);
    }

    let (mesh, mut diagnostics) = finalize_mesh(vertices, Some(uvs), indices, tol);
    diagnostics.warnings.extend(warnings);

    Ok(SweepResult {
        mesh,
        diagnostics,
        profile,
        clamp,
    })
}

fn place(origin: Point3, frame: &FrenetFrame, (x, y): (f64, f64)) -> Point3 {
    origin
        .add_vec(frame.normal.mul_scalar(x))
        .add_vec(frame.binormal.mul_scalar(y))
}

fn compute_arc_lengths(points: &[Point3]) -> Vec<f64> {
    let mut arc_lengths = Vec::with_capacity(points.len());
    let mut cumulative = 0.0;
    arc_lengths.push(cumulative);
    for window in points.windows(2) {
        let segment_length = window[1].distance_to(window[0]);
        if segment_length.is_finite() {
            cumulative += segment_length;
        }
        arc_lengths.push(cumulative);
    }
    arc_lengths
}

/// Fan cap over a closed outline. The outline copy is welded onto the last
/// ring by `finalize_mesh`.
fn add_cap(
    vertices: &mut Vec<Point3>,
    uvs: &mut Vec<[f64; 2]>,
    indices: &mut Vec<u32>,
    origin: Point3,
    frame: &FrenetFrame,
    outline: &[(f64, f64)],
    is_start: bool,
) {
    let center = vertices.len() as u32;
    vertices.push(origin);
    uvs.push([0.5, 0.5]);

    let extent = outline
        .iter()
        .map(|(x, y)| x.hypot(*y))
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    for local in outline {
        vertices.push(place(origin, frame, *local));
        uvs.push([0.5 + 0.5 * local.0 / extent, 0.5 + 0.5 * local.1 / extent]);
    }

    let ring_start = center + 1;
    let n = outline.len() as u32;
    for seg in 0..n {
        let a = ring_start + seg;
        let b = ring_start + (seg + 1) % n;
        if is_start {
            // Outward normal at the start points along -tangent.
            indices.extend_from_slice(&[center, b, a]);
        } else {
            indices.extend_from_slice(&[center, a, b]);
        }
    }
}

/// Checks the rail against the profile and returns the clamp to apply, if any.
/// Reported sample indices are taken from `source`.
fn apply_radius_guard(
    rail: &[Point3],
    source: &[usize],
    closed: bool,
    profile: SweepProfile,
    external_limit: Option<f64>,
    tol: Tolerance,
) -> Result<Option<RadiusClamp>, SweepError> {
    let n = rail.len();
    let (start, end) = if closed { (0, n) } else { (1, n.saturating_sub(1)) };

    let mut tightest: Option<(usize, f64)> = None;
    for i in start..end {
        let prev = rail[(i + n - 1) % n];
        let next = rail[(i + 1) % n];

        let (Some(da), Some(db)) = (
            rail[i].sub_point(prev).normalized(),
            next.sub_point(rail[i]).normalized(),
        ) else {
            continue;
        };
        if da.dot(db) < REVERSAL_DOT {
            return Err(SweepError::CuspNotSupported { index: source[i] });
        }

        if let Some(radius) = circumradius(prev, rail[i], next, tol) {
            if tightest.is_none_or(|(_, best)| radius < best) {
                tightest = Some((i, radius));
            }
        }
    }

    let requested = profile.guard_radius();
    let mut limit: Option<RadiusClamp> = None;

    if let Some((sample, radius)) = tightest {
        let allowed = CURVATURE_SAFETY * radius;
        if requested > allowed {
            limit = Some(RadiusClamp {
                sample: Some(source[sample]),
                requested,
                applied: allowed,
            });
        }
    }
    if let Some(external) = external_limit.filter(|v| v.is_finite() && *v > tol.eps) {
        let current = limit.map_or(requested, |clamp| clamp.applied);
        if current > external {
            limit = Some(RadiusClamp {
                sample: None,
                requested,
                applied: external,
            });
        }
    }

    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_rail(samples: usize, radius: f64) -> Vec<Point3> {
        (0..samples)
            .map(|i| {
                let t = i as f64 / samples as f64 * 2.0 * std::f64::consts::PI;
                Point3::new(radius * t.cos(), radius * t.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn guard_ignores_straight_rails() {
        let rail = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let clamp = apply_radius_guard(
            &rail,
            &[0, 1, 2],
            false,
            SweepProfile::Circle { radius: 5.0 },
            None,
            Tolerance::default_geom(),
        )
        .expect("straight rail is valid");
        assert!(clamp.is_none());
    }

    #[test]
    fn reversal_is_rejected() {
        let rail = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let result = sweep_profile(
            &rail,
            false,
            SweepProfile::Circle { radius: 0.1 },
            SweepOptions::default(),
            Tolerance::default_geom(),
        );
        assert!(matches!(result, Err(SweepError::CuspNotSupported { index: 1 })));
    }

    #[test]
    fn repeated_samples_keep_their_rail_index() {
        let rail = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let result = sweep_profile(
            &rail,
            false,
            SweepProfile::Circle { radius: 0.1 },
            SweepOptions::default(),
            Tolerance::default_geom(),
        );
        assert!(matches!(result, Err(SweepError::CuspNotSupported { index: 2 })));

        let doubled: Vec<Point3> = circle_rail(32, 2.0).into_iter().flat_map(|p| [p, p]).collect();
        let result = sweep_profile(
            &doubled,
            true,
            SweepProfile::Circle { radius: 5.0 },
            SweepOptions::default(),
            Tolerance::default_geom(),
        )
        .expect("sweep should succeed");
        let sample = result.clamp.and_then(|clamp| clamp.sample).expect("bend limits the profile");
        assert!(sample < doubled.len());
        assert_eq!(sample % 2, 0, "kept samples are the first of each pair");
    }

    #[test]
    fn rectangle_outline_is_counter_clockwise() {
        let outline = SweepProfile::Rectangle { width: 2.0, thickness: 1.0 }.outline(16);
        let area: f64 = outline
            .iter()
            .zip(outline.iter().cycle().skip(1))
            .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
            .sum();
        assert!(area > 0.0);
    }

    #[test]
    fn external_limit_clamps_profile() {
        let result = sweep_profile(
            &circle_rail(32, 2.0),
            true,
            SweepProfile::Circle { radius: 0.5 },
            SweepOptions {
                max_guard_radius: Some(0.2),
                ..SweepOptions::default()
            },
            Tolerance::default_geom(),
        )
        .expect("sweep should succeed");
        let clamp = result.clamp.expect("clamp expected");
        assert!((clamp.applied - 0.2).abs() < 1e-12);
        assert_eq!(result.profile, SweepProfile::Circle { radius: 0.2 });
    }
}
