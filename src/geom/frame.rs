//! Moving frames along polyline rails.
//!
//! Frames are propagated by parallel transport (a rotation-minimising frame),
//! so a swept profile does not spin around the rail. On closed rails the
//! residual rotation after one lap (the holonomy) is spread evenly over the
//! arc length, which lets the last ring meet the first one without a seam.

use super::{Point3, Tolerance, Vec3};

/// A dot product below this value between neighbouring tangents (~75°) is
/// reported as a sharp turn.
const CUSP_DOT_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetFrame {
    /// Unit vector pointing along the rail direction.
    pub tangent: Vec3,
    /// Unit vector perpendicular to the tangent.
    pub normal: Vec3,
    /// `tangent × normal`.
    pub binormal: Vec3,
}

impl FrenetFrame {
    /// Frame from a tangent only, with an arbitrary but deterministic normal.
    #[must_use]
    pub fn from_tangent(tangent: Vec3) -> Option<Self> {
        let tangent = tangent.normalized()?;
        let reference = if tangent.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let normal = tangent.cross(reference).normalized()?;
        let binormal = tangent.cross(normal);
        Some(Self { tangent, normal, binormal })
    }

    /// Frame whose normal is the component of `up` perpendicular to the tangent.
    ///
    /// Falls back to [`FrenetFrame::from_tangent`] when `up` is parallel to the
    /// tangent.
    #[must_use]
    pub fn from_tangent_with_up(tangent: Vec3, up: Vec3) -> Option<Self> {
        let tangent = tangent.normalized()?;
        let Some(normal) = up.reject_from(tangent).normalized() else {
            return Self::from_tangent(tangent);
        };
        let binormal = tangent.cross(normal);
        Some(Self { tangent, normal, binormal })
    }

    /// Rotates normal and binormal about the tangent by `angle` radians.
    #[must_use]
    pub fn rolled(self, angle: f64) -> Self {
        let normal = rotate_vector(self.normal, self.tangent, angle);
        let binormal = self.tangent.cross(normal);
        Self { tangent: self.tangent, normal, binormal }
    }
}

/// Rodrigues rotation of `v` about the unit `axis`.
#[must_use]
pub fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let cos_angle = angle.cos();
    let sin_angle = angle.sin();

    let k_cross_v = axis.cross(v);
    let k_dot_v = axis.dot(v);

    v.mul_scalar(cos_angle)
        .add(k_cross_v.mul_scalar(sin_angle))
        .add(axis.mul_scalar(k_dot_v * (1.0 - cos_angle)))
}

/// Transports `prev` onto `new_tangent` with the smallest rotation.
#[must_use]
pub fn parallel_transport_frame(prev: &FrenetFrame, new_tangent: Vec3, tol: Tolerance) -> FrenetFrame {
    let old_tangent = prev.tangent;
    let cross = old_tangent.cross(new_tangent);

    if cross.length_squared() < tol.eps_squared() {
        if old_tangent.dot(new_tangent) < 0.0 {
            return FrenetFrame {
                tangent: new_tangent,
                normal: -prev.normal,
                binormal: -prev.binormal,
            };
        }
        return FrenetFrame { tangent: new_tangent, ..*prev };
    }

    let axis = cross.normalized().unwrap_or(Vec3::Z);
    let angle = old_tangent.dot(new_tangent).clamp(-1.0, 1.0).acos();

    let normal = rotate_vector(prev.normal, axis, angle)
        .reject_from(new_tangent)
        .normalized()
        .unwrap_or(prev.normal);
    let binormal = new_tangent.cross(normal).normalized().unwrap_or(prev.binormal);

    FrenetFrame { tangent: new_tangent, normal, binormal }
}

/// Unit tangents at each rail point using averaged neighbouring chords.
fn rail_tangents(rail: &[Point3], closed: bool) -> Vec<Option<Vec3>> {
    let n = rail.len();
    (0..n)
        .map(|i| {
            let prev = if i > 0 {
                Some(rail[i - 1])
            } else if closed {
                Some(rail[n - 1])
            } else {
                None
            };
            let next = if i + 1 < n {
                Some(rail[i + 1])
            } else if closed {
                Some(rail[0])
            } else {
                None
            };

            let backward = prev.and_then(|p| rail[i].sub_point(p).normalized());
            let forward = next.and_then(|q| q.sub_point(rail[i]).normalized());
            match (backward, forward) {
                (Some(b), Some(f)) => b.add(f).normalized().or(Some(f)),
                (Some(b), None) => Some(b),
                (None, Some(f)) => Some(f),
                (None, None) => None,
            }
        })
        .collect()
}

/// Rotation-minimising frames along a rail.
///
/// The first frame's normal follows `up` when given. Closed rails get the
/// holonomy correction described in the module docs. Returns the frames plus
/// human-readable warnings in the style of [`super::GeomMeshDiagnostics`].
#[must_use]
pub fn compute_rail_frames(
    rail: &[Point3],
    closed: bool,
    up: Option<Vec3>,
    tol: Tolerance,
) -> (Vec<FrenetFrame>, Vec<String>) {
    let mut warnings = Vec::new();
    let fallback = FrenetFrame { tangent: Vec3::Z, normal: Vec3::X, binormal: Vec3::Y };

    if rail.len() < 2 {
        warnings.push("rail too short; using default frame".to_string());
        return (vec![fallback; rail.len().max(1)], warnings);
    }

    let tangents = rail_tangents(rail, closed);

    let first_tangent = tangents[0].unwrap_or(Vec3::Z);
    let first = up
        .and_then(|up| FrenetFrame::from_tangent_with_up(first_tangent, up))
        .or_else(|| FrenetFrame::from_tangent(first_tangent))
        .unwrap_or(fallback);

    let mut frames = Vec::with_capacity(rail.len());
    frames.push(first);

    let mut degenerate = 0usize;
    let mut cusp_like = 0usize;
    for tangent in tangents.iter().skip(1) {
        let prev = frames[frames.len() - 1];
        let tangent = match tangent {
            Some(t) => *t,
            None => {
                degenerate += 1;
                prev.tangent
            }
        };
        if prev.tangent.dot(tangent) < CUSP_DOT_THRESHOLD {
            cusp_like += 1;
        }
        frames.push(parallel_transport_frame(&prev, tangent, tol));
    }

    if degenerate > 0 {
        warnings.push(format!("rail has {degenerate} degenerate tangents; reusing previous frame"));
    }
    if cusp_like > 0 {
        warnings.push(format!("rail continuity warning: {cusp_like} sharp tangent changes"));
    }

    if closed {
        distribute_holonomy(&mut frames, rail, tol);
    }

    (frames, warnings)
}

/// Rolls each frame so the transported frame after a full lap matches the
/// first one.
fn distribute_holonomy(frames: &mut [FrenetFrame], rail: &[Point3], tol: Tolerance) {
    let Some(last) = frames.last().copied() else {
        return;
    };
    let first = frames[0];

    let closing = parallel_transport_frame(&last, first.tangent, tol);
    let x = closing.normal.dot(first.normal);
    let y = closing.normal.dot(first.binormal);
    // Angle of the lapped normal measured from the starting one.
    let mismatch = y.atan2(x);
    if !mismatch.is_finite() || mismatch.abs() <= tol.eps {
        return;
    }

    let mut arc = Vec::with_capacity(rail.len());
    let mut cumulative = 0.0;
    arc.push(0.0);
    for window in rail.windows(2) {
        cumulative += window[1].distance_to(window[0]);
        arc.push(cumulative);
    }
    let total = cumulative + rail[rail.len() - 1].distance_to(rail[0]);
    if total <= tol.eps {
        return;
    }

    for (frame, s) in frames.iter_mut().zip(arc) {
        *frame = frame.rolled(-mismatch * s / total);
    }
}
