//! Cubic Bezier solver for one keyframe segment.
//!
//! A segment runs from `start` to `end` in timeline space. Control points are
//! built in a local frame anchored at the start key:
//! - P0 = (0, start.value)
//! - P1 = P0 + start.ctrl
//! - P3 = (end.frame - start.frame, end.value)
//! - P2 = P3 + end.ctrl
//!
//! For a requested frame we find the curve parameter whose x equals the
//! local frame offset, evaluate y there and floor it to slider units.

use thiserror::Error;

use crate::data::KeyPoint;

/// Bisection steps per monotonic piece; enough to exhaust f64 precision on [0, 1].
const BISECT_ITERS: usize = 64;
/// Relative tolerance for accepting a polynomial value as zero.
const ROOT_EPS: f64 = 1e-9;
/// Roots closer than this are the same root.
const ROOT_MERGE: f64 = 1e-12;

/// No parameter in `[0, 1]` maps to the requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("no Bezier parameter in [0, 1] reaches local x = {target_x} (segment length {span})")]
pub struct SolveError {
    pub target_x: f64,
    pub span: f64,
}

/// Cubic Bezier in Bernstein form, written relative to `p0` so a flat curve
/// (all four values equal) evaluates to exactly `p0`.
#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    p0 + 3.0 * u * u * t * (p1 - p0) + 3.0 * u * t * t * (p2 - p0) + t * t * t * (p3 - p0)
}

/// Interpolated value of the segment at `frame`, floored to an integer.
///
/// Frames before `start.frame` are evaluated at the start of the segment.
pub fn solve(frame: u32, start: &KeyPoint, end: &KeyPoint) -> Result<i32, SolveError> {
    let x0 = 0.0;
    let y0 = f64::from(start.value);
    let x1 = start.ctrl.x + x0;
    let y1 = start.ctrl.y + y0;
    let x3 = f64::from(end.frame) - f64::from(start.frame);
    let y3 = f64::from(end.value);
    let x2 = end.ctrl.x + x3;
    let y2 = end.ctrl.y + y3;

    let x = (f64::from(frame) - f64::from(start.frame)).max(0.0);

    // x as a cubic in the parameter measured from P3 back toward P0.
    let a = x0 - 3.0 * x1 + 3.0 * x2 - x3;
    let b = 3.0 * x1 - 6.0 * x2 + 3.0 * x3;
    let c = 3.0 * x2 - 3.0 * x3;
    let d = x3 - x;

    let t = cubic_roots_in_unit(a, b, c, d)
        .first()
        .copied()
        .ok_or(SolveError {
            target_x: x,
            span: x3,
        })?;
    // Back to the parameter measured from P0.
    let t = 1.0 - t;
    let y = cubic_bezier(y0, y1, y2, y3, t);
    Ok(y.floor() as i32)
}

/// Real roots of `a t^3 + b t^2 + c t + d` inside `[0, 1]`, ascending.
///
/// The interval is split at the polynomial's turning points; each monotonic
/// piece holds at most one root, found by bisection. Roots that only touch
/// zero (double roots) are picked up at the turning points themselves.
pub fn cubic_roots_in_unit(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let p = |t: f64| ((a * t + b) * t + c) * t + d;
    let scale = a.abs().max(b.abs()).max(c.abs()).max(d.abs()).max(1.0);
    let tol = ROOT_EPS * scale;

    let mut knots = Vec::with_capacity(4);
    knots.push(0.0);
    let mut turning = quadratic_roots(3.0 * a, 2.0 * b, c);
    turning.retain(|t| *t > 0.0 && *t < 1.0);
    turning.sort_by(f64::total_cmp);
    knots.extend(turning);
    knots.push(1.0);

    let mut roots = Vec::with_capacity(3);
    for w in knots.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        let (plo, phi) = (p(lo), p(hi));
        if plo.abs() <= tol {
            push_root(&mut roots, lo);
        } else if phi.abs() > tol && plo.signum() != phi.signum() {
            push_root(&mut roots, bisect(&p, lo, hi, plo));
        }
    }
    if p(1.0).abs() <= tol {
        push_root(&mut roots, 1.0);
    }
    roots
}

fn push_root(roots: &mut Vec<f64>, t: f64) {
    if roots.last().is_some_and(|last| (t - last).abs() <= ROOT_MERGE) {
        return;
    }
    roots.push(t);
}

fn bisect(p: &impl Fn(f64) -> f64, mut lo: f64, mut hi: f64, mut plo: f64) -> f64 {
    for _ in 0..BISECT_ITERS {
        let mid = 0.5 * (lo + hi);
        let pm = p(mid);
        if pm == 0.0 {
            return mid;
        }
        if pm.signum() == plo.signum() {
            lo = mid;
            plo = pm;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Real roots of `a t^2 + b t + c` (any order); degrades to the linear case.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a == 0.0 {
        if b == 0.0 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        return vec![0.0];
    }
    vec![q / a, c / q]
}
