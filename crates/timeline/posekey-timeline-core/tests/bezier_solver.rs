use posekey_timeline_core::{solve, KeyPoint, SolveError, Vec2};

fn segment(f0: u32, v0: i32, f1: u32, v1: i32) -> (KeyPoint, KeyPoint) {
    (KeyPoint::flat(f0, v0), KeyPoint::flat(f1, v1))
}

#[test]
fn start_frame_returns_start_value_exactly() {
    let (a, b) = segment(0, -1000, 100, 1000);
    assert_eq!(solve(0, &a, &b).unwrap(), -1000);

    let a = KeyPoint::new(20, 333, Vec2::new(15.0, -400.0));
    let b = KeyPoint::new(80, -250, Vec2::new(-10.0, 90.0));
    assert_eq!(solve(20, &a, &b).unwrap(), 333);
}

#[test]
fn frames_before_start_clamp_to_start() {
    let (a, b) = segment(10, 250, 40, 900);
    assert_eq!(solve(0, &a, &b).unwrap(), 250);
    assert_eq!(solve(9, &a, &b).unwrap(), 250);
}

#[test]
fn flat_segment_is_constant() {
    for v in [-1000, 0, 1, 500] {
        let (a, b) = segment(0, v, 301, v);
        for f in 0..=300 {
            assert_eq!(solve(f, &a, &b).unwrap(), v, "frame {f}");
        }
    }
}

#[test]
fn zero_tangents_degenerate_to_linear() {
    // x and y share the same easing, so y tracks x.
    let (a, b) = segment(0, 0, 100, 1000);
    let mut last = i32::MIN;
    for f in 0..100 {
        let v = solve(f, &a, &b).unwrap();
        assert!(v >= last, "frame {f}: {v} < {last}");
        assert!((v - 10 * f as i32).abs() <= 1, "frame {f}: {v}");
        last = v;
    }
}

#[test]
fn descending_segment_is_nonincreasing() {
    let (a, b) = segment(50, 500, 150, -500);
    let values: Vec<i32> = (50..150).map(|f| solve(f, &a, &b).unwrap()).collect();
    assert_eq!(values[0], 500);
    assert!(values.windows(2).all(|w| w[1] <= w[0]), "{values:?}");
    assert!(*values.last().unwrap() >= -500);
}

#[test]
fn handles_shape_the_curve() {
    // Outgoing handle pulls the curve up early.
    let a = KeyPoint::new(0, 0, Vec2::new(30.0, 600.0));
    let b = KeyPoint::new(100, 1000, Vec2::new(-30.0, 0.0));
    assert_eq!(solve(0, &a, &b).unwrap(), 0);
    let early = solve(10, &a, &b).unwrap();
    assert!(early > 150, "early value {early}");
    let late = solve(99, &a, &b).unwrap();
    assert!((990..=1000).contains(&late), "late value {late}");
}

#[test]
fn frame_past_the_end_has_no_parameter() {
    let (a, b) = segment(0, 0, 100, 100);
    let err = solve(150, &a, &b).unwrap_err();
    assert_eq!(
        err,
        SolveError {
            target_x: 150.0,
            span: 100.0
        }
    );
    assert!(err.to_string().contains("150"));
}

#[test]
fn non_finite_handle_fails() {
    let a = KeyPoint::new(0, 0, Vec2::new(f64::NAN, 0.0));
    let b = KeyPoint::flat(10, 10);
    assert!(solve(5, &a, &b).is_err());
}
