use posekey_timeline_core::{
    ChannelEdit, ChannelSample, KeyPoint, MorphLane, Segment, Timeline, TimelineCommand,
    TimelineConfig, TimelineError, TimelineEvent, Vec2,
};

fn timeline() -> Timeline {
    Timeline::new(TimelineConfig::default()).expect("default config is valid")
}

fn key_simple(tl: &mut Timeline, frame: i64, channel: &str, value: i32) {
    tl.set_cursor(frame).unwrap();
    tl.set_simple_value(channel, value).unwrap();
}

fn key_morph(
    tl: &mut Timeline,
    frame: i64,
    channel: &str,
    lane: MorphLane,
    preset: u32,
    value: i32,
) {
    tl.set_cursor(frame).unwrap();
    tl.set_morph_value(channel, lane, preset, value).unwrap();
}

fn column(tl: &Timeline, path: &str) -> Vec<i32> {
    (0..=tl.frame_count())
        .map(|f| tl.get_value(path, f).unwrap())
        .collect()
}

fn all_lane_paths(tl: &Timeline) -> Vec<String> {
    tl.channels()
        .lanes()
        .into_iter()
        .map(|lane| tl.channels().lane_path(lane))
        .collect()
}

#[test]
fn untouched_timeline_holds_neutral_values() {
    let tl = timeline();
    assert_eq!(tl.frame_count(), 300);
    assert_eq!(tl.cursor(), 0);
    for path in all_lane_paths(&tl) {
        let neutral = if path.contains('.') { -1000 } else { 0 };
        assert!(
            column(&tl, &path).iter().all(|v| *v == neutral),
            "{path} is not neutral"
        );
    }
    assert_eq!(tl.get_preset_index("mouth", 300).unwrap(), 0);
}

#[test]
fn single_key_extends_flat_everywhere() {
    for path in ["head_x", "breathing", "eyebrow.first", "iris_morphs.second"] {
        let mut tl = timeline();
        tl.set_cursor(137).unwrap();
        match path.split_once('.') {
            Some((channel, lane)) => {
                let lane: MorphLane = lane.parse().unwrap();
                tl.set_morph_value(channel, lane, 0, 420).unwrap();
            }
            None => tl.set_simple_value(path, 420).unwrap(),
        }
        assert!(
            column(&tl, path).iter().all(|v| *v == 420),
            "{path} is not flat"
        );
    }
}

#[test]
fn head_x_two_keys() {
    let mut tl = timeline();
    key_simple(&mut tl, 50, "head_x", 500);
    key_simple(&mut tl, 150, "head_x", -500);

    assert_eq!(tl.get_value("head_x", 0).unwrap(), 500);
    assert_eq!(tl.get_value("head_x", 50).unwrap(), 500);
    assert_eq!(tl.get_value("head_x", 150).unwrap(), -500);
    assert_eq!(tl.get_value("head_x", 300).unwrap(), -500);

    let span = &column(&tl, "head_x")[50..=150];
    assert!(span.windows(2).all(|w| w[1] <= w[0]), "{span:?}");
    // Continuous: no jump bigger than the linear step allows.
    assert!(span.windows(2).all(|w| (w[0] - w[1]) <= 11), "{span:?}");
    assert!(span[1] < 500 && span[99] > -500);
}

#[test]
fn morph_preset_and_values() {
    let mut tl = timeline();
    key_morph(&mut tl, 0, "eye", MorphLane::First, 2, -1000);
    key_morph(&mut tl, 100, "eye", MorphLane::First, 2, 1000);

    for f in 0..=100 {
        assert_eq!(tl.get_preset_index("eye", f).unwrap(), 2, "frame {f}");
    }
    assert_eq!(tl.get_value("eye.first", 0).unwrap(), -1000);
    assert_eq!(tl.get_value("eye.first", 100).unwrap(), 1000);
    let span = &column(&tl, "eye.first")[0..=100];
    assert!(span.windows(2).all(|w| w[1] >= w[0]), "{span:?}");
    // The other lane was never keyed.
    assert!(column(&tl, "eye.second").iter().all(|v| *v == -1000));
}

#[test]
fn deleting_the_middle_key_bridges_smoothly() {
    let mut tl = timeline();
    key_simple(&mut tl, 10, "body_y", 0);
    key_simple(&mut tl, 20, "body_y", 100);
    key_simple(&mut tl, 30, "body_y", 0);
    assert_eq!(tl.get_value("body_y", 20).unwrap(), 100);

    tl.set_cursor(20).unwrap();
    let removed = tl.delete_at_cursor().expect("frame 20 had data");
    assert_eq!(removed.frame, 20);

    let values = column(&tl, "body_y");
    assert!(values[10..=30].iter().all(|v| *v == 0), "{:?}", &values[10..=30]);
    assert_eq!(tl.authored_frames(), vec![10, 30]);
}

#[test]
fn bridging_again_reproduces_the_same_gap() {
    let mut tl = timeline();
    key_simple(&mut tl, 10, "body_y", 0);
    key_simple(&mut tl, 20, "body_y", 100);
    key_simple(&mut tl, 30, "body_y", 40);
    let removed = tl.delete_at(20).unwrap().expect("frame 20 had data");
    let bridged = tl.baked().clone();
    tl.drain_events();

    tl.set_cursor(250).unwrap();
    tl.bridge(&removed);
    assert_eq!(tl.baked(), &bridged);
    assert_eq!(
        tl.drain_events(),
        vec![TimelineEvent::SegmentBaked {
            lane: "body_y".into(),
            start: 10,
            end: 30,
        }]
    );
}

#[test]
fn deleting_twice_is_a_no_op() {
    let mut tl = timeline();
    key_simple(&mut tl, 60, "neck_z", 250);
    assert!(tl.delete_at_cursor().is_some());
    let before = tl.baked().clone();
    tl.drain_events();

    assert!(tl.delete_at_cursor().is_none());
    assert_eq!(tl.baked(), &before);
    assert!(tl.drain_events().is_empty());
}

#[test]
fn deleting_the_only_key_eases_to_neutral() {
    let mut tl = timeline();
    key_simple(&mut tl, 100, "body_z", 800);
    tl.delete_at(100).unwrap();
    // Bridged from the neutral value at frame 0 to the neutral value past the end.
    assert!(column(&tl, "body_z").iter().all(|v| *v == 0));
    assert!(tl.authored_frames().is_empty());
}

#[test]
fn rebaking_a_span_twice_is_idempotent() {
    let mut tl = timeline();
    key_simple(&mut tl, 0, "head_y", -300);
    key_simple(&mut tl, 90, "head_y", 700);
    tl.set_tangents("head_y", 0, Vec2::new(20.0, 300.0), Vec2::ZERO)
        .unwrap();

    let lane = tl.lane("head_y").unwrap();
    let segment = Segment {
        lane,
        before: KeyPoint::new(0, -300, Vec2::new(20.0, 300.0)),
        after: KeyPoint::flat(90, 700),
        preset_index: None,
    };
    let once = {
        tl.rebake(&segment);
        tl.baked().clone()
    };
    tl.rebake(&segment);
    assert_eq!(tl.baked(), &once);

    tl.update_after_edit(0);
    let again = tl.baked().clone();
    tl.update_after_edit(0);
    assert_eq!(tl.baked(), &again);
}

#[test]
fn full_rebake_matches_incremental_edits() {
    let mut tl = timeline();
    key_simple(&mut tl, 150, "head_x", 100);
    key_simple(&mut tl, 30, "head_x", -700);
    key_simple(&mut tl, 220, "head_x", 900);
    key_simple(&mut tl, 30, "head_x", -600);
    key_morph(&mut tl, 80, "mouth", MorphLane::Second, 5, 0);
    key_morph(&mut tl, 10, "mouth", MorphLane::Second, 5, -400);
    tl.set_tangents("head_x", 150, Vec2::new(12.0, 50.0), Vec2::new(-8.0, -50.0))
        .unwrap();

    let incremental = tl.baked().clone();
    tl.full_rebake();
    assert_eq!(tl.baked(), &incremental);
}

#[test]
fn full_rebake_steps_presets_by_entry_frame() {
    let mut tl = timeline();
    key_morph(&mut tl, 100, "eye", MorphLane::Second, 3, 200);
    key_morph(&mut tl, 50, "eye", MorphLane::First, 1, -200);
    let incremental = tl.baked().clone();

    tl.full_rebake();
    for path in ["eye.first", "eye.second"] {
        let lane = tl.lane(path).unwrap();
        assert_eq!(tl.baked().lane_values(lane), incremental.lane_values(lane));
    }
    for f in [0, 50, 99] {
        assert_eq!(tl.get_preset_index("eye", f).unwrap(), 1, "frame {f}");
    }
    for f in [100, 200, 300] {
        assert_eq!(tl.get_preset_index("eye", f).unwrap(), 3, "frame {f}");
    }

    // Keying the same entries in the other order rebakes to the same table.
    let mut other = timeline();
    key_morph(&mut other, 50, "eye", MorphLane::First, 1, -200);
    key_morph(&mut other, 100, "eye", MorphLane::Second, 3, 200);
    other.full_rebake();
    assert_eq!(other.baked(), tl.baked());
}

#[test]
fn clear_all_keeps_the_table_until_rebaked() {
    let mut tl = timeline();
    key_simple(&mut tl, 10, "iris_rotation_x", 321);
    tl.clear_all();
    assert!(tl.store().is_empty());
    assert_eq!(tl.get_value("iris_rotation_x", 200).unwrap(), 321);

    tl.full_rebake();
    assert_eq!(tl.get_value("iris_rotation_x", 200).unwrap(), 0);
}

#[test]
fn invalid_cursor_is_rejected_without_side_effects() {
    let mut tl = timeline();
    tl.set_cursor(42).unwrap();
    for bad in [-1, 301, i64::MAX] {
        let err = tl.set_cursor(bad).unwrap_err();
        assert_eq!(
            err,
            TimelineError::InvalidCursor {
                frame: bad,
                frame_count: 300
            }
        );
        assert_eq!(err.category(), "frame");
    }
    assert_eq!(tl.cursor(), 42);
    tl.set_cursor(300).unwrap();
    assert_eq!(tl.cursor(), 300);
}

#[test]
fn bad_edits_change_nothing() {
    let mut tl = timeline();
    tl.set_cursor(10).unwrap();
    let before = tl.baked().clone();

    assert!(matches!(
        tl.set_simple_value("head_x", 1001),
        Err(TimelineError::ValueOutOfRange { .. })
    ));
    assert!(matches!(
        tl.set_simple_value("breathing", -1),
        Err(TimelineError::ValueOutOfRange { .. })
    ));
    assert!(matches!(
        tl.set_morph_value("iris_morphs", MorphLane::First, 1, 0),
        Err(TimelineError::PresetOutOfRange { count: 1, .. })
    ));
    assert!(matches!(
        tl.set_simple_value("eye", 0),
        Err(TimelineError::ChannelKindMismatch { .. })
    ));
    assert!(matches!(
        tl.set_morph_value("head_x", MorphLane::First, 0, 0),
        Err(TimelineError::ChannelKindMismatch { .. })
    ));
    assert!(matches!(
        tl.set_simple_value("tail", 0),
        Err(TimelineError::ChannelNotFound { .. })
    ));

    assert!(tl.store().is_empty());
    assert_eq!(tl.baked(), &before);
}

#[test]
fn key_pose_is_all_or_nothing() {
    let mut tl = timeline();
    tl.set_cursor(75).unwrap();
    let edits = vec![
        ChannelEdit::Simple {
            channel: "head_x".into(),
            value: 100,
        },
        ChannelEdit::Morph {
            channel: "mouth".into(),
            lane: MorphLane::First,
            preset_index: 99,
            value: 0,
        },
    ];
    assert!(tl.key_pose(&edits).is_err());
    assert!(tl.store().is_empty());

    let edits = vec![
        ChannelEdit::Simple {
            channel: "head_x".into(),
            value: 100,
        },
        ChannelEdit::Morph {
            channel: "mouth".into(),
            lane: MorphLane::First,
            preset_index: 6,
            value: 0,
        },
    ];
    tl.key_pose(&edits).unwrap();
    assert_eq!(tl.authored_frames(), vec![75]);
    assert_eq!(tl.entry_at(75).map(|e| e.len()), Some(2));
    assert_eq!(tl.get_value("head_x", 0).unwrap(), 100);
    assert_eq!(tl.get_value("mouth.first", 300).unwrap(), 0);
    assert_eq!(tl.get_preset_index("mouth", 0).unwrap(), 6);
}

#[test]
fn set_tangents_validates_and_rebakes() {
    let mut tl = timeline();
    key_simple(&mut tl, 0, "head_x", 0);
    key_simple(&mut tl, 100, "head_x", 1000);
    let linear = tl.get_value("head_x", 20).unwrap();

    assert!(matches!(
        tl.set_tangents("head_x", 50, Vec2::ZERO, Vec2::ZERO),
        Err(TimelineError::KeyframeNotFound { frame: 50, .. })
    ));
    assert!(matches!(
        tl.set_tangents("head_x", 0, Vec2::new(f64::INFINITY, 0.0), Vec2::ZERO),
        Err(TimelineError::NonFiniteTangent { .. })
    ));
    assert!(matches!(
        tl.set_tangents("head_x", 301, Vec2::ZERO, Vec2::ZERO),
        Err(TimelineError::FrameOutOfRange { .. })
    ));
    assert_eq!(tl.get_value("head_x", 20).unwrap(), linear);

    tl.set_tangents("head_x", 0, Vec2::new(30.0, 800.0), Vec2::ZERO)
        .unwrap();
    assert!(tl.get_value("head_x", 20).unwrap() > linear);
    assert_eq!(tl.get_value("head_x", 0).unwrap(), 0);
    assert_eq!(tl.get_value("head_x", 100).unwrap(), 1000);
}

#[test]
fn queries_validate_their_arguments() {
    let tl = timeline();
    assert!(matches!(
        tl.get_value("head_x", 301),
        Err(TimelineError::FrameOutOfRange { .. })
    ));
    assert!(matches!(
        tl.get_value("eye", 0),
        Err(TimelineError::ChannelKindMismatch { .. })
    ));
    assert!(matches!(
        tl.get_preset_index("head_x", 0),
        Err(TimelineError::ChannelKindMismatch { .. })
    ));
    assert!(tl.pose_at(301).is_err());
}

#[test]
fn pose_at_reports_every_channel() {
    let mut tl = timeline();
    key_morph(&mut tl, 20, "eyebrow", MorphLane::Second, 3, 450);
    key_simple(&mut tl, 20, "head_y", -90);

    let pose = tl.pose_at(250).unwrap();
    assert_eq!(pose.frame, 250);
    assert_eq!(pose.channels.len(), 12);
    assert_eq!(
        pose.get("eyebrow"),
        Some(&ChannelSample::Morph {
            channel: "eyebrow".into(),
            preset_index: 3,
            first: -1000,
            second: 450,
        })
    );
    assert_eq!(
        pose.get("head_y"),
        Some(&ChannelSample::Simple {
            channel: "head_y".into(),
            value: -90,
        })
    );
    assert!(pose.get("tail").is_none());
}

#[test]
fn keyframes_are_listed_per_lane() {
    let mut tl = timeline();
    key_morph(&mut tl, 5, "eye", MorphLane::First, 0, 0);
    key_morph(&mut tl, 9, "eye", MorphLane::Second, 0, 0);
    key_simple(&mut tl, 7, "head_x", 0);

    assert_eq!(tl.keyframes("eye.first").unwrap(), vec![5]);
    assert_eq!(tl.keyframes("eye.second").unwrap(), vec![9]);
    assert_eq!(tl.keyframes("head_x").unwrap(), vec![7]);
    assert_eq!(tl.authored_frames(), vec![5, 7, 9]);
    assert!(tl.keyframes("eye").is_err());
}

#[test]
fn events_describe_what_was_baked() {
    let mut tl = timeline();
    key_simple(&mut tl, 40, "head_x", 10);
    let events = tl.drain_events();
    assert_eq!(
        events,
        vec![
            TimelineEvent::SegmentBaked {
                lane: "head_x".into(),
                start: 40,
                end: 301,
            },
            TimelineEvent::SegmentBaked {
                lane: "head_x".into(),
                start: 0,
                end: 40,
            },
        ]
    );

    tl.delete_at_cursor();
    let events = tl.drain_events();
    assert_eq!(events[0], TimelineEvent::KeyframeRemoved { frame: 40 });
    assert_eq!(events.len(), 2);

    tl.clear_all();
    assert_eq!(tl.drain_events(), vec![TimelineEvent::StoreCleared]);
}

#[test]
fn solver_failures_leave_frames_stale() {
    let mut tl = timeline();
    key_simple(&mut tl, 0, "neck_z", 75);
    tl.drain_events();

    let lane = tl.lane("neck_z").unwrap();
    let broken = Segment {
        lane,
        before: KeyPoint::new(0, 0, Vec2::new(f64::NAN, 0.0)),
        after: KeyPoint::flat(3, 500),
        preset_index: None,
    };
    let report = tl.rebake(&broken);
    assert_eq!(report.failed, vec![0, 1, 2]);
    assert!(column(&tl, "neck_z").iter().all(|v| *v == 75));

    let events = tl.drain_events();
    assert_eq!(
        events,
        vec![
            TimelineEvent::SolverFailed {
                lane: "neck_z".into(),
                frame: 0
            },
            TimelineEvent::SolverFailed {
                lane: "neck_z".into(),
                frame: 1
            },
            TimelineEvent::SolverFailed {
                lane: "neck_z".into(),
                frame: 2
            },
            TimelineEvent::SegmentBaked {
                lane: "neck_z".into(),
                start: 0,
                end: 3
            },
        ]
    );
}

#[test]
fn event_buffer_is_capped() {
    let cfg = TimelineConfig {
        max_events: 3,
        ..TimelineConfig::default()
    };
    let mut tl = Timeline::new(cfg).unwrap();
    for frame in [10, 20, 30] {
        key_simple(&mut tl, frame, "head_x", 0);
    }
    assert_eq!(tl.drain_events().len(), 3);
    assert!(tl.dropped_events() > 0);
}

#[test]
fn commands_drive_the_engine() {
    let mut tl = timeline();
    let cmds = vec![
        TimelineCommand::SetCursor { frame: 12 },
        TimelineCommand::SetSimpleValue {
            channel: "breathing".into(),
            value: 600,
        },
        TimelineCommand::SetCursor { frame: -5 },
        TimelineCommand::SetSimpleValue {
            channel: "breathing".into(),
            value: 0,
        },
    ];
    let err = tl.apply_all(cmds).unwrap_err();
    assert!(matches!(err, TimelineError::InvalidCursor { frame: -5, .. }));
    assert!(err.is_recoverable());
    // Commands after the failing one never ran.
    assert_eq!(tl.cursor(), 12);
    assert_eq!(tl.get_value("breathing", 299).unwrap(), 600);

    tl.apply(TimelineCommand::DeleteAtCursor).unwrap();
    assert!(tl.store().is_empty());
}
