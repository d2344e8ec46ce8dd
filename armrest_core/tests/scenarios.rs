use std::time::Duration;

use armrest_core::mocks::ConstantFrontEnd;
use armrest_core::{
    parse_record, format_record, Armrest, CalibrationModel, Geometry, PipelineCfg, PipelineState,
    Sensitivity, StepStatus, TransferFn, ZoneState,
};
use armrest_traits::clock::test_clock::TestClock;
use armrest_traits::Channel;
use rstest::rstest;

/// raw units = 10 * v, every channel weighted 1.0, 5.91 N per unit.
fn linear_cfg() -> PipelineCfg {
    PipelineCfg {
        calibration: CalibrationModel {
            transfer: TransferFn {
                p1: 0.0,
                p2: 10.0,
                p3: 0.0,
            },
            sensitivity: Sensitivity::new(1.0, 1.0, 1.0),
            newtons_per_unit: 5.91,
        },
        ..PipelineCfg::default()
    }
}

#[test]
fn baseline_voltages_give_zero_force_and_no_cop() {
    let cfg = PipelineCfg::default();
    let rest = [1.61, 1.63, 1.58];
    let mut st = PipelineState::new(&cfg, rest);
    let frame = st.process(&cfg, rest, 10);
    assert_eq!(frame.forces().to_array(), [0.0, 0.0, 0.0]);
    assert_eq!(frame.total_n(), 0.0);
    assert!(!frame.is_rested());
    assert!(frame.cop().is_none());
    assert_eq!(st.zone_state(), ZoneState::Unrested);
}

#[test]
fn below_baseline_is_clamped_to_zero() {
    let cfg = linear_cfg();
    let mut st = PipelineState::new(&cfg, [0.5; 3]);
    let frame = st.evaluate(&cfg, [0.1, 0.49, 0.0], 0);
    assert_eq!(frame.total_n(), 0.0);
}

#[test]
fn largest_accepted_calibration_stays_rested_at_full_scale() {
    let mut cfg = linear_cfg();
    cfg.calibration.transfer.p2 = 1.0e30;
    cfg.validate().expect("bound fits in f32");
    let full_scale = cfg.adc.vref * f32::from(u16::MAX) / f32::from(cfg.adc.max_count);

    let mut st = PipelineState::new(&cfg, [0.5; 3]);
    let frame = st.evaluate(&cfg, [full_scale; 3], 0);
    assert!(frame.total_n().is_finite());
    assert!(frame.is_rested());
    assert!(frame.cop().is_some());
}

#[rstest]
#[case(Channel::Left)]
#[case(Channel::Right)]
#[case(Channel::Vtc)]
fn single_loaded_channel_lands_on_its_position(#[case] loaded: Channel) {
    let cfg = linear_cfg();
    let mut st = PipelineState::new(&cfg, [0.5; 3]);
    let mut filtered = [0.5f32; 3];
    filtered[loaded.index()] = 1.0;

    let frame = st.evaluate(&cfg, filtered, 0);
    for ch in Channel::ALL {
        let f = frame.forces().get(ch);
        if ch == loaded {
            assert!((f - 59.1).abs() < 1e-4, "{ch}: {f}");
        } else {
            assert_eq!(f, 0.0);
        }
    }
    assert!((frame.total_n() - 59.1).abs() < 1e-4);
    assert!(frame.is_rested());
    assert_eq!(frame.cop(), Some(cfg.geometry.position(loaded)));
}

#[test]
fn equal_forces_put_cop_at_centroid() {
    let cfg = linear_cfg();
    let mut st = PipelineState::new(&cfg, [0.5; 3]);
    let frame = st.evaluate(&cfg, [1.0; 3], 0);
    let cop = frame.cop().unwrap();
    let c = Geometry::default().centroid();
    assert!((cop.x - c.x).abs() < 1e-4);
    assert!((cop.y - c.y).abs() < 1e-4);
    // the centroid is the dead-zone centre, so entering it is a zone event
    assert!(frame.zone_changed());
    assert_eq!(st.zone_state(), ZoneState::RestedInside);
}

#[test]
fn light_touch_stays_unrested() {
    let mut cfg = linear_cfg();
    cfg.calibration.transfer.p3 = -5.0;
    let mut st = PipelineState::new(&cfg, [0.5; 3]);
    // 0.05 raw units on one channel is about 0.3 N, well under 3.5 N
    let frame = st.evaluate(&cfg, [0.505, 0.5, 0.5], 0);
    assert!(frame.total_n() > 0.0);
    assert!(frame.total_n() < 1.0);
    assert!(!frame.is_rested());
    assert!(frame.cop().is_none());
}

fn armrest_with_clock(clock: &TestClock) -> Armrest {
    Armrest::builder()
        .with_front_end(ConstantFrontEnd::new([2000, 2000, 2000]))
        .with_config(linear_cfg())
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap()
}

#[test]
fn one_record_per_interval_at_fast_loop_rate() {
    let clock = TestClock::new();
    let mut a = armrest_with_clock(&clock);
    a.begin_with_rest([0.5; 3]);

    let mut stamps = Vec::new();
    for _ in 0..500 {
        clock.advance(Duration::from_millis(1));
        if let StepStatus::Emitted(f) = a.step_from_volts([1.0, 0.5, 0.5]).unwrap() {
            stamps.push(f.timestamp_ms());
        }
    }
    assert_eq!(stamps, (1..=10).map(|k| k * 50).collect::<Vec<_>>());
}

#[test]
fn burst_without_elapsed_time_emits_nothing_extra() {
    let clock = TestClock::new();
    let mut a = armrest_with_clock(&clock);
    a.begin_with_rest([0.5; 3]);

    clock.advance(Duration::from_millis(50));
    let emitted = (0..1_000)
        .filter(|_| a.step_from_volts([0.5; 3]).unwrap().is_emitted())
        .count();
    assert_eq!(emitted, 1);
}

#[test]
fn emitted_line_parses_back() {
    let cfg = linear_cfg();
    let mut st = PipelineState::new(&cfg, [0.5; 3]);
    let frame = st.evaluate(&cfg, [1.0, 0.5, 0.5], 150);
    let rec = parse_record(&format_record(&frame)).unwrap();
    assert_eq!(rec.timestamp_ms, 150);
    assert!(rec.is_rested);
    assert_eq!(rec.cop, Some((0.0, 0.0)));
    assert!((rec.force_left - 59.1).abs() < 1e-3);
}
