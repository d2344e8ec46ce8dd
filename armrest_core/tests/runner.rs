use std::sync::atomic::AtomicBool;
use std::time::Duration;

use armrest_core::mocks::{ConstantFrontEnd, FailingFrontEnd};
use armrest_core::{
    parse_record, Armrest, CsvRecordWriter, PipelineCfg, RunParams, ZeroingCfg, CSV_HEADER,
};
use armrest_traits::clock::test_clock::TestClock;
use armrest_traits::{AnalogFrontEnd, Channel};

fn quick_zeroing() -> PipelineCfg {
    PipelineCfg {
        zeroing: ZeroingCfg {
            samples: 10,
            delay_ms: 5,
        },
        ..PipelineCfg::default()
    }
}

fn paced(max: u64) -> RunParams {
    RunParams {
        max_iterations: Some(max),
        pace: Some(Duration::from_millis(1)),
        ..RunParams::default()
    }
}

/// Healthy for the first `ok_reads` reads, then fails every seventh read.
struct FlakyFrontEnd {
    reads: u32,
    ok_reads: u32,
}

impl AnalogFrontEnd for FlakyFrontEnd {
    fn read_counts(
        &mut self,
        _channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.reads += 1;
        if self.reads > self.ok_reads && (self.reads - self.ok_reads) % 7 == 0 {
            return Err("spi timeout".into());
        }
        Ok(2000)
    }
}

#[test]
fn writes_header_then_one_record_per_interval() {
    let clock = TestClock::new();
    let mut a = Armrest::builder()
        .with_front_end(ConstantFrontEnd::new([2000, 2000, 2000]))
        .with_config(quick_zeroing())
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();

    let mut sink = CsvRecordWriter::new(Vec::new());
    let stop = AtomicBool::new(false);
    let summary = a.run(&mut sink, &stop, paced(500)).unwrap();

    // loop time runs 0..=499 ms after zeroing, so 50, 100, ..., 450
    assert_eq!(summary.iterations, 500);
    assert_eq!(summary.emitted, 9);
    assert_eq!(summary.read_faults, 0);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    let records: Vec<_> = lines.map(|l| parse_record(l).unwrap()).collect();
    assert_eq!(records.len(), 9);
    assert!(records.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
    // unloaded rig: nothing rested, no CoP
    assert!(records.iter().all(|r| !r.is_rested && r.cop.is_none()));
}

#[test]
fn zeroing_failure_aborts_the_run() {
    let clock = TestClock::new();
    let mut a = Armrest::builder()
        .with_front_end(FailingFrontEnd)
        .with_clock(Box::new(clock))
        .build()
        .unwrap();
    let mut sink = CsvRecordWriter::new(Vec::new());
    let err = a
        .run(&mut sink, &AtomicBool::new(false), paced(10))
        .unwrap_err();
    assert!(format!("{err:#}").contains("startup zeroing"));
    assert!(sink.into_inner().is_empty());
}

#[test]
fn steady_state_read_faults_are_skipped() {
    let clock = TestClock::new();
    let cfg = quick_zeroing();
    let mut a = Armrest::builder()
        .with_front_end(FlakyFrontEnd {
            reads: 0,
            // 10 zeroing samples x 3 channels
            ok_reads: 30,
        })
        .with_config(cfg)
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    let mut sink = CsvRecordWriter::new(Vec::new());
    let summary = a
        .run(&mut sink, &AtomicBool::new(false), paced(100))
        .unwrap();
    assert_eq!(summary.iterations, 100);
    assert!(summary.read_faults > 0);
    assert!(summary.read_faults < 100);
}

#[test]
fn raised_shutdown_flag_stops_before_first_iteration() {
    let clock = TestClock::new();
    let mut a = Armrest::builder()
        .with_front_end(ConstantFrontEnd::new([2000; 3]))
        .with_config(quick_zeroing())
        .with_clock(Box::new(clock))
        .build()
        .unwrap();
    let mut sink = CsvRecordWriter::new(Vec::new());
    let summary = a
        .run(&mut sink, &AtomicBool::new(true), RunParams::default())
        .unwrap();
    assert_eq!(summary.iterations, 0);
    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(text.trim_end(), CSV_HEADER);
}
