//! Rate-limited record emission and the line-oriented CSV wire format.

use std::io::{self, Write};

use crate::error::ArmrestError;
use crate::frame::SampleFrame;

/// Column order of every emitted record.
pub const CSV_HEADER: &str =
    "timestamp,force_left,force_right,force_vtc,force_total,is_rested,zone_changed,cop_x,cop_y";

const FIELD_COUNT: usize = 9;

/// Marker written in both CoP columns when the arm is not rested.
pub const COP_UNDEFINED: &str = "nan";

/// Emission gate: lets a frame through at most once per `interval_ms`.
///
/// The last-emit timestamp starts at the loop epoch (0), so the first record
/// goes out once a full interval has elapsed.
#[derive(Debug, Clone, Copy)]
pub struct EmitGate {
    interval_ms: u64,
    last_emit_ms: u64,
}

impl EmitGate {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_emit_ms: 0,
        }
    }

    pub fn reset(&mut self) {
        self.last_emit_ms = 0;
    }

    /// Returns true (and records `now_ms`) when at least one interval has
    /// passed since the previous emission.
    pub fn should_emit(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_emit_ms) >= self.interval_ms {
            self.last_emit_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn last_emit_ms(&self) -> u64 {
        self.last_emit_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

/// Destination for emitted frames.
pub trait RecordSink {
    /// Written once, before the first record.
    fn header(&mut self) -> io::Result<()>;
    fn record(&mut self, frame: &SampleFrame) -> io::Result<()>;
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn header(&mut self) -> io::Result<()> {
        (**self).header()
    }

    fn record(&mut self, frame: &SampleFrame) -> io::Result<()> {
        (**self).record(frame)
    }
}

/// CSV writer: forces to 3 decimals, CoP to 2, booleans as 0/1.
pub struct CsvRecordWriter<W: Write> {
    out: W,
}

impl<W: Write> CsvRecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render one data line (without the trailing newline).
pub fn format_record(frame: &SampleFrame) -> String {
    let f = frame.forces();
    let (cop_x, cop_y) = match frame.cop() {
        Some(p) => (format!("{:.2}", p.x), format!("{:.2}", p.y)),
        None => (COP_UNDEFINED.to_string(), COP_UNDEFINED.to_string()),
    };
    format!(
        "{},{:.3},{:.3},{:.3},{:.3},{},{},{},{}",
        frame.timestamp_ms(),
        f.left,
        f.right,
        f.vtc,
        frame.total_n(),
        u8::from(frame.is_rested()),
        u8::from(frame.zone_changed()),
        cop_x,
        cop_y,
    )
}

impl<W: Write> RecordSink for CsvRecordWriter<W> {
    fn header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{CSV_HEADER}")?;
        self.out.flush()
    }

    fn record(&mut self, frame: &SampleFrame) -> io::Result<()> {
        writeln!(self.out, "{}", format_record(frame))?;
        self.out.flush()
    }
}

/// A data line as read back by a consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub timestamp_ms: u64,
    pub force_left: f32,
    pub force_right: f32,
    pub force_vtc: f32,
    pub force_total: f32,
    pub is_rested: bool,
    pub zone_changed: bool,
    pub cop: Option<(f32, f32)>,
}

impl From<&SampleFrame> for Record {
    fn from(frame: &SampleFrame) -> Self {
        let f = frame.forces();
        Self {
            timestamp_ms: frame.timestamp_ms(),
            force_left: f.left,
            force_right: f.right,
            force_vtc: f.vtc,
            force_total: frame.total_n(),
            is_rested: frame.is_rested(),
            zone_changed: frame.zone_changed(),
            cop: frame.cop().map(|p| (p.x, p.y)),
        }
    }
}

fn bad(msg: String) -> ArmrestError {
    ArmrestError::Record(msg)
}

fn parse_f32(name: &str, s: &str) -> Result<f32, ArmrestError> {
    s.trim()
        .parse::<f32>()
        .map_err(|_| bad(format!("{name}: not a number: {s:?}")))
}

fn parse_flag(name: &str, s: &str) -> Result<bool, ArmrestError> {
    match s.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(bad(format!("{name}: expected 0 or 1, got {other:?}"))),
    }
}

fn parse_cop(s: &str) -> Result<Option<f32>, ArmrestError> {
    if s.trim().eq_ignore_ascii_case(COP_UNDEFINED) {
        return Ok(None);
    }
    parse_f32("cop", s).map(Some)
}

/// Parse one CSV data line produced by `CsvRecordWriter`.
pub fn parse_record(line: &str) -> Result<Record, ArmrestError> {
    let fields: Vec<&str> = line.trim_end().split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(bad(format!(
            "expected {FIELD_COUNT} fields, got {}",
            fields.len()
        )));
    }
    let timestamp_ms = fields[0]
        .trim()
        .parse::<u64>()
        .map_err(|_| bad(format!("timestamp: not an integer: {:?}", fields[0])))?;
    let is_rested = parse_flag("is_rested", fields[5])?;
    let zone_changed = parse_flag("zone_changed", fields[6])?;
    let cop = match (parse_cop(fields[7])?, parse_cop(fields[8])?) {
        (Some(x), Some(y)) => Some((x, y)),
        (None, None) => None,
        _ => return Err(bad("cop_x and cop_y must both be defined or both nan".into())),
    };
    if cop.is_some() != is_rested {
        return Err(bad("cop must be defined exactly when is_rested is 1".into()));
    }
    Ok(Record {
        timestamp_ms,
        force_left: parse_f32("force_left", fields[1])?,
        force_right: parse_f32("force_right", fields[2])?,
        force_vtc: parse_f32("force_vtc", fields[3])?,
        force_total: parse_f32("force_total", fields[4])?,
        is_rested,
        zone_changed,
        cop,
    })
}
