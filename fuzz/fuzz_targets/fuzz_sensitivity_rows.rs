#![no_main]
use armrest_config::{SensitivityCalibration, SensitivityRow};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|rows: Vec<(String, f32)>| {
    let rows: Vec<SensitivityRow> = rows
        .into_iter()
        .map(|(channel, raw_units)| SensitivityRow { channel, raw_units })
        .collect();
    if let Ok(cal) = SensitivityCalibration::from_rows(&rows) {
        assert_eq!(cal.left, 1.0);
        assert!(cal.right.is_finite() && cal.vtc.is_finite());
    }
});
