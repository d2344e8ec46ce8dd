#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary TOML must either fail to parse or validate without panicking,
// and anything that validates must be usable by the pipeline.
fuzz_target!(|data: &str| {
    let Ok(cfg) = armrest_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        assert!(cfg.filter.ema_alpha > 0.0 && cfg.filter.ema_alpha < 1.0);
        assert!(cfg.emit.interval_ms >= 1);
        assert!(cfg.zeroing.samples >= 1);
    }
});
