use aved_core::config::CoreConfig;
use std::env;
use std::time::Duration;

// Everything lives in one test: the environment is process-wide.
#[test]
fn test_env_var_overrides() {
    let keys = [
        "AVED_PROBE_TIMEOUT_MS",
        "AVED_INSPECTION_DELAY_MS",
        "AVED_FRAME_FORMAT",
        "AVED_TRANSCODE",
        "AVED_TRANSCODE_OPTIONS",
    ];
    unsafe {
        for key in keys {
            env::remove_var(key);
        }
        env::set_var("AVED_PROBE_TIMEOUT_MS", "750");
        env::set_var("AVED_INSPECTION_DELAY_MS", "100");
        env::set_var("AVED_FRAME_FORMAT", "jpg");
        env::set_var("AVED_TRANSCODE", "/opt/tc/bin/transcode");
        env::set_var("AVED_TRANSCODE_OPTIONS", "--print_status 10");
    }

    let config = CoreConfig::from_env();
    assert_eq!(config.probe_timeout, Duration::from_millis(750));
    assert_eq!(config.inspection_delay, Duration::from_millis(100));
    assert_eq!(config.frame_format, "jpg");
    assert_eq!(config.transcode_program, "/opt/tc/bin/transcode");
    assert_eq!(config.transcode_options, vec!["--print_status", "10"]);

    // A bad number is ignored rather than fatal
    unsafe {
        env::set_var("AVED_PROBE_TIMEOUT_MS", "soon");
    }
    assert_eq!(CoreConfig::from_env().probe_timeout, Duration::from_secs(1));

    unsafe {
        for key in keys {
            env::remove_var(key);
        }
    }
    assert_eq!(CoreConfig::from_env().frame_format, "ppm");
}
