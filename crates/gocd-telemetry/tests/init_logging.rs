use anyhow::Result;
use gocd_telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};

#[test]
fn subscriber_installs_once_per_process() -> Result<()> {
    let config = LoggingConfig::new("info,gocd_client=debug")
        .with_format(LogFormat::Json)
        .with_ansi(false);

    init_logging(&config)?;
    tracing::debug!(target: "gocd_client", "subscriber ready");

    let err = init_logging(&config).expect_err("second install must fail");
    assert!(matches!(err, TelemetryError::AlreadyInstalled { .. }));
    Ok(())
}
