use std::env;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use thinkgear_rs::blink::{BlinkConfig, BlinkDetector};
use thinkgear_rs::protocol::DEFAULT_BAUD_RATE;
use thinkgear_rs::thinkgear_client::{ThinkGearClient, ThinkGearClientConfig};
use thinkgear_rs::types::HeadsetEvent;

/// Read an environment variable, falling back to `default` when unset.
///
/// An unparseable value is an error rather than a silent fallback — a typo
/// in a threshold should not degrade detection quietly.
fn env_parsed<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid value for {name}: {value:?}")),
        Err(_) => Ok(default),
    }
}

/// Audible cue for a detected blink.
///
/// The ASCII BEL is the lowest-common-denominator tone; a selection UI
/// hooking the same event would play its own feedback.
fn ring_bell() {
    use std::io::Write;
    print!("\x07");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for per-frame output, e.g.:
    //   RUST_LOG=thinkgear_rs=debug cargo run
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Configuration ─────────────────────────────────────────────────────────
    // All values come from environment variables with the documented
    // defaults; SERIAL_PORT left unset probes the available ports.
    let client_config = ThinkGearClientConfig {
        port: env::var("SERIAL_PORT").ok().filter(|p| !p.is_empty()),
        baud_rate: env_parsed("BAUD_RATE", DEFAULT_BAUD_RATE)?,
        ..Default::default()
    };
    let blink_config = BlinkConfig {
        spike_threshold: env_parsed("BLINK_SPIKE_THRESHOLD", 500)?,
        dip_threshold: env_parsed("BLINK_DIP_THRESHOLD", -400)?,
        baseline_threshold: env_parsed("BLINK_BASELINE_THRESHOLD", 150)?,
        max_dip_delay: env_parsed("BLINK_MAX_DIP_DELAY", 500)?,
        max_baseline_delay: env_parsed("BLINK_MAX_BASELINE_DELAY", 200)?,
    };

    // ── Connect ───────────────────────────────────────────────────────────────
    info!("Connecting to EEG headset …");
    let client = ThinkGearClient::new(client_config);
    let (mut rx, handle) = client.connect().await?;

    // Ctrl-C requests a clean stop; the reader emits Disconnected and
    // releases the port, which ends the event loop below.
    let handle = Arc::new(handle);
    let ctrlc_handle = Arc::clone(&handle);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received — stopping reader");
            ctrlc_handle.stop();
        }
    });

    // ── Detection loop ────────────────────────────────────────────────────────
    let mut detector = BlinkDetector::new(blink_config);
    let mut blink_count: u64 = 0;

    while let Some(event) = rx.recv().await {
        match event {
            HeadsetEvent::Connected(port) => {
                info!("✅  Streaming from {port}");
            }
            HeadsetEvent::Frame(frame) => {
                if let Some(sample) = frame.raw_eeg {
                    if detector.feed(sample) {
                        blink_count += 1;
                        info!("Blink detected (#{blink_count}) — advancing selection");
                        ring_bell();
                    }
                } else if frame.asic_bands.is_some() {
                    debug!("summary frame: {frame:?}");
                }
            }
            HeadsetEvent::Disconnected => {
                info!("❌  Headset disconnected.");
                break;
            }
        }
    }

    info!(
        "Event loop finished after {} raw samples, {blink_count} blink(s) – exiting.",
        detector.current_index()
    );
    Ok(())
}
