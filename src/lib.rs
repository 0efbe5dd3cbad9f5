//! # thinkgear-rs
//!
//! Serial streaming client and blink-gesture detector for
//! [NeuroSky ThinkGear](https://neurosky.com) EEG headsets (MindWave,
//! MindWave Mobile, and other ThinkGear-ASIC devices speaking the serial
//! protocol).
//!
//! Two cores, used in series:
//!
//! 1. **Frame decoding** — [`thinkgear_client::FrameReader`] extracts
//!    checksum-valid frames from a byte stream (sync-marker alignment,
//!    length-prefixed payload, inverted-sum checksum) and
//!    [`parse::decode_payload`] turns each payload into a typed
//!    [`types::Frame`].
//! 2. **Blink detection** — [`blink::BlinkDetector`] classifies the raw EEG
//!    sample stream into discrete blink events with a three-state timing
//!    machine (spike → dip → return to baseline).
//!
//! A deliberate blink event is the input gesture for assistive selection
//! UIs; the bundled binary wires the two cores together and logs/sounds each
//! detection.
//!
//! ## Quick start
//!
//! ```no_run
//! use thinkgear_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ThinkGearClient::new(ThinkGearClientConfig::default());
//!     let (mut rx, handle) = client.connect().await?;
//!     let mut detector = BlinkDetector::new(BlinkConfig::default());
//!
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             HeadsetEvent::Frame(frame) => {
//!                 if let Some(sample) = frame.raw_eeg {
//!                     if detector.feed(sample) {
//!                         println!("blink!");
//!                     }
//!                 }
//!             }
//!             HeadsetEvent::Disconnected => break,
//!             _ => {}
//!         }
//!     }
//!     handle.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the most commonly needed types |
//! | [`thinkgear_client`] | Serial connection, frame reader, and the event-channel client |
//! | [`types`] | Decoded frame and event types |
//! | [`protocol`] | Wire constants: sync marker, record codes, checksum |
//! | [`parse`] | Pure byte-to-value decoders for frame payloads |
//! | [`blink`] | Blink-gesture timing state machine |

pub mod blink;
pub mod parse;
pub mod protocol;
pub mod thinkgear_client;
pub mod types;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
///
/// A single glob import covers connecting to a headset, consuming its
/// frames, and running blink detection over the raw EEG stream.
pub mod prelude {
    // ── Client ────────────────────────────────────────────────────────────────
    pub use crate::thinkgear_client::{
        FrameReader, ThinkGearClient, ThinkGearClientConfig, ThinkGearHandle,
    };

    // ── Events and data types ─────────────────────────────────────────────────
    pub use crate::types::{AsicBands, Frame, HeadsetEvent};

    // ── Blink detection ───────────────────────────────────────────────────────
    pub use crate::blink::{BlinkConfig, BlinkDetector};

    // ── Protocol constants ────────────────────────────────────────────────────
    pub use crate::protocol::{ASIC_BAND_NAMES, DEFAULT_BAUD_RATE, SYNC_BYTE};
}
