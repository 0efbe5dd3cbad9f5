//! Wire-format constants and helpers for the ThinkGear serial protocol.
//!
//! A ThinkGear headset streams an endless sequence of *frames* over the
//! serial link:
//!
//! ```text
//! [0xAA 0xAA] [plength] [payload × plength] [checksum]
//! ```
//!
//! The payload is a flat sequence of *records*, each introduced by a one-byte
//! code from [`record_code`]; see [`crate::parse::decode_payload`] for the
//! record walker and [`checksum`] for the trailing verification byte.

// ── Framing ──────────────────────────────────────────────────────────────────

/// The byte repeated twice to mark the start of a frame.
///
/// Two consecutive `0xAA` bytes form the sync marker. Because the scanner
/// discards everything before the next marker, a desynchronised stream
/// (dropped bytes, mid-frame connect) self-heals on the following frame.
pub const SYNC_BYTE: u8 = 0xAA;

/// Maximum payload length expressible by the one-byte length prefix.
pub const MAX_PAYLOAD_LEN: usize = 255;

// ── Record codes ──────────────────────────────────────────────────────────────

/// One-byte codes identifying each record kind inside a frame payload.
///
/// | Code | Record | Value bytes after code | Decoded type |
/// |---|---|---|---|
/// | `0x02` | signal quality | 1 | `u8` (0 = good contact, 200 = off-head) |
/// | `0x03` | heart rate | 1 | `u8` |
/// | `0x04` | attention | 1 | `u8` (0–100 eSense scale) |
/// | `0x05` | meditation | 1 | `u8` (0–100 eSense scale) |
/// | `0x06` | raw 8-bit wave | 1 | `u8` |
/// | `0x80` | raw EEG sample | 3 (1 reserved + 2 BE data) | `i16` |
/// | `0x83` | ASIC band powers | 25 (24 data + 1 unused) | 8 × `u32` (24-bit BE) |
///
/// Any other byte at a record-code position is padding or an unsupported
/// record and is skipped one byte at a time.
pub mod record_code {
    /// Electrode contact quality (`0x02`).
    pub const QUALITY: u8 = 0x02;
    /// Heart rate in BPM (`0x03`).
    pub const HEARTRATE: u8 = 0x03;
    /// eSense attention level (`0x04`).
    pub const ATTENTION: u8 = 0x04;
    /// eSense meditation level (`0x05`).
    pub const MEDITATION: u8 = 0x05;
    /// Legacy 8-bit raw wave value (`0x06`).
    pub const RAW_8BIT: u8 = 0x06;
    /// One signed 16-bit raw EEG sample (`0x80`).
    pub const RAW_EEG: u8 = 0x80;
    /// ASIC frequency-band power report (`0x83`).
    pub const ASIC_BANDS: u8 = 0x83;
}

// ── ASIC band labels ──────────────────────────────────────────────────────────

/// Frequency-band names in the order they appear inside an ASIC record.
///
/// Matches the field order of [`crate::types::AsicBands`].
pub const ASIC_BAND_NAMES: [&str; 8] = [
    "delta",
    "theta",
    "low-alpha",
    "high-alpha",
    "low-beta",
    "high-beta",
    "low-gamma",
    "mid-gamma",
];

// ── Serial link ──────────────────────────────────────────────────────────────

/// Factory baud rate for ThinkGear serial links (57600 bps).
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

// ── Checksum ─────────────────────────────────────────────────────────────────

/// Compute the one-byte checksum for a frame payload.
///
/// Sum all payload bytes, truncate the sum to 8 bits, then invert:
///
/// ```text
/// checksum = !(Σ payload) & 0xFF
/// ```
///
/// The headset appends this byte after the payload; a frame whose received
/// checksum disagrees with this computation is discarded in its entirety.
///
/// # Example
///
/// ```
/// # use thinkgear_rs::protocol::checksum;
/// assert_eq!(checksum(&[]), 0xFF);
/// // Truncation before inversion: 0x80 + 0x81 = 0x101 → 0x01 → 0xFE
/// assert_eq!(checksum(&[0x80, 0x81]), 0xFE);
/// ```
pub fn checksum(payload: &[u8]) -> u8 {
    !payload.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}
