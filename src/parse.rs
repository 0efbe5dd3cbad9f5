//! Binary decoders for ThinkGear frame payloads.
//!
//! All public functions in this module are pure (no I/O, no state) and are
//! safe to call from any context. Framing — sync-marker scan, length prefix,
//! checksum verification — happens in [`crate::thinkgear_client::FrameReader`];
//! by the time bytes reach [`decode_payload`] they are a checksum-valid
//! payload.
//!
//! # Payload layout
//!
//! A payload is a flat sequence of records, each introduced by a one-byte
//! code ([`crate::protocol::record_code`]):
//!
//! | Code | Record | Value bytes |
//! |---|---|---|
//! | `0x02`–`0x06` | quality / heartrate / attention / meditation / raw-8bit | 1 |
//! | `0x80` | raw EEG | 3 (1 reserved + 2 BE data) |
//! | `0x83` | ASIC bands | 25 (8 × 24-bit BE + 1 unused) |
//!
//! Bytes at a record-code position that match no known code are skipped one
//! at a time, so padding and unsupported records never fail a frame.

use crate::protocol::record_code;
use crate::types::{AsicBands, Frame};

// ── Errors ───────────────────────────────────────────────────────────────────

/// A structural defect inside an otherwise checksum-valid payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// A known record code claims more value bytes than the payload holds.
    ///
    /// The whole frame is discarded; decoding resumes at the next sync
    /// marker. Reading past the payload boundary is never attempted.
    #[error(
        "record 0x{code:02X} at payload offset {offset} needs {needed} data bytes, {remaining} remain"
    )]
    Truncated {
        /// The record code whose value region was cut short.
        code: u8,
        /// Byte offset of the code within the payload.
        offset: usize,
        /// Data bytes the record requires after its code.
        needed: usize,
        /// Data bytes actually remaining after the code.
        remaining: usize,
    },
}

// ── Signed widening ───────────────────────────────────────────────────────────

/// Reinterpret a `bit_width`-bit unsigned value as two's-complement signed.
///
/// Returns `value` when the top bit (bit `bit_width − 1`) is clear, otherwise
/// `value − 2^bit_width`. Parameterised on the width so the same transform
/// serves any fixed-width field; the raw-EEG record uses `bit_width = 16`.
///
/// # Example
///
/// ```
/// # use thinkgear_rs::parse::decode_signed;
/// assert_eq!(decode_signed(0xFFFF, 16), -1);
/// assert_eq!(decode_signed(0x7FFF, 16), 32767);
/// assert_eq!(decode_signed(0x8000, 16), -32768);
/// assert_eq!(decode_signed(0x0000, 16), 0);
/// ```
pub fn decode_signed(value: u32, bit_width: u32) -> i32 {
    debug_assert!((1..=32).contains(&bit_width));
    let sign = (value >> (bit_width - 1)) & 1;
    (i64::from(value) - i64::from(sign) * (1i64 << bit_width)) as i32
}

// ── Band triplets ─────────────────────────────────────────────────────────────

/// Decode a 24-bit unsigned big-endian array (3 bytes per value).
///
/// Returns one `u32` per complete 3-byte group; partial trailing bytes are
/// ignored.
pub fn decode_unsigned_24bit(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(3)
        .map(|c| (u32::from(c[0]) << 16) | (u32::from(c[1]) << 8) | u32::from(c[2]))
        .collect()
}

/// Decode the 24 data bytes of an ASIC record into named band powers.
///
/// Band order on the wire matches the field order of [`AsicBands`]
/// (delta first, mid-gamma last), each a 24-bit big-endian value.
///
/// # Panics
/// Panics if `data` is shorter than 24 bytes; [`decode_payload`] checks the
/// record length before calling.
pub fn decode_asic_bands(data: &[u8]) -> AsicBands {
    let v = decode_unsigned_24bit(&data[..24]);
    AsicBands {
        delta: v[0],
        theta: v[1],
        low_alpha: v[2],
        high_alpha: v[3],
        low_beta: v[4],
        high_beta: v[5],
        low_gamma: v[6],
        mid_gamma: v[7],
    }
}

// ── Payload walker ────────────────────────────────────────────────────────────

/// Decode a checksum-valid payload into a [`Frame`].
///
/// Walks the payload left to right. Each known record code consumes its
/// fixed-length value region; any other byte is skipped individually. The
/// walk stops once fewer than two bytes remain (a record needs at least one
/// value byte after its code), so a lone trailing byte is ignored.
///
/// Returns [`PayloadError::Truncated`] when a known code's value region
/// would extend past the payload end — the caller discards the frame and
/// resynchronises, same as for a checksum mismatch.
///
/// # Example
///
/// ```
/// # use thinkgear_rs::parse::decode_payload;
/// let frame = decode_payload(&[0x02, 50, 0x80, 0x00, 0x34, 0x12]).unwrap();
/// assert_eq!(frame.quality, Some(50));
/// assert_eq!(frame.raw_eeg, Some(0x3412));
/// ```
pub fn decode_payload(payload: &[u8]) -> Result<Frame, PayloadError> {
    let mut frame = Frame::default();
    let mut i = 0;

    while i + 1 < payload.len() {
        let code = payload[i];
        let value = &payload[i + 1..];
        match code {
            record_code::QUALITY => {
                frame.quality = Some(value[0]);
                i += 2;
            }
            record_code::HEARTRATE => {
                frame.heartrate = Some(value[0]);
                i += 2;
            }
            record_code::ATTENTION => {
                frame.attention = Some(value[0]);
                i += 2;
            }
            record_code::MEDITATION => {
                frame.meditation = Some(value[0]);
                i += 2;
            }
            record_code::RAW_8BIT => {
                frame.raw_8bit = Some(value[0]);
                i += 2;
            }
            record_code::RAW_EEG => {
                if value.len() < 3 {
                    return Err(PayloadError::Truncated {
                        code,
                        offset: i,
                        needed: 3,
                        remaining: value.len(),
                    });
                }
                // value[0] is reserved; the sample is two big-endian data bytes.
                let raw = u16::from_be_bytes([value[1], value[2]]);
                frame.raw_eeg = Some(decode_signed(u32::from(raw), 16) as i16);
                i += 4;
            }
            record_code::ASIC_BANDS => {
                if value.len() < 24 {
                    return Err(PayloadError::Truncated {
                        code,
                        offset: i,
                        needed: 24,
                        remaining: value.len(),
                    });
                }
                frame.asic_bands = Some(decode_asic_bands(&value[..24]));
                i += 26; // code + 24 data bytes + 1 unused trailing value byte
            }
            // Padding or an unsupported record: skip a single byte so the
            // walker re-aligns on the next known code.
            _ => i += 1,
        }
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_widening_at_16_bits() {
        assert_eq!(decode_signed(0xFFFF, 16), -1);
        assert_eq!(decode_signed(0x7FFF, 16), 32767);
        assert_eq!(decode_signed(0x8000, 16), -32768);
        assert_eq!(decode_signed(0x0000, 16), 0);
    }

    #[test]
    fn signed_widening_at_other_widths() {
        assert_eq!(decode_signed(0xFF, 8), -1);
        assert_eq!(decode_signed(0x7F, 8), 127);
        assert_eq!(decode_signed(0x80_0000, 24), -8_388_608);
        assert_eq!(decode_signed(0xFF_FFFF, 24), -1);
    }

    #[test]
    fn decodes_quality_and_raw_eeg_example() {
        let frame = decode_payload(&[0x02, 50, 0x80, 0x00, 0x34, 0x12]).unwrap();
        assert_eq!(frame.quality, Some(50));
        assert_eq!(frame.raw_eeg, Some(0x3412));
        assert_eq!(frame.attention, None);
        assert!(!frame.is_empty());
    }

    #[test]
    fn decodes_negative_raw_eeg() {
        let frame = decode_payload(&[0x80, 0x00, 0xFF, 0xFF]).unwrap();
        assert_eq!(frame.raw_eeg, Some(-1));
    }

    #[test]
    fn raw_eeg_reserved_byte_is_ignored() {
        let a = decode_payload(&[0x80, 0x00, 0x12, 0x34]).unwrap();
        let b = decode_payload(&[0x80, 0xCC, 0x12, 0x34]).unwrap();
        assert_eq!(a.raw_eeg, b.raw_eeg);
    }

    #[test]
    fn decodes_all_single_byte_records() {
        let frame =
            decode_payload(&[0x02, 26, 0x03, 72, 0x04, 91, 0x05, 4, 0x06, 200]).unwrap();
        assert_eq!(frame.quality, Some(26));
        assert_eq!(frame.heartrate, Some(72));
        assert_eq!(frame.attention, Some(91));
        assert_eq!(frame.meditation, Some(4));
        assert_eq!(frame.raw_8bit, Some(200));
    }

    #[test]
    fn decodes_asic_bands_in_wire_order() {
        let mut payload = vec![0x83];
        for band in 1u8..=8 {
            payload.extend_from_slice(&[0x00, 0x00, band]);
        }
        payload.push(0xEE); // unused trailing value byte
        let frame = decode_payload(&payload).unwrap();
        let bands = frame.asic_bands.unwrap();
        assert_eq!(bands.delta, 1);
        assert_eq!(bands.theta, 2);
        assert_eq!(bands.low_alpha, 3);
        assert_eq!(bands.high_alpha, 4);
        assert_eq!(bands.low_beta, 5);
        assert_eq!(bands.high_beta, 6);
        assert_eq!(bands.low_gamma, 7);
        assert_eq!(bands.mid_gamma, 8);
    }

    #[test]
    fn asic_triplets_are_big_endian() {
        let mut payload = vec![0x83, 0x12, 0x34, 0x56];
        payload.extend_from_slice(&[0x00; 21]); // remaining 7 bands
        payload.push(0x00); // trailing value byte
        let frame = decode_payload(&payload).unwrap();
        assert_eq!(frame.asic_bands.unwrap().delta, 0x123456);
    }

    #[test]
    fn unknown_codes_are_skipped_one_byte_at_a_time() {
        // 0x55 and 0x01 match no record; the walker must still find the
        // quality record behind them.
        let frame = decode_payload(&[0x55, 0x01, 0x02, 50]).unwrap();
        assert_eq!(frame.quality, Some(50));
    }

    #[test]
    fn lone_trailing_byte_ends_the_walk() {
        // A final 0x02 with no room for a value byte is ignored, not an error.
        let frame = decode_payload(&[0x04, 77, 0x02]).unwrap();
        assert_eq!(frame.attention, Some(77));
        assert_eq!(frame.quality, None);
    }

    #[test]
    fn truncated_raw_eeg_fails_the_frame() {
        let err = decode_payload(&[0x80, 0x00, 0x12]).unwrap_err();
        assert_eq!(
            err,
            PayloadError::Truncated {
                code: 0x80,
                offset: 0,
                needed: 3,
                remaining: 2,
            }
        );
    }

    #[test]
    fn truncated_asic_record_fails_the_frame() {
        let err = decode_payload(&[0x83, 0x00, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, PayloadError::Truncated { code: 0x83, .. }));
    }

    #[test]
    fn empty_and_padding_only_payloads_decode_to_empty_frames() {
        assert!(decode_payload(&[]).unwrap().is_empty());
        assert!(decode_payload(&[0x55, 0xAA, 0x01, 0x00]).unwrap().is_empty());
    }
}
