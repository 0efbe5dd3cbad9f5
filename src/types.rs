/// The per-band power report carried by an ASIC record (`0x83`).
///
/// Each band is an unsigned 24-bit accumulator in headset-internal units —
/// values are only meaningful relative to each other, not as absolute power.
/// Field order matches the wire order and
/// [`crate::protocol::ASIC_BAND_NAMES`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsicBands {
    /// δ band, 0.5–2.75 Hz.
    pub delta: u32,
    /// θ band, 3.5–6.75 Hz.
    pub theta: u32,
    /// Low α band, 7.5–9.25 Hz.
    pub low_alpha: u32,
    /// High α band, 10–11.75 Hz.
    pub high_alpha: u32,
    /// Low β band, 13–16.75 Hz.
    pub low_beta: u32,
    /// High β band, 18–29.75 Hz.
    pub high_beta: u32,
    /// Low γ band, 31–39.75 Hz.
    pub low_gamma: u32,
    /// Mid γ band, 41–49.75 Hz.
    pub mid_gamma: u32,
}

/// One checksum-validated protocol unit decoded from the serial stream.
///
/// A frame carries at most one record of each kind; a record kind that was
/// not present in the payload stays `None`. The decoder builds a fresh
/// `Frame` per read cycle and never retains it, so there is no carry-over of
/// values between cycles.
///
/// Which records appear depends on the headset's output mode: raw-EEG frames
/// (`raw_eeg` only) arrive at 512 Hz, while the once-per-second summary frame
/// bundles `quality`, `attention`, `meditation`, and `asic_bands`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    /// Electrode contact quality: 0 = good contact, 200 = electrode off head.
    pub quality: Option<u8>,
    /// Heart rate in BPM (only certain headset models emit this).
    pub heartrate: Option<u8>,
    /// eSense attention level, 0–100.
    pub attention: Option<u8>,
    /// eSense meditation level, 0–100.
    pub meditation: Option<u8>,
    /// Legacy 8-bit raw wave value.
    pub raw_8bit: Option<u8>,
    /// One raw EEG sample, sign-extended from the 16-bit wire value.
    ///
    /// This is the signal the blink detector consumes; see
    /// [`crate::blink::BlinkDetector::feed`].
    pub raw_eeg: Option<i16>,
    /// ASIC frequency-band power report.
    pub asic_bands: Option<AsicBands>,
}

impl Frame {
    /// `true` when the payload contained no recognised record at all.
    ///
    /// A valid checksum over a payload of only padding/unknown codes decodes
    /// to an empty frame; callers typically skip these.
    pub fn is_empty(&self) -> bool {
        *self == Frame::default()
    }
}

/// Events emitted by [`crate::thinkgear_client::ThinkGearClient`].
///
/// Consumers receive these through the `mpsc::Receiver` returned by
/// [`crate::thinkgear_client::ThinkGearClient::connect`] or
/// [`crate::thinkgear_client::ThinkGearClient::connect_to`].
#[derive(Debug, Clone)]
pub enum HeadsetEvent {
    /// The serial port has been opened. The inner `String` is the port name
    /// (e.g. `"/dev/ttyUSB0"` or `"COM3"`).
    Connected(String),
    /// One checksum-valid decoded frame.
    Frame(Frame),
    /// The serial link failed (unplugged, read timeout) or the client was
    /// stopped. After this event the channel closes; no further events
    /// arrive and the port has been released.
    Disconnected,
}
