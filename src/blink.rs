//! Blink-gesture detection over the raw EEG sample stream.
//!
//! A deliberate eye blink shows up in the raw signal as a sharp positive
//! spike, a negative dip shortly after, and a return to the near-zero
//! baseline:
//!
//! ```text
//!        spike
//!          ▲
//!   ───────┘└─┐  ┌────── baseline
//!             └─┘
//!             dip
//! ```
//!
//! [`BlinkDetector`] classifies that waveform with a three-state timing
//! machine. All delays are measured in sample indices, not wall-clock time —
//! at the headset's 512 Hz raw rate the default dip window of 500 samples is
//! roughly one second.

/// Thresholds and timeouts for [`BlinkDetector`], immutable after
/// construction.
///
/// All values are in the units of the incoming stream: thresholds in raw EEG
/// ADC counts, delays in sample indices.
#[derive(Debug, Clone, Copy)]
pub struct BlinkConfig {
    /// A sample above this value starts a blink candidate. Default: `500`.
    pub spike_threshold: i32,
    /// A sample below this value completes the dip leg. Default: `-400`.
    pub dip_threshold: i32,
    /// The waveform completes when a sample falls strictly inside
    /// `(-baseline_threshold, baseline_threshold)`. Default: `150`.
    pub baseline_threshold: i32,
    /// Samples allowed between spike and dip before the candidate is
    /// abandoned. Default: `500`.
    pub max_dip_delay: u64,
    /// Samples allowed between dip and baseline return before the candidate
    /// is abandoned. Default: `200`.
    pub max_baseline_delay: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            spike_threshold: 500,
            dip_threshold: -400,
            baseline_threshold: 150,
            max_dip_delay: 500,
            max_baseline_delay: 200,
        }
    }
}

/// Where the detector is within the spike → dip → baseline waveform.
///
/// The index marker for each waiting state lives inside its variant, so a
/// marker cannot outlive the state that owns it; a new candidate overwrites
/// the marker rather than accumulating history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkState {
    /// No candidate in progress; waiting for a spike.
    Idle,
    /// Spike seen at `spike_index`; waiting for the dip.
    WaitingForDip { spike_index: u64 },
    /// Dip seen at `dip_index`; waiting for the return to baseline.
    WaitingForBaseline { dip_index: u64 },
}

/// Single-stream blink classifier.
///
/// Feed raw EEG samples one at a time; [`feed`](Self::feed) returns `true`
/// exactly on the sample that completes a full blink waveform. The detector
/// is a pure function of its current state plus the incoming sample — no
/// sample history is buffered.
///
/// Not designed for concurrent use: call `feed` from the single context that
/// consumes decoded frames so the sample index ordering is preserved.
///
/// # Example
///
/// ```
/// # use thinkgear_rs::blink::{BlinkConfig, BlinkDetector};
/// let mut detector = BlinkDetector::new(BlinkConfig::default());
/// assert!(!detector.feed(600));  // spike
/// assert!(!detector.feed(-500)); // dip
/// assert!(detector.feed(50));    // back to baseline → blink
/// ```
#[derive(Debug)]
pub struct BlinkDetector {
    config: BlinkConfig,
    state: BlinkState,
    /// Count of samples fed so far; increments once per [`feed`](Self::feed)
    /// call regardless of outcome, never decreases.
    current_index: u64,
}

impl BlinkDetector {
    /// Create an idle detector with the given thresholds.
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            state: BlinkState::Idle,
            current_index: 0,
        }
    }

    /// Number of samples fed so far.
    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    /// `true` while `value` lies strictly inside the baseline band.
    fn in_baseline(&self, value: i32) -> bool {
        -self.config.baseline_threshold < value && value < self.config.baseline_threshold
    }

    /// Feed one raw EEG sample; returns `true` when this sample completes a
    /// blink waveform.
    ///
    /// In each waiting state the timeout check runs before the target check,
    /// so a sample that is simultaneously too late and on-target counts as a
    /// timeout and fires no event. Delay comparisons are strict (`>`): a
    /// delay exactly equal to the maximum is still within bounds. At most
    /// one event fires per call.
    pub fn feed(&mut self, sample: i16) -> bool {
        let value = i32::from(sample);
        let mut detected = false;

        match self.state {
            BlinkState::Idle => {
                if value > self.config.spike_threshold {
                    self.state = BlinkState::WaitingForDip {
                        spike_index: self.current_index,
                    };
                }
            }
            BlinkState::WaitingForDip { spike_index } => {
                if self.current_index - spike_index > self.config.max_dip_delay {
                    // Too slow to reach the dip; abandon the candidate.
                    self.state = BlinkState::Idle;
                } else if value < self.config.dip_threshold {
                    self.state = BlinkState::WaitingForBaseline {
                        dip_index: self.current_index,
                    };
                }
            }
            BlinkState::WaitingForBaseline { dip_index } => {
                if self.current_index - dip_index > self.config.max_baseline_delay {
                    // Too slow to return to baseline; abandon the candidate.
                    self.state = BlinkState::Idle;
                } else if self.in_baseline(value) {
                    self.state = BlinkState::Idle;
                    detected = true;
                }
            }
        }

        self.current_index += 1;
        detected
    }
}
