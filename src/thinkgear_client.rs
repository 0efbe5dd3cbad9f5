//! Serial client for ThinkGear headsets.
//!
//! Three layers, innermost first:
//!
//! * [`FrameReader`] — blocking frame extraction from any [`Read`] stream:
//!   sync-marker scan, length-prefixed payload, checksum verification,
//!   payload decode. Only checksum-valid frames ever leave it.
//! * [`RecoverySink`] — injected reporting capability for recoverable
//!   protocol events (checksum mismatch, truncated record), so the reader
//!   does not depend on process-wide logging state. [`LogRecoverySink`]
//!   forwards to the `log` facade at warning level.
//! * [`ThinkGearClient`] — opens the serial port (configured or
//!   auto-discovered), runs the reader on a blocking task, and hands back an
//!   event channel plus a [`ThinkGearHandle`] for cancellation.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use serialport::SerialPort;
use tokio::sync::mpsc;

use crate::parse::{decode_payload, PayloadError};
use crate::protocol::{checksum, DEFAULT_BAUD_RATE, SYNC_BYTE};
use crate::types::{Frame, HeadsetEvent};

// ── Errors ───────────────────────────────────────────────────────────────────

/// Fatal transport-level failure while reading frames.
///
/// There is deliberately no recoverable variant here: checksum mismatches and
/// truncated payloads are handled inside [`FrameReader::next_frame`] by
/// resynchronising, and are reported through the [`RecoverySink`] instead.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The transport failed mid-read (unplugged device, read timeout).
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The byte source reached end-of-stream.
    #[error("byte stream ended (device disconnected)")]
    StreamEnded,
}

// ── Recovery sink ─────────────────────────────────────────────────────────────

/// Reporting capability for recoverable protocol events.
///
/// Both events mean one frame was discarded and the reader is rescanning for
/// the next sync marker; neither is ever surfaced to the frame consumer.
/// Inject a custom implementation to count or capture them (tests do), or
/// rely on [`LogRecoverySink`].
pub trait RecoverySink: Send {
    /// The received checksum byte disagreed with the one computed over the
    /// payload.
    fn checksum_mismatch(&mut self, computed: u8, received: u8);

    /// A checksum-valid payload contained a record cut short by the payload
    /// boundary.
    fn truncated_payload(&mut self, error: &PayloadError);
}

/// Default [`RecoverySink`]: warning-level messages through the `log` facade.
#[derive(Debug, Default)]
pub struct LogRecoverySink;

impl RecoverySink for LogRecoverySink {
    fn checksum_mismatch(&mut self, computed: u8, received: u8) {
        warn!(
            "checksum mismatch (computed 0x{computed:02X}, received 0x{received:02X}) — frame discarded"
        );
    }

    fn truncated_payload(&mut self, error: &PayloadError) {
        warn!("{error} — frame discarded");
    }
}

// ── Frame reader ──────────────────────────────────────────────────────────────

/// Reads checksum-valid ThinkGear frames from any [`Read`] stream.
///
/// The reader owns the transport; dropping it releases the handle. It keeps
/// no decode state between calls — every [`next_frame`](Self::next_frame)
/// builds a fresh [`Frame`].
pub struct FrameReader<R> {
    inner: R,
    sink: Box<dyn RecoverySink>,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader reporting recoverable events through [`LogRecoverySink`].
    pub fn new(inner: R) -> Self {
        Self::with_sink(inner, Box::new(LogRecoverySink))
    }

    /// Create a reader with an explicit recovery sink.
    pub fn with_sink(inner: R, sink: Box<dyn RecoverySink>) -> Self {
        Self { inner, sink }
    }

    /// Consume the reader and return the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Block until the next complete, checksum-valid frame.
    ///
    /// Per attempt: scan for the `0xAA 0xAA` sync marker (discarding
    /// everything before it), read the one-byte payload length, the payload,
    /// and the checksum byte. A checksum mismatch or a truncated record
    /// discards the attempt, reports it to the sink, and rescans — the
    /// stream self-heals at the next marker. Only transport failures are
    /// returned as errors.
    pub fn next_frame(&mut self) -> Result<Frame, FrameError> {
        loop {
            self.sync()?;
            let plength = usize::from(self.read_byte()?);
            let mut payload = vec![0u8; plength];
            self.read_exact(&mut payload)?;

            let computed = checksum(&payload);
            let received = self.read_byte()?;
            if computed != received {
                self.sink.checksum_mismatch(computed, received);
                continue;
            }

            match decode_payload(&payload) {
                Ok(frame) => return Ok(frame),
                Err(err) => {
                    // Same policy as a checksum mismatch: the frame is torn,
                    // drop it whole and resynchronise.
                    self.sink.truncated_payload(&err);
                    continue;
                }
            }
        }
    }

    /// Consume bytes until two consecutive [`SYNC_BYTE`]s have been seen.
    fn sync(&mut self) -> Result<(), FrameError> {
        let mut run = 0;
        while run < 2 {
            if self.read_byte()? == SYNC_BYTE {
                run += 1;
            } else {
                run = 0;
            }
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, FrameError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), FrameError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(FrameError::StreamEnded),
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}

// ── Client configuration ──────────────────────────────────────────────────────

/// Configuration for [`ThinkGearClient`].
#[derive(Debug, Clone)]
pub struct ThinkGearClientConfig {
    /// Serial port to open (e.g. `"/dev/ttyUSB0"`, `"COM3"`).
    ///
    /// `None` enumerates the available ports and tries each until one opens.
    /// Default: `None`.
    pub port: Option<String>,
    /// Serial baud rate. Default: [`DEFAULT_BAUD_RATE`] (57600).
    pub baud_rate: u32,
    /// Serial read timeout.
    ///
    /// A streaming headset is never silent this long, so a timeout is
    /// treated as a dead link (fatal), and it also bounds how long a
    /// [`ThinkGearHandle::stop`] request can go unobserved.
    /// Default: 3 seconds.
    pub read_timeout: Duration,
}

impl Default for ThinkGearClientConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(3),
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Serial streaming client for ThinkGear headsets.
///
/// Connecting spawns a blocking reader task that owns the port and drives
/// [`FrameReader::next_frame`] in a tight loop — the single blocking point of
/// the pipeline. Decoded frames arrive as [`HeadsetEvent`]s on the returned
/// channel, in read order.
pub struct ThinkGearClient {
    config: ThinkGearClientConfig,
}

impl ThinkGearClient {
    pub fn new(config: ThinkGearClientConfig) -> Self {
        Self { config }
    }

    // ── Public: scan ─────────────────────────────────────────────────────────

    /// Names of all serial ports currently present on the system.
    pub fn scan_all(&self) -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    // ── Public: connect_to ───────────────────────────────────────────────────

    /// Open a specific serial port and start streaming frames from it.
    ///
    /// Returns the event receiver and a [`ThinkGearHandle`] for stopping the
    /// stream.
    pub async fn connect_to(
        &self,
        port_name: &str,
    ) -> Result<(mpsc::Receiver<HeadsetEvent>, ThinkGearHandle)> {
        let port = self.open(port_name)?;
        self.start_stream(port_name.to_owned(), port).await
    }

    // ── Public: connect (convenience) ────────────────────────────────────────

    /// Connect to the configured port, or probe the available ports until
    /// one opens.
    ///
    /// Probing walks the enumeration in reverse because USB serial adapters
    /// tend to enumerate after the built-in ports. Failure to open a
    /// candidate is logged and the next one is tried; only exhausting every
    /// port is an error.
    pub async fn connect(&self) -> Result<(mpsc::Receiver<HeadsetEvent>, ThinkGearHandle)> {
        if let Some(name) = self.config.port.clone() {
            info!("Using configured port: {name}");
            let port = self.open(&name)?;
            return self.start_stream(name, port).await;
        }

        let ports = self.scan_all()?;
        info!(
            "No port configured — probing {} available port(s)",
            ports.len()
        );
        for name in ports.iter().rev() {
            match self.open(name) {
                Ok(port) => {
                    info!("Connected to headset on {name}");
                    return self.start_stream(name.clone(), port).await;
                }
                Err(err) => warn!("Could not open {name}: {err}"),
            }
        }

        Err(anyhow!(
            "no ThinkGear device found on available ports [{}]",
            ports.join(", ")
        ))
    }

    // ── Private ──────────────────────────────────────────────────────────────

    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPort>> {
        let port = serialport::new(port_name, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()?;
        Ok(port)
    }

    /// Spawn the blocking reader loop and wire up the event channel.
    async fn start_stream(
        &self,
        port_name: String,
        port: Box<dyn SerialPort>,
    ) -> Result<(mpsc::Receiver<HeadsetEvent>, ThinkGearHandle)> {
        let (tx, rx) = mpsc::channel::<HeadsetEvent>(256);
        let _ = tx.send(HeadsetEvent::Connected(port_name.clone())).await;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let task_port_name = port_name.clone();

        tokio::task::spawn_blocking(move || {
            let mut reader = FrameReader::new(port);

            let reason = loop {
                // Observed at frame boundaries; the serial read timeout
                // bounds how long a raised flag can go unnoticed.
                if stop_flag.load(Ordering::Relaxed) {
                    break "stop requested";
                }
                match reader.next_frame() {
                    Ok(frame) => {
                        debug!("frame: {frame:?}");
                        if tx.blocking_send(HeadsetEvent::Frame(frame)).is_err() {
                            break "event receiver dropped";
                        }
                    }
                    Err(err) => {
                        error!("Transport failure on {task_port_name}: {err}");
                        break "transport error";
                    }
                }
            };

            info!("Reader loop on {task_port_name} ended ({reason})");
            let _ = tx.blocking_send(HeadsetEvent::Disconnected);
            // Dropping the reader releases the serial handle.
        });

        Ok((rx, ThinkGearHandle { stop, port_name }))
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Handle to an active stream; lets the owner stop it cleanly.
pub struct ThinkGearHandle {
    stop: Arc<AtomicBool>,
    port_name: String,
}

impl ThinkGearHandle {
    /// Name of the serial port the stream is reading from.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Request a clean stop.
    ///
    /// The reader observes the request at the next frame boundary (at the
    /// latest after one read timeout), emits [`HeadsetEvent::Disconnected`],
    /// and releases the port.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;

    use super::*;
    use crate::types::AsicBands;

    /// Wrap a payload in sync marker, length prefix, and checksum.
    fn frame_bytes(payload: &[u8]) -> Vec<u8> {
        let mut wire = vec![SYNC_BYTE, SYNC_BYTE, payload.len() as u8];
        wire.extend_from_slice(payload);
        wire.push(checksum(payload));
        wire
    }

    /// Sink that captures recoverable events for assertions.
    #[derive(Default)]
    struct CaptureSink {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RecoverySink for CaptureSink {
        fn checksum_mismatch(&mut self, computed: u8, received: u8) {
            self.events
                .lock()
                .unwrap()
                .push(format!("checksum {computed:02X}!={received:02X}"));
        }

        fn truncated_payload(&mut self, error: &PayloadError) {
            self.events.lock().unwrap().push(format!("truncated: {error}"));
        }
    }

    #[test]
    fn reads_a_single_frame() {
        let wire = frame_bytes(&[0x02, 50, 0x80, 0x00, 0x34, 0x12]);
        let mut reader = FrameReader::new(Cursor::new(wire));
        let frame = reader.next_frame().unwrap();
        assert_eq!(frame.quality, Some(50));
        assert_eq!(frame.raw_eeg, Some(0x3412));
    }

    #[test]
    fn resyncs_across_garbage_and_returns_each_frame_once() {
        let mut wire = vec![0x13, 0x37, 0xAA, 0x00]; // garbage incl. a lone sync byte
        wire.extend(frame_bytes(&[0x04, 91]));
        wire.extend([0xFF, 0x00, 0xAA]); // more garbage
        wire.extend(frame_bytes(&[0x05, 12]));
        let mut reader = FrameReader::new(Cursor::new(wire));

        let first = reader.next_frame().unwrap();
        assert_eq!(first.attention, Some(91));
        let second = reader.next_frame().unwrap();
        assert_eq!(second.meditation, Some(12));
        assert!(matches!(
            reader.next_frame().unwrap_err(),
            FrameError::StreamEnded
        ));
    }

    #[test]
    fn split_sync_marker_does_not_count() {
        // AA 00 AA AA: the first sync byte is cancelled by the 0x00, the
        // marker is the later consecutive pair.
        let mut wire = vec![SYNC_BYTE, 0x00];
        wire.extend(frame_bytes(&[0x02, 0]));
        let mut reader = FrameReader::new(Cursor::new(wire));
        assert_eq!(reader.next_frame().unwrap().quality, Some(0));
    }

    #[test]
    fn checksum_mismatch_is_reported_and_skipped() {
        let mut bad = frame_bytes(&[0x02, 50]);
        *bad.last_mut().unwrap() ^= 0xFF; // corrupt the checksum byte
        let mut wire = bad;
        wire.extend(frame_bytes(&[0x02, 7]));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = CaptureSink {
            events: Arc::clone(&events),
        };
        let mut reader = FrameReader::with_sink(Cursor::new(wire), Box::new(sink));

        // The corrupt frame is invisible; the next valid one comes through.
        assert_eq!(reader.next_frame().unwrap().quality, Some(7));
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with("checksum"));
    }

    #[test]
    fn corrupted_payload_byte_fails_the_checksum() {
        let mut wire = frame_bytes(&[0x02, 50]);
        wire[4] ^= 0x01; // flip a payload bit, keep the stale checksum
        wire.extend(frame_bytes(&[0x03, 60]));
        let mut reader = FrameReader::new(Cursor::new(wire));
        assert_eq!(reader.next_frame().unwrap().heartrate, Some(60));
    }

    #[test]
    fn truncated_record_discards_the_whole_frame() {
        // Checksum-valid payload whose raw-EEG record runs past the end.
        let mut wire = frame_bytes(&[0x80, 0x00, 0x12]);
        wire.extend(frame_bytes(&[0x02, 1]));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = CaptureSink {
            events: Arc::clone(&events),
        };
        let mut reader = FrameReader::with_sink(Cursor::new(wire), Box::new(sink));

        let frame = reader.next_frame().unwrap();
        // Nothing from the torn frame survives, not even decodable records.
        assert_eq!(frame.raw_eeg, None);
        assert_eq!(frame.quality, Some(1));
        assert!(events.lock().unwrap()[0].starts_with("truncated"));
    }

    #[test]
    fn zero_length_payload_is_a_valid_empty_frame() {
        let wire = frame_bytes(&[]);
        let mut reader = FrameReader::new(Cursor::new(wire));
        assert!(reader.next_frame().unwrap().is_empty());
    }

    #[test]
    fn sync_bytes_inside_a_payload_are_not_markers() {
        // A payload may legally contain 0xAA bytes; they are only markers
        // during the inter-frame scan.
        let wire = frame_bytes(&[0x55, 0xAA, 0xAA, 0x02, 77]);
        let mut reader = FrameReader::new(Cursor::new(wire));
        assert_eq!(reader.next_frame().unwrap().quality, Some(77));
    }

    #[test]
    fn eof_mid_frame_is_fatal() {
        let mut wire = frame_bytes(&[0x02, 50]);
        wire.truncate(4); // cut inside the payload
        let mut reader = FrameReader::new(Cursor::new(wire));
        assert!(matches!(
            reader.next_frame().unwrap_err(),
            FrameError::StreamEnded
        ));
    }

    #[test]
    fn decodes_a_full_summary_frame() {
        // The once-per-second summary: quality, attention, meditation, bands.
        let mut payload = vec![0x02, 0, 0x04, 63, 0x05, 48, 0x83];
        for band in 1u8..=8 {
            payload.extend_from_slice(&[0x00, 0x01, band]);
        }
        payload.push(0x00); // unused trailing ASIC value byte
        let mut reader = FrameReader::new(Cursor::new(frame_bytes(&payload)));
        let frame = reader.next_frame().unwrap();
        assert_eq!(frame.quality, Some(0));
        assert_eq!(frame.attention, Some(63));
        assert_eq!(frame.meditation, Some(48));
        assert_eq!(
            frame.asic_bands,
            Some(AsicBands {
                delta: 0x101,
                theta: 0x102,
                low_alpha: 0x103,
                high_alpha: 0x104,
                low_beta: 0x105,
                high_beta: 0x106,
                low_gamma: 0x107,
                mid_gamma: 0x108,
            })
        );
    }
}
