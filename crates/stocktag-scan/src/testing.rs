//! Scripted camera, locator and emitter fakes for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use qrcode::{Color, QrCode};
use uuid::Uuid;

use stocktag_core::{MalformedPayloadError, PayloadCodec, ProductRecord};

use crate::error::DeviceError;
use crate::events::ScanEventEmitter;
use crate::frame::{CameraDevice, Frame, FrameSource, PixelFormat};
use crate::locator::Locator;
use crate::session::ScanState;

/// Base64 of "not-a-product", so it is a well-formed code that fails to decode.
pub const MALFORMED: &str = "bm90LWEtcHJvZHVjdA";

pub fn sample_record() -> ProductRecord {
    ProductRecord::new("m16x50", "M16X50 Akb Civata", "M16X50AKB").with_optical_tag("BC7K2Q9X0AM")
}

pub fn valid_payload() -> String {
    PayloadCodec::encode(&sample_record())
        .expect("sample record is valid")
        .into_string()
}

// =============================================================================
// Scripted Camera
// =============================================================================

/// What the scripted camera returns on one read. The last step repeats.
#[derive(Debug, Clone)]
pub enum Step {
    /// A frame whose bytes are this text (see [`TextLocator`]).
    Code(String),
    /// A frame with no code in it.
    Blank,
    /// No frame ready.
    Nothing,
    /// The device is gone.
    Lost,
}

impl Step {
    pub fn code(text: &str) -> Self {
        Step::Code(text.to_string())
    }
}

/// Counts camera calls. Sources sharing a probe model one physical camera.
#[derive(Debug, Default)]
pub struct Probe {
    opens: AtomicUsize,
    reads: AtomicUsize,
    closes: AtomicUsize,
    open_now: AtomicUsize,
    peak: AtomicUsize,
}

impl Probe {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Most devices ever open at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct ScriptedSource {
    steps: Arc<Vec<Step>>,
    probe: Arc<Probe>,
    available: bool,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        (Self::sharing(steps, &probe), probe)
    }

    /// A source reporting to an existing probe.
    pub fn sharing(steps: Vec<Step>, probe: &Arc<Probe>) -> Self {
        ScriptedSource {
            steps: Arc::new(steps),
            probe: Arc::clone(probe),
            available: true,
        }
    }

    pub fn unavailable() -> (Self, Arc<Probe>) {
        let (mut source, probe) = Self::new(Vec::new());
        source.available = false;
        (source, probe)
    }
}

impl FrameSource for ScriptedSource {
    type Device = ScriptedDevice;

    fn open(&mut self) -> Result<ScriptedDevice, DeviceError> {
        if !self.available {
            return Err(DeviceError::Unavailable("no camera attached".into()));
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        let now = self.probe.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.peak.fetch_max(now, Ordering::SeqCst);
        Ok(ScriptedDevice {
            steps: Arc::clone(&self.steps),
            cursor: 0,
            probe: Arc::clone(&self.probe),
        })
    }
}

pub struct ScriptedDevice {
    steps: Arc<Vec<Step>>,
    cursor: usize,
    probe: Arc<Probe>,
}

impl CameraDevice for ScriptedDevice {
    fn current_frame(&mut self) -> Result<Option<Frame>, DeviceError> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(self.cursor)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or(Step::Nothing);
        self.cursor += 1;

        match step {
            Step::Code(text) => Ok(Some(text_frame(&text))),
            Step::Blank => Ok(Some(text_frame(""))),
            Step::Nothing => Ok(None),
            Step::Lost => Err(DeviceError::Lost("unplugged".into())),
        }
    }

    fn close(self) {
        self.probe.open_now.fetch_sub(1, Ordering::SeqCst);
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn text_frame(text: &str) -> Frame {
    Frame::new(text.len() as u32, 1, PixelFormat::Luma8, text.as_bytes().to_vec())
        .expect("one byte per pixel")
}

// =============================================================================
// Locators
// =============================================================================

/// Treats a frame's bytes as the code text. Empty frames have no code.
pub struct TextLocator;

impl Locator for TextLocator {
    fn locate(&self, frame: &Frame) -> Option<String> {
        if frame.data.is_empty() {
            return None;
        }
        String::from_utf8(frame.data.clone()).ok()
    }
}

/// [`TextLocator`] that takes a while and tracks how many calls overlap.
pub struct SlowLocator {
    delay: Duration,
    gauge: Arc<Gauge>,
}

impl SlowLocator {
    pub fn new(delay: Duration) -> (Self, Arc<Gauge>) {
        let gauge = Arc::new(Gauge::default());
        let locator = SlowLocator {
            delay,
            gauge: Arc::clone(&gauge),
        };
        (locator, gauge)
    }
}

impl Locator for SlowLocator {
    fn locate(&self, frame: &Frame) -> Option<String> {
        let now = self.gauge.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);
        self.gauge.calls.fetch_add(1, Ordering::SeqCst);

        std::thread::sleep(self.delay);
        let text = TextLocator.locate(frame);

        self.gauge.running.fetch_sub(1, Ordering::SeqCst);
        text
    }
}

/// Concurrent [`SlowLocator`] calls.
#[derive(Debug, Default)]
pub struct Gauge {
    running: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl Gauge {
    /// Most locate calls ever running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Emitter
// =============================================================================

#[derive(Default)]
pub struct RecordingEmitter {
    states: Mutex<Vec<&'static str>>,
    rejected: AtomicUsize,
}

impl RecordingEmitter {
    pub fn states(&self) -> Vec<&'static str> {
        self.states.lock().expect("emitter lock").clone()
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

impl ScanEventEmitter for RecordingEmitter {
    fn emit_state(&self, _session_id: Uuid, state: &ScanState) {
        self.states.lock().expect("emitter lock").push(state.name());
    }

    fn emit_rejected(&self, _session_id: Uuid, _error: &MalformedPayloadError) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// QR Rendering
// =============================================================================

/// Renders `text` as a Luma8 frame, `scale` pixels per module, with a
/// four-module quiet zone.
pub fn render_qr(text: &str, scale: usize) -> Frame {
    let code = QrCode::new(text.as_bytes()).expect("text fits in a QR code");
    let modules = code.width();
    let colors = code.to_colors();
    let quiet = 4;
    let side = (modules + 2 * quiet) * scale;

    let mut data = vec![255u8; side * side];
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (mx, my) = (i % modules + quiet, i / modules + quiet);
        for dy in 0..scale {
            for dx in 0..scale {
                data[(my * scale + dy) * side + mx * scale + dx] = 0;
            }
        }
    }

    Frame::new(side as u32, side as u32, PixelFormat::Luma8, data).expect("sized buffer")
}
