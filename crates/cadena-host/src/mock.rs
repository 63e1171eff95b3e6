//! Test doubles for the format and instance seams.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use cadena_core::{
    BlockBuffer, EventBuffer, FormatError, PluginFormat, PluginInstance, PluginType, ProcessMode,
    StateError,
};

/// Shared lifecycle log, one entry per observed call.
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A backend that accepts `.mock` files and produces gain instances.
///
/// File stems steer behavior: a stem containing `empty` enumerates nothing,
/// `broken` fails at create time.
pub struct MockFormat {
    gain: f32,
    refuse_layout: bool,
    log: CallLog,
}

impl Default for MockFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFormat {
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            refuse_layout: false,
            log: new_log(),
        }
    }

    pub fn with_gain(gain: f32) -> Self {
        Self {
            gain,
            ..Self::new()
        }
    }

    pub fn refusing_layout(mut self) -> Self {
        self.refuse_layout = true;
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }
}

impl PluginFormat for MockFormat {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension().is_some_and(|e| e == "mock")
    }

    fn enumerate_types(&self, path: &Path) -> Vec<PluginType> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if stem.contains("empty") {
            return Vec::new();
        }
        vec![PluginType {
            format: "mock",
            path: path.to_path_buf(),
            index: 0,
            name: stem.to_string(),
        }]
    }

    fn create(
        &self,
        ty: &PluginType,
        _sample_rate: f64,
        _block_size: usize,
    ) -> Result<Box<dyn PluginInstance>, FormatError> {
        if ty.name.contains("broken") {
            return Err(FormatError("create refused".into()));
        }
        Ok(Box::new(MockInstance {
            name: ty.name.clone(),
            gain: self.gain,
            refuse_layout: self.refuse_layout,
            log: Rc::clone(&self.log),
            state_blob: Vec::new(),
            released: false,
        }))
    }
}

/// A gain stage that records every lifecycle call it receives.
pub struct MockInstance {
    name: String,
    gain: f32,
    refuse_layout: bool,
    log: CallLog,
    state_blob: Vec<u8>,
    released: bool,
}

impl MockInstance {
    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}:{call}", self.name));
    }
}

impl PluginInstance for MockInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_mode(&mut self, mode: ProcessMode) {
        self.record(match mode {
            ProcessMode::Offline => "set_mode(offline)",
            ProcessMode::Realtime => "set_mode(realtime)",
        });
    }

    fn input_channels(&self) -> usize {
        2
    }

    fn output_channels(&self) -> usize {
        2
    }

    fn request_layout(&mut self, inputs: usize, outputs: usize) -> bool {
        self.record(&format!("request_layout({inputs},{outputs})"));
        !self.refuse_layout
    }

    fn prepare(&mut self, _sample_rate: f64, _block_size: usize) {
        self.record("prepare");
    }

    fn reset(&mut self) {
        self.record("reset");
    }

    fn process(&mut self, buffer: &mut BlockBuffer, frames: usize, _events: &mut EventBuffer) {
        self.record("process");
        for ch in 0..buffer.num_channels() {
            for sample in &mut buffer.channel_mut(ch)[..frames] {
                *sample *= self.gain;
            }
        }
    }

    fn state(&mut self) -> Vec<u8> {
        if self.state_blob.is_empty() {
            self.gain.to_le_bytes().to_vec()
        } else {
            self.state_blob.clone()
        }
    }

    fn restore_state(&mut self, data: &[u8]) -> Result<(), StateError> {
        if data == b"bad" {
            return Err(StateError("unrecognized blob".into()));
        }
        if let Ok(bytes) = <[u8; 4]>::try_from(data) {
            self.gain = f32::from_le_bytes(bytes);
        }
        self.state_blob = data.to_vec();
        self.record("restore_state");
        Ok(())
    }

    fn release(&mut self) {
        assert!(!self.released, "release called twice");
        self.released = true;
        self.record("release");
    }
}
