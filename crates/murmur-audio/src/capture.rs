//! Microphone capture via cpal.
//!
//! The device callback runs on a driver-owned thread with arbitrary timing
//! relative to the session thread. Sample blocks go into `CaptureBuffer`
//! under its own narrow lock; the loudness scalar is published through an
//! atomic so the meter poll thread never takes a lock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use murmur_core::config::AudioConfig;
use murmur_core::error::{MurmurError, Result};

use crate::wav::encode_wav;

/// Thread-safe accumulator for one utterance's sample blocks.
///
/// Append-only while a session is recording; cleared on each `reset`.
/// The latest block's loudness is readable without the lock.
#[derive(Debug)]
pub struct CaptureBuffer {
    blocks: Mutex<Vec<Vec<i16>>>,
    /// f32 bits of the most recent loudness reading, in [0.0, 1.0].
    loudness: AtomicU32,
    meter_gain: f32,
}

impl CaptureBuffer {
    pub fn new(meter_gain: f32) -> Self {
        Self {
            blocks: Mutex::new(Vec::new()),
            loudness: AtomicU32::new(0f32.to_bits()),
            meter_gain,
        }
    }

    /// Append a copy of a sample block and publish its loudness.
    ///
    /// Called from the cpal callback thread.
    pub fn push_block(&self, block: &[i16]) {
        if let Ok(mut blocks) = self.blocks.lock() {
            blocks.push(block.to_vec());
        }
        self.loudness
            .store(block_loudness(block, self.meter_gain).to_bits(), Ordering::Relaxed);
    }

    /// Latest loudness reading. Lock-free; staleness is tolerated by design.
    pub fn current_loudness(&self) -> f32 {
        f32::from_bits(self.loudness.load(Ordering::Relaxed))
    }

    /// Clear accumulated blocks and zero the loudness reading.
    pub fn reset(&self) {
        if let Ok(mut blocks) = self.blocks.lock() {
            blocks.clear();
        }
        self.loudness.store(0f32.to_bits(), Ordering::Relaxed);
    }

    /// Take all accumulated blocks, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Vec<i16>> {
        self.blocks
            .lock()
            .map(|mut blocks| std::mem::take(&mut *blocks))
            .unwrap_or_default()
    }

    /// Number of blocks currently buffered.
    pub fn len(&self) -> usize {
        self.blocks.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RMS amplitude of a block, normalized to i16 full scale, scaled by the
/// meter gain and clamped to [0, 1].
fn block_loudness(block: &[i16], gain: f32) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = block.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_sq / block.len() as f64).sqrt() as f32;
    (rms / i16::MAX as f32 * gain).clamp(0.0, 1.0)
}

/// Wrapper to make `cpal::Stream` storable inside a `Mutex`.
///
/// `cpal::Stream` carries a `*mut ()` marker that prevents auto `Send`/`Sync`.
/// SAFETY: the handle is only ever stored (to keep capture alive) and dropped
/// (to stop it); sample delivery happens on a cpal-managed thread that shares
/// no mutable state with the handle.
struct SendStream(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for SendStream {}

/// Microphone capture for one utterance at a time.
///
/// `start` opens an input stream at the fixed mono/i16/sample-rate
/// configuration; `stop` closes it and returns the encoded WAV payload.
pub struct AudioCapture {
    config: AudioConfig,
    buffer: Arc<CaptureBuffer>,
    /// The cpal stream is stored here while recording. Dropping it stops
    /// capture.
    stream: Mutex<Option<SendStream>>,
}

impl AudioCapture {
    pub fn new(config: AudioConfig) -> Self {
        let buffer = Arc::new(CaptureBuffer::new(config.meter_gain));
        Self {
            config,
            buffer,
            stream: Mutex::new(None),
        }
    }

    /// Open the input stream and begin accumulating blocks.
    ///
    /// Fails with `AlreadyCapturing` if a stream is already open, and with
    /// `Audio` if no input device is available or the stream cannot be built.
    pub fn start(&self) -> Result<()> {
        let mut guard = self.stream.lock().expect("stream mutex poisoned");
        if guard.is_some() {
            return Err(MurmurError::AlreadyCapturing);
        }

        self.buffer.reset();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| MurmurError::Audio("No input device available".to_string()))?;

        let stream_config = cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer = Arc::clone(&self.buffer);
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    buffer.push_block(data);
                },
                |err| tracing::warn!(error = %err, "Audio input stream error"),
                None,
            )
            .map_err(|e| MurmurError::Audio(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| MurmurError::Audio(format!("Failed to start input stream: {}", e)))?;

        tracing::debug!(
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            "Audio capture started"
        );

        *guard = Some(SendStream(stream));
        Ok(())
    }

    /// Close the stream and return the utterance as WAV bytes.
    ///
    /// Returns the empty sentinel if no blocks were captured. Safe to call
    /// without a prior `start` (same empty sentinel, not an error).
    pub fn stop(&self) -> Result<Vec<u8>> {
        {
            let mut guard = self.stream.lock().expect("stream mutex poisoned");
            // Dropping the stream stops the driver callbacks.
            *guard = None;
        }

        let blocks = self.buffer.drain();
        self.buffer.reset();

        tracing::debug!(blocks = blocks.len(), "Audio capture stopped");
        encode_wav(&blocks, self.config.sample_rate, self.config.channels)
    }

    /// Latest loudness reading in [0.0, 1.0]; 0.0 when no session is active.
    pub fn current_loudness(&self) -> f32 {
        self.buffer.current_loudness()
    }

    /// Whether an input stream is currently open.
    pub fn is_active(&self) -> bool {
        self.stream
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}
