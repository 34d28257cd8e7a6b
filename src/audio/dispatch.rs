use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A run of device-rate mono samples with its position in the stream.
///
/// `start_sample` counts device-rate samples since the stream opened, so
/// the consumer can recover a capture timestamp that stays correct even
/// when intermediate blocks are dropped.
pub(super) struct RawBlock {
    pub(super) start_sample: u64,
    pub(super) samples: Vec<f32>,
}

/// Downmix multi-channel input to mono while applying the provided converter
/// so the pipeline sees a single channel regardless of the microphone layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame to produce a mono representation.
    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

/// Chunks the callback stream into fixed-size blocks and forwards them
/// without blocking. Runs on the CPAL callback thread; when the channel is
/// full the block is dropped and counted instead of waited on.
pub(super) struct BlockDispatcher {
    block_samples: usize,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    samples_seen: u64,
    sender: Sender<RawBlock>,
    dropped: Arc<AtomicUsize>,
}

impl BlockDispatcher {
    pub(super) fn new(
        block_samples: usize,
        sender: Sender<RawBlock>,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            block_samples: block_samples.max(1),
            pending: Vec::with_capacity(block_samples),
            scratch: Vec::new(),
            samples_seen: 0,
            sender,
            dropped,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.block_samples {
            let samples: Vec<f32> = self.pending.drain(..self.block_samples).collect();
            let start_sample = self.samples_seen;
            self.samples_seen += samples.len() as u64;
            match self.sender.try_send(RawBlock {
                start_sample,
                samples,
            }) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    }
}
