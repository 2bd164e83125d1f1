//! Bounded FIFO of frames waiting for the next flush.

use std::io;

use bytes::BytesMut;
use slcan_udp_proto::{encode_into, CanFrame, EncodeError, MAX_FRAME_LEN};
use thiserror::Error;

use crate::transport::Transport;

/// Matches the write buffer of the motor driver firmware.
pub const DEFAULT_CAPACITY: usize = 32;

/// Returned by [`OutboundQueue::enqueue`] when no slot is left. Carries the
/// rejected frame so the caller can retry it later.
#[derive(Error, Debug)]
#[error("Outbound queue full ({capacity} frames), dropped {frame}")]
pub struct QueueFull {
    frame: CanFrame,
    capacity: usize,
}

impl QueueFull {
    pub fn frame(&self) -> &CanFrame {
        &self.frame
    }

    pub fn into_frame(self) -> CanFrame {
        self.frame
    }
}

/// Why a single queued frame did not make it onto the wire.
#[derive(Error, Debug)]
pub enum FlushError {
    #[error("Frame {frame} rejected: {source}")]
    Encode { frame: CanFrame, source: EncodeError },

    #[error("Sending {frame} failed: {source}")]
    Transport { frame: CanFrame, source: io::Error },
}

impl FlushError {
    pub fn frame(&self) -> &CanFrame {
        match self {
            FlushError::Encode { frame, .. } | FlushError::Transport { frame, .. } => frame,
        }
    }
}

/// Outcome of one flush. Frames that failed are not retained.
#[derive(Debug, Default)]
pub struct FlushReport {
    pub attempted: usize,
    pub sent: usize,
    pub first_error: Option<FlushError>,
}

impl FlushReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.sent
    }

    pub fn is_complete(&self) -> bool {
        self.sent == self.attempted
    }

    /// Number of frames sent, or the first failure.
    pub fn into_result(self) -> Result<usize, FlushError> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(self.sent),
        }
    }
}

#[derive(Debug)]
pub struct OutboundQueue {
    frames: Vec<CanFrame>,
    capacity: usize,
}

impl Default for OutboundQueue {
    fn default() -> Self {
        OutboundQueue::with_capacity(DEFAULT_CAPACITY)
    }
}

impl OutboundQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        OutboundQueue {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.frames.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanFrame> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn enqueue(&mut self, frame: CanFrame) -> Result<(), QueueFull> {
        if self.frames.len() >= self.capacity {
            return Err(QueueFull {
                frame,
                capacity: self.capacity,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Encodes and sends every queued frame in order, then leaves the queue
    /// empty no matter how many of them failed. Also empty if the returned
    /// future is dropped halfway.
    pub async fn drain_and_send<T: Transport>(&mut self, transport: &T) -> FlushReport {
        let mut report = FlushReport::default();
        let mut buf = BytesMut::with_capacity(MAX_FRAME_LEN);

        for frame in self.frames.drain(..) {
            report.attempted += 1;
            log::debug!("Writing {frame}");

            buf.clear();
            let result = match encode_into(&frame, &mut buf) {
                Ok(_) => transport
                    .send(&buf)
                    .await
                    .map(|_| ())
                    .map_err(|source| FlushError::Transport { frame, source }),
                Err(source) => Err(FlushError::Encode { frame, source }),
            };

            match result {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    log::warn!("{e}");
                    if report.first_error.is_none() {
                        report.first_error = Some(e);
                    }
                }
            }
        }

        report
    }
}
