//! Inbound line buffering.
//!
//! The device prints free-form diagnostic text. None of it is interpreted,
//! but it has to be consumed (the device's output buffer stalls the CLI
//! after roughly 10-15 commands otherwise), and it is most useful in logs
//! as complete lines. [`LineBuffer`] accumulates received bytes and yields
//! complete lines, retaining a trailing partial line for the next read.

use bytes::{Buf, BytesMut};

/// Initial capacity of the receive buffer.
const RX_BUFFER_CAPACITY: usize = 256;

/// Accumulates raw serial bytes and splits them into text lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
}

impl LineBuffer {
    /// Create an empty line buffer.
    pub fn new() -> Self {
        LineBuffer {
            buffer: BytesMut::with_capacity(RX_BUFFER_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete line, if one is buffered.
    ///
    /// Lines are split on `\r` or `\n`; empty lines are skipped. Returns
    /// `None` when only a partial line remains, leaving it buffered.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let end = self
                .buffer
                .iter()
                .position(|&b| b == b'\r' || b == b'\n')?;

            let line_data = self.buffer.split_to(end);
            let line = String::from_utf8_lossy(&line_data).to_string();

            // Consume the newline run (handles both \r\n and lone endings).
            while !self.buffer.is_empty()
                && (self.buffer[0] == b'\r' || self.buffer[0] == b'\n')
            {
                self.buffer.advance(1);
            }

            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Number of buffered bytes (the retained partial line).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all buffered data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
