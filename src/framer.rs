//! Line framer
//!
//! Accumulates raw bytes from one connection and yields complete
//! newline-terminated lines in arrival order.

use crate::error::FrameError;

/// Result of feeding one read into a framer
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Frames {
    /// Complete lines, in arrival order, up to any overflow
    pub lines: Vec<Vec<u8>>,
    /// Set when a line grew past the maximum; nothing after it is framed
    pub overflow: Option<FrameError>,
}

/// Per-connection line accumulator
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes received but not yet terminated by `\n`
    buffer: Vec<u8>,
    /// Upper bound on a single line, in bytes
    max_line_length: usize,
    /// Drop a `\r` right before the `\n`
    strip_carriage_return: bool,
}

impl LineFramer {
    /// Create an empty framer that rejects lines longer than `max_line_length`
    ///
    /// `\r\n` endings are accepted; see [`LineFramer::strip_carriage_return`].
    pub fn new(max_line_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_length,
            strip_carriage_return: true,
        }
    }

    /// Choose whether a trailing `\r` is removed from each line
    pub fn strip_carriage_return(mut self, strip: bool) -> Self {
        self.strip_carriage_return = strip;
        self
    }

    /// Append freshly received bytes and drain every complete line
    ///
    /// Returned lines exclude the `\n`. An empty `bytes` slice is a no-op.
    /// Lines completed before an oversized one are still returned; the
    /// overflow is reported alongside them and the buffer is discarded.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Frames::default();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let mut line = &self.buffer[start..end];
            if self.strip_carriage_return {
                if let Some(stripped) = line.strip_suffix(b"\r") {
                    line = stripped;
                }
            }
            if line.len() > self.max_line_length {
                frames.overflow = Some(self.overflow());
                return frames;
            }
            frames.lines.push(line.to_vec());
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.max_line_length {
            frames.overflow = Some(self.overflow());
        }
        frames
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn overflow(&mut self) -> FrameError {
        self.buffer.clear();
        FrameError::LineTooLong {
            max: self.max_line_length,
        }
    }
}
