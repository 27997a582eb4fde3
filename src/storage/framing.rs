//! Record framing for the encrypted stream
//!
//! Each record is a 4-byte sync marker, a 4-byte big-endian length, then
//! exactly that many ciphertext bytes. Parsing never depends on the
//! ciphertext content; the marker only matters after a damaged header, when
//! the reader scans forward to the next record instead of giving up.

use crate::domain::{Result, VigilError};

/// Marker that opens every frame
pub const FRAME_MARKER: [u8; 4] = *b"VGL\x01";

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Marker plus length prefix
pub const FRAME_HEADER_LEN: usize = FRAME_MARKER.len() + LENGTH_PREFIX_LEN;

/// Frame a payload
///
/// # Errors
///
/// Returns `Serialization` if the payload does not fit a 32-bit length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        VigilError::Serialization(format!("record of {} bytes is too large", payload.len()))
    })?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&FRAME_MARKER);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// One item produced by [`FrameReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A complete record payload
    Complete(&'a [u8]),
    /// Bytes with no readable frame header; reading resumes at the next marker
    Corrupt {
        /// Byte offset where the unreadable region starts
        offset: usize,
        /// Length of the unreadable region
        skipped: usize,
    },
    /// The buffer ended inside a frame; no further frames follow
    Truncated {
        /// Byte offset where the partial frame starts
        offset: usize,
        /// Payload length the prefix announced, if the header itself was whole
        declared: Option<usize>,
        /// Bytes left in the buffer from `offset`
        available: usize,
    },
}

/// Iterator over the frames of an encrypted partition
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> FrameReader<'a> {
    /// Read frames from `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            done: false,
        }
    }

    /// Offset of the next marker at or after `from`
    fn next_marker(&self, from: usize) -> Option<usize> {
        self.buf
            .get(from..)?
            .windows(FRAME_MARKER.len())
            .position(|w| w == FRAME_MARKER)
            .map(|pos| from + pos)
    }

    /// Skip to the next marker after the current offset
    fn resync(&mut self) -> Frame<'a> {
        let start = self.offset;
        match self.next_marker(start + 1) {
            Some(next) => {
                self.offset = next;
                Frame::Corrupt {
                    offset: start,
                    skipped: next - start,
                }
            }
            None => {
                self.done = true;
                Frame::Corrupt {
                    offset: start,
                    skipped: self.buf.len() - start,
                }
            }
        }
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.buf.len() {
            return None;
        }

        let rest = &self.buf[self.offset..];
        if !rest.starts_with(&FRAME_MARKER[..rest.len().min(FRAME_MARKER.len())]) {
            return Some(self.resync());
        }

        if rest.len() < FRAME_HEADER_LEN {
            self.done = true;
            return Some(Frame::Truncated {
                offset: self.offset,
                declared: None,
                available: rest.len(),
            });
        }

        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        prefix.copy_from_slice(&rest[FRAME_MARKER.len()..FRAME_HEADER_LEN]);
        let declared = u32::from_be_bytes(prefix) as usize;

        let body = &rest[FRAME_HEADER_LEN..];
        if body.len() < declared {
            // A later marker means the length was damaged, not the tail cut
            if self.next_marker(self.offset + FRAME_HEADER_LEN).is_some() {
                return Some(self.resync());
            }
            self.done = true;
            return Some(Frame::Truncated {
                offset: self.offset,
                declared: Some(declared),
                available: rest.len(),
            });
        }

        self.offset += FRAME_HEADER_LEN + declared;
        Some(Frame::Complete(&body[..declared]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(frames: &[&[u8]]) -> Vec<u8> {
        frames
            .iter()
            .flat_map(|payload| encode_frame(payload).unwrap())
            .collect()
    }

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(b"abc").unwrap();
        assert_eq!(frame, vec![b'V', b'G', b'L', 1, 0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_reads_frames_in_order() {
        let buf = concat(&[b"first", b"", b"third"]);
        let frames: Vec<_> = FrameReader::new(&buf).collect();
        assert_eq!(
            frames,
            vec![
                Frame::Complete(b"first"),
                Frame::Complete(b""),
                Frame::Complete(b"third"),
            ]
        );
    }

    #[test]
    fn test_payload_containing_old_delimiter_is_intact() {
        let payload = b"abc\n---RECORD---\ndef";
        let buf = concat(&[payload, b"next"]);
        let frames: Vec<_> = FrameReader::new(&buf).collect();
        assert_eq!(frames[0], Frame::Complete(&payload[..]));
        assert_eq!(frames[1], Frame::Complete(b"next"));
    }

    #[test]
    fn test_truncated_body_stops_iteration() {
        let mut buf = concat(&[b"whole"]);
        let partial = encode_frame(b"partial").unwrap();
        buf.extend_from_slice(&partial[..10]);

        let frames: Vec<_> = FrameReader::new(&buf).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Frame::Complete(b"whole"));
        assert_eq!(
            frames[1],
            Frame::Truncated {
                offset: 13,
                declared: Some(7),
                available: 10,
            }
        );
    }

    #[test]
    fn test_truncated_header() {
        let buf = [b'V', b'G', b'L', 1, 0, 0];
        let frames: Vec<_> = FrameReader::new(&buf).collect();
        assert_eq!(
            frames,
            vec![Frame::Truncated {
                offset: 0,
                declared: None,
                available: 6,
            }]
        );
    }

    #[test]
    fn test_oversized_length_resyncs_at_next_marker() {
        let mut buf = concat(&[b"first", b"second", b"third"]);
        // first frame is 13 bytes; its successor's length sits after the marker
        buf[13 + 4..13 + 8].copy_from_slice(&u32::MAX.to_be_bytes());

        let frames: Vec<_> = FrameReader::new(&buf).collect();
        assert_eq!(
            frames,
            vec![
                Frame::Complete(b"first"),
                Frame::Corrupt {
                    offset: 13,
                    skipped: 14,
                },
                Frame::Complete(b"third"),
            ]
        );
    }

    #[test]
    fn test_shortened_length_resyncs_at_next_marker() {
        let mut buf = concat(&[b"first", b"second", b"third"]);
        buf[13 + 4..13 + 8].copy_from_slice(&2u32.to_be_bytes());

        let frames: Vec<_> = FrameReader::new(&buf).collect();
        assert_eq!(frames[0], Frame::Complete(b"first"));
        assert_eq!(frames[1], Frame::Complete(b"se"));
        assert_eq!(
            frames[2],
            Frame::Corrupt {
                offset: 23,
                skipped: 4,
            }
        );
        assert_eq!(frames[3], Frame::Complete(b"third"));
        assert_eq!(frames.len(), 4);
    }

    #[test]
    fn test_garbage_without_marker_is_one_corrupt_region() {
        let buf = b"no frames in here";
        let frames: Vec<_> = FrameReader::new(buf).collect();
        assert_eq!(
            frames,
            vec![Frame::Corrupt {
                offset: 0,
                skipped: buf.len(),
            }]
        );
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(FrameReader::new(&[]).count(), 0);
    }
}
