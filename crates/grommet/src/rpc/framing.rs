//! Reassembly of `Content-Length` framed messages from a byte stream.
//!
//! Reads from a server are not aligned to message boundaries: one read may
//! carry half a message, or several. [`FrameBuffer`] accumulates bytes and
//! hands out each complete body once it has arrived.

use thiserror::Error;

/// Largest header block accepted before the buffer gives up on it.
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

/// Largest message body accepted.
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

const CONTENT_LENGTH: &[u8] = b"content-length";

/// Problems with an incoming header block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The header block has no `Content-Length` header.
    #[error("header block has no Content-Length")]
    MissingContentLength,

    /// The `Content-Length` value is not a byte count.
    #[error("invalid Content-Length value '{0}'")]
    InvalidContentLength(String),

    /// No header terminator within [`MAX_HEADER_SIZE`] bytes.
    #[error("header block exceeds {limit} bytes")]
    HeaderTooLarge {
        /// The header size limit.
        limit: usize,
    },

    /// The declared body exceeds [`MAX_MESSAGE_SIZE`].
    #[error("message of {length} bytes exceeds the {limit} byte limit")]
    MessageTooLarge {
        /// The declared body length.
        length: usize,
        /// The body size limit.
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for a complete header block.
    Head,
    /// Header parsed; waiting for this many body bytes.
    Body(usize),
    /// Skipping this many bytes of a rejected body.
    Discard(usize),
    /// Skipping garbage until the next `Content-Length` header.
    Resync,
}

/// Accumulates raw bytes and yields complete message bodies.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    state: State,
}

impl FrameBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: State::Head,
        }
    }

    /// Append bytes read from the stream.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the next complete message body.
    ///
    /// Returns `None` when more bytes are needed. After an error the
    /// offending header is discarded and the buffer resynchronises on the
    /// next `Content-Length` header, so callers can keep calling.
    pub fn next_frame(&mut self) -> Option<Result<Vec<u8>, FrameError>> {
        loop {
            match self.state {
                State::Body(length) => {
                    if self.buf.len() < length {
                        return None;
                    }
                    let body: Vec<u8> = self.buf.drain(..length).collect();
                    self.state = State::Head;
                    return Some(Ok(body));
                }
                State::Discard(remaining) => {
                    let n = remaining.min(self.buf.len());
                    self.buf.drain(..n);
                    if n < remaining {
                        self.state = State::Discard(remaining - n);
                        return None;
                    }
                    self.state = State::Head;
                }
                State::Resync => {
                    let Some(start) = find_ignore_case(&self.buf, CONTENT_LENGTH) else {
                        // Keep a tail that could be the start of a split header name.
                        let keep = CONTENT_LENGTH.len() - 1;
                        let skip = self.buf.len().saturating_sub(keep);
                        self.buf.drain(..skip);
                        return None;
                    };
                    self.buf.drain(..start);
                    self.state = State::Head;
                }
                State::Head => {
                    let Some((header_len, terminator_len)) = find_header_end(&self.buf) else {
                        if self.buf.len() > MAX_HEADER_SIZE {
                            self.buf.clear();
                            self.state = State::Resync;
                            return Some(Err(FrameError::HeaderTooLarge {
                                limit: MAX_HEADER_SIZE,
                            }));
                        }
                        return None;
                    };

                    let parsed = if header_len > MAX_HEADER_SIZE {
                        Err(FrameError::HeaderTooLarge {
                            limit: MAX_HEADER_SIZE,
                        })
                    } else {
                        parse_content_length(&self.buf[..header_len])
                    };
                    self.buf.drain(..header_len + terminator_len);

                    match parsed {
                        Ok(length) if length > MAX_MESSAGE_SIZE => {
                            self.state = State::Discard(length);
                            return Some(Err(FrameError::MessageTooLarge {
                                length,
                                limit: MAX_MESSAGE_SIZE,
                            }));
                        }
                        Ok(length) => self.state = State::Body(length),
                        Err(e) => {
                            self.state = State::Resync;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the blank line ending a header block, accepting `\r\n\r\n` or
/// `\n\n`. Returns the header length and the terminator length.
fn find_header_end(buf: &[u8]) -> Option<(usize, usize)> {
    let crlf = find(buf, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find(buf, b"\n\n").map(|i| (i, 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_content_length(header: &[u8]) -> Result<usize, FrameError> {
    let text = String::from_utf8_lossy(header);
    for line in text.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let value = value.trim();
            return value
                .parse()
                .map_err(|_| FrameError::InvalidContentLength(value.to_string()));
        }
    }
    Err(FrameError::MissingContentLength)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_ignore_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::frame;
    use proptest::prelude::*;

    fn drain(buffer: &mut FrameBuffer) -> Vec<Result<Vec<u8>, FrameError>> {
        std::iter::from_fn(|| buffer.next_frame()).collect()
    }

    #[test]
    fn yields_a_single_frame() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(&frame(r#"{"id": 1}"#));

        assert_eq!(drain(&mut buffer), vec![Ok(br#"{"id": 1}"#.to_vec())]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn yields_every_concatenated_frame() {
        let mut buffer = FrameBuffer::new();
        let mut bytes = frame("[1]");
        bytes.extend(frame("[2]"));
        bytes.extend(frame("[3]"));
        buffer.extend(&bytes);

        let bodies: Vec<Vec<u8>> = drain(&mut buffer).into_iter().map(Result::unwrap).collect();
        assert_eq!(bodies, vec![b"[1]".to_vec(), b"[2]".to_vec(), b"[3]".to_vec()]);
    }

    #[test]
    fn waits_for_the_rest_of_a_split_body() {
        let bytes = frame(r#"{"split": true}"#);
        let (head, tail) = bytes.split_at(bytes.len() - 5);

        let mut buffer = FrameBuffer::new();
        buffer.extend(head);
        assert!(buffer.next_frame().is_none());

        buffer.extend(tail);
        assert_eq!(
            buffer.next_frame(),
            Some(Ok(br#"{"split": true}"#.to_vec()))
        );
    }

    #[test]
    fn accepts_lowercase_header_bare_newlines_and_extra_headers() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(b"Content-Type: application/json\ncontent-length: 2\n\n{}");

        assert_eq!(buffer.next_frame(), Some(Ok(b"{}".to_vec())));
    }

    #[test]
    fn missing_content_length_resynchronises() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(b"X-Other: 1\r\n\r\ngarbage");
        buffer.extend(&frame("[]"));

        let results = drain(&mut buffer);
        assert_eq!(
            results,
            vec![Err(FrameError::MissingContentLength), Ok(b"[]".to_vec())]
        );
    }

    #[test]
    fn invalid_content_length_is_reported() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(b"Content-Length: ten\r\n\r\n");

        assert_eq!(
            buffer.next_frame(),
            Some(Err(FrameError::InvalidContentLength("ten".to_string())))
        );
    }

    #[test]
    fn oversized_message_is_skipped() {
        let mut buffer = FrameBuffer::new();
        let length = MAX_MESSAGE_SIZE + 1;
        buffer.extend(format!("Content-Length: {length}\r\n\r\n").as_bytes());
        buffer.extend(&vec![b' '; length]);
        buffer.extend(&frame("[]"));

        let results = drain(&mut buffer);
        assert_eq!(
            results,
            vec![
                Err(FrameError::MessageTooLarge {
                    length,
                    limit: MAX_MESSAGE_SIZE
                }),
                Ok(b"[]".to_vec())
            ]
        );
    }

    #[test]
    fn unterminated_header_is_rejected_past_the_limit() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(&vec![b'a'; MAX_HEADER_SIZE + 1]);

        assert_eq!(
            buffer.next_frame(),
            Some(Err(FrameError::HeaderTooLarge {
                limit: MAX_HEADER_SIZE
            }))
        );

        buffer.extend(&frame("[]"));
        assert_eq!(buffer.next_frame(), Some(Ok(b"[]".to_vec())));
    }

    proptest! {
        #[test]
        fn any_chunking_yields_the_same_frames(cuts in prop::collection::vec(0usize..200, 0..8)) {
            let bodies = [r#"{"a": 1}"#, "[]", r#"{"text": "éé"}"#];
            let stream: Vec<u8> = bodies.iter().flat_map(|b| frame(b)).collect();

            let mut points: Vec<usize> = cuts.into_iter().map(|c| c % (stream.len() + 1)).collect();
            points.push(0);
            points.push(stream.len());
            points.sort_unstable();

            let mut buffer = FrameBuffer::new();
            let mut received = Vec::new();
            for pair in points.windows(2) {
                buffer.extend(&stream[pair[0]..pair[1]]);
                while let Some(result) = buffer.next_frame() {
                    received.push(result.unwrap());
                }
            }

            let expected: Vec<Vec<u8>> = bodies.iter().map(|b| b.as_bytes().to_vec()).collect();
            prop_assert_eq!(received, expected);
        }
    }
}
