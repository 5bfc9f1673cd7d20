//! Splits a server's stdout into JSON-RPC messages.
//!
//! Servers either write one JSON document per line or prefix each body with
//! a `Content-Length` header block; both are accepted, per message.

const MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;
const CONTENT_LENGTH: &[u8] = b"content-length:";

#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    buffer: Vec<u8>,
    /// Body bytes of a dropped message that have not arrived yet
    skip: usize,
}

enum LengthPrefixed {
    Frame(Vec<u8>),
    Incomplete,
    Discarded,
}

impl FrameDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete message body, or `None` until more bytes arrive
    pub(crate) fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            if self.skip > 0 {
                let skipped = self.skip.min(self.buffer.len());
                self.buffer.drain(..skipped);
                self.skip -= skipped;
                if self.skip > 0 {
                    return None;
                }
            }

            let leading = self
                .buffer
                .iter()
                .take_while(|b| matches!(**b, b'\n' | b'\r'))
                .count();
            self.buffer.drain(..leading);

            if self.buffer.is_empty() {
                return None;
            }

            if has_content_length_prefix(&self.buffer) {
                match self.take_length_prefixed() {
                    LengthPrefixed::Frame(frame) => return Some(frame),
                    LengthPrefixed::Incomplete => return None,
                    LengthPrefixed::Discarded => continue,
                }
            }

            let newline = self.buffer.iter().position(|b| *b == b'\n')?;
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }

            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    fn take_length_prefixed(&mut self) -> LengthPrefixed {
        let Some((header_end, delimiter_len)) = find_header_end(&self.buffer) else {
            return LengthPrefixed::Incomplete;
        };
        let body_start = header_end + delimiter_len;

        let length = String::from_utf8_lossy(&self.buffer[..header_end])
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            });

        let Some(length) = length else {
            tracing::warn!("dropping MCP header block with an invalid Content-Length");
            self.buffer.drain(..body_start);
            return LengthPrefixed::Discarded;
        };

        if length > MAX_MESSAGE_SIZE {
            tracing::warn!(length, "dropping oversized MCP message");
            let available = self.buffer.len().min(body_start + length);
            self.buffer.drain(..available);
            self.skip = body_start + length - available;
            return LengthPrefixed::Discarded;
        }

        if self.buffer.len() < body_start + length {
            return LengthPrefixed::Incomplete;
        }

        let mut frame: Vec<u8> = self.buffer.drain(..body_start + length).collect();
        LengthPrefixed::Frame(frame.split_off(body_start))
    }
}

fn has_content_length_prefix(buffer: &[u8]) -> bool {
    buffer.len() >= CONTENT_LENGTH.len()
        && buffer[..CONTENT_LENGTH.len()].eq_ignore_ascii_case(CONTENT_LENGTH)
}

fn find_header_end(buffer: &[u8]) -> Option<(usize, usize)> {
    position(buffer, b"\r\n\r\n")
        .map(|pos| (pos, 4))
        .or_else(|| position(buffer, b"\n\n").map(|pos| (pos, 2)))
}

fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_newline_delimited_messages() {
        let mut decoder = FrameDecoder::default();
        decoder.push(b"{\"id\":1}\r\n\n{\"id\":2}\n{\"id\":");

        assert_eq!(decoder.next_frame().unwrap(), b"{\"id\":1}".to_vec());
        assert_eq!(decoder.next_frame().unwrap(), b"{\"id\":2}".to_vec());
        assert!(decoder.next_frame().is_none());

        decoder.push(b"3}\n");
        assert_eq!(decoder.next_frame().unwrap(), b"{\"id\":3}".to_vec());
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn decodes_content_length_messages() {
        let body = b"{\"jsonrpc\":\"2.0\",\"id\":1}";
        let mut decoder = FrameDecoder::default();
        decoder.push(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        assert!(decoder.next_frame().is_none());

        decoder.push(body);
        decoder.push(b"{\"id\":2}\n");
        assert_eq!(decoder.next_frame().unwrap(), body.to_vec());
        assert_eq!(decoder.next_frame().unwrap(), b"{\"id\":2}".to_vec());
    }

    #[test]
    fn drops_oversized_messages_and_resumes_after_them() {
        let mut decoder = FrameDecoder::default();
        decoder.push(format!("content-length: {}\n\n{{}}", MAX_MESSAGE_SIZE + 1).as_bytes());
        assert!(decoder.next_frame().is_none());
        assert!(decoder.buffer.is_empty());
        assert_eq!(decoder.skip, MAX_MESSAGE_SIZE - 1);

        let rest_of_body = vec![b'x'; MAX_MESSAGE_SIZE - 1];
        decoder.push(&rest_of_body[..1024]);
        assert!(decoder.next_frame().is_none());

        decoder.push(&rest_of_body[1024..]);
        decoder.push(b"{\"id\":7}\n");
        assert_eq!(decoder.next_frame().unwrap(), b"{\"id\":7}".to_vec());
        assert_eq!(decoder.skip, 0);
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn invalid_content_length_does_not_stall_the_stream() {
        let mut decoder = FrameDecoder::default();
        decoder.push(b"Content-Length: abc\r\n\r\n{}\n");
        decoder.push(b"{\"id\":2}\n");

        assert_eq!(decoder.next_frame().unwrap(), b"{}".to_vec());
        assert_eq!(decoder.next_frame().unwrap(), b"{\"id\":2}".to_vec());
        assert!(decoder.next_frame().is_none());
        assert!(decoder.buffer.is_empty());
    }
}
