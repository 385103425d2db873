/// Incremental byte-to-line decoder for event streams
///
/// Bytes are decoded as UTF-8 statefully: a multi-byte character split across
/// two chunks is held back until the rest arrives, and invalid sequences are
/// replaced with U+FFFD instead of failing the stream. Decoded text is split on
/// `\n`; only complete lines are returned, the trailing segment waits for the
/// next chunk.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Undecoded tail: the first bytes of a character cut by a chunk boundary
    pending_bytes: Vec<u8>,
    /// Decoded text after the last newline
    fragment: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line it completes (without the `\n`)
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending_bytes.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_lines()
    }

    /// End of stream
    ///
    /// An unterminated trailing fragment is never emitted as a line. It is
    /// returned only so callers can log what was dropped.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_bytes.is_empty() {
            self.pending_bytes.clear();
            self.fragment.push(char::REPLACEMENT_CHARACTER);
        }
        let dropped = std::mem::take(&mut self.fragment);
        (!dropped.is_empty()).then_some(dropped)
    }

    /// Bytes and characters currently held back
    pub fn pending_len(&self) -> usize {
        self.pending_bytes.len() + self.fragment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    fn decode_pending(&mut self) {
        let bytes = std::mem::take(&mut self.pending_bytes);
        let mut start = 0;

        while start < bytes.len() {
            match std::str::from_utf8(&bytes[start..]) {
                Ok(text) => {
                    self.fragment.push_str(text);
                    start = bytes.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.fragment
                        .push_str(std::str::from_utf8(&bytes[start..valid_end]).unwrap_or_default());
                    match e.error_len() {
                        Some(invalid_len) => {
                            self.fragment.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            self.pending_bytes = bytes[valid_end..].to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.fragment.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.fragment.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.fragment, rest);

        complete[..complete.len() - 1]
            .split('\n')
            .map(str::to_owned)
            .collect()
    }
}
