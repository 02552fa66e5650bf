use std::io::{BufRead, BufReader, ErrorKind, Read};

/// Lines longer than `max_line_bytes` are cut at the cap; the rest of the
/// line is still consumed so the next call starts on a fresh line.
pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    raw_line: Vec<u8>,
    line: String,
    max_line_bytes: usize,
    bytes_read: u64,
    line_number: u64,
    last_line_truncated: bool,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(reader: R, chunk_bytes: usize, max_line_bytes: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(chunk_bytes.max(1), reader),
            raw_line: Vec::new(),
            line: String::new(),
            max_line_bytes,
            bytes_read: 0,
            line_number: 0,
            last_line_truncated: false,
        }
    }

    pub(crate) fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub(crate) fn line_number(&self) -> u64 {
        self.line_number
    }

    pub(crate) fn last_line_truncated(&self) -> bool {
        self.last_line_truncated
    }

    pub(crate) fn next_line(&mut self) -> std::io::Result<Option<&str>> {
        self.raw_line.clear();
        self.last_line_truncated = false;

        let mut consumed_any = false;
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            };
            if available.is_empty() {
                break;
            }
            consumed_any = true;

            let (segment_len, found_newline) = match available.iter().position(|&byte| byte == b'\n')
            {
                Some(index) => (index + 1, true),
                None => (available.len(), false),
            };

            // Room for a trailing `\r\n` on top of the content cap.
            let room = self
                .max_line_bytes
                .saturating_add(2)
                .saturating_sub(self.raw_line.len());
            let keep = segment_len.min(room);
            self.raw_line.extend_from_slice(&available[..keep]);
            if keep < segment_len {
                self.last_line_truncated = true;
            }

            self.inner.consume(segment_len);
            self.bytes_read = self.bytes_read.saturating_add(segment_len as u64);

            if found_newline {
                break;
            }
        }

        if !consumed_any {
            return Ok(None);
        }

        strip_line_terminator(&mut self.raw_line);
        if self.raw_line.len() > self.max_line_bytes {
            self.raw_line.truncate(self.max_line_bytes);
            self.last_line_truncated = true;
        }
        self.line_number += 1;

        self.line.clear();
        self.line.push_str(&String::from_utf8_lossy(&self.raw_line));
        Ok(Some(self.line.as_str()))
    }
}

fn strip_line_terminator(raw_line: &mut Vec<u8>) {
    if raw_line.last() == Some(&b'\n') {
        raw_line.pop();
    }
    if raw_line.last() == Some(&b'\r') {
        raw_line.pop();
    }
}
