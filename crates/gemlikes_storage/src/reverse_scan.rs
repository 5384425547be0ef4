#![forbid(unsafe_code)]

use std::io::{self, Read, Seek, SeekFrom};

pub const DEFAULT_WINDOW_BYTES: usize = 4096;
/// A single line longer than this aborts the scan instead of growing the buffer.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Lines of a seekable source, last physical line first.
///
/// Reads backward in fixed windows, so memory stays at one window plus the
/// longest line regardless of source size. A single trailing `\n` does not
/// produce an empty first line. Lines are decoded lossily. Once exhausted the
/// scanner stays exhausted; reopen the source to scan again.
#[derive(Debug)]
pub struct ReverseLines<R> {
    src: R,
    window: usize,
    // Unread bytes are src[0..pos] followed by `pending`.
    pos: u64,
    pending: Vec<u8>,
    done: bool,
}

impl<R: Read + Seek> ReverseLines<R> {
    pub fn new(src: R) -> io::Result<Self> {
        Self::with_window(src, DEFAULT_WINDOW_BYTES)
    }

    pub fn with_window(mut src: R, window: usize) -> io::Result<Self> {
        let len = src.seek(SeekFrom::End(0))?;
        let mut pos = len;
        if len > 0 {
            src.seek(SeekFrom::Start(len - 1))?;
            let mut last = [0u8; 1];
            src.read_exact(&mut last)?;
            if last[0] == b'\n' {
                pos -= 1;
            }
        }
        Ok(Self {
            src,
            window: window.max(1),
            pos,
            pending: Vec::new(),
            done: len == 0,
        })
    }

    fn fill(&mut self) -> io::Result<()> {
        let n = (self.window as u64).min(self.pos);
        self.pos -= n;
        self.src.seek(SeekFrom::Start(self.pos))?;
        let mut chunk = vec![0u8; n as usize];
        self.src.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&self.pending);
        self.pending = chunk;
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.done {
            return Ok(None);
        }
        loop {
            if let Some(idx) = self.pending.iter().rposition(|b| *b == b'\n') {
                let line = self.pending.split_off(idx + 1);
                self.pending.truncate(idx);
                return Ok(Some(decode(line)));
            }
            if self.pos == 0 {
                self.done = true;
                let line = std::mem::take(&mut self.pending);
                return Ok(Some(decode(line)));
            }
            if self.pending.len() > MAX_LINE_BYTES {
                self.done = true;
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line exceeds {MAX_LINE_BYTES} bytes"),
                ));
            }
            self.fill()?;
        }
    }
}

impl<R: Read + Seek> Iterator for ReverseLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
