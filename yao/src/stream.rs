use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::constants::DEFAULT_BUFFER_SIZE;

/// Line-by-line reader over a circuit description
#[derive(Debug)]
pub struct BufferedLineStream<R = File> {
    /// Buffered reader over the underlying source
    reader: BufReader<R>,
    /// Reused string buffer to avoid allocations per line
    line_buffer: String,
    /// 1-based number of the last line returned
    line_number: u64,
}

impl BufferedLineStream<File> {
    /// Open a circuit description file
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> BufferedLineStream<R> {
    /// Create a new stream with default buffer size
    pub fn new(reader: R) -> Self {
        Self::with_buffer_size(reader, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new stream with custom buffer size
    pub fn with_buffer_size(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            line_buffer: String::with_capacity(256),
            line_number: 0,
        }
    }

    /// Number of the line most recently returned by [`next_line`](Self::next_line)
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Get the next line with trailing whitespace removed
    ///
    /// Returns None at EOF. The returned &str is valid until the next call.
    pub fn next_line(&mut self) -> Option<Result<&str, io::Error>> {
        self.line_buffer.clear();

        match self.reader.read_line(&mut self.line_buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                Some(Ok(self.line_buffer.trim_end()))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Get the next line that is neither blank nor a `#` comment
    pub fn next_record(&mut self) -> Option<Result<&str, io::Error>> {
        loop {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = self.line_buffer.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        break;
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(self.line_buffer.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffer_size() {
        let stream = BufferedLineStream::new("".as_bytes());
        assert_eq!(stream.reader.capacity(), DEFAULT_BUFFER_SIZE);
        let stream = BufferedLineStream::with_buffer_size("".as_bytes(), 1024);
        assert_eq!(stream.reader.capacity(), 1024);
    }

    #[test]
    fn test_next_line_strips_newlines() -> io::Result<()> {
        let mut stream = BufferedLineStream::new("a b\r\nc\n".as_bytes());
        assert_eq!(stream.next_line().transpose()?, Some("a b"));
        assert_eq!(stream.next_line().transpose()?, Some("c"));
        assert_eq!(stream.next_line().transpose()?, None);
        assert_eq!(stream.line_number(), 2);
        Ok(())
    }

    #[test]
    fn test_next_record_skips_comments_and_blanks() -> io::Result<()> {
        let mut stream = BufferedLineStream::new("# header\n\n  3 1 1\n   \n4 1 2 AND\n".as_bytes());
        assert_eq!(stream.next_record().transpose()?, Some("3 1 1"));
        assert_eq!(stream.line_number(), 3);
        assert_eq!(stream.next_record().transpose()?, Some("4 1 2 AND"));
        assert_eq!(stream.line_number(), 5);
        assert!(stream.next_record().is_none());
        Ok(())
    }
}
