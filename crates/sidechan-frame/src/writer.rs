use std::io::{ErrorKind, Write};

use serde_json::Value;

use crate::error::{FrameError, Result};
use crate::message::Message;

/// Writes wire records to any `Write` stream.
///
/// This is the child side of the protocol: each record is one JSON object
/// followed by `\n`, flushed immediately so it lands in its own delivery.
pub struct RecordWriter<T> {
    inner: T,
    buf: Vec<u8>,
}

impl<T: Write> RecordWriter<T> {
    /// Create a new record writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(1024),
        }
    }

    /// Encode and send one record.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, message)?;
        self.buf.push(b'\n');
        self.write_buffered()
    }

    /// Send an `end` record.
    pub fn end(&mut self) -> Result<()> {
        self.send(&Message::end())
    }

    /// Send a `log` record.
    pub fn log(&mut self, entry: impl Into<Value>) -> Result<()> {
        self.send(&Message::log(entry))
    }

    /// Send an `error` record, optionally with a code.
    pub fn error(&mut self, text: &str, code: Option<&str>) -> Result<()> {
        let message = match code {
            Some(code) => Message::error_with_code(text, code),
            None => Message::error(text),
        };
        self.send(&message)
    }

    /// Write plain diagnostic text, bypassing record encoding.
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(text.as_bytes());
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::parse_chunk;

    fn written(writer: RecordWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn records_are_newline_terminated() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::new()));
        writer.log("hello").unwrap();

        let bytes = written(writer);
        assert_eq!(
            bytes,
            b"{\"type\":\"log\",\"payload\":{\"entry\":\"hello\"}}\n".to_vec()
        );
    }

    #[test]
    fn parser_reads_back_a_session() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::new()));
        writer.log("starting").unwrap();
        writer.error("missing", Some("MODULE_NOT_FOUND")).unwrap();
        writer.end().unwrap();

        let messages = parse_chunk(&written(writer));
        assert_eq!(
            messages,
            vec![
                Message::log("starting"),
                Message::error_with_code("missing", "MODULE_NOT_FOUND"),
                Message::end(),
            ]
        );
    }

    #[test]
    fn write_text_is_verbatim() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::new()));
        writer.write_text("ReferenceError: x\n").unwrap();
        assert_eq!(written(writer), b"ReferenceError: x\n".to_vec());
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn every_record_is_flushed() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = RecordWriter::new(sink);

        writer.end().unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn retries_interrupted_writes() {
        let mut writer = RecordWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.error("boom", None).unwrap();
        assert!(!writer.get_ref().data.is_empty());
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn zero_length_write_reports_closed() {
        let mut writer = RecordWriter::new(ClosedWriter);
        let err = writer.end().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }
}
