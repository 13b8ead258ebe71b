use std::convert::Infallible;
use std::io::Write;
use std::ops::{Deref, DerefMut};

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, trace};

use crate::config::EncoderConfig;
use crate::encoder::LineEncoder;
use crate::error::{Error, Result};
use crate::filter::{self, FilterOutcome};
use crate::output::{TypeOutput, VerbatimOutput};
use crate::split::split;
use crate::types::ChangeEvent;

/// Receives finished lines in emission order.
pub trait LineSink {
    type Error;

    /// Take ownership of one complete line. Framing is up to the sink.
    fn emit(&mut self, line: Bytes) -> std::result::Result<(), Self::Error>;
}

impl LineSink for Vec<Bytes> {
    type Error = Infallible;

    fn emit(&mut self, line: Bytes) -> std::result::Result<(), Infallible> {
        self.push(line);
        Ok(())
    }
}

/// Writes each line followed by `\n` to an [`io::Write`](std::io::Write).
pub struct WriterSink<W: Write> {
    writer: W,
    lines: u64,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| Error::SinkWrite {
            line: self.lines,
            source,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LineSink for WriterSink<W> {
    type Error = Error;

    fn emit(&mut self, line: Bytes) -> Result<()> {
        let line_no = self.lines + 1;
        self.writer
            .write_all(&line)
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|source| Error::SinkWrite {
                line: line_no,
                source,
            })?;
        self.lines = line_no;
        Ok(())
    }
}

/// Counters kept over the life of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Events handed to the session.
    pub events: u64,
    /// Events suppressed by the origin or table filter.
    pub filtered: u64,
    /// Events that carried no image to render.
    pub empty: u64,
    /// Lines handed to the sink.
    pub lines: u64,
}

/// Scoped use of the session's line buffer. The buffer is cleared when the
/// guard is acquired and again when it is dropped, whatever the exit path.
struct LineBuffer<'b> {
    buf: &'b mut BytesMut,
}

impl<'b> LineBuffer<'b> {
    fn acquire(buf: &'b mut BytesMut) -> Self {
        buf.clear();
        Self { buf }
    }

    /// Detach the rendered line.
    fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}

impl Deref for LineBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        self.buf
    }
}

impl DerefMut for LineBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BytesMut {
        self.buf
    }
}

impl Drop for LineBuffer<'_> {
    fn drop(&mut self) {
        self.buf.clear();
    }
}

/// An encoding session: owns the resolved configuration and renders events
/// one at a time.
pub struct Session {
    config: EncoderConfig,
    output: Box<dyn TypeOutput>,
    buffer: BytesMut,
    stats: SessionStats,
}

impl Session {
    /// Start a session that renders values with [`VerbatimOutput`].
    pub fn start(config: EncoderConfig) -> Self {
        Self::with_output(config, VerbatimOutput)
    }

    /// Start a session with a specific type-output service.
    pub fn with_output(config: EncoderConfig, output: impl TypeOutput + 'static) -> Self {
        info!(
            include_xids = config.include_xids,
            include_oids = config.include_oids,
            include_lsn = config.include_lsn,
            full_name = config.full_name,
            skip_nulls = config.skip_nulls,
            only_local = config.only_local,
            escape_chars = config.escape_chars,
            tables = config.table_filter.len(),
            "Starting encoding session"
        );

        Self {
            config,
            output: Box::new(output),
            buffer: BytesMut::with_capacity(1024),
            stats: SessionStats::default(),
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Render one event into `sink`, returning the number of lines emitted.
    ///
    /// Events without a usable image and events rejected by the filter
    /// produce nothing. The only error is one raised by the sink.
    pub fn handle_event<S>(&mut self, event: &ChangeEvent, sink: &mut S) -> std::result::Result<usize, S::Error>
    where
        S: LineSink + ?Sized,
    {
        self.stats.events += 1;

        let images = split(event);
        if images.is_empty() {
            self.stats.empty += 1;
            trace!(table = %event.table.name, kind = ?event.kind, "Change has no image to render");
            return Ok(0);
        }

        let outcome = filter::evaluate(event, &self.config);
        if outcome != FilterOutcome::Emit {
            self.stats.filtered += 1;
            debug!(table = %event.table.name, reason = ?outcome, "Change filtered");
            return Ok(0);
        }

        let encoder = LineEncoder::new(&self.config, &*self.output);
        for image in &images {
            let mut line = LineBuffer::acquire(&mut self.buffer);
            encoder.encode_into(&mut line, event, image);
            sink.emit(line.take())?;
            self.stats.lines += 1;
        }

        Ok(images.len())
    }

    /// Render one event and collect its lines.
    pub fn encode_event(&mut self, event: &ChangeEvent) -> Vec<Bytes> {
        let mut lines = Vec::with_capacity(2);
        match self.handle_event(event, &mut lines) {
            Ok(_) => lines,
            Err(never) => match never {},
        }
    }

    /// End the session, returning its counters.
    pub fn shutdown(self) -> SessionStats {
        info!(
            events = self.stats.events,
            filtered = self.stats.filtered,
            empty = self.stats.empty,
            lines = self.stats.lines,
            "Encoding session finished"
        );
        self.stats
    }
}
