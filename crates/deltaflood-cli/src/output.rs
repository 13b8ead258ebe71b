use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use deltaflood_core::WriterSink;

pub type LineWriter = WriterSink<BufWriter<Box<dyn Write + Send>>>;

/// Open the line sink: `path` when given, stdout otherwise.
pub fn open_sink(path: Option<&Path>) -> Result<LineWriter> {
    let inner: Box<dyn Write + Send> = match path {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    Ok(WriterSink::new(BufWriter::new(inner)))
}
