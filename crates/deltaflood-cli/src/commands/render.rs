use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use deltaflood_core::{ChangeEvent, EncoderConfig, Session, SessionStats};
use tracing::info;

use crate::output::open_sink;

/// Replay JSON-lines change events through a session.
pub fn cmd_render(encoder: EncoderConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open events file: {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    info!(input = %input.display(), "Rendering change events");

    let mut sink = open_sink(output)?;
    let stats = render_events(Session::start(encoder), reader, &mut sink)?;
    sink.flush().context("Failed to flush output")?;

    eprintln!(
        "{} {} events, {} filtered, {} lines",
        "Rendered".green(),
        stats.events,
        stats.filtered,
        stats.lines
    );
    Ok(())
}

/// Feed every non-blank line of `reader` to `session` as one event.
fn render_events<R, S>(mut session: Session, reader: R, sink: &mut S) -> Result<SessionStats>
where
    R: BufRead,
    S: deltaflood_core::LineSink<Error = deltaflood_core::Error>,
{
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let event = ChangeEvent::from_json(&line)
            .with_context(|| format!("Invalid change event on line {}", line_no))?;
        session
            .handle_event(&event, sink)
            .with_context(|| format!("Failed to write output for line {}", line_no))?;
    }

    Ok(session.shutdown())
}
