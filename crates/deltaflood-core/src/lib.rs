pub mod config;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod filter;
pub mod ident;
pub mod lsn;
pub mod output;
pub mod render;
pub mod session;
pub mod split;
pub mod types;

pub use config::{EncoderConfig, EncoderConfigBuilder, DEFAULT_NULL_TEXT, DEFAULT_SEPARATOR};
pub use encoder::LineEncoder;
pub use error::{Error, Result};
pub use escape::escape;
pub use filter::{should_emit, FilterOutcome};
pub use ident::{quote_identifier, quote_qualified_identifier};
pub use lsn::{format_lsn, parse_lsn, DisplayLsn};
pub use output::{bytea_hex, TypeOutput, VerbatimOutput};
pub use render::{ColumnRenderer, RenderedColumn};
pub use session::{LineSink, Session, SessionStats, WriterSink};
pub use split::{split, Image, ImageAction};
pub use types::{ChangeEvent, ChangeKind, Column, ColumnValue, Datum, Origin, TableRef, Tuple};
