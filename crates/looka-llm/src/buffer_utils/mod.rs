mod event_parser;
mod line_decoder;

pub use event_parser::{EventParser, LineEvent, SkipReason, DATA_PREFIX, TERMINATOR};
pub use line_decoder::LineDecoder;
