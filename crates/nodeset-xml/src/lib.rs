//! Stream OPC UA NodeSet XML into a [`Nodeset`](nodeset_core::Nodeset) using quick-xml.

mod parser;
mod reader;
mod text;
mod value;

use thiserror::Error;

pub use nodeset_core::{Attributes, NodesetError};
pub use parser::{NodesetParser, Phase, State};
pub use reader::{parse_reader, parse_str, DEFAULT_CHUNK_SIZE};
pub use text::TextBuffer;
pub use value::{RawValue, RawValueDecoder, SkipValues, ValueDecoder, ValueLeaf};

#[derive(Debug, Error)]
pub enum ParseError {
    /// The tokenizer rejected the document.
    #[error("xml error at byte {position}: {message}")]
    Xml { position: usize, message: String },
    /// A semantic error while building the graph.
    #[error(transparent)]
    Nodeset(#[from] NodesetError),
    /// An element that needs an open owner arrived without one.
    #[error("<{0}> outside of its owning element")]
    Detached(&'static str),
    /// The input ended before the open elements were closed.
    #[error("document ended inside {0:?}")]
    UnexpectedEof(Phase),
    /// The input held no element at all.
    #[error("document contains no root element")]
    EmptyDocument,
}
