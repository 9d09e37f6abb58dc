#![cfg_attr(docsrs, feature(doc_cfg))]
//! Ingestion entry point for OPC UA NodeSet XML files.
//!
//! A [`Loader`] parses one file into a graph, orders the nodes so every
//! parent, supertype and type definition comes before the nodes that need
//! it, and then hands each node to a caller supplied sink.
//!
//! ```rust,no_run
//! use nodeset_loader::{Loader, RawValueDecoder};
//!
//! struct Server {
//!     namespaces: Vec<String>,
//!     created: usize,
//! }
//!
//! let mut server = Server { namespaces: vec!["http://opcfoundation.org/UA/".into()], created: 0 };
//! let report = Loader::new("Opc.Ua.Di.NodeSet2.xml")
//!     .namespace_remap(|server: &mut Server, uri: &str| {
//!         server.namespaces.push(uri.to_string());
//!         (server.namespaces.len() - 1) as u16
//!     })
//!     .value_decoder(RawValueDecoder)
//!     .sink(|server: &mut Server, _node| {
//!         server.created += 1;
//!         Ok(())
//!     })
//!     .load(&mut server)?;
//! println!("created {} nodes in {:?}", report.nodes, report.total());
//! # Ok::<(), nodeset_loader::LoadError>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info};

pub use nodeset_core as graph;
pub use nodeset_core::{Node, Nodeset, NodesetError, OrderingPolicy, OrderingRule};
pub use nodeset_xml as xml;
pub use nodeset_xml::{ParseError, RawValue, RawValueDecoder, SkipValues, ValueDecoder};
pub use ua_types as types;
pub use ua_types::NodeId;

/// Error a sink may return to stop the load.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

type RemapFn<'a, C> = Box<dyn FnMut(&mut C, &str) -> u16 + 'a>;
type SinkFn<'a, C, V> = Box<dyn FnMut(&mut C, Node<V>) -> Result<(), SinkError> + 'a>;
type DecoderBox<'a, V> = Box<dyn ValueDecoder<Value = V> + 'a>;

/// Error type produced by [`Loader::load`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required collaborator was not configured on the loader.
    #[error("no {0} configured")]
    MissingCollaborator(&'static str),
    /// The document could not be opened.
    #[error("open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed XML or an invalid node declaration.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The parsed graph could not be ordered.
    #[error(transparent)]
    Nodeset(#[from] NodesetError),
    /// The sink rejected a node.
    #[error("sink rejected {node}: {message}")]
    Sink { node: NodeId, message: String },
}

/// Tuning knobs for a load.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Read size handed to the tokenizer.
    pub chunk_size: usize,
    /// Which reference types constrain creation order.
    pub policy: OrderingPolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            chunk_size: nodeset_xml::DEFAULT_CHUNK_SIZE,
            policy: OrderingPolicy::default(),
        }
    }
}

/// Summary of a successful load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes: usize,
    pub aliases: usize,
    pub namespaces: usize,
    pub parse: Duration,
    pub sort: Duration,
    pub add: Duration,
}

impl LoadReport {
    pub fn total(&self) -> Duration {
        self.parse + self.sort + self.add
    }
}

/// Builder wiring a file to its namespace remap, value decoder and sink.
///
/// `C` is the caller's context, passed unchanged to the remap callback and
/// the sink. `V` is the value type produced by the decoder.
pub struct Loader<'a, C, V> {
    path: PathBuf,
    remap: Option<RemapFn<'a, C>>,
    sink: Option<SinkFn<'a, C, V>>,
    decoder: Option<DecoderBox<'a, V>>,
    options: LoaderOptions,
}

impl<'a, C, V> Loader<'a, C, V> {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            remap: None,
            sink: None,
            decoder: None,
            options: LoaderOptions::default(),
        }
    }

    /// Map each namespace URI declared by the document to the consumer's index.
    pub fn namespace_remap<F>(mut self, remap: F) -> Self
    where
        F: FnMut(&mut C, &str) -> u16 + 'a,
    {
        self.remap = Some(Box::new(remap));
        self
    }

    /// Receive each node once all of its prerequisites have been received.
    pub fn sink<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&mut C, Node<V>) -> Result<(), SinkError> + 'a,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn value_decoder<D>(mut self, decoder: D) -> Self
    where
        D: ValueDecoder<Value = V> + 'a,
    {
        self.decoder = Some(Box::new(decoder));
        self
    }

    pub fn options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse, order and emit the document.
    ///
    /// Nothing reaches the sink unless the whole document parsed and ordered
    /// cleanly. A sink error stops the load; nodes already accepted stay with
    /// the caller.
    pub fn load(self, context: &mut C) -> Result<LoadReport, LoadError> {
        let Loader {
            path,
            remap,
            sink,
            decoder,
            mut options,
        } = self;
        let mut remap = remap.ok_or(LoadError::MissingCollaborator("namespace remap"))?;
        let mut sink = sink.ok_or(LoadError::MissingCollaborator("node sink"))?;
        let decoder = decoder.ok_or(LoadError::MissingCollaborator("value decoder"))?;

        let file = File::open(&path).map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;
        let input = BufReader::with_capacity(options.chunk_size.max(1), file);
        debug!(path = %path.display(), chunk_size = options.chunk_size, "loading nodeset");

        let started = Instant::now();
        let nodeset = nodeset_xml::parse_reader(input, decoder, |uri: &str| {
            remap(&mut *context, uri)
        })?;
        let parsed = Instant::now();

        let mut report = LoadReport {
            nodes: nodeset.len(),
            aliases: nodeset.alias_count(),
            namespaces: nodeset.namespaces().len(),
            ..LoadReport::default()
        };
        options.policy.extend_from(&nodeset);
        let ordered = nodeset.into_sorted(&options.policy)?;
        let sorted = Instant::now();

        for node in ordered {
            let id = node.id.clone();
            sink(&mut *context, node).map_err(|err| LoadError::Sink {
                node: id,
                message: err.to_string(),
            })?;
        }
        let added = Instant::now();

        report.parse = parsed - started;
        report.sort = sorted - parsed;
        report.add = added - sorted;
        info!(
            path = %path.display(),
            nodes = report.nodes,
            aliases = report.aliases,
            namespaces = report.namespaces,
            parse_ms = report.parse.as_millis() as u64,
            sort_ms = report.sort.as_millis() as u64,
            add_ms = report.add.as_millis() as u64,
            "nodeset loaded"
        );
        Ok(report)
    }
}

/// Run `loader` and report success as a flag; failures are logged.
pub fn load_file<C, V>(loader: Loader<'_, C, V>, context: &mut C) -> bool {
    let path = loader.path().to_path_buf();
    match loader.load(context) {
        Ok(_) => true,
        Err(err) => {
            error!(path = %path.display(), error = %err, "nodeset load failed");
            false
        }
    }
}
