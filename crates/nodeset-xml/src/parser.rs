use nodeset_core::{AliasDraft, Attributes, NamespaceSlot, Node, Nodeset, ReferenceDraft};
use tracing::{debug, trace};
use ua_types::NodeClass;

use crate::text::TextBuffer;
use crate::value::ValueDecoder;
use crate::ParseError;

const NAMESPACE_URIS: &str = "NamespaceUris";
const NAMESPACE_URI: &str = "Uri";
const ALIAS: &str = "Alias";
const DISPLAY_NAME: &str = "DisplayName";
const DESCRIPTION: &str = "Description";
const REFERENCES: &str = "References";
const REFERENCE: &str = "Reference";
const VALUE: &str = "Value";
const CONTAINERS: [&str; 3] = ["UANodeSet", "Aliases", "Extensions"];

/// Recognised element the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Node,
    DisplayName,
    References,
    Reference,
    Description,
    Alias,
    NamespaceUris,
    Uri,
    Value,
}

/// Parser state: a recognised phase, or an unrecognised subtree `depth`
/// levels deep that returns to `resume` once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Known(Phase),
    Unknown { resume: Phase, depth: usize },
}

/// Event-driven NodeSet state machine.
///
/// Feed it start/characters/end events in document order, then call
/// [`NodesetParser::finish`] to obtain the graph.
pub struct NodesetParser<D: ValueDecoder, R> {
    nodeset: Nodeset<D::Value>,
    state: State,
    text: TextBuffer,
    node: Option<Node<D::Value>>,
    alias: Option<AliasDraft>,
    reference: Option<ReferenceDraft>,
    namespace: Option<NamespaceSlot>,
    value: Option<D::Value>,
    value_depth: usize,
    open: usize,
    seen_root: bool,
    decoder: D,
    remap: R,
}

impl<D, R> NodesetParser<D, R>
where
    D: ValueDecoder,
    R: FnMut(&str) -> u16,
{
    /// `remap` receives every declared namespace uri and returns the index
    /// the host wants used for it.
    pub fn new(decoder: D, remap: R) -> Self {
        Self {
            nodeset: Nodeset::new(),
            state: State::Known(Phase::Init),
            text: TextBuffer::new(),
            node: None,
            alias: None,
            reference: None,
            namespace: None,
            value: None,
            value_depth: 0,
            open: 0,
            seen_root: false,
            decoder,
            remap,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Graph built so far.
    pub fn nodeset(&self) -> &Nodeset<D::Value> {
        &self.nodeset
    }

    pub fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
        self.open += 1;
        self.seen_root = true;
        self.state = match self.state {
            State::Unknown { resume, depth } => State::Unknown {
                resume,
                depth: depth + 1,
            },
            State::Known(phase) => match self.enter(phase, name, attrs)? {
                Some(next) => State::Known(next),
                None => {
                    trace!(element = name, ?phase, "skipping unrecognised element");
                    State::Unknown {
                        resume: phase,
                        depth: 1,
                    }
                }
            },
        };
        self.text.begin();
        Ok(())
    }

    pub fn characters(&mut self, fragment: &str) {
        self.text.append(fragment);
    }

    pub fn end_element(&mut self, name: &str) -> Result<(), ParseError> {
        self.open = self.open.saturating_sub(1);
        let text = self.text.take();
        self.state = match self.state {
            State::Unknown { resume, depth: 1 } => State::Known(resume),
            State::Unknown { resume, depth } => State::Unknown {
                resume,
                depth: depth - 1,
            },
            State::Known(phase) => State::Known(self.leave(phase, name, text)?),
        };
        Ok(())
    }

    /// Return the finished graph; fails if the document was empty or stopped
    /// before every element closed.
    pub fn finish(self) -> Result<Nodeset<D::Value>, ParseError> {
        if !self.seen_root {
            return Err(ParseError::EmptyDocument);
        }
        match self.state {
            State::Known(Phase::Init) if self.open > 0 => {
                Err(ParseError::UnexpectedEof(Phase::Init))
            }
            State::Known(Phase::Init) => {
                debug!(
                    nodes = self.nodeset.len(),
                    aliases = self.nodeset.alias_count(),
                    namespaces = self.nodeset.namespaces().len(),
                    "nodeset parsed"
                );
                Ok(self.nodeset)
            }
            State::Known(phase) | State::Unknown { resume: phase, .. } => {
                Err(ParseError::UnexpectedEof(phase))
            }
        }
    }

    /// Transition for a start element; `None` means the element is not
    /// recognised here.
    fn enter(
        &mut self,
        phase: Phase,
        name: &str,
        attrs: &Attributes,
    ) -> Result<Option<Phase>, ParseError> {
        let next = match phase {
            Phase::Init => {
                if let Some(class) = NodeClass::from_element_name(name) {
                    self.node = Some(self.nodeset.new_node(class, attrs)?);
                    Some(Phase::Node)
                } else if name == NAMESPACE_URIS {
                    Some(Phase::NamespaceUris)
                } else if name == ALIAS {
                    self.alias = Some(self.nodeset.new_alias(attrs)?);
                    Some(Phase::Alias)
                } else if CONTAINERS.contains(&name) {
                    Some(Phase::Init)
                } else {
                    None
                }
            }
            Phase::NamespaceUris if name == NAMESPACE_URI => {
                self.namespace = Some(self.nodeset.new_namespace());
                Some(Phase::Uri)
            }
            Phase::Node => match name {
                DISPLAY_NAME => Some(Phase::DisplayName),
                DESCRIPTION => Some(Phase::Description),
                REFERENCES => Some(Phase::References),
                VALUE => {
                    let node = self.node.as_ref().ok_or(ParseError::Detached(VALUE))?;
                    if node.class.has_value() {
                        self.value = Some(self.decoder.new_value(node));
                        self.value_depth = 0;
                        Some(Phase::Value)
                    } else {
                        None
                    }
                }
                _ => None,
            },
            Phase::Value => {
                let value = self.value.as_mut().ok_or(ParseError::Detached(VALUE))?;
                self.decoder.start(value, name);
                self.value_depth += 1;
                Some(Phase::Value)
            }
            Phase::References if name == REFERENCE => {
                self.reference = Some(self.nodeset.new_reference(attrs)?);
                Some(Phase::Reference)
            }
            _ => None,
        };
        Ok(next)
    }

    /// Transition for an end element carrying the element's text.
    fn leave(&mut self, phase: Phase, name: &str, text: String) -> Result<Phase, ParseError> {
        let next = match phase {
            Phase::Init => Phase::Init,
            Phase::Alias => {
                let alias = self.alias.take().ok_or(ParseError::Detached(ALIAS))?;
                self.nodeset.finish_alias(alias, &text)?;
                Phase::Init
            }
            Phase::Uri => {
                let slot = self
                    .namespace
                    .take()
                    .ok_or(ParseError::Detached(NAMESPACE_URI))?;
                self.nodeset.finish_namespace(slot, &mut self.remap, &text);
                Phase::NamespaceUris
            }
            Phase::NamespaceUris => Phase::Init,
            Phase::Node => {
                let node = self.node.take().ok_or(ParseError::Detached("node"))?;
                self.nodeset.finish_node(node)?;
                Phase::Init
            }
            Phase::DisplayName => {
                self.node_mut(DISPLAY_NAME)?.display_name = Some(trimmed(text));
                Phase::Node
            }
            Phase::Description => {
                self.node_mut(DESCRIPTION)?.description = Some(trimmed(text));
                Phase::Node
            }
            Phase::References => Phase::Node,
            Phase::Reference => {
                let draft = self
                    .reference
                    .take()
                    .ok_or(ParseError::Detached(REFERENCE))?;
                let node = self.node.as_mut().ok_or(ParseError::Detached(REFERENCE))?;
                self.nodeset.finish_reference(draft, node, &text)?;
                Phase::References
            }
            Phase::Value if self.value_depth == 0 => {
                let mut value = self.value.take().ok_or(ParseError::Detached(VALUE))?;
                self.decoder.finish(&mut value);
                self.node_mut(VALUE)?.value = Some(value);
                Phase::Node
            }
            Phase::Value => {
                let value = self.value.as_mut().ok_or(ParseError::Detached(VALUE))?;
                self.decoder.end(value, name, &text);
                self.value_depth -= 1;
                Phase::Value
            }
        };
        Ok(next)
    }

    fn node_mut(&mut self, element: &'static str) -> Result<&mut Node<D::Value>, ParseError> {
        self.node.as_mut().ok_or(ParseError::Detached(element))
    }
}

fn trimmed(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.len() == text.len() {
        text
    } else {
        trimmed.to_string()
    }
}
