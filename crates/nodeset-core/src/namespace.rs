use tracing::debug;

use crate::NodesetError;

/// Uri of namespace 0, implicit in every document.
pub const BASE_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

/// Declared namespace with the index the host assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub uri: String,
    pub index: u16,
}

/// Position of a `<Uri>` entry whose text has not been read yet.
#[derive(Debug)]
#[must_use]
pub struct NamespaceSlot {
    pub(crate) position: usize,
}

/// Ordered namespace declarations of one document.
///
/// Document index `k >= 1` refers to the `k`-th declared entry; index 0 is
/// the base namespace and is never remapped.
#[derive(Debug, Default)]
pub struct NamespaceTable {
    entries: Vec<Option<Namespace>>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reserve_slot(&mut self) -> NamespaceSlot {
        self.entries.push(None);
        NamespaceSlot {
            position: self.entries.len() - 1,
        }
    }

    pub(crate) fn fill(&mut self, slot: NamespaceSlot, uri: String, index: u16) {
        debug!(
            document_index = slot.position + 1,
            index,
            uri = %uri,
            "namespace declared"
        );
        self.entries[slot.position] = Some(Namespace { uri, index });
    }

    /// Translate a document-local namespace index into the host index.
    pub fn translate(&self, document_index: u16) -> Result<u16, NodesetError> {
        if document_index == 0 {
            return Ok(0);
        }
        self.entries
            .get(usize::from(document_index) - 1)
            .and_then(Option::as_ref)
            .map(|ns| ns.index)
            .ok_or(NodesetError::UnknownNamespace(document_index))
    }

    /// Host index of a namespace identified by uri.
    pub fn index_of(&self, uri: &str) -> Result<u16, NodesetError> {
        if uri == BASE_NAMESPACE_URI {
            return Ok(0);
        }
        self.iter()
            .find(|ns| ns.uri == uri)
            .map(|ns| ns.index)
            .ok_or_else(|| NodesetError::UnknownNamespaceUri(uri.to_string()))
    }

    /// Declared namespaces in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.entries.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
