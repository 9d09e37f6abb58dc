use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use nodeset_loader::{LoadReport, Loader, LoaderOptions, Node, RawValue, RawValueDecoder};
use serde::Serialize;
use tracing::debug;

/// Parse a `--remap URI=INDEX` pair.
pub fn parse_remap(text: &str) -> Result<(String, u16)> {
    let (uri, index) = text
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected URI=INDEX, got '{text}'"))?;
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(anyhow!("empty namespace URI in '{text}'"));
    }
    let index = index
        .trim()
        .parse::<u16>()
        .with_context(|| format!("namespace index in '{text}'"))?;
    Ok((uri.to_string(), index))
}

/// Hands out consumer namespace indices: explicit pairs first, then the
/// lowest free index starting at 1.
#[derive(Debug, Default)]
pub struct NamespaceAssigner {
    explicit: HashMap<String, u16>,
    taken: HashSet<u16>,
    next: u16,
}

impl NamespaceAssigner {
    pub fn new(pairs: &[(String, u16)]) -> Self {
        Self {
            explicit: pairs.iter().cloned().collect(),
            taken: pairs.iter().map(|(_, index)| *index).collect(),
            next: 1,
        }
    }

    pub fn assign(&mut self, uri: &str) -> u16 {
        if let Some(index) = self.explicit.get(uri) {
            return *index;
        }
        while self.taken.contains(&self.next) {
            self.next += 1;
        }
        let index = self.next;
        self.taken.insert(index);
        self.explicit.insert(uri.to_string(), index);
        debug!(uri, index, "assigned namespace index");
        index
    }
}

/// Everything a load handed to the sink, in creation order.
#[derive(Debug)]
pub struct Collected {
    pub nodes: Vec<Node<RawValue>>,
    pub namespaces: Vec<(String, u16)>,
    pub report: LoadReport,
}

pub fn collect(path: &Path, remaps: &[(String, u16)], chunk_size: usize) -> Result<Collected> {
    struct Target {
        assigner: NamespaceAssigner,
        namespaces: Vec<(String, u16)>,
        nodes: Vec<Node<RawValue>>,
    }

    let mut target = Target {
        assigner: NamespaceAssigner::new(remaps),
        namespaces: Vec::new(),
        nodes: Vec::new(),
    };
    let report = Loader::new(path)
        .namespace_remap(|target: &mut Target, uri: &str| {
            let index = target.assigner.assign(uri);
            target.namespaces.push((uri.to_string(), index));
            index
        })
        .value_decoder(RawValueDecoder)
        .sink(|target: &mut Target, node| {
            target.nodes.push(node);
            Ok(())
        })
        .options(LoaderOptions {
            chunk_size,
            ..LoaderOptions::default()
        })
        .load(&mut target)
        .with_context(|| format!("load {}", path.display()))?;

    Ok(Collected {
        nodes: target.nodes,
        namespaces: target.namespaces,
        report,
    })
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_pairs_split_on_last_equals() {
        assert_eq!(
            parse_remap("urn:acme:a=b=3").unwrap(),
            ("urn:acme:a=b".to_string(), 3)
        );
        assert!(parse_remap("http://example.org/UA/").is_err());
        assert!(parse_remap("=2").is_err());
        assert!(parse_remap("urn:x=70000").is_err());
    }

    #[test]
    fn assigner_skips_explicit_indices() {
        let mut assigner = NamespaceAssigner::new(&[("urn:b".to_string(), 1)]);
        assert_eq!(assigner.assign("urn:a"), 2);
        assert_eq!(assigner.assign("urn:b"), 1);
        assert_eq!(assigner.assign("urn:c"), 3);
        assert_eq!(assigner.assign("urn:a"), 2);
    }
}
