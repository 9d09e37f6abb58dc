use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use ua_types::{NodeClass, NodeId, QualifiedName};

use crate::common;

#[derive(Serialize)]
struct OrderEntry<'a> {
    position: usize,
    node_id: &'a NodeId,
    class: NodeClass,
    browse_name: Option<&'a QualifiedName>,
    display_name: Option<&'a str>,
    parent: Option<&'a NodeId>,
    references: usize,
}

pub fn run(path: &Path, remaps: &[(String, u16)], chunk_size: usize, json: bool) -> Result<()> {
    let collected = common::collect(path, remaps, chunk_size)?;
    info!(count = collected.nodes.len(), "ordered nodes");

    if json {
        let entries: Vec<OrderEntry<'_>> = collected
            .nodes
            .iter()
            .enumerate()
            .map(|(position, node)| OrderEntry {
                position,
                node_id: &node.id,
                class: node.class,
                browse_name: node.browse_name.as_ref(),
                display_name: node.display_name.as_deref(),
                parent: node.parent.as_ref(),
                references: node.references.len(),
            })
            .collect();
        common::print_json(&entries)?;
        return Ok(());
    }

    if collected.nodes.is_empty() {
        println!("No nodes declared.");
        return Ok(());
    }

    for (uri, index) in &collected.namespaces {
        println!("ns={index:<4} {uri}");
    }
    println!(
        "{:<6} {:<28} {:<14} {}",
        "POS", "NODEID", "CLASS", "BrowseName"
    );
    for (position, node) in collected.nodes.iter().enumerate() {
        let browse_name = node
            .browse_name
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".into());
        println!(
            "{position:<6} {:<28} {:<14} {browse_name}",
            node.id.to_string(),
            node.class.to_string(),
        );
    }

    Ok(())
}
