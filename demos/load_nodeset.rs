use std::env;

use nodeset_rs::{Loader, LoaderOptions, Node, RawValue, RawValueDecoder};
use tracing::info;

struct AddressSpace {
    namespaces: Vec<String>,
    nodes: Vec<Node<RawValue>>,
}

fn parse_args() -> Result<(String, usize), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut path = None;
    let mut chunk_size = nodeset_rs::xml::DEFAULT_CHUNK_SIZE;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--chunk-size" => {
                if let Some(value) = args.next() {
                    chunk_size = value.parse()?;
                }
            }
            _ => path = Some(arg),
        }
    }
    let path = path.ok_or("usage: load_nodeset <NodeSet2.xml> [--chunk-size N]")?;
    Ok((path, chunk_size))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let (path, chunk_size) = parse_args()?;

    let mut space = AddressSpace {
        namespaces: vec![nodeset_rs::graph::BASE_NAMESPACE_URI.to_string()],
        nodes: Vec::new(),
    };
    let report = Loader::new(&path)
        .namespace_remap(|space: &mut AddressSpace, uri: &str| {
            if let Some(index) = space.namespaces.iter().position(|known| known == uri) {
                return index as u16;
            }
            space.namespaces.push(uri.to_string());
            (space.namespaces.len() - 1) as u16
        })
        .value_decoder(RawValueDecoder)
        .sink(|space: &mut AddressSpace, node| {
            space.nodes.push(node);
            Ok(())
        })
        .options(LoaderOptions {
            chunk_size,
            ..LoaderOptions::default()
        })
        .load(&mut space)?;

    info!(nodes = report.nodes, total = ?report.total(), "loaded");
    for (index, uri) in space.namespaces.iter().enumerate() {
        println!("ns={index} {uri}");
    }
    for node in space.nodes.iter().take(20) {
        let value = node
            .value
            .as_ref()
            .and_then(|value| value.leaves.first())
            .map(|leaf| format!(" = {}", leaf.text))
            .unwrap_or_default();
        println!("{} {}{}", node.class, node.id, value);
    }
    if space.nodes.len() > 20 {
        println!("... {} more", space.nodes.len() - 20);
    }
    Ok(())
}
