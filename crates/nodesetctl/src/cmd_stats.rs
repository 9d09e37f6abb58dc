use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::common;

#[derive(Serialize)]
struct StatsEntry {
    nodes: usize,
    aliases: usize,
    namespaces: usize,
    classes: BTreeMap<String, usize>,
    with_value: usize,
    references: usize,
    parse_ms: f64,
    sort_ms: f64,
    add_ms: f64,
    total_ms: f64,
}

pub fn run(path: &Path, remaps: &[(String, u16)], chunk_size: usize, json: bool) -> Result<()> {
    let collected = common::collect(path, remaps, chunk_size)?;
    let report = collected.report;

    let mut classes = BTreeMap::new();
    for node in &collected.nodes {
        *classes.entry(node.class.to_string()).or_insert(0usize) += 1;
    }
    let stats = StatsEntry {
        nodes: report.nodes,
        aliases: report.aliases,
        namespaces: report.namespaces,
        classes,
        with_value: collected.nodes.iter().filter(|n| n.value.is_some()).count(),
        references: collected.nodes.iter().map(|n| n.references.len()).sum(),
        parse_ms: millis(report.parse),
        sort_ms: millis(report.sort),
        add_ms: millis(report.add),
        total_ms: millis(report.total()),
    };

    if json {
        return common::print_json(&stats);
    }

    println!("file        {}", path.display());
    println!("nodes       {}", stats.nodes);
    for (class, count) in &stats.classes {
        println!("  {class:<10}{count}");
    }
    println!("references  {}", stats.references);
    println!("values      {}", stats.with_value);
    println!("aliases     {}", stats.aliases);
    println!("namespaces  {}", stats.namespaces);
    println!(
        "parse {:.3} ms, sort {:.3} ms, add {:.3} ms, total {:.3} ms",
        stats.parse_ms, stats.sort_ms, stats.add_ms, stats.total_ms
    );
    Ok(())
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
