//! Graphviz export for inspecting evolved organisms.
//!
//! Inputs are drawn red, outputs blue and the bias node grey. Every gene is a
//! record node between its endpoints showing its weight and whether it is
//! enabled, so disabled genes stay visible.

use std::io::{self, Write};

use crate::gene::NodeType;
use crate::organism::Organism;

/// Write `organism` as a DOT digraph.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_dot<W: Write>(organism: &Organism, mut out: W) -> io::Result<()> {
    writeln!(out, "digraph G {{")?;
    writeln!(out, "  concentrate=false;")?;
    writeln!(out, "  rankdir=LR;")?;

    for (kind, style) in [
        (NodeType::Input, "shape=circle, style=filled, color=red"),
        (NodeType::Output, "shape=circle, style=filled, color=blue"),
        (NodeType::Bias, "shape=circle, style=filled, color=grey"),
        (NodeType::Hidden, "shape=circle"),
    ] {
        for &id in organism.nodes() {
            if organism.node_type(id) == Some(kind) {
                writeln!(out, "  node{} [{style}];", id.0)?;
            }
        }
    }

    for gene in organism.genes() {
        let state = if gene.enabled { "enabled" } else { "disabled" };
        writeln!(
            out,
            "  gene{} [shape=record, label=\"w: {:.2}|{state}\"];",
            gene.innovation.0, gene.weight
        )?;
    }

    for gene in organism.genes() {
        writeln!(out, "  node{} -> gene{};", gene.input.0, gene.innovation.0)?;
        writeln!(out, "  gene{} -> node{};", gene.innovation.0, gene.output.0)?;
    }

    writeln!(out, "}}")
}

/// Render `organism` as a DOT string.
#[must_use]
pub fn to_dot(organism: &Organism) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail
    let _ = write_dot(organism, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
