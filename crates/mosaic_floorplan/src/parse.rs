//! Parsers for the block, net, and region text files.
//!
//! All three formats are line oriented with `#` comments. Numeric conversion
//! failures surface as [`FloorplanError::Parse`] with the file and 1-based
//! line number; nothing panics on malformed input.
//!
//! - Block file: `cluster <name> <area>`, `macro <cluster> <name> <width>
//!   <height> <pin_x> <pin_y>`, `terminal <name> <x> <y>`.
//! - Net file: `source: <name> <sink1> <weight1> [<sink2> <weight2> ...]`;
//!   each (source, sink, weight) triple becomes one two-pin net. A name that
//!   exists in the terminal table is a terminal reference, otherwise a block
//!   reference.
//! - Region file: `<label> <lx> <ly> <ux> <uy>`; the label is ignored. A
//!   missing region file means zero regions, not an error.

use crate::error::FloorplanError;
use crate::model::{Cluster, Design, Macro, Net, Region, Terminal};
use mosaic_common::Rect;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

fn parse_num<T: FromStr>(
    token: &str,
    file: &str,
    line: usize,
    what: &str,
) -> Result<T, FloorplanError> {
    token.parse().map_err(|_| FloorplanError::Parse {
        file: file.to_string(),
        line,
        message: format!("invalid {what} '{token}'"),
    })
}

fn read_file(path: &Path) -> Result<String, FloorplanError> {
    std::fs::read_to_string(path).map_err(|source| FloorplanError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

/// Parses a block file into a design with clusters, macros, and terminals.
pub fn parse_block_file(path: &Path) -> Result<Design, FloorplanError> {
    parse_block_str(&read_file(path)?, &path.display().to_string())
}

/// Parses block-file content; `file` names the source for error messages.
pub fn parse_block_str(content: &str, file: &str) -> Result<Design, FloorplanError> {
    let mut design = Design::new();
    for (line_no, line) in content_lines(content) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let bad = |message: String| FloorplanError::Parse {
            file: file.to_string(),
            line: line_no,
            message,
        };
        match tokens[0] {
            "cluster" => {
                if tokens.len() != 3 {
                    return Err(bad("expected 'cluster <name> <area>'".to_string()));
                }
                let area: f64 = parse_num(tokens[2], file, line_no, "area")?;
                design.add_cluster(Cluster::new(tokens[1], area));
            }
            "macro" => {
                if tokens.len() != 7 {
                    return Err(bad(
                        "expected 'macro <cluster> <name> <width> <height> <pin_x> <pin_y>'"
                            .to_string(),
                    ));
                }
                let width: f64 = parse_num(tokens[3], file, line_no, "width")?;
                let height: f64 = parse_num(tokens[4], file, line_no, "height")?;
                let pin_x: f64 = parse_num(tokens[5], file, line_no, "pin_x")?;
                let pin_y: f64 = parse_num(tokens[6], file, line_no, "pin_y")?;
                let id = design
                    .find_cluster(tokens[1])
                    .ok_or_else(|| bad(format!("unknown cluster '{}'", tokens[1])))?;
                design
                    .cluster_mut(id)
                    .macros
                    .push(Macro::new(tokens[2], width, height, pin_x, pin_y));
            }
            "terminal" => {
                if tokens.len() != 4 {
                    return Err(bad("expected 'terminal <name> <x> <y>'".to_string()));
                }
                let x: f64 = parse_num(tokens[2], file, line_no, "x")?;
                let y: f64 = parse_num(tokens[3], file, line_no, "y")?;
                design.terminals.push(Terminal {
                    name: tokens[1].to_string(),
                    x,
                    y,
                });
            }
            other => {
                return Err(bad(format!("unknown record '{other}'")));
            }
        }
    }
    Ok(design)
}

/// Parses a net file against a terminal-name table.
pub fn parse_net_file(
    path: &Path,
    terminals: &HashSet<String>,
) -> Result<Vec<Net>, FloorplanError> {
    parse_net_str(&read_file(path)?, &path.display().to_string(), terminals)
}

/// Parses net-file content; `file` names the source for error messages.
pub fn parse_net_str(
    content: &str,
    file: &str,
    terminals: &HashSet<String>,
) -> Result<Vec<Net>, FloorplanError> {
    let mut nets = Vec::new();
    for (line_no, line) in content_lines(content) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let bad = |message: String| FloorplanError::Parse {
            file: file.to_string(),
            line: line_no,
            message,
        };
        if tokens[0] != "source:" {
            return Err(bad(format!("expected 'source:', found '{}'", tokens[0])));
        }
        if tokens.len() < 4 || tokens.len() % 2 != 0 {
            return Err(bad(
                "expected 'source: <name> <sink> <weight> [<sink> <weight> ...]'".to_string(),
            ));
        }
        let source = tokens[1];
        for pair in tokens[2..].chunks(2) {
            let sink = pair[0];
            let weight: u32 = parse_num(pair[1], file, line_no, "weight")?;
            let mut blocks = Vec::new();
            let mut term_refs = Vec::new();
            for name in [source, sink] {
                if terminals.contains(name) {
                    term_refs.push(name.to_string());
                } else {
                    blocks.push(name.to_string());
                }
            }
            nets.push(Net {
                weight,
                blocks,
                terminals: term_refs,
            });
        }
    }
    Ok(nets)
}

/// Parses a region file; a missing file yields zero regions.
pub fn parse_region_file(path: &Path) -> Result<Vec<Region>, FloorplanError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    parse_region_str(&read_file(path)?, &path.display().to_string())
}

/// Parses region-file content; `file` names the source for error messages.
pub fn parse_region_str(content: &str, file: &str) -> Result<Vec<Region>, FloorplanError> {
    let mut regions = Vec::new();
    for (line_no, line) in content_lines(content) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 5 {
            return Err(FloorplanError::Parse {
                file: file.to_string(),
                line: line_no,
                message: "expected '<label> <lx> <ly> <ux> <uy>'".to_string(),
            });
        }
        let lx: f64 = parse_num(tokens[1], file, line_no, "lx")?;
        let ly: f64 = parse_num(tokens[2], file, line_no, "ly")?;
        let ux: f64 = parse_num(tokens[3], file, line_no, "ux")?;
        let uy: f64 = parse_num(tokens[4], file, line_no, "uy")?;
        regions.push(Region::new(Rect::new(lx, ly, ux, uy)));
    }
    Ok(regions)
}

/// Loads a complete design from its block, net, and optional region files.
pub fn load_design(
    block_path: &Path,
    net_path: &Path,
    region_path: Option<&Path>,
) -> Result<Design, FloorplanError> {
    let mut design = parse_block_file(block_path)?;
    let terminal_names: HashSet<String> =
        design.terminals.iter().map(|t| t.name.clone()).collect();
    design.nets = parse_net_file(net_path, &terminal_names)?;
    design.regions = match region_path {
        Some(path) => parse_region_file(path)?,
        None => Vec::new(),
    };
    Ok(design)
}
