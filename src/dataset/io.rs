//! On-disk edge list encodings.
//!
//! `.graph.bin` files are packed 32 byte records of four native-endian
//! `i64`s (`src dst weight timestamp`). `.graph.el` files hold the same four
//! fields per line, whitespace separated.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::edge::Edge;
use crate::error::DatasetError;

pub const RECORD_BYTES: usize = 4 * std::mem::size_of::<i64>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Binary,
    Text,
}

impl Format {
    pub fn from_path(path: &str) -> Option<Format> {
        if path.ends_with(".graph.bin") {
            Some(Format::Binary)
        } else if path.ends_with(".graph.el") {
            Some(Format::Text)
        } else {
            None
        }
    }
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> DatasetError + '_ {
    move |source| DatasetError::Io { path: path.to_path_buf(), source }
}

/// Loads an edge list, choosing the encoding from the file's suffix.
pub fn read_edges(path: &str) -> Result<Vec<Edge>, DatasetError> {
    match Format::from_path(path) {
        Some(Format::Binary) => read_binary(Path::new(path)),
        Some(Format::Text) => read_text(Path::new(path)),
        None => Err(DatasetError::UnknownFormat(path.to_string())),
    }
}

pub fn read_binary(path: &Path) -> Result<Vec<Edge>, DatasetError> {
    info!("Checking file size of {}...", path.display());
    let len = fs::metadata(path).map_err(io_error(path))?.len();
    if len % RECORD_BYTES as u64 != 0 {
        return Err(DatasetError::MisSized { path: path.to_path_buf(), len, record: RECORD_BYTES });
    }
    info!("Preloading {} directed edges from {}...", len / RECORD_BYTES as u64, path.display());

    let bytes = fs::read(path).map_err(io_error(path))?;
    if bytes.len() % RECORD_BYTES != 0 {
        // the file changed size since we looked.
        return Err(DatasetError::MisSized { path: path.to_path_buf(), len: bytes.len() as u64, record: RECORD_BYTES });
    }

    let mut edges = Vec::with_capacity(bytes.len() / RECORD_BYTES);
    for record in bytes.chunks_exact(RECORD_BYTES) {
        let field = |i: usize| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&record[8 * i..8 * (i + 1)]);
            i64::from_ne_bytes(word)
        };
        edges.push(Edge::new(field(0), field(1), field(2), field(3)));
    }
    Ok(edges)
}

pub fn read_text(path: &Path) -> Result<Vec<Edge>, DatasetError> {
    info!("Counting lines in {}...", path.display());
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    let num_lines = text.bytes().filter(|&b| b == b'\n').count();
    info!("Preloading {} directed edges from {}...", num_lines, path.display());

    let mut edges = Vec::with_capacity(num_lines);
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if !line.ends_with('\n') {
            if !line.trim().is_empty() {
                warn!("{}: ignoring incomplete final line {:?}", path.display(), line);
            }
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let edge = parse_edge(line).ok_or_else(|| DatasetError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            content: line.to_string(),
        })?;
        edges.push(edge);
    }
    Ok(edges)
}

fn parse_edge(line: &str) -> Option<Edge> {
    let mut fields = line.split_whitespace().map(|f| f.parse::<i64>());
    let mut next = || fields.next()?.ok();
    let edge = Edge::new(next()?, next()?, next()?, next()?);
    if fields.next().is_some() {
        return None;
    }
    Some(edge)
}

/// Writes `edges` in the encoding chosen by the file's suffix.
pub fn write_edges(path: &str, edges: &[Edge]) -> Result<(), DatasetError> {
    match Format::from_path(path) {
        Some(Format::Binary) => write_binary(Path::new(path), edges),
        Some(Format::Text) => write_text(Path::new(path), edges),
        None => Err(DatasetError::UnknownFormat(path.to_string())),
    }
}

pub fn write_binary(path: &Path, edges: &[Edge]) -> Result<(), DatasetError> {
    let mut writer = BufWriter::new(File::create(path).map_err(io_error(path))?);
    for e in edges {
        for field in [e.src, e.dst, e.weight, e.timestamp] {
            writer.write_all(&field.to_ne_bytes()).map_err(io_error(path))?;
        }
    }
    writer.flush().map_err(io_error(path))
}

pub fn write_text(path: &Path, edges: &[Edge]) -> Result<(), DatasetError> {
    let mut writer = BufWriter::new(File::create(path).map_err(io_error(path))?);
    for e in edges {
        writeln!(writer, "{} {} {} {}", e.src, e.dst, e.weight, e.timestamp).map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_fields() {
        assert_eq!(parse_edge("1 2 3 4"), Some(Edge::new(1, 2, 3, 4)));
        assert_eq!(parse_edge("  -1\t2  3 4 "), Some(Edge::new(-1, 2, 3, 4)));
        assert_eq!(parse_edge("1 2 3"), None);
        assert_eq!(parse_edge("1 2 3 4 5"), None);
        assert_eq!(parse_edge("1 2 x 4"), None);
    }

    #[test]
    fn format_follows_suffix() {
        assert_eq!(Format::from_path("a/b.graph.bin"), Some(Format::Binary));
        assert_eq!(Format::from_path("b.graph.el"), Some(Format::Text));
        assert_eq!(Format::from_path("b.el"), None);
        assert!(matches!(read_edges("missing.csv"), Err(DatasetError::UnknownFormat(_))));
    }
}
