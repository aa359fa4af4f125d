//! Preserved blocks: regions of a generated file delimited by
//! `/// StartBlock(name)` ... `/// EndBlock(name)` (or `###` for
//! hash-comment languages) whose content belongs to the user.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{Result, StrataError};

/// Block name -> the lines found between its markers, newline-joined.
pub type BlockMap = BTreeMap<String, String>;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w*(///|###)\s*([a-zA-Z]+)\(([a-zA-Z]+)\)").expect("valid regex")
});

#[derive(Debug, PartialEq, Eq)]
enum Marker<'a> {
    Start(&'a str),
    End(&'a str),
}

fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let caps = MARKER.captures(line)?;
    let name = caps.get(3)?.as_str();
    match caps.get(2)?.as_str() {
        "StartBlock" => Some(Marker::Start(name)),
        "EndBlock" => Some(Marker::End(name)),
        _ => None,
    }
}

/// Scan state for one file. At most one block is open at a time.
#[derive(Debug)]
enum ScanState {
    Outside,
    Inside(String),
}

/// Collect the content of every preserved block in `reader`.
///
/// A block seen with no lines between its markers maps to an empty string, so
/// a user clearing a block is preserved as well. `path` is only used in errors.
pub fn scan_blocks(path: &Path, reader: impl BufRead) -> Result<BlockMap> {
    let mut state = ScanState::Outside;
    let mut lines_by_block: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let line_no = index + 1;
        let raw = raw.map_err(|e| StrataError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        })?;
        let line = String::from_utf8_lossy(&raw);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        let malformed = |reason: String| StrataError::MalformedBlockMarkers {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };

        state = match (state, parse_marker(line)) {
            (ScanState::Outside, Some(Marker::Start(name))) => {
                lines_by_block.entry(name.to_string()).or_default();
                ScanState::Inside(name.to_string())
            }
            (ScanState::Inside(open), Some(Marker::Start(name))) => {
                return Err(malformed(format!(
                    "StartBlock({name}) while block '{open}' is still open"
                )));
            }
            (ScanState::Outside, Some(Marker::End(name))) => {
                return Err(malformed(format!(
                    "EndBlock({name}) without a matching StartBlock"
                )));
            }
            (ScanState::Inside(open), Some(Marker::End(name))) => {
                if open != name {
                    return Err(malformed(format!(
                        "EndBlock({name}) while inside block '{open}'"
                    )));
                }
                ScanState::Outside
            }
            (ScanState::Inside(open), None) => {
                lines_by_block
                    .entry(open.clone())
                    .or_default()
                    .push(line.to_string());
                ScanState::Inside(open)
            }
            (ScanState::Outside, None) => ScanState::Outside,
        };
    }

    if let ScanState::Inside(open) = state {
        tracing::warn!(path = %path.display(), block = %open, "block is never closed; keeping its content");
    }

    Ok(lines_by_block
        .into_iter()
        .map(|(name, lines)| (name, lines.join("\n")))
        .collect())
}

/// Read the preserved blocks of an existing output file.
///
/// A missing file has no blocks. The file handle is closed before returning,
/// so the caller is free to overwrite the same path.
pub fn read_preserved_blocks(path: &Path) -> Result<BlockMap> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BlockMap::new()),
        Err(e) => {
            return Err(StrataError::Io {
                context: format!("opening {}", path.display()),
                source: e,
            })
        }
    };
    scan_blocks(path, BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(content: &str) -> Result<BlockMap> {
        scan_blocks(Path::new("out.go"), content.as_bytes())
    }

    #[test]
    fn recognizes_both_comment_styles() {
        assert_eq!(parse_marker("/// StartBlock(imports)"), Some(Marker::Start("imports")));
        assert_eq!(parse_marker("  ### EndBlock(deps)"), Some(Marker::End("deps")));
        assert_eq!(parse_marker("\t///EndBlock(x)"), Some(Marker::End("x")));
        assert_eq!(parse_marker("// StartBlock(x)"), None);
        assert_eq!(parse_marker("/// Unknown(x)"), None);
        assert_eq!(parse_marker("/// StartBlock(bad_name)"), None);
    }

    #[test]
    fn collects_lines_between_markers() {
        let blocks = scan(
            "package main\n\
             /// StartBlock(imports)\n\
             import \"fmt\"\n\
             import \"os\"\n\
             /// EndBlock(imports)\n\
             func main() {}\n",
        )
        .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks["imports"], "import \"fmt\"\nimport \"os\"");
    }

    #[test]
    fn multiple_blocks_and_hash_comments() {
        let blocks = scan(
            "### StartBlock(env)\nFOO=1\n### EndBlock(env)\n\
             other\n\
             ### StartBlock(extra)\n  indented\n\n### EndBlock(extra)\n",
        )
        .unwrap();
        assert_eq!(blocks["env"], "FOO=1");
        assert_eq!(blocks["extra"], "  indented\n");
    }

    #[test]
    fn empty_block_is_recorded() {
        let blocks = scan("/// StartBlock(x)\n/// EndBlock(x)\n").unwrap();
        assert_eq!(blocks["x"], "");
    }

    #[test]
    fn crlf_line_endings() {
        let blocks = scan("/// StartBlock(x)\r\nline\r\n/// EndBlock(x)\r\n").unwrap();
        assert_eq!(blocks["x"], "line");
    }

    #[test]
    fn nested_start_is_rejected_at_second_marker() {
        let err = scan("a\n/// StartBlock(x)\nb\n/// StartBlock(y)\n").unwrap_err();
        match err {
            StrataError::MalformedBlockMarkers { path, line, .. } => {
                assert_eq!(path, Path::new("out.go"));
                assert_eq!(line, 4);
            }
            other => panic!("expected MalformedBlockMarkers, got: {other:?}"),
        }
    }

    #[test]
    fn mismatched_end_is_rejected() {
        let err = scan("/// StartBlock(x)\n/// EndBlock(y)\n").unwrap_err();
        assert!(matches!(err, StrataError::MalformedBlockMarkers { line: 2, .. }));
    }

    #[test]
    fn orphan_end_is_rejected() {
        let err = scan("text\n/// EndBlock(x)\n").unwrap_err();
        assert!(matches!(err, StrataError::MalformedBlockMarkers { line: 2, .. }));
    }

    #[test]
    fn unclosed_block_keeps_content() {
        let blocks = scan("/// StartBlock(x)\nkept\n").unwrap();
        assert_eq!(blocks["x"], "kept");
    }

    #[test]
    fn missing_file_has_no_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = read_preserved_blocks(&dir.path().join("nope.go")).unwrap();
        assert!(blocks.is_empty());
    }
}
