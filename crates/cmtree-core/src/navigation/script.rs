//! Command-script input
//!
//! A script may carry a `### HEADER ###` region of pass-through metadata and
//! a `### BODY ###` region of commands. Without a body marker every line is a
//! command. Blank lines and `#` comments are skipped.

pub const HEADER_MARKER: &str = "### HEADER ###";
pub const BODY_MARKER: &str = "### BODY ###";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptInput {
    /// Header lines, untouched apart from trimming
    pub header: Vec<String>,
    /// Command lines with their 1-based line numbers in the source text
    pub body: Vec<(usize, String)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Region {
    Preamble,
    Header,
    Body,
}

pub fn parse_script(text: &str) -> ScriptInput {
    let has_body_marker = text.lines().any(|l| l.trim() == BODY_MARKER);
    let mut region = if has_body_marker {
        Region::Preamble
    } else {
        Region::Body
    };
    let mut input = ScriptInput::default();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line == HEADER_MARKER {
            region = Region::Header;
            continue;
        }
        if line == BODY_MARKER {
            region = Region::Body;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        match region {
            Region::Header => input.header.push(line.to_string()),
            Region::Body if !line.starts_with('#') => input.body.push((i + 1, line.to_string())),
            _ => {}
        }
    }
    input
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_without_markers_everything_is_body() {
        let input = parse_script("ROOT 1\n\n# comment\nx 1\n");
        assert!(input.header.is_empty());
        assert_eq!(
            input.body,
            vec![(1, "ROOT 1".to_string()), (4, "x 1".to_string())]
        );
    }

    #[test]
    fn test_header_and_body_regions() {
        let text = "stray\n### HEADER ###\nsite: lab\n### BODY ###\nROOT 1\n  exit  \n";
        let input = parse_script(text);
        assert_eq!(input.header, vec!["site: lab".to_string()]);
        assert_eq!(
            input.body,
            vec![(5, "ROOT 1".to_string()), (6, "exit".to_string())]
        );
    }
}
