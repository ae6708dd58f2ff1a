//! Command-script rendering of a change-set
//!
//! Objects are visited in distName order. Frames shared with the previous
//! object are kept open, so siblings are written without re-entering their
//! parent. The script closes every frame it opens; replaying it through a
//! session ends that session.
//!
//! A delete is written as `delete-mo` from the parent frame. Deletes already
//! covered by a deleted ancestor are omitted.

use crate::diff::{ChangeEntry, Changeset};
use crate::model::{DistName, ListValue, OperationTag, PathSegment};
use crate::navigation::command::{quote_token, KW_EXIT, KW_LIST, KW_SCHEDULE_DELETE};
use crate::ops::object_ops::SCALAR_LIST_FIELD;

/// Render `changeset` as a replayable command script
pub fn render_script(changeset: &Changeset) -> String {
    let mut entries: Vec<&ChangeEntry> = changeset.iter().collect();
    entries.sort_by(|a, b| a.dist_name().cmp(b.dist_name()));

    let deleted: Vec<&DistName> = entries
        .iter()
        .filter(|e| e.tag == OperationTag::Delete)
        .map(|e| e.dist_name())
        .collect();

    let mut out = ScriptWriter::default();
    for entry in entries {
        let dist_name = entry.dist_name();
        if entry.tag == OperationTag::Delete {
            if deleted.iter().any(|d| d.is_ancestor_of(dist_name)) {
                continue;
            }
            let (Some(parent), Some(last)) = (dist_name.parent(), dist_name.last()) else {
                continue;
            };
            out.move_to(parent.segments());
            out.line(format!(
                "{} {} {}",
                KW_SCHEDULE_DELETE,
                last.class,
                quote_token(&last.id)
            ));
            continue;
        }

        out.move_to(dist_name.segments());
        let obj = &entry.object;
        for (name, value) in &obj.parameters {
            out.line(format!("{} {}", name, quote_token(value)));
        }
        for (name, list) in &obj.lists {
            match list {
                ListValue::Scalar(values) => {
                    for (i, value) in values.iter().enumerate() {
                        out.list_line(name, i + 1, SCALAR_LIST_FIELD, value);
                    }
                }
                ListValue::Records(records) => {
                    for (i, record) in records.iter().enumerate() {
                        for (field, value) in record {
                            out.list_line(name, i + 1, field, value);
                        }
                    }
                }
            }
        }
    }
    out.move_to(&[]);
    out.finish()
}

#[derive(Default)]
struct ScriptWriter {
    frames: Vec<PathSegment>,
    lines: Vec<String>,
}

impl ScriptWriter {
    fn line(&mut self, line: String) {
        self.lines.push(line);
    }

    fn list_line(&mut self, list: &str, index: usize, field: &str, value: &str) {
        self.lines.push(format!(
            "{} {} {} {} {}",
            KW_LIST,
            list,
            index,
            field,
            quote_token(value)
        ));
    }

    /// Exit to the shared prefix with `target`, then enter the rest of it
    fn move_to(&mut self, target: &[PathSegment]) {
        let shared = self
            .frames
            .iter()
            .zip(target)
            .take_while(|(a, b)| a == b)
            .count();
        while self.frames.len() > shared {
            self.frames.pop();
            self.lines.push(KW_EXIT.to_string());
        }
        for segment in &target[shared..] {
            self.lines
                .push(format!("{} {}", segment.class, quote_token(&segment.id)));
            self.frames.push(segment.clone());
        }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}
