//! Human-readable summary renderer for change-sets.

use crate::model::OperationTag;

use super::model::Changeset;

/// Render a short Markdown summary of a [`Changeset`]
///
/// Informational only; the document and the script are the outputs that
/// downstream consumers act on.
pub fn render_summary(changeset: &Changeset) -> String {
    let mut out = String::new();
    out.push_str("## Change Set\n\n");
    out.push_str(&format!(
        "**Mode**: {}  \n**Objects**: {}\n\n",
        changeset.mode,
        changeset.len()
    ));

    if changeset.is_empty() {
        out.push_str("_No changes._\n");
        return out;
    }

    for (tag, heading) in [
        (OperationTag::Create, "Created"),
        (OperationTag::Update, "Updated"),
        (OperationTag::Delete, "Deleted"),
    ] {
        let names: Vec<String> = changeset
            .iter()
            .filter(|e| e.tag == tag)
            .map(|e| format!("- `{}` ({})", e.dist_name(), e.object.class))
            .collect();
        if names.is_empty() {
            continue;
        }
        out.push_str(&format!("### {} ({})\n\n", heading, names.len()));
        out.push_str(&names.join("\n"));
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diff::model::{ChangeEntry, DiffMode};
    use crate::model::{DistName, ManagedObject};

    #[test]
    fn test_empty_summary() {
        let out = render_summary(&Changeset::new(DiffMode::Fine, vec![]));
        assert!(out.contains("**Mode**: fine"));
        assert!(out.contains("_No changes._"));
    }

    #[test]
    fn test_sections_per_tag() {
        let b = ManagedObject::new("B", None, DistName::parse("R-1/B-1").unwrap(), "1");
        let c = ManagedObject::new("B", None, DistName::parse("R-1/B-2").unwrap(), "1");
        let cs = Changeset::new(
            DiffMode::Fine,
            vec![
                ChangeEntry::new(OperationTag::Update, &b),
                ChangeEntry::new(OperationTag::Delete, &c),
            ],
        );
        let out = render_summary(&cs);
        assert!(out.contains("### Updated (1)\n\n- `R-1/B-1` (B)"));
        assert!(out.contains("### Deleted (1)"));
        assert!(!out.contains("### Created"));
    }
}
