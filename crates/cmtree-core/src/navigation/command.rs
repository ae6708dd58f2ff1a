//! Command tokenizing and classification
//!
//! A line is split into tokens up front and classified into a [`Command`]
//! before anything touches the tree. Classification is purely syntactic apart
//! from one decision point: a two-token line whose first token looks like a
//! class (uppercase letters, digits, underscores) is an enter-or-create,
//! unless the current class declares a parameter with exactly that name, in
//! which case it is a parameter assignment.

use crate::errors::{CmError, Result};

pub const KW_LIST: &str = "list";
pub const KW_EXIT: &str = "exit";
pub const KW_EXIT_ALL: &str = "exit-all";
pub const KW_REMOVE_OBJECT: &str = "no-mo";
pub const KW_SCHEDULE_DELETE: &str = "delete-mo";
pub const KW_REMOVE_PARAMETER: &str = "no-pa";
pub const KW_REMOVE_LIST: &str = "no-list";
pub const KW_RENAME_ID: &str = "chg-mo-id";
pub const KW_AUTO_FILL: &str = "add-auto-pa";
pub const KW_SHOW_CHILDREN: &str = "show-can-mo";
pub const KW_SHOW_PARAMETERS: &str = "show-can-pa";
pub const KW_SHOW_VALUES: &str = "show-para";
pub const KW_SHOW_SIBLING: &str = "show-sib";
pub const FLAG_ALL: &str = "-a";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `list <name> <index> <field> <value>`
    SetListItem {
        list: String,
        index: String,
        field: String,
        value: String,
    },
    /// `<CLASS> <id>`
    Enter { class: String, id: String },
    /// `<key> <value>`
    SetParameter { name: String, value: String },
    Exit,
    ExitAll,
    /// `no-mo <CLASS> <id>`: hard delete wherever the segment occurs
    RemoveObject { class: String, id: String },
    /// `delete-mo <CLASS> <id>`: soft delete of a child of the current object
    ScheduleDelete { class: String, id: String },
    /// `no-pa <name>`
    RemoveParameter { name: String },
    /// `no-list <name>`
    RemoveList { name: String },
    /// `chg-mo-id <newId>`
    RenameId { new_id: String },
    /// `add-auto-pa [-a]`
    AutoFill { all: bool },
    /// Read-only lookups; never touch the tree
    Show(Query),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `show-can-mo`: classes allowed under the current object
    Children,
    /// `show-can-pa`: parameters the current class declares
    Parameters,
    /// `show-para <name>`: every object carrying the parameter
    Values { name: String },
    /// `show-sib <id>`: the same-class sibling with that id
    Sibling { id: String },
}

/// Whether `token` has the shape of a class name
pub fn is_class_token(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_uppercase())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Split a line into tokens
///
/// Whitespace separates tokens. Single quotes group literally; double quotes
/// group and honor `\"` and `\\`. Adjacent quoted and bare parts join into
/// one token, and `""` yields an empty token.
///
/// # Errors
///
/// Returns `UnrecognizedCommand` for an unterminated quote.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(unterminated(line)),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(unterminated(line)),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(unterminated(line)),
                    }
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn unterminated(line: &str) -> CmError {
    CmError::UnrecognizedCommand {
        line: format!("{} (unterminated quote)", line),
    }
}

/// Render a value as a single token that [`tokenize`] reads back unchanged
pub fn quote_token(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Context the classifier needs beyond the tokens themselves
pub struct Classifier<'a> {
    pub root_class: &'a str,
    pub root_aliases: &'a [String],
    /// Whether the current class declares a parameter of this name
    pub declares_parameter: &'a dyn Fn(&str) -> bool,
}

impl Classifier<'_> {
    /// Classify a tokenized line
    ///
    /// Priority: `list` form, keywords, two-token enter-or-create, two-token
    /// assignment.
    ///
    /// # Errors
    ///
    /// Returns `UnrecognizedCommand` when no form matches.
    pub fn classify(&self, tokens: &[String]) -> Result<Command> {
        let unrecognized = || CmError::UnrecognizedCommand {
            line: tokens.join(" "),
        };
        let t: Vec<&str> = tokens.iter().map(String::as_str).collect();

        match t.as_slice() {
            [KW_LIST, list, index, field, value] => Ok(Command::SetListItem {
                list: list.to_string(),
                index: index.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            }),
            [KW_LIST, ..] => Err(unrecognized()),
            [KW_EXIT] => Ok(Command::Exit),
            [KW_EXIT_ALL] => Ok(Command::ExitAll),
            [KW_REMOVE_OBJECT, class, id] => Ok(Command::RemoveObject {
                class: class.to_string(),
                id: id.to_string(),
            }),
            [KW_SCHEDULE_DELETE, class, id] => Ok(Command::ScheduleDelete {
                class: class.to_string(),
                id: id.to_string(),
            }),
            [KW_REMOVE_PARAMETER, name] => Ok(Command::RemoveParameter {
                name: name.to_string(),
            }),
            [KW_REMOVE_LIST, name] => Ok(Command::RemoveList {
                name: name.to_string(),
            }),
            [KW_RENAME_ID, new_id] => Ok(Command::RenameId {
                new_id: new_id.to_string(),
            }),
            [KW_AUTO_FILL] => Ok(Command::AutoFill { all: false }),
            [KW_AUTO_FILL, FLAG_ALL] => Ok(Command::AutoFill { all: true }),
            [KW_SHOW_CHILDREN] => Ok(Command::Show(Query::Children)),
            [KW_SHOW_PARAMETERS] => Ok(Command::Show(Query::Parameters)),
            [KW_SHOW_VALUES, name] => Ok(Command::Show(Query::Values {
                name: name.to_string(),
            })),
            [KW_SHOW_SIBLING, id] => Ok(Command::Show(Query::Sibling { id: id.to_string() })),
            [first, second] => {
                if self.root_aliases.iter().any(|a| a == first) {
                    return Ok(Command::Enter {
                        class: self.root_class.to_string(),
                        id: second.to_string(),
                    });
                }
                if is_class_token(first) && !(self.declares_parameter)(first) {
                    Ok(Command::Enter {
                        class: first.to_string(),
                        id: second.to_string(),
                    })
                } else {
                    Ok(Command::SetParameter {
                        name: first.to_string(),
                        value: second.to_string(),
                    })
                }
            }
            _ => Err(unrecognized()),
        }
    }
}
