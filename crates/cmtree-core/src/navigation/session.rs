//! Editing session
//!
//! A [`Session`] owns one configuration tree, the navigation stack over it,
//! an optional reference tree captured at baseline load, and every
//! diagnostic produced while editing. Lines are classified into a
//! [`Command`] up front and dispatched to the tree operations.
//!
//! Templates never recurse: the lines a template yields are queued and
//! replayed through [`Session::execute`]'s own drain loop before control
//! returns to the caller.

use std::collections::VecDeque;
use std::time::Instant;

use cmtree_core_types::{CommandSeq, SessionId};

use crate::config::SessionConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSource};
use crate::errors::{CmError, Result};
use crate::model::{DistName, ManagedObject, PathSegment};
use crate::ops::object_ops;
use crate::ops::ConfigTree;
use crate::rulebook::{apply_defaults, RuleTable};
use crate::schema::{ParameterMeta, SchemaCatalog};
use crate::{log_fallback, log_op_end, log_op_error, log_op_start};

use super::command::{tokenize, Classifier, Command, Query};
use super::context::NavigationContext;
use super::script::parse_script;
use super::template::TemplateExpander;

/// Where a queued line came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOrigin {
    Direct,
    /// 1-based line of the executed script
    Script { line: usize },
    /// 1-based line of a template expanded for `class`
    Template {
        class: String,
        variant: String,
        line: usize,
    },
}

impl std::fmt::Display for LineOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineOrigin::Direct => write!(f, "direct input"),
            LineOrigin::Script { line } => write!(f, "script line {}", line),
            LineOrigin::Template {
                class,
                variant,
                line,
            } => write!(f, "template {}/{} line {}", class, variant, line),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingLine {
    text: String,
    origin: LineOrigin,
}

/// Observable effect of one executed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Entered { dist_name: DistName, created: bool },
    ParameterSet { dist_name: DistName, name: String },
    ListItemSet {
        dist_name: DistName,
        list: String,
        index: usize,
    },
    /// Popped one or more frames; `dist_name` is the new position
    Exited { dist_name: DistName },
    /// `exit` at the root frame
    SessionEnded,
    Removed { paths: Vec<DistName> },
    DeleteScheduled { paths: Vec<DistName> },
    ParameterRemoved { dist_name: DistName, name: String },
    ListRemoved { dist_name: DistName, name: String },
    Renamed { from: DistName, to: DistName },
    AutoFilled { dist_name: DistName, names: Vec<String> },
    /// Answer of a read-only query, one entry per line
    Shown { lines: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineFailure {
    pub origin: LineOrigin,
    pub line: String,
    pub error: CmError,
}

impl std::fmt::Display for LineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}': {}", self.origin, self.line, self.error)
    }
}

/// Outcome of [`Session::run_script`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Lines that executed successfully, template lines included
    pub executed: usize,
    /// Pass-through header region of the script
    pub header: Vec<String>,
    pub failures: Vec<LineFailure>,
    pub ended: bool,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Session<'a> {
    id: SessionId,
    catalog: &'a dyn SchemaCatalog,
    rules: &'a RuleTable,
    templates: &'a dyn TemplateExpander,
    config: SessionConfig,
    tree: ConfigTree,
    reference: Option<ConfigTree>,
    context: NavigationContext,
    root_id: Option<String>,
    pending: VecDeque<PendingLine>,
    diagnostics: Vec<Diagnostic>,
    seq: CommandSeq,
    ended: bool,
}

impl<'a> Session<'a> {
    pub fn new(
        catalog: &'a dyn SchemaCatalog,
        rules: &'a RuleTable,
        templates: &'a dyn TemplateExpander,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: SessionId::new(),
            catalog,
            rules,
            templates,
            config,
            tree: ConfigTree::new(),
            reference: None,
            context: NavigationContext::new(),
            root_id: None,
            pending: VecDeque::new(),
            diagnostics: Vec::new(),
            seq: CommandSeq::default(),
            ended: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn catalog(&self) -> &'a dyn SchemaCatalog {
        self.catalog
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Tree captured by the last baseline load or [`Session::capture_reference`]
    pub fn reference(&self) -> Option<&ConfigTree> {
        self.reference.as_ref()
    }

    pub fn context(&self) -> &NavigationContext {
        &self.context
    }

    pub fn current_path(&self) -> Option<DistName> {
        self.context.current_path()
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Replace the tree with a baseline and capture an independent reference copy
    ///
    /// The navigation stack is cleared; the root id is taken from the
    /// baseline's root object.
    pub fn load_baseline(&mut self, tree: ConfigTree) {
        log_op_start!("load_baseline", session_id = self.id.as_str());
        let start = Instant::now();

        self.root_id = tree
            .live_objects()
            .find(|o| o.dist_name.len() == 1)
            .and_then(|o| o.dist_name.id())
            .map(str::to_string);
        self.reference = Some(tree.clone());
        self.tree = tree;
        self.context = NavigationContext::new();
        self.pending.clear();
        self.ended = false;

        log_op_end!(
            "load_baseline",
            duration_ms = start.elapsed().as_millis() as u64,
            object_count = self.tree.len()
        );
    }

    /// Freeze the current tree as the comparison reference
    pub fn capture_reference(&mut self) {
        self.reference = Some(self.tree.clone());
    }

    /// Execute one command line, then replay any template lines it queued
    ///
    /// Failures of replayed template lines do not fail this call; each is
    /// recorded as a template diagnostic.
    ///
    /// # Errors
    ///
    /// Any error of the line itself; the tree is left as it was.
    pub fn execute(&mut self, line: &str) -> Result<Step> {
        let step = self.execute_line(line, &LineOrigin::Direct)?;
        for failure in self.drain_pending().1 {
            self.diagnostics.push(
                Diagnostic::warning(DiagnosticSource::Template, failure.to_string()),
            );
        }
        Ok(step)
    }

    /// Execute a script with optional HEADER/BODY regions
    ///
    /// A failing line is reported and the run continues with the next one.
    pub fn run_script(&mut self, text: &str) -> RunReport {
        log_op_start!("run_script", session_id = self.id.as_str());
        let start = Instant::now();

        let input = parse_script(text);
        let mut report = RunReport {
            header: input.header,
            ..RunReport::default()
        };

        for (line_no, text) in input.body {
            let origin = LineOrigin::Script { line: line_no };
            match self.execute_line(&text, &origin) {
                Ok(_) => report.executed += 1,
                Err(error) => report.failures.push(LineFailure {
                    origin,
                    line: text,
                    error,
                }),
            }
            let (executed, failures) = self.drain_pending();
            report.executed += executed;
            report.failures.extend(failures);
        }
        report.ended = self.ended;

        log_op_end!(
            "run_script",
            duration_ms = start.elapsed().as_millis() as u64,
            object_count = self.tree.len(),
            failure_count = report.failures.len()
        );
        report
    }

    /// Create an object under `parent` (or the root when `None`) and seed it
    /// from the rule table
    ///
    /// Does not move the navigation position.
    ///
    /// # Errors
    ///
    /// The errors of [`object_ops::create_object`].
    pub fn create_object(
        &mut self,
        parent: Option<&DistName>,
        class: &str,
        id: &str,
    ) -> Result<DistName> {
        let version = self.catalog.resolve_version(class);
        let path =
            object_ops::create_object(&mut self.tree, self.catalog, parent, class, id, &version)?;
        if parent.is_none() {
            self.root_id = Some(id.to_string());
        }

        let outcome = apply_defaults(
            &mut self.tree,
            self.catalog,
            self.rules,
            &self.config,
            &path,
            self.root_id.as_deref(),
        );
        if let Some((step, key)) = &outcome.resolution {
            tracing::debug!(
                dist_name = %path,
                step = ?step,
                key = %key,
                applied = outcome.applied,
                "rulebook entry applied"
            );
        }
        self.diagnostics.extend(outcome.diagnostics);
        Ok(path)
    }

    /// Classes that may be created under the current object
    ///
    /// # Errors
    ///
    /// `NoCurrentObject` before the root is entered.
    pub fn allowed_children(&self) -> Result<Vec<&'a str>> {
        let catalog = self.catalog;
        let class = self.context.current_class().ok_or(CmError::NoCurrentObject)?;
        Ok(catalog.children_of(class))
    }

    /// Parameters the current object's class declares, in catalog order
    ///
    /// # Errors
    ///
    /// `NoCurrentObject` before the root is entered.
    pub fn declared_parameters(&self) -> Result<Vec<(&'a str, &'a ParameterMeta)>> {
        let catalog = self.catalog;
        let class = self.context.current_class().ok_or(CmError::NoCurrentObject)?;
        Ok(catalog.parameters_of(class))
    }

    /// Every live object that carries scalar parameter `name`, with its value
    pub fn parameter_values(&self, name: &str) -> Vec<(&DistName, &str)> {
        self.tree
            .live_objects()
            .filter_map(|o| o.parameter(name).map(|v| (&o.dist_name, v)))
            .collect()
    }

    /// The live object of the current class under the same parent with instance `id`
    ///
    /// # Errors
    ///
    /// `NoCurrentObject` before the root is entered.
    pub fn sibling(&self, id: &str) -> Result<Option<&ManagedObject>> {
        let current = self.current()?;
        let class = current.class().unwrap_or_default();
        let path = match current.parent() {
            Some(parent) => parent.child(class, id),
            None => DistName::default().child(class, id),
        };
        Ok(self.tree.find(&path))
    }

    fn answer(&self, query: Query) -> Result<Vec<String>> {
        match query {
            Query::Children => Ok(self
                .allowed_children()?
                .into_iter()
                .map(str::to_string)
                .collect()),
            Query::Parameters => Ok(self
                .declared_parameters()?
                .into_iter()
                .map(|(name, meta)| {
                    format!(
                        "{} (type: {}, required: {}, default: {})",
                        name,
                        meta.kind,
                        if meta.required { "Y" } else { "N" },
                        meta.default_text().unwrap_or_else(|| "null".to_string())
                    )
                })
                .collect()),
            Query::Values { name } => Ok(self
                .parameter_values(&name)
                .into_iter()
                .map(|(dist_name, value)| format!("{}: {}", dist_name, value))
                .collect()),
            Query::Sibling { id } => {
                let sibling = self.sibling(&id)?.ok_or_else(|| {
                    let current = self.context.current_path().unwrap_or_default();
                    CmError::ObjectNotFound {
                        dist_name: format!(
                            "{}-{}",
                            current.class().unwrap_or_default(),
                            id
                        ),
                    }
                })?;
                Ok(sibling
                    .parameters
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect())
            }
        }
    }

    fn execute_line(&mut self, line: &str, origin: &LineOrigin) -> Result<Step> {
        self.seq = self.seq.next();
        log_op_start!(
            "execute",
            session_id = self.id.as_str(),
            command_seq = self.seq.value()
        );
        let start = Instant::now();

        let result = self.execute_impl(line);
        match &result {
            Ok(_) => log_op_end!(
                "execute",
                duration_ms = start.elapsed().as_millis() as u64,
                session_id = self.id.as_str(),
                command_seq = self.seq.value()
            ),
            Err(e) => log_op_error!(
                "execute",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                session_id = self.id.as_str(),
                command_seq = self.seq.value(),
                origin = %origin
            ),
        }
        result
    }

    fn execute_impl(&mut self, line: &str) -> Result<Step> {
        if self.ended {
            return Err(CmError::SessionEnded);
        }
        let tokens = tokenize(line)?;
        let command = self.classify(&tokens)?;
        self.dispatch(command)
    }

    fn classify(&self, tokens: &[String]) -> Result<Command> {
        let catalog = self.catalog;
        let current_class = self.context.current_class();
        let declares = |name: &str| {
            current_class.is_some_and(|class| catalog.parameter_metadata(class, name).is_some())
        };
        let classifier = Classifier {
            root_class: catalog.root_class(),
            root_aliases: &self.config.root_aliases,
            declares_parameter: &declares,
        };
        classifier.classify(tokens)
    }

    fn current(&self) -> Result<DistName> {
        self.context.current_path().ok_or(CmError::NoCurrentObject)
    }

    fn dispatch(&mut self, command: Command) -> Result<Step> {
        match command {
            Command::SetListItem {
                list,
                index,
                field,
                value,
            } => {
                let path = self.current()?;
                let index = object_ops::parse_list_index(&index)?;
                object_ops::set_list_item(
                    &mut self.tree,
                    self.catalog,
                    &path,
                    &list,
                    index,
                    &[(field, value)],
                )?;
                Ok(Step::ListItemSet {
                    dist_name: path,
                    list,
                    index,
                })
            }
            Command::Enter { class, id } => self.enter(&class, &id),
            Command::SetParameter { name, value } => {
                let path = self.current()?;
                object_ops::set_parameter(&mut self.tree, self.catalog, &path, &name, &value)?;
                Ok(Step::ParameterSet {
                    dist_name: path,
                    name,
                })
            }
            Command::Exit => match self.context.depth() {
                0 => Err(CmError::ExitPastRoot),
                1 => {
                    self.ended = true;
                    tracing::info!(session_id = self.id.as_str(), "session ended");
                    Ok(Step::SessionEnded)
                }
                _ => {
                    self.context.pop();
                    Ok(Step::Exited {
                        dist_name: self.current()?,
                    })
                }
            },
            Command::ExitAll => {
                if self.context.is_empty() {
                    return Err(CmError::ExitPastRoot);
                }
                while self.context.depth() > 1 {
                    self.context.pop();
                }
                Ok(Step::Exited {
                    dist_name: self.current()?,
                })
            }
            Command::RemoveObject { class, id } => {
                let targets = self.tree.find_by_segment(&class, &id);
                if targets.is_empty() {
                    return Err(CmError::ObjectNotFound {
                        dist_name: format!("{}-{}", class, id),
                    });
                }
                let current = self.context.current_path();
                for target in &targets {
                    object_ops::check_not_current(target, current.as_ref())?;
                }
                let mut removed = Vec::new();
                for target in &targets {
                    if self.tree.contains_live(target) {
                        removed.extend(object_ops::delete_hard(
                            &mut self.tree,
                            target,
                            current.as_ref(),
                        )?);
                    }
                }
                Ok(Step::Removed { paths: removed })
            }
            Command::ScheduleDelete { class, id } => {
                let current = self.current()?;
                let target = current.child(class, id);
                let paths =
                    object_ops::delete_soft(&mut self.tree, self.catalog, &target, Some(&current))?;
                Ok(Step::DeleteScheduled { paths })
            }
            Command::RemoveParameter { name } => {
                let path = self.current()?;
                object_ops::remove_parameter(&mut self.tree, &path, &name)?;
                Ok(Step::ParameterRemoved {
                    dist_name: path,
                    name,
                })
            }
            Command::RemoveList { name } => {
                let path = self.current()?;
                object_ops::remove_list(&mut self.tree, &path, &name)?;
                Ok(Step::ListRemoved {
                    dist_name: path,
                    name,
                })
            }
            Command::RenameId { new_id } => {
                let path = self.current()?;
                let renamed = object_ops::rename_id(&mut self.tree, self.catalog, &path, &new_id)?;
                self.context.follow_rename(&path, &renamed);
                if renamed.len() == 1 {
                    self.root_id = Some(new_id);
                }
                Ok(Step::Renamed {
                    from: path,
                    to: renamed,
                })
            }
            Command::Show(query) => Ok(Step::Shown {
                lines: self.answer(query)?,
            }),
            Command::AutoFill { all } => {
                let path = self.current()?;
                let names =
                    object_ops::add_auto_parameters(&mut self.tree, self.catalog, &path, all)?;
                Ok(Step::AutoFilled {
                    dist_name: path,
                    names,
                })
            }
        }
    }

    fn enter(&mut self, requested: &str, id: &str) -> Result<Step> {
        let catalog = self.catalog;
        let class = self.config.substitute_class(requested).to_string();
        let root_class = catalog.root_class();

        let id = match &self.root_id {
            Some(root_id)
                if id == self.config.placeholder_id
                    && self.config.mirrors_root_id(&class, root_class) =>
            {
                root_id.clone()
            }
            _ => id.to_string(),
        };

        let parent = self.context.current_path();
        let path = match &parent {
            None => {
                if class != root_class {
                    return Err(CmError::RootClassRequired {
                        class,
                        root_class: root_class.to_string(),
                    });
                }
                DistName::default().child(class.as_str(), id.as_str())
            }
            Some(parent_path) => {
                let parent_class = self.context.current_class().unwrap_or_default();
                if !catalog.is_child_allowed(parent_class, &class) {
                    return Err(CmError::ClassNotAllowed {
                        class,
                        parent_class: parent_class.to_string(),
                    });
                }
                parent_path.child(class.as_str(), id.as_str())
            }
        };

        if self.tree.contains_live(&path) {
            self.context.push(PathSegment::new(class, id.as_str()));
            if parent.is_none() {
                self.root_id = Some(id);
            }
            return Ok(Step::Entered {
                dist_name: path,
                created: false,
            });
        }

        let created = self.create_object(parent.as_ref(), &class, &id)?;
        self.context.push(PathSegment::new(class.as_str(), id.as_str()));
        self.enqueue_template(&class, &created);
        Ok(Step::Entered {
            dist_name: created,
            created: true,
        })
    }

    fn enqueue_template(&mut self, class: &str, path: &DistName) {
        let Some(variant) = self.config.templates.get(class) else {
            return;
        };
        let Some(lines) = self.templates.expand(class, variant) else {
            log_fallback!(
                "template_expand",
                "no template for variant",
                class = class,
                dist_name = %path
            );
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticSource::Template,
                    format!("no template {} for class {}", variant, class),
                )
                .at(path),
            );
            return;
        };

        let queued: Vec<PendingLine> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| (i, text.trim()))
            .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
            .map(|(i, text)| PendingLine {
                text: text.to_string(),
                origin: LineOrigin::Template {
                    class: class.to_string(),
                    variant: variant.clone(),
                    line: i + 1,
                },
            })
            .collect();
        tracing::debug!(class = class, dist_name = %path, lines = queued.len(), "template queued");

        // Front of the queue so a nested template finishes before its parent's remaining lines
        for line in queued.into_iter().rev() {
            self.pending.push_front(line);
        }
    }

    fn drain_pending(&mut self) -> (usize, Vec<LineFailure>) {
        let mut executed = 0;
        let mut failures = Vec::new();
        while let Some(pending) = self.pending.pop_front() {
            match self.execute_line(&pending.text, &pending.origin) {
                Ok(_) => executed += 1,
                Err(error) => failures.push(LineFailure {
                    origin: pending.origin,
                    line: pending.text,
                    error,
                }),
            }
        }
        (executed, failures)
    }
}
