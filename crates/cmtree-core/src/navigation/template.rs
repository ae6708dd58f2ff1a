use std::collections::BTreeMap;

/// Source of follow-up command lines for classes that expand on creation
pub trait TemplateExpander {
    /// Lines to replay after creating `class`, `None` if no template exists
    fn expand(&self, class: &str, variant_key: &str) -> Option<Vec<String>>;
}

/// Expander with no templates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateExpander for NoTemplates {
    fn expand(&self, _class: &str, _variant_key: &str) -> Option<Vec<String>> {
        None
    }
}

/// In-memory templates keyed by `(class, variantKey)`
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: BTreeMap<(String, String), Vec<String>>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template<I, S>(mut self, class: &str, variant_key: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates.insert(
            (class.to_string(), variant_key.to_string()),
            lines.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl TemplateExpander for StaticTemplates {
    fn expand(&self, class: &str, variant_key: &str) -> Option<Vec<String>> {
        self.templates
            .get(&(class.to_string(), variant_key.to_string()))
            .cloned()
    }
}
