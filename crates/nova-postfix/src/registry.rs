//! The priority-ordered set of available templates.

use std::fmt;

use crate::template::{PostfixTemplate, TemplateDescriptor};
use crate::templates::{
    ArgumentExpressionTemplate, CastExpressionTemplate, IfStatementTemplate,
    IntroduceFieldTemplate, NotExpressionTemplate, ObjectCreationTemplate,
    ReturnStatementTemplate, ThrowStatementTemplate, TryParseTemplate, WhileLoopTemplate,
};

#[derive(Default)]
pub struct TemplateRegistry {
    templates: Vec<Box<dyn PostfixTemplate>>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.templates.iter().map(|t| &t.descriptor().name))
            .finish()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All bundled templates, in priority order.
    pub fn with_builtin_templates() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(IfStatementTemplate::default()));
        registry.register(Box::new(WhileLoopTemplate::default()));
        registry.register(Box::new(ReturnStatementTemplate::default()));
        registry.register(Box::new(ThrowStatementTemplate::default()));
        registry.register(Box::new(ObjectCreationTemplate::default()));
        registry.register(Box::new(NotExpressionTemplate::default()));
        registry.register(Box::new(CastExpressionTemplate::default()));
        registry.register(Box::new(ArgumentExpressionTemplate::default()));
        registry.register(Box::new(IntroduceFieldTemplate::default()));
        registry.register(Box::new(TryParseTemplate::default()));
        registry
    }

    /// Appends `template` at the lowest priority. Returns `false` and keeps
    /// the existing template if the name is already taken.
    pub fn register(&mut self, template: Box<dyn PostfixTemplate>) -> bool {
        let name = &template.descriptor().name;
        if self.get(name).is_some() {
            tracing::warn!(target = "nova.postfix", template = %name, "duplicate postfix template ignored");
            return false;
        }
        self.templates.push(template);
        true
    }

    pub fn get(&self, name: &str) -> Option<&dyn PostfixTemplate> {
        self.templates
            .iter()
            .find(|t| t.descriptor().name == name)
            .map(|t| t.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PostfixTemplate> {
        self.templates.iter().map(|t| t.as_ref())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TemplateDescriptor> {
        self.templates.iter().map(|t| t.descriptor())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
