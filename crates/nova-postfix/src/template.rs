//! The capability interface every postfix template implements.

use smol_str::SmolStr;

use crate::context::{PostfixContext, PrefixExpressionContext};
use crate::rewrite::Behavior;
use crate::semantics::SemanticModel;
use crate::settings::PostfixSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub name: SmolStr,
    pub description: String,
    pub example: String,
    pub disabled_by_default: bool,
    /// The template is also offered after a type name (`Foo.new`).
    pub works_on_type_names: bool,
}

impl TemplateDescriptor {
    pub fn new(name: &str, description: &str, example: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            description: description.to_string(),
            example: example.to_string(),
            disabled_by_default: false,
            works_on_type_names: false,
        }
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.disabled_by_default = true;
        self
    }

    pub fn works_on_type_names(mut self) -> Self {
        self.works_on_type_names = true;
        self
    }
}

/// Heuristic checks while the user is typing, or full type checks for an
/// explicit invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    Soft,
    Precise,
}

/// Which rewrite shape a template chose for its contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Expression,
    TypeUsage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateProposal {
    pub template: SmolStr,
    /// Indices into [`PostfixContext::contexts`], innermost first.
    pub contexts: Vec<usize>,
    pub target: TargetKind,
}

impl TemplateProposal {
    pub fn new(template: &SmolStr, contexts: Vec<usize>, target: TargetKind) -> Self {
        Self {
            template: template.clone(),
            contexts,
            target,
        }
    }

    pub fn single(template: &SmolStr, context: usize, target: TargetKind) -> Self {
        Self::new(template, vec![context], target)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.contexts.len() > 1
    }
}

/// Everything a template may look at when deciding whether it applies.
#[derive(Clone, Copy)]
pub struct TemplateQuery<'a> {
    pub context: &'a PostfixContext,
    pub mode: DispatchMode,
    pub model: &'a dyn SemanticModel,
    pub settings: &'a PostfixSettings,
    /// Template name of the hotspot session open on the surface, if any.
    pub active_session: Option<&'a str>,
}

impl<'a> TemplateQuery<'a> {
    pub fn contexts(&self) -> impl DoubleEndedIterator<Item = (usize, &'a PrefixExpressionContext)> {
        self.context.contexts.iter().enumerate()
    }

    pub fn is_precise(&self) -> bool {
        self.mode == DispatchMode::Precise
    }
}

pub trait PostfixTemplate: Send + Sync {
    fn descriptor(&self) -> &TemplateDescriptor;

    /// Decides applicability from `query` alone.
    fn try_propose(&self, query: &TemplateQuery<'_>) -> Option<TemplateProposal>;

    /// Rewrite recipe for a proposal this template made.
    ///
    /// `proposal` always carries exactly one context by the time this is called.
    fn create_behavior(&self, proposal: &TemplateProposal, query: &TemplateQuery<'_>) -> Behavior;
}
