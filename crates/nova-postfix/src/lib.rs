//! Postfix templates: rewriting `expr.name` into code built around `expr`.
//!
//! Typing `flag.if` and picking `if` turns the line into `if (flag) { }`.
//! The pieces, in the order they run:
//! - [`context::resolve`] finds the `.name` marker and the expressions it can apply to,
//! - [`dispatch::dispatch`] asks every template in the [`TemplateRegistry`] whether it applies,
//! - [`chooser::choose`] lets the user pick one expression when several qualify,
//! - [`rewrite::expand`] writes the result in a single document transaction,
//! - [`hotspot::Session`] walks the user through the fields the template left.
//!
//! [`PostfixTemplatesManager`] strings these together for an editor shell.

pub mod chooser;
pub mod completion;
pub mod context;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod hotspot;
pub mod local_semantics;
pub mod macros;
pub mod manager;
pub mod registry;
pub mod rewrite;
pub mod semantics;
pub mod settings;
pub mod skeleton;
pub mod tab_tracker;
pub mod template;
pub mod templates;
pub mod ui;

pub use context::{PostfixContext, PostfixMarker, PrefixExpressionContext};
pub use document::{Document, SharedDocument, SourceMap, SurfaceId, TextControl};
pub use error::{ExpandError, SessionError, SkeletonError};
pub use hotspot::{EscapePolicy, Session, SessionGuards, SessionState};
pub use local_semantics::{LocalSemanticModel, TypeInfo};
pub use manager::{Outcome, PostfixTemplatesManager};
pub use registry::TemplateRegistry;
pub use rewrite::{Behavior, CaretPlacement, ExpansionResult, MemberDeclaration};
pub use semantics::{
    CanInstantiate, EmbeddedHost, FunctionSignature, FuturePayload, NoEmbeddedHost, Resolution,
    SemanticModel, StatementReplacement, Type,
};
pub use settings::{PostfixSettings, SettingsError};
pub use tab_tracker::TabTracker;
pub use template::{
    DispatchMode, PostfixTemplate, TargetKind, TemplateDescriptor, TemplateProposal,
    TemplateQuery,
};
pub use ui::{Highlighter, NoUi, ParameterInfoPresenter, PopupItem, PopupMenu, UiServices};
