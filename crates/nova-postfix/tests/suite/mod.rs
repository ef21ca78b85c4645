mod ambiguity;
mod completion_items;
mod context_resolution;
mod diagnostics;
mod embedded_host;
mod expression_templates;
mod hotspot_sessions;
mod object_creation;
mod precise_mode;
mod statement_templates;
mod tab_tracker;
