//! The bundled postfix templates.

mod argument_expression;
mod cast_expression;
mod if_statement;
mod introduce_field;
mod not_expression;
mod object_creation;
mod return_statement;
mod throw_statement;
mod try_parse;
pub(crate) mod util;
mod while_loop;

pub use argument_expression::ArgumentExpressionTemplate;
pub use cast_expression::CastExpressionTemplate;
pub use if_statement::IfStatementTemplate;
pub use introduce_field::IntroduceFieldTemplate;
pub use not_expression::NotExpressionTemplate;
pub use object_creation::ObjectCreationTemplate;
pub use return_statement::ReturnStatementTemplate;
pub use throw_statement::ThrowStatementTemplate;
pub use try_parse::TryParseTemplate;
pub use while_loop::WhileLoopTemplate;
