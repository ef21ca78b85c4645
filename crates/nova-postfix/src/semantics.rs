//! Contract between the postfix engine and whatever answers type questions.
//!
//! The engine never computes types itself. Templates ask a [`SemanticModel`]
//! about the nodes of the tree they were handed; [`crate::LocalSemanticModel`]
//! is a small reference implementation that reads declarations from the same
//! file.

use std::fmt;

use nova_core::TextRange;
use nova_syntax::{Expression, MethodCallExpression, SyntaxNode};
use smol_str::SmolStr;

use crate::document::{DocumentError, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Unresolved,
    Void,
    Null,
    Primitive(SmolStr),
    Named { name: SmolStr, args: Vec<Type> },
    Array(Box<Type>),
}

impl Type {
    pub fn primitive(name: &str) -> Type {
        Type::Primitive(SmolStr::new(name))
    }

    pub fn named(name: &str) -> Type {
        Type::Named {
            name: SmolStr::new(name),
            args: Vec::new(),
        }
    }

    pub fn generic(name: &str, args: Vec<Type>) -> Type {
        Type::Named {
            name: SmolStr::new(name),
            args,
        }
    }

    pub fn boolean() -> Type {
        Type::primitive("boolean")
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Type::Unresolved)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_boolean(&self) -> bool {
        match self {
            Type::Primitive(name) => name == "boolean",
            Type::Named { name, .. } => name == "Boolean",
            _ => false,
        }
    }

    /// Simple (unqualified) name of a named type.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Type::Named { name, .. } => Some(name.rsplit('.').next().unwrap_or(name)),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unresolved => f.write_str("?"),
            Type::Void => f.write_str("void"),
            Type::Null => f.write_str("null"),
            Type::Primitive(name) => f.write_str(name),
            Type::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Type::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanInstantiate {
    No,
    Default,
    CtorWithParameters,
}

/// What a name or qualified name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unresolved,
    Type(Type),
    Value(Type),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// `None` when the function does not spell out a return type (lambdas).
    pub return_type: Option<Type>,
    pub is_async: bool,
    pub is_iterator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuturePayload {
    NotFuture,
    NoPayload,
    Payload(Type),
}

const FUTURE_TYPES: &[&str] = &["Task", "ValueTask", "Future", "CompletableFuture"];

pub trait SemanticModel {
    fn type_of(&self, expr: &Expression) -> Type;

    /// Resolution of a name or field-access chain. Other expressions resolve to
    /// their value.
    fn resolve_reference(&self, expr: &Expression) -> Resolution;

    /// Looks up a type by (possibly qualified) name as seen from `scope`.
    fn resolve_type_name(&self, name: &str, scope: &SyntaxNode) -> Option<Type>;

    fn is_implicitly_convertible(&self, from: &Type, to: &Type, scope: &SyntaxNode) -> bool;

    fn can_instantiate(&self, ty: &Type, scope: &SyntaxNode) -> CanInstantiate;

    /// Excludes types that exist only for their static members.
    fn is_useful_to_create_with_new(&self, ty: &Type, scope: &SyntaxNode) -> bool;

    /// Signature of a method, constructor or lambda node.
    fn function_signature(&self, function: &SyntaxNode) -> Option<FunctionSignature>;

    /// Root of the throwable hierarchy.
    fn exception_type(&self) -> Type {
        Type::named("Exception")
    }

    fn future_payload(&self, ty: &Type) -> FuturePayload {
        match ty {
            Type::Named { args, .. }
                if ty
                    .simple_name()
                    .is_some_and(|name| FUTURE_TYPES.contains(&name)) =>
            {
                match args.first() {
                    Some(payload) => FuturePayload::Payload(payload.clone()),
                    None => FuturePayload::NoPayload,
                }
            }
            _ => FuturePayload::NotFuture,
        }
    }

    /// Whether the call binds to a known method.
    fn resolves_invocation(&self, call: &MethodCallExpression) -> bool;
}

/// The type a `return` in `signature` has to produce, if any.
///
/// Iterators and `void` functions take no value. In async functions a bare
/// future takes no value either, and `Future<T>` takes a `T`.
pub fn effective_return_type(
    model: &dyn SemanticModel,
    signature: &FunctionSignature,
) -> Option<Type> {
    if signature.is_iterator {
        return None;
    }
    let declared = signature.return_type.clone()?;
    if declared.is_void() {
        return None;
    }
    if !signature.is_async {
        return Some(declared);
    }
    match model.future_payload(&declared) {
        FuturePayload::NotFuture => Some(declared),
        FuturePayload::NoPayload => None,
        FuturePayload::Payload(payload) => Some(payload),
    }
}

/// Where an [`EmbeddedHost`] put a statement and what it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementReplacement {
    /// Document range of the inserted statement.
    pub range: TextRange,
    /// Text the host replaced, which may extend past the operand.
    pub original_text: String,
}

/// Statement replacement for code that is embedded in another document
/// syntax, where the enclosing statement has no physical range of its own.
pub trait EmbeddedHost {
    /// Replace the operand at `expression` with `statement`.
    fn replace_statement(
        &self,
        tx: &mut Transaction<'_>,
        expression: TextRange,
        statement: &str,
    ) -> Result<Option<StatementReplacement>, DocumentError>;
}

/// Host for plain files: nothing is embedded, so nothing can be replaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEmbeddedHost;

impl EmbeddedHost for NoEmbeddedHost {
    fn replace_statement(
        &self,
        _tx: &mut Transaction<'_>,
        _expression: TextRange,
        _statement: &str,
    ) -> Result<Option<StatementReplacement>, DocumentError> {
        Ok(None)
    }
}
