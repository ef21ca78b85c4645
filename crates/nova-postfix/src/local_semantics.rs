//! A file-local [`SemanticModel`].
//!
//! Declarations are read straight from the syntax tree: locals, parameters,
//! fields, classes and methods of the file, plus a small table of well-known
//! library types. Anything else is unresolved, which is exactly what soft-mode
//! templates are written to cope with.

use std::collections::HashMap;

use nova_syntax::{
    support, AstNode, BinaryExpression, ClassDeclaration, ConstructorDeclaration, Expression,
    FieldAccessExpression, LocalVariableDeclarationStatement, MethodCallExpression,
    MethodDeclaration, NameExpression, Parameter, SyntaxKind, SyntaxNode, UnaryExpression,
};
use smol_str::SmolStr;

use crate::semantics::{CanInstantiate, FunctionSignature, Resolution, SemanticModel, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorInfo {
    pub parameters: usize,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: SmolStr,
    pub base: Option<SmolStr>,
    pub is_interface: bool,
    pub is_abstract: bool,
    /// Empty means an implicit public default constructor.
    pub constructors: Vec<ConstructorInfo>,
    pub fields: HashMap<SmolStr, Type>,
    pub methods: HashMap<SmolStr, Type>,
}

impl TypeInfo {
    pub fn class(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            base: None,
            is_interface: false,
            is_abstract: false,
            constructors: Vec::new(),
            fields: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    pub fn interface(name: &str) -> Self {
        Self {
            is_interface: true,
            ..Self::class(name)
        }
    }

    pub fn extends(mut self, base: &str) -> Self {
        self.base = Some(SmolStr::new(base));
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn constructor(mut self, parameters: usize) -> Self {
        self.constructors.push(ConstructorInfo {
            parameters,
            is_private: false,
        });
        self
    }

    pub fn private_constructor(mut self, parameters: usize) -> Self {
        self.constructors.push(ConstructorInfo {
            parameters,
            is_private: true,
        });
        self
    }

    pub fn field(mut self, name: &str, ty: Type) -> Self {
        self.fields.insert(SmolStr::new(name), ty);
        self
    }

    pub fn method(mut self, name: &str, ty: Type) -> Self {
        self.methods.insert(SmolStr::new(name), ty);
        self
    }

    fn from_declaration(class: &ClassDeclaration) -> Option<Self> {
        let name = class.name()?;
        let mut info = if class.is_interface() {
            TypeInfo::interface(name.text())
        } else {
            TypeInfo::class(name.text())
        };
        info.is_abstract = class.is_abstract();
        info.base = class
            .extends()
            .and_then(|ty| ty.named())
            .map(|named| SmolStr::new(named.name()));
        for ctor in class.constructors() {
            info.constructors.push(constructor_info(&ctor));
        }
        for field in class.fields() {
            let ty = field.ty().map(|ty| lower_type(&ty)).unwrap_or(Type::Unresolved);
            for declarator in field.declarators() {
                if let Some(name) = declarator.name() {
                    info.fields.insert(SmolStr::new(name.text()), ty.clone());
                }
            }
        }
        for method in class.methods() {
            if let (Some(name), Some(ty)) = (method.name(), method.return_type()) {
                info.methods
                    .insert(SmolStr::new(name.text()), lower_type(&ty));
            }
        }
        Some(info)
    }
}

fn constructor_info(ctor: &ConstructorDeclaration) -> ConstructorInfo {
    ConstructorInfo {
        parameters: ctor.parameters().count(),
        is_private: ctor.is_private(),
    }
}

#[derive(Debug, Clone)]
pub struct LocalSemanticModel {
    library: HashMap<SmolStr, TypeInfo>,
}

impl Default for LocalSemanticModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSemanticModel {
    /// A model that knows the common library types.
    pub fn new() -> Self {
        let int = || Type::primitive("int");
        let string = || Type::named("String");
        let mut model = Self::empty();
        for info in [
            TypeInfo::class("Object"),
            TypeInfo::class("String")
                .constructor(0)
                .constructor(1)
                .method("length", int())
                .method("isEmpty", Type::boolean()),
            TypeInfo::class("Boolean").private_constructor(1),
            TypeInfo::class("Integer").private_constructor(1),
            TypeInfo::class("Math").private_constructor(0),
            TypeInfo::class("Exception")
                .constructor(0)
                .constructor(1)
                .method("getMessage", string()),
            TypeInfo::class("RuntimeException")
                .extends("Exception")
                .constructor(0)
                .constructor(1),
            TypeInfo::class("IllegalStateException")
                .extends("RuntimeException")
                .constructor(0)
                .constructor(1),
            TypeInfo::class("IllegalArgumentException")
                .extends("RuntimeException")
                .constructor(0)
                .constructor(1),
            TypeInfo::interface("Future"),
            TypeInfo::class("CompletableFuture").constructor(0),
            TypeInfo::class("Task").abstract_class(),
            TypeInfo::class("ValueTask").abstract_class(),
            TypeInfo::interface("Iterable"),
            TypeInfo::interface("List")
                .method("size", int())
                .method("isEmpty", Type::boolean()),
            TypeInfo::class("ArrayList").constructor(0).constructor(1),
            TypeInfo::class("StringBuilder")
                .constructor(0)
                .constructor(1)
                .method("length", int())
                .method("toString", string()),
        ] {
            model = model.with_type(info);
        }
        model
    }

    /// A model without any library types.
    pub fn empty() -> Self {
        Self {
            library: HashMap::new(),
        }
    }

    pub fn with_type(mut self, info: TypeInfo) -> Self {
        self.library.insert(info.name.clone(), info);
        self
    }

    fn type_info(&self, name: &str, scope: &SyntaxNode) -> Option<TypeInfo> {
        let simple = name.rsplit('.').next().unwrap_or(name);
        let root = scope.ancestors().last()?;
        root.descendants()
            .filter_map(ClassDeclaration::cast)
            .find(|class| class.name().is_some_and(|n| n.text() == simple))
            .and_then(|class| TypeInfo::from_declaration(&class))
            .or_else(|| self.library.get(simple).cloned())
    }

    fn is_subclass(&self, from: &str, to: &str, scope: &SyntaxNode) -> bool {
        let target = to.rsplit('.').next().unwrap_or(to);
        if target == "Object" {
            return true;
        }
        let mut current = SmolStr::new(from.rsplit('.').next().unwrap_or(from));
        // Bounded walk; a malformed file may contain an inheritance cycle.
        for _ in 0..32 {
            if current == target {
                return true;
            }
            match self.type_info(&current, scope).and_then(|info| info.base) {
                Some(base) => current = SmolStr::new(base.rsplit('.').next().unwrap_or(&base)),
                None => return false,
            }
        }
        false
    }

    fn lookup_name(&self, name: &str, at: &SyntaxNode) -> Resolution {
        let at_start = at.text_range().start();
        for ancestor in at.ancestors() {
            match ancestor.kind() {
                SyntaxKind::Block | SyntaxKind::ForStatement => {
                    for stmt in ancestor.descendants().filter_map(LocalVariableDeclarationStatement::cast) {
                        let owner = stmt
                            .syntax()
                            .ancestors()
                            .skip(1)
                            .find(|n| matches!(n.kind(), SyntaxKind::Block | SyntaxKind::ForStatement));
                        if owner.as_ref() != Some(&ancestor) || stmt.syntax().text_range().start() >= at_start {
                            continue;
                        }
                        if let Some(ty) = local_type(self, &stmt, name) {
                            return Resolution::Value(ty);
                        }
                    }
                }
                SyntaxKind::CatchClause => {
                    if let Some(param) = support::child::<Parameter>(&ancestor) {
                        if param.name().is_some_and(|n| n.text() == name) {
                            return Resolution::Value(param.ty().map(|ty| lower_type(&ty)).unwrap_or(Type::Unresolved));
                        }
                    }
                }
                SyntaxKind::LambdaExpression => {
                    let declares = ancestor
                        .children_with_tokens()
                        .filter_map(|it| it.into_token())
                        .take_while(|tok| tok.kind() != SyntaxKind::Arrow)
                        .any(|tok| tok.kind().is_identifier_like() && tok.text() == name);
                    if declares {
                        return Resolution::Value(Type::Unresolved);
                    }
                }
                SyntaxKind::MethodDeclaration | SyntaxKind::ConstructorDeclaration => {
                    let params = ancestor
                        .children()
                        .find(|n| n.kind() == SyntaxKind::ParameterList)
                        .into_iter()
                        .flat_map(|list| list.children().filter_map(Parameter::cast).collect::<Vec<_>>());
                    for param in params {
                        if param.name().is_some_and(|n| n.text() == name) {
                            return Resolution::Value(param.ty().map(|ty| lower_type(&ty)).unwrap_or(Type::Unresolved));
                        }
                    }
                    if declares_type_parameter(&ancestor, name) {
                        return Resolution::Type(Type::named(name));
                    }
                }
                SyntaxKind::ClassDeclaration | SyntaxKind::InterfaceDeclaration => {
                    if let Some(class) = ClassDeclaration::cast(ancestor.clone()) {
                        for field in class.fields() {
                            if field.declarators().any(|d| d.name().is_some_and(|n| n.text() == name)) {
                                return Resolution::Value(field.ty().map(|ty| lower_type(&ty)).unwrap_or(Type::Unresolved));
                            }
                        }
                    }
                    if declares_type_parameter(&ancestor, name) {
                        return Resolution::Type(Type::named(name));
                    }
                }
                _ => {}
            }
        }
        match self.type_info(name, at) {
            Some(info) => Resolution::Type(Type::named(&info.name)),
            None => Resolution::Unresolved,
        }
    }

    fn member_type(&self, owner: &Type, member: &str, scope: &SyntaxNode) -> Option<Type> {
        if let Type::Array(_) = owner {
            return (member == "length").then(|| Type::primitive("int"));
        }
        let info = self.type_info(owner.simple_name()?, scope)?;
        info.fields.get(member).cloned()
    }

    fn method_return_type(&self, call: &MethodCallExpression) -> Option<Type> {
        let callee = call.callee()?;
        match callee.kind() {
            SyntaxKind::NameExpression => {
                let name = NameExpression::cast(callee.syntax().clone())?.name()?;
                call.syntax()
                    .ancestors()
                    .filter_map(ClassDeclaration::cast)
                    .find_map(|class| {
                        class
                            .methods()
                            .find(|m| m.name().is_some_and(|n| n.text() == name.text()))
                            .and_then(|m| m.return_type())
                            .map(|ty| lower_type(&ty))
                    })
            }
            SyntaxKind::FieldAccessExpression => {
                let access = FieldAccessExpression::cast(callee.syntax().clone())?;
                let name = access.name()?;
                let owner = match self.resolve_reference(&access.receiver()?) {
                    Resolution::Type(ty) | Resolution::Value(ty) => ty,
                    Resolution::Unresolved => return None,
                };
                let info = self.type_info(owner.simple_name()?, call.syntax())?;
                info.methods.get(name.text()).cloned()
            }
            _ => None,
        }
    }

    fn binary_type(&self, binary: &BinaryExpression) -> Type {
        let Some(op) = binary.op() else {
            return Type::Unresolved;
        };
        match op {
            SyntaxKind::Less
            | SyntaxKind::LessEq
            | SyntaxKind::Greater
            | SyntaxKind::GreaterEq
            | SyntaxKind::EqEq
            | SyntaxKind::BangEq
            | SyntaxKind::AmpAmp
            | SyntaxKind::PipePipe => Type::boolean(),
            _ => {
                let lhs = binary.lhs().map(|e| self.type_of(&e)).unwrap_or(Type::Unresolved);
                let rhs = binary.rhs().map(|e| self.type_of(&e)).unwrap_or(Type::Unresolved);
                if matches!(op, SyntaxKind::Amp | SyntaxKind::Pipe | SyntaxKind::Caret)
                    && lhs.is_boolean()
                {
                    return Type::boolean();
                }
                if op == SyntaxKind::Plus
                    && (lhs.simple_name() == Some("String") || rhs.simple_name() == Some("String"))
                {
                    return Type::named("String");
                }
                numeric_promotion(&lhs, &rhs)
            }
        }
    }
}

fn declares_type_parameter(owner: &SyntaxNode, name: &str) -> bool {
    owner
        .children()
        .filter(|n| n.kind() == SyntaxKind::TypeParameters)
        .flat_map(|list| list.children().collect::<Vec<_>>())
        .filter_map(|param| support::first_significant_token(&param))
        .any(|tok| tok.text() == name)
}

fn local_type(
    model: &LocalSemanticModel,
    stmt: &LocalVariableDeclarationStatement,
    name: &str,
) -> Option<Type> {
    let declarator = stmt
        .declarators()
        .find(|d| d.name().is_some_and(|n| n.text() == name))?;
    let declared = stmt.ty();
    let is_var = declared
        .as_ref()
        .and_then(|ty| ty.named())
        .is_some_and(|named| named.name() == "var");
    if is_var {
        return Some(
            declarator
                .initializer()
                .map(|init| model.type_of(&init))
                .unwrap_or(Type::Unresolved),
        );
    }
    Some(declared.map(|ty| lower_type(&ty)).unwrap_or(Type::Unresolved))
}

const NUMERIC_RANK: &[&str] = &["byte", "short", "char", "int", "long", "float", "double"];

fn numeric_rank(ty: &Type) -> Option<usize> {
    match ty {
        Type::Primitive(name) => NUMERIC_RANK.iter().position(|n| n == name),
        _ => None,
    }
}

fn numeric_promotion(lhs: &Type, rhs: &Type) -> Type {
    match (numeric_rank(lhs), numeric_rank(rhs)) {
        (Some(l), Some(r)) => {
            let rank = l.max(r).max(3);
            Type::primitive(NUMERIC_RANK[rank])
        }
        _ => Type::Unresolved,
    }
}

fn boxed_name(primitive: &str) -> Option<&'static str> {
    Some(match primitive {
        "boolean" => "Boolean",
        "int" => "Integer",
        "long" => "Long",
        "double" => "Double",
        "char" => "Character",
        _ => return None,
    })
}

/// Converts a syntactic type into a semantic one without resolving names.
pub fn lower_type(ty: &nova_syntax::Type) -> Type {
    let mut lowered = if let Some(keyword) = ty.primitive_keyword() {
        if keyword == SyntaxKind::VoidKw {
            Type::Void
        } else {
            let text = ty
                .syntax()
                .children()
                .find(|n| n.kind() == SyntaxKind::PrimitiveType)
                .and_then(|n| support::first_significant_token(&n))
                .map(|tok| tok.text().to_string())
                .unwrap_or_default();
            Type::primitive(&text)
        }
    } else if let Some(named) = ty.named() {
        Type::generic(
            &named.name(),
            named.type_arguments().iter().map(lower_type).collect(),
        )
    } else {
        Type::Unresolved
    };
    for _ in 0..ty.array_dimensions() {
        lowered = Type::Array(Box::new(lowered));
    }
    lowered
}

impl SemanticModel for LocalSemanticModel {
    fn type_of(&self, expr: &Expression) -> Type {
        let node = expr.syntax();
        match expr.kind() {
            SyntaxKind::LiteralExpression => {
                let kind = support::first_significant_token(node).map(|t| t.kind());
                match kind {
                    Some(SyntaxKind::IntLiteral) => Type::primitive("int"),
                    Some(SyntaxKind::LongLiteral) => Type::primitive("long"),
                    Some(SyntaxKind::FloatLiteral) => Type::primitive("float"),
                    Some(SyntaxKind::DoubleLiteral) => Type::primitive("double"),
                    Some(SyntaxKind::CharLiteral) => Type::primitive("char"),
                    Some(SyntaxKind::StringLiteral) => Type::named("String"),
                    Some(SyntaxKind::TrueKw | SyntaxKind::FalseKw) => Type::boolean(),
                    Some(SyntaxKind::NullKw) => Type::Null,
                    _ => Type::Unresolved,
                }
            }
            SyntaxKind::NameExpression | SyntaxKind::FieldAccessExpression => {
                match self.resolve_reference(expr) {
                    Resolution::Value(ty) => ty,
                    Resolution::Type(_) | Resolution::Unresolved => Type::Unresolved,
                }
            }
            SyntaxKind::ThisExpression => node
                .ancestors()
                .find_map(ClassDeclaration::cast)
                .and_then(|class| class.name())
                .map(|name| Type::named(name.text()))
                .unwrap_or(Type::Unresolved),
            SyntaxKind::ParenthesizedExpression => {
                let inner = expr.unparenthesized();
                if inner.kind() == SyntaxKind::ParenthesizedExpression {
                    Type::Unresolved
                } else {
                    self.type_of(&inner)
                }
            }
            SyntaxKind::NewExpression | SyntaxKind::CastExpression => {
                support::child::<nova_syntax::Type>(node)
                    .map(|ty| lower_type(&ty))
                    .unwrap_or(Type::Unresolved)
            }
            SyntaxKind::MethodCallExpression => MethodCallExpression::cast(node.clone())
                .and_then(|call| self.method_return_type(&call))
                .unwrap_or(Type::Unresolved),
            SyntaxKind::ArrayAccessExpression => {
                match support::child::<Expression>(node).map(|e| self.type_of(&e)) {
                    Some(Type::Array(elem)) => *elem,
                    _ => Type::Unresolved,
                }
            }
            SyntaxKind::UnaryExpression => {
                let Some(unary) = UnaryExpression::cast(node.clone()) else {
                    return Type::Unresolved;
                };
                if unary.op() == Some(SyntaxKind::Bang) {
                    return Type::boolean();
                }
                unary
                    .operand()
                    .map(|operand| self.type_of(&operand))
                    .unwrap_or(Type::Unresolved)
            }
            SyntaxKind::BinaryExpression => BinaryExpression::cast(node.clone())
                .map(|binary| self.binary_type(&binary))
                .unwrap_or(Type::Unresolved),
            SyntaxKind::InstanceofExpression => Type::boolean(),
            SyntaxKind::AssignmentExpression => support::child::<Expression>(node)
                .map(|lhs| self.type_of(&lhs))
                .unwrap_or(Type::Unresolved),
            SyntaxKind::ConditionalExpression => support::children::<Expression>(node)
                .nth(1)
                .map(|branch| self.type_of(&branch))
                .unwrap_or(Type::Unresolved),
            _ => Type::Unresolved,
        }
    }

    fn resolve_reference(&self, expr: &Expression) -> Resolution {
        match expr.kind() {
            SyntaxKind::NameExpression => {
                let Some(name) = NameExpression::cast(expr.syntax().clone()).and_then(|n| n.name()) else {
                    return Resolution::Unresolved;
                };
                self.lookup_name(name.text(), expr.syntax())
            }
            SyntaxKind::FieldAccessExpression => {
                let Some(access) = FieldAccessExpression::cast(expr.syntax().clone()) else {
                    return Resolution::Unresolved;
                };
                let (Some(receiver), Some(name)) = (access.receiver(), access.name()) else {
                    return Resolution::Unresolved;
                };
                match self.resolve_reference(&receiver) {
                    Resolution::Type(owner) | Resolution::Value(owner) => self
                        .member_type(&owner, name.text(), expr.syntax())
                        .map(Resolution::Value)
                        .unwrap_or(Resolution::Unresolved),
                    Resolution::Unresolved => Resolution::Unresolved,
                }
            }
            _ => Resolution::Value(self.type_of(expr)),
        }
    }

    fn resolve_type_name(&self, name: &str, scope: &SyntaxNode) -> Option<Type> {
        if NUMERIC_RANK.contains(&name) || name == "boolean" {
            return Some(Type::primitive(name));
        }
        match self.lookup_name(name, scope) {
            Resolution::Type(ty) => Some(ty),
            _ => None,
        }
    }

    fn is_implicitly_convertible(&self, from: &Type, to: &Type, scope: &SyntaxNode) -> bool {
        if !from.is_resolved() || !to.is_resolved() {
            return false;
        }
        if from == to {
            return true;
        }
        match (from, to) {
            (Type::Null, Type::Named { .. } | Type::Array(_)) => true,
            (Type::Primitive(_), Type::Primitive(_)) => {
                match (numeric_rank(from), numeric_rank(to)) {
                    (Some(f), Some(t)) => f <= t && !(f == 2 && t < 3) && !(t == 2 && f != 2),
                    _ => false,
                }
            }
            (Type::Primitive(p), Type::Named { name, .. }) => {
                boxed_name(p) == Some(name.as_str()) || name == "Object"
            }
            (Type::Named { name, .. }, Type::Primitive(p)) => boxed_name(p) == Some(name.as_str()),
            (Type::Named { name: from_name, args: from_args }, Type::Named { name: to_name, args: to_args }) => {
                if !to_args.is_empty() && from_name == to_name {
                    return from_args == to_args;
                }
                self.is_subclass(from_name, to_name, scope)
            }
            (Type::Array(_), Type::Named { name, .. }) => name == "Object",
            _ => false,
        }
    }

    fn can_instantiate(&self, ty: &Type, scope: &SyntaxNode) -> CanInstantiate {
        let Some(info) = ty.simple_name().and_then(|name| self.type_info(name, scope)) else {
            return CanInstantiate::No;
        };
        if info.is_interface || info.is_abstract {
            return CanInstantiate::No;
        }
        if info.constructors.is_empty() {
            return CanInstantiate::Default;
        }
        let accessible: Vec<_> = info.constructors.iter().filter(|c| !c.is_private).collect();
        if accessible.is_empty() {
            CanInstantiate::No
        } else if accessible.iter().any(|c| c.parameters > 0) {
            CanInstantiate::CtorWithParameters
        } else {
            CanInstantiate::Default
        }
    }

    fn is_useful_to_create_with_new(&self, ty: &Type, scope: &SyntaxNode) -> bool {
        let Some(info) = ty.simple_name().and_then(|name| self.type_info(name, scope)) else {
            return false;
        };
        let static_only = !info.constructors.is_empty() && info.constructors.iter().all(|c| c.is_private);
        !info.is_interface && !static_only
    }

    fn function_signature(&self, function: &SyntaxNode) -> Option<FunctionSignature> {
        match function.kind() {
            SyntaxKind::MethodDeclaration => {
                let method = MethodDeclaration::cast(function.clone())?;
                Some(FunctionSignature {
                    return_type: Some(
                        method
                            .return_type()
                            .map(|ty| lower_type(&ty))
                            .unwrap_or(Type::Unresolved),
                    ),
                    is_async: method.is_async(),
                    is_iterator: method.is_iterator(),
                })
            }
            SyntaxKind::ConstructorDeclaration => Some(FunctionSignature {
                return_type: Some(Type::Void),
                is_async: false,
                is_iterator: false,
            }),
            SyntaxKind::LambdaExpression => Some(FunctionSignature {
                return_type: None,
                is_async: false,
                is_iterator: false,
            }),
            _ => None,
        }
    }

    fn resolves_invocation(&self, call: &MethodCallExpression) -> bool {
        self.method_return_type(call).is_some()
    }
}
