//! Name resolution and type lowering for `faxc-par`'s AST.
//!
//! `faxc-sem` is the other half of the mutually recursive relationship
//! described in `faxc-par`'s module doc comment: it implements
//! [`faxc_par::SemanticHooks`] so the parser can ask "does this path name a
//! type" while it's still parsing, and it owns the [`DefTable`] that every
//! later stage (mangling, `faxc-mir` lowering) looks names up in.
//!
//! Class bodies are fully resolved as the parser finishes them (in
//! [`Hooks::on_class_complete`]) since every name a class body can reference
//! — its bases, its own members, anything declared before it in the
//! translation unit — is already bound by the time the closing `}` is seen.
//! Everything else (free functions, namespaces, global variables) is
//! resolved in a second pass over the completed AST, [`resolve_translation_unit`],
//! since the parser's hooks don't get a callback for those declaration kinds.

pub mod def;
pub mod mangle;
pub mod scope;
pub mod templates;
pub mod types;

use faxc_par::ast;
use faxc_par::SemanticHooks;
use faxc_util::diagnostic::{E_SEMANTIC_INCOMPLETE_TYPE, E_SEMANTIC_UNRESOLVED_NAME};
use faxc_util::{DefId, DiagnosticBuilder, Handler, Symbol};

pub use def::{ClassInfo, DefInfo, DefKind, DefTable, EnumInfo, FunctionSig};
pub use scope::{RibKind, ScopeTree};
pub use templates::{SubstitutionFailure, TemplateInstantiationKey, TemplateRegistry};
pub use types::{CvQualifiers, Type};

/// Name bindings plus the definition table they point into. Threaded
/// through both parsing (via [`Hooks`]) and the post-parse pass.
pub struct Resolver {
    pub defs: DefTable,
    pub scopes: ScopeTree,
    pub templates: TemplateRegistry,
    /// Method bodies the parser deferred, collected by [`Hooks`] while
    /// parsing so the driver can re-lex and fill them in once every class
    /// in the translation unit is known (spec §4.C "delayed parsing").
    pub delayed: Vec<DelayedMethod>,
}

impl Resolver {
    pub fn new() -> Self {
        Self { defs: DefTable::new(), scopes: ScopeTree::new(), templates: TemplateRegistry::new(), delayed: Vec::new() }
    }

    fn declare_and_bind(&mut self, name: Symbol, kind: DefKind, span: faxc_util::Span) -> DefId {
        let id = self.defs.declare(name, kind, span);
        self.scopes.add_binding(name, id);
        id
    }

    /// Resolve a path's last segment against the current scope chain. Only
    /// unqualified and single-segment-qualified lookups are supported —
    /// `faxc-sem` doesn't yet model nested namespace/class qualification for
    /// a multi-segment path (`std::vector`'s `std::` is ignored rather than
    /// checked), a known simplification.
    pub fn resolve_path(&self, path: &ast::Path) -> Option<DefId> {
        let last = path.segments.last()?;
        self.scopes.resolve(last.name)
    }

    /// Resolves a path whose final segment carries template arguments
    /// (`Box<int>`) by instantiating the named template, memoized by
    /// [`TemplateInstantiationKey`] (spec §4.D/§8). A path with no template
    /// arguments just falls back to [`Resolver::resolve_path`].
    ///
    /// Returns `None` on substitution failure (SFINAE, spec §7) rather than
    /// emitting a diagnostic — the caller decides whether a failed
    /// instantiation is itself the error or just a dropped overload
    /// candidate.
    pub fn instantiate_path(&mut self, path: &ast::Path, handler: &Handler) -> Option<DefId> {
        let seg = path.segments.last()?;
        if seg.template_args.is_empty() {
            return self.resolve_path(path);
        }
        let template_id = self.scopes.resolve(seg.name)?;
        let (params, body) = match self.defs.get(template_id).map(|d| &d.kind) {
            Some(DefKind::Template { params, body }) => (params.clone(), body.clone()),
            _ => return None,
        };
        let key = TemplateInstantiationKey { template: template_id, fingerprint: templates::fingerprint(&seg.template_args) };
        if let Some(cached) = self.templates.get(&key) {
            return Some(cached);
        }
        let instantiated = templates::instantiate(&params, &body, &seg.template_args).ok()?;
        // `resolve_item`'s `Class`/`Union` arm is a no-op: it assumes
        // `Hooks::on_class_complete` already declared the class while the
        // parser was scanning it. An instantiated body never went through
        // the parser, so a class/union template is declared directly here
        // instead of going through `resolve_item`.
        let id = match &instantiated {
            ast::Item::Class(c) | ast::Item::Union(c) => declare_class(c, self, handler),
            other => {
                resolve_item(other, self, handler);
                let name = item_name(other)?;
                self.scopes.resolve(name)?
            }
        };
        self.templates.record(key, id);
        Some(id)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower a parsed `TypeSpecifier` to a semantic `Type`, resolving any named
/// type against `resolver`'s current scope. Returns `Type::Error` (not
/// `None`) on an unresolved name so callers can keep building a
/// partially-typed def table instead of aborting.
pub fn lower_type(ts: &ast::TypeSpecifier, resolver: &Resolver) -> Type {
    let cv = CvQualifiers { is_const: ts.cv.is_const, is_volatile: ts.cv.is_volatile };
    let mut ty = match &ts.base {
        ast::TypeBase::Void => Type::Void,
        ast::TypeBase::Bool => Type::Bool,
        ast::TypeBase::Char => Type::Char,
        ast::TypeBase::Char8T => Type::Char8T,
        ast::TypeBase::Char16T => Type::Char16T,
        ast::TypeBase::Char32T => Type::Char32T,
        ast::TypeBase::WCharT => Type::WCharT,
        ast::TypeBase::SChar => Type::SChar,
        ast::TypeBase::UChar => Type::UChar,
        ast::TypeBase::Short => Type::Short,
        ast::TypeBase::UShort => Type::UShort,
        ast::TypeBase::Int => Type::Int,
        ast::TypeBase::UInt => Type::UInt,
        ast::TypeBase::Long => Type::Long,
        ast::TypeBase::ULong => Type::ULong,
        ast::TypeBase::LongLong => Type::LongLong,
        ast::TypeBase::ULongLong => Type::ULongLong,
        ast::TypeBase::Float => Type::Float,
        ast::TypeBase::Double => Type::Double,
        ast::TypeBase::LongDouble => Type::LongDouble,
        // `auto` without a trailing-return-type context can't be resolved
        // here; the function's initializer/body decides it, which is a
        // `faxc-mir`-level concern (constant folding & local type inference
        // aren't implemented in this pass).
        ast::TypeBase::Auto => Type::Error,
        ast::TypeBase::Decltype(_) => Type::Error,
        ast::TypeBase::TemplateParam(_) => Type::Error,
        ast::TypeBase::Resolved(id) => Type::Record(*id),
        ast::TypeBase::Named(path) => match resolver.resolve_path(path) {
            Some(id) => match resolver.defs.get(id).map(|d| &d.kind) {
                Some(DefKind::Class(_)) | Some(DefKind::Enum(_)) => Type::Record(id),
                Some(DefKind::Template { .. }) => Type::Record(id),
                _ => Type::Error,
            },
            None => Type::Error,
        },
    };

    for layer in &ts.layers {
        ty = match layer {
            ast::TypeLayer::Pointer(ptr_cv) => {
                Type::Pointer(Box::new(ty), CvQualifiers { is_const: ptr_cv.is_const, is_volatile: ptr_cv.is_volatile })
            }
            ast::TypeLayer::LValueRef => Type::LValueRef(Box::new(ty)),
            ast::TypeLayer::RValueRef => Type::RValueRef(Box::new(ty)),
            ast::TypeLayer::Array(_size_expr) => Type::Array(Box::new(ty), None),
            ast::TypeLayer::Function { params, is_variadic, .. } => Type::Function {
                params: params.iter().map(|p| lower_type(p, resolver)).collect(),
                ret: Box::new(ty),
                is_variadic: *is_variadic,
            },
        };
    }

    let _ = cv; // top-level cv-qualification on the base itself isn't tracked separately from pointee cv.
    ty
}

/// The bridge the parser calls back through while it's still running. Class
/// bodies are resolved eagerly here; everything else waits for
/// [`resolve_translation_unit`].
pub struct Hooks<'r> {
    pub resolver: &'r mut Resolver,
    pub handler: &'r Handler,
    /// Method bodies the parser deferred (`faxc_par::ast::MemberKind::DelayedMethod`),
    /// collected so the driver can re-lex and fill them in once every class
    /// in the translation unit is known.
    pub delayed: Vec<DelayedMethod>,
}

pub struct DelayedMethod {
    pub class: DefId,
    pub method: DefId,
    pub token_position: usize,
}

impl<'r> Hooks<'r> {
    pub fn new(resolver: &'r mut Resolver, handler: &'r Handler) -> Self {
        Self { resolver, handler, delayed: Vec::new() }
    }

    fn lower_function_sig(&self, params: &[ast::Param], ret: &ast::TypeSpecifier, is_variadic: bool) -> FunctionSig {
        FunctionSig {
            params: params.iter().map(|p| lower_type(&p.ty, self.resolver)).collect(),
            ret: lower_type(ret, self.resolver),
            is_variadic,
            is_static: false,
            is_virtual: false,
            is_const: false,
        }
    }
}

impl<'r> SemanticHooks for Hooks<'r> {
    fn is_type_name(&mut self, path: &ast::Path) -> bool {
        match self.resolver.resolve_path(path) {
            Some(id) => matches!(
                self.resolver.defs.get(id).map(|d| &d.kind),
                Some(DefKind::Class(_)) | Some(DefKind::Enum(_)) | Some(DefKind::Template { .. })
            ),
            None => false,
        }
    }

    fn on_class_complete(&mut self, class: &ast::ClassItem) {
        declare_class(class, self.resolver, self.handler);
    }

    fn on_template_seen(&mut self, item: &ast::TemplateItem) {
        if let Some(name) = item_name(&item.body) {
            self.resolver.declare_and_bind(
                name,
                DefKind::Template { params: item.params.clone(), body: item.body.clone() },
                item.span,
            );
        }
    }
}

/// Declares a class/struct/union and all of its members, binding each into
/// the current scope. Shared by [`Hooks::on_class_complete`] (run eagerly
/// while the parser is still scanning the rest of the file) and by template
/// instantiation (run once per instantiated class-template use, spec §4.D) —
/// an instantiated class is resolved exactly like a hand-written one.
fn declare_class(class: &ast::ClassItem, resolver: &mut Resolver, handler: &Handler) -> DefId {
    let bases: Vec<DefId> = class
        .bases
        .iter()
        .filter_map(|b| match resolver.resolve_path(&b.path) {
            Some(id) => Some(id),
            None => {
                DiagnosticBuilder::error("base class not found")
                    .code(E_SEMANTIC_UNRESOLVED_NAME)
                    .span(b.path.span)
                    .emit(handler);
                None
            }
        })
        .collect();

    let class_id = resolver.declare_and_bind(
        class.name,
        DefKind::Class(ClassInfo { key: class.key, bases, fields: Vec::new(), methods: Vec::new(), is_complete: class.is_complete }),
        class.span,
    );

    resolver.scopes.enter_scope(RibKind::Block);
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    for member in &class.members {
        match &member.kind {
            ast::MemberKind::Field(field) => {
                fields.push((field.name, lower_type(&field.ty, resolver)));
            }
            ast::MemberKind::Method(sig) | ast::MemberKind::Constructor(sig) | ast::MemberKind::Destructor(sig) => {
                let fn_sig = lower_function_sig(sig, resolver);
                let method_id = resolver.declare_and_bind(sig.name, DefKind::Function(fn_sig), sig.span);
                methods.push(method_id);
            }
            ast::MemberKind::DelayedMethod { signature, token_position } => {
                let fn_sig = lower_function_sig(signature, resolver);
                let method_id = resolver.declare_and_bind(signature.name, DefKind::Function(fn_sig), signature.span);
                methods.push(method_id);
                resolver.delayed.push(DelayedMethod { class: class_id, method: method_id, token_position: *token_position });
            }
            ast::MemberKind::NestedType(item) => resolve_item(item, resolver, handler),
            ast::MemberKind::StaticAssert { .. } => {}
        }
    }
    resolver.scopes.exit_scope();

    if let Some(def::DefInfo { kind: DefKind::Class(info), .. }) = resolver.defs.get_mut(class_id) {
        info.fields = fields;
        info.methods = methods;
    }
    class_id
}

fn lower_function_sig(f: &ast::FunctionItem, resolver: &Resolver) -> FunctionSig {
    FunctionSig {
        params: f.params.iter().map(|p| lower_type(&p.ty, resolver)).collect(),
        ret: lower_type(&f.ret_type, resolver),
        is_variadic: f.is_variadic,
        is_static: f.is_static,
        is_virtual: f.is_virtual,
        is_const: f.is_const,
    }
}

fn item_name(item: &ast::Item) -> Option<Symbol> {
    match item {
        ast::Item::Function(f) => Some(f.name),
        ast::Item::Class(c) | ast::Item::Union(c) => Some(c.name),
        ast::Item::Enum(e) => Some(e.name),
        ast::Item::Typedef { name, .. } | ast::Item::UsingAlias { name, .. } => Some(*name),
        _ => None,
    }
}

/// Second pass over the completed translation unit: resolves everything the
/// parser's hooks don't call back for (free functions, namespaces, global
/// variables). Classes and templates are already in `resolver` from
/// [`Hooks`] and are only recursed into here to reach nested items.
pub fn resolve_translation_unit(tu: &ast::TranslationUnit, resolver: &mut Resolver, handler: &Handler) {
    for item in tu {
        resolve_item(item, resolver, handler);
    }
}

fn resolve_item(item: &ast::Item, resolver: &mut Resolver, handler: &Handler) {
    match item {
        ast::Item::Function(f) => {
            let params: Vec<Type> = f.params.iter().map(|p| lower_type(&p.ty, resolver)).collect();
            let ret = lower_type(&f.ret_type, resolver);
            if f.body.is_none() && !f.is_deleted && !f.is_defaulted {
                // Declaration only; still gets a def so calls can resolve
                // against it.
            }
            resolver.declare_and_bind(
                f.name,
                DefKind::Function(FunctionSig {
                    params,
                    ret,
                    is_variadic: f.is_variadic,
                    is_static: f.is_static,
                    is_virtual: f.is_virtual,
                    is_const: f.is_const,
                }),
                f.span,
            );
        }
        // Classes/unions are fully resolved by `Hooks::on_class_complete`
        // while parsing; nothing left to do here.
        ast::Item::Class(_) | ast::Item::Union(_) => {}
        ast::Item::Enum(e) => {
            let underlying = e.underlying.as_ref().map(|ts| lower_type(ts, resolver)).unwrap_or(Type::Int);
            let mut next_value = 0i64;
            let mut variants = Vec::new();
            for (name, value_expr) in &e.variants {
                if value_expr.is_some() {
                    // Constant-expression evaluation isn't implemented in
                    // this pass; variants with an explicit initializer keep
                    // incrementing from the last known value rather than
                    // the (unevaluated) expression's actual value.
                }
                variants.push((*name, next_value));
                next_value += 1;
            }
            resolver.declare_and_bind(e.name, DefKind::Enum(EnumInfo { is_scoped: e.is_scoped, underlying, variants }), e.span);
        }
        ast::Item::GlobalVar(decl) => {
            let ty = lower_type(&decl.ty, resolver);
            if matches!(ty, Type::Error) {
                DiagnosticBuilder::error("could not resolve type of this declaration")
                    .code(E_SEMANTIC_INCOMPLETE_TYPE)
                    .span(decl.span)
                    .emit(handler);
            }
            resolver.declare_and_bind(decl.name, DefKind::Variable(ty), decl.span);
        }
        ast::Item::Namespace { name, items, span } => {
            let ns_id = name.map(|n| resolver.declare_and_bind(n, DefKind::Namespace, *span));
            let _ = ns_id;
            resolver.scopes.enter_scope(RibKind::Module);
            for inner in items {
                resolve_item(inner, resolver, handler);
            }
            resolver.scopes.exit_scope();
        }
        ast::Item::ExternBlock { items, .. } => {
            for inner in items {
                resolve_item(inner, resolver, handler);
            }
        }
        ast::Item::Friend(inner) => resolve_item(inner, resolver, handler),
        ast::Item::Template(t) => {
            // Already bound by `Hooks::on_template_seen`; non-type template
            // bodies (e.g. a templated free function) aren't otherwise
            // visited, so nothing further to resolve until instantiation.
            let _ = t;
        }
        ast::Item::Typedef { .. }
        | ast::Item::UsingAlias { .. }
        | ast::Item::UsingDirective { .. }
        | ast::Item::StaticAssert { .. } => {}
    }
}
