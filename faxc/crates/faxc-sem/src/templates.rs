//! Template instantiation engine (spec §4.D).
//!
//! Instantiating a template means: build a parameter-name -> argument map,
//! walk a fresh clone of the template's body substituting every occurrence
//! of `TypeBase::TemplateParam`/a non-type parameter's name, and hand the
//! result back through the same [`crate::Hooks`]-driven resolution path a
//! non-template declaration goes through. Results are memoized so the same
//! argument list always returns the same [`DefId`], per spec §8's
//! "template memoization" property.

use std::hash::{Hash, Hasher};

use faxc_par::ast::{
    self, BaseSpecifier, Block, ClassItem, Expr, ExprKind, FieldDecl, FunctionItem, Item, Member,
    MemberKind, Param, Path, PathSegment, Stmt, TemplateArg, TemplateParam, TypeBase, TypeLayer,
    TypeSpecifier, VarDecl,
};
use faxc_util::{DefId, FxHashMap, Symbol};
use rustc_hash::FxHasher;

/// Why substituting a candidate's parameter list with a given argument list
/// failed. This is SFINAE (spec §7): the candidate is dropped from overload
/// resolution, no diagnostic is raised, unless it turns out to be the only
/// candidate left.
#[derive(Debug, Clone)]
pub enum SubstitutionFailure {
    ArityMismatch { expected: usize, found: usize },
    KindMismatch { param: Symbol },
    DeductionFailed,
}

/// One entry of the parameter -> argument map built for a single
/// instantiation.
#[derive(Clone)]
enum Binding {
    Type(TypeSpecifier),
    Value(Expr),
    Template(Path),
}

/// Identifies one instantiation of one template: which template, and a
/// fingerprint of the normalized argument sequence. Two instantiations with
/// the same key are the same instantiation (spec §8).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateInstantiationKey {
    pub template: DefId,
    pub fingerprint: u64,
}

/// Owns the memoization table mapping an instantiation key to the `DefId`
/// the instantiated declaration was registered under.
pub struct TemplateRegistry {
    instantiations: FxHashMap<TemplateInstantiationKey, DefId>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self { instantiations: FxHashMap::default() }
    }

    pub fn get(&self, key: &TemplateInstantiationKey) -> Option<DefId> {
        self.instantiations.get(key).copied()
    }

    pub fn record(&mut self, key: TemplateInstantiationKey, id: DefId) {
        self.instantiations.insert(key, id);
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint the argument list with `rustc-hash`'s `FxHasher`, the same
/// hasher the rest of the compiler already uses for its `FxHashMap`s. Types
/// and expressions are fingerprinted through their `Debug` rendering rather
/// than a dedicated structural hash, matching `mangle::hashed_suffix`'s
/// fallback for the cases that don't have a compact encoding.
pub fn fingerprint(args: &[TemplateArg]) -> u64 {
    let mut hasher = FxHasher::default();
    for arg in args {
        match arg {
            TemplateArg::Type(ty) => format!("{ty:?}").hash(&mut hasher),
            TemplateArg::Expr(e) => format!("{e:?}").hash(&mut hasher),
        }
    }
    hasher.finish()
}

/// Builds the mangled instantiation name `base$hash(args)` (spec §4.D).
pub fn instantiated_name(base: &str, args: &[TemplateArg]) -> String {
    format!("{base}${:016x}", fingerprint(args))
}

/// Binds `params` to `args` positionally, collapsing a trailing parameter
/// pack onto every remaining argument. Returns `ArityMismatch` if there
/// are too few arguments to cover every non-pack, non-defaulted parameter.
fn bind_params(params: &[TemplateParam], args: &[TemplateArg]) -> Result<FxHashMap<Symbol, Binding>, SubstitutionFailure> {
    let mut map = FxHashMap::default();
    let mut arg_iter = args.iter();
    for param in params {
        match param {
            TemplateParam::Type { name, default, is_pack } => {
                if *is_pack {
                    // A pack absorbs every remaining type argument; only the
                    // first is bound for substitution purposes (no variadic
                    // expansion in the substitution walk below, a known
                    // simplification recorded in DESIGN.md).
                    if let Some(TemplateArg::Type(ty)) = arg_iter.next() {
                        map.insert(*name, Binding::Type(ty.clone()));
                    }
                    continue;
                }
                match arg_iter.next() {
                    Some(TemplateArg::Type(ty)) => {
                        map.insert(*name, Binding::Type(ty.clone()));
                    }
                    Some(TemplateArg::Expr(_)) => return Err(SubstitutionFailure::KindMismatch { param: *name }),
                    None => match default {
                        Some(ty) => {
                            map.insert(*name, Binding::Type(ty.clone()));
                        }
                        None => {
                            return Err(SubstitutionFailure::ArityMismatch { expected: params.len(), found: args.len() })
                        }
                    },
                }
            }
            TemplateParam::NonType { name, default, is_pack, .. } => {
                if *is_pack {
                    if let Some(TemplateArg::Expr(e)) = arg_iter.next() {
                        map.insert(*name, Binding::Value(e.clone()));
                    }
                    continue;
                }
                match arg_iter.next() {
                    Some(TemplateArg::Expr(e)) => {
                        map.insert(*name, Binding::Value(e.clone()));
                    }
                    Some(TemplateArg::Type(_)) => return Err(SubstitutionFailure::KindMismatch { param: *name }),
                    None => match default {
                        Some(e) => {
                            map.insert(*name, Binding::Value(e.clone()));
                        }
                        None => {
                            return Err(SubstitutionFailure::ArityMismatch { expected: params.len(), found: args.len() })
                        }
                    },
                }
            }
            TemplateParam::Template { name, default, .. } => match arg_iter.next() {
                Some(TemplateArg::Type(ts)) => {
                    if let TypeBase::Named(path) = &ts.base {
                        map.insert(*name, Binding::Template(path.clone()));
                    }
                }
                _ => {
                    if let Some(path) = default {
                        map.insert(*name, Binding::Template(path.clone()));
                    }
                }
            },
        }
    }
    Ok(map)
}

/// Instantiate `template_body` by substituting `args` for `params`,
/// returning the concrete, un-resolved `Item` ready to hand to
/// [`crate::resolve_item`]/[`crate::Hooks::on_class_complete`] as if it had
/// been written out by hand at the use site.
pub fn instantiate(params: &[TemplateParam], body: &Item, args: &[TemplateArg]) -> Result<Item, SubstitutionFailure> {
    let bindings = bind_params(params, args)?;
    Ok(subst_item(body, &bindings))
}

fn subst_item(item: &Item, b: &FxHashMap<Symbol, Binding>) -> Item {
    match item {
        Item::Function(f) => Item::Function(subst_function(f, b)),
        Item::Class(c) => Item::Class(subst_class(c, b)),
        Item::Union(c) => Item::Union(subst_class(c, b)),
        Item::Enum(e) => Item::Enum(e.clone()),
        Item::Typedef { name, ty, span } => Item::Typedef { name: *name, ty: subst_type(ty, b), span: *span },
        Item::UsingAlias { name, ty, span } => Item::UsingAlias { name: *name, ty: subst_type(ty, b), span: *span },
        Item::UsingDirective { .. } => item.clone(),
        Item::Namespace { name, items, span } => {
            Item::Namespace { name: *name, items: items.iter().map(|i| subst_item(i, b)).collect(), span: *span }
        }
        Item::Template(t) => Item::Template(t.clone()),
        Item::StaticAssert { condition, message, span } => {
            Item::StaticAssert { condition: subst_expr(condition, b), message: *message, span: *span }
        }
        Item::ExternBlock { abi, items, span } => {
            Item::ExternBlock { abi: *abi, items: items.iter().map(|i| subst_item(i, b)).collect(), span: *span }
        }
        Item::GlobalVar(decl) => Item::GlobalVar(subst_var_decl(decl, b)),
        Item::Friend(inner) => Item::Friend(Box::new(subst_item(inner, b))),
    }
}

fn subst_function(f: &FunctionItem, b: &FxHashMap<Symbol, Binding>) -> FunctionItem {
    FunctionItem {
        name: f.name,
        params: f.params.iter().map(|p| subst_param(p, b)).collect(),
        is_variadic: f.is_variadic,
        ret_type: subst_type(&f.ret_type, b),
        body: f.body.as_ref().map(|body| subst_block(body, b)),
        linkage: f.linkage,
        calling_convention: f.calling_convention,
        is_virtual: f.is_virtual,
        is_static: f.is_static,
        is_const: f.is_const,
        is_noexcept: f.is_noexcept,
        is_constexpr: f.is_constexpr,
        is_consteval: f.is_consteval,
        is_explicit: f.is_explicit,
        is_deleted: f.is_deleted,
        is_defaulted: f.is_defaulted,
        span: f.span,
    }
}

fn subst_param(p: &Param, b: &FxHashMap<Symbol, Binding>) -> Param {
    Param { name: p.name, ty: subst_type(&p.ty, b), default: p.default.as_ref().map(|e| subst_expr(e, b)) }
}

fn subst_class(c: &ClassItem, b: &FxHashMap<Symbol, Binding>) -> ClassItem {
    ClassItem {
        key: c.key,
        name: c.name,
        bases: c.bases.iter().map(|base| subst_base(base, b)).collect(),
        members: c.members.iter().map(|m| subst_member(m, b)).collect(),
        is_complete: c.is_complete,
        span: c.span,
    }
}

fn subst_base(base: &BaseSpecifier, b: &FxHashMap<Symbol, Binding>) -> BaseSpecifier {
    BaseSpecifier { path: subst_path(&base.path, b), visibility: base.visibility, is_virtual: base.is_virtual }
}

fn subst_member(m: &Member, b: &FxHashMap<Symbol, Binding>) -> Member {
    let kind = match &m.kind {
        MemberKind::Field(f) => MemberKind::Field(subst_field(f, b)),
        MemberKind::Method(sig) => MemberKind::Method(subst_function(sig, b)),
        MemberKind::DelayedMethod { signature, token_position } => {
            MemberKind::DelayedMethod { signature: subst_function(signature, b), token_position: *token_position }
        }
        MemberKind::Constructor(sig) => MemberKind::Constructor(subst_function(sig, b)),
        MemberKind::Destructor(sig) => MemberKind::Destructor(subst_function(sig, b)),
        MemberKind::NestedType(item) => MemberKind::NestedType(Box::new(subst_item(item, b))),
        MemberKind::StaticAssert { condition, message } => {
            MemberKind::StaticAssert { condition: subst_expr(condition, b), message: *message }
        }
    };
    Member { visibility: m.visibility, kind }
}

fn subst_field(f: &FieldDecl, b: &FxHashMap<Symbol, Binding>) -> FieldDecl {
    FieldDecl {
        name: f.name,
        ty: subst_type(&f.ty, b),
        bitfield_width: f.bitfield_width.as_ref().map(|e| subst_expr(e, b)),
        initializer: f.initializer.as_ref().map(|e| subst_expr(e, b)),
        is_static: f.is_static,
        is_mutable: f.is_mutable,
        span: f.span,
    }
}

fn subst_var_decl(d: &VarDecl, b: &FxHashMap<Symbol, Binding>) -> VarDecl {
    VarDecl {
        name: d.name,
        ty: subst_type(&d.ty, b),
        initializer: d.initializer.as_ref().map(|e| subst_expr(e, b)),
        is_static: d.is_static,
        is_extern: d.is_extern,
        is_thread_local: d.is_thread_local,
        is_constexpr: d.is_constexpr,
        span: d.span,
    }
}

/// Substitutes a `TypeSpecifier`, collapsing references the way reference
/// collapsing rules require: binding a type parameter to `T&` and then
/// wrapping the result in another `&` (or `&&`) layer collapses to a single
/// `&`, never `&&&`/`& &&`.
fn subst_type(ts: &TypeSpecifier, b: &FxHashMap<Symbol, Binding>) -> TypeSpecifier {
    if let TypeBase::TemplateParam(name) = &ts.base {
        if let Some(Binding::Type(bound)) = b.get(name) {
            let mut merged = bound.clone();
            merged.layers.extend(ts.layers.iter().cloned());
            collapse_references(&mut merged);
            return merged;
        }
    }
    if let TypeBase::Named(path) = &ts.base {
        if let Some(seg) = path.segments.first() {
            if path.segments.len() == 1 && seg.template_args.is_empty() {
                if let Some(Binding::Template(bound_path)) = b.get(&seg.name) {
                    return TypeSpecifier {
                        base: TypeBase::Named(bound_path.clone()),
                        cv: ts.cv,
                        layers: ts.layers.iter().map(|l| subst_layer(l, b)).collect(),
                        span: ts.span,
                    };
                }
            }
        }
    }
    TypeSpecifier {
        base: subst_base_kind(&ts.base, b),
        cv: ts.cv,
        layers: ts.layers.iter().map(|l| subst_layer(l, b)).collect(),
        span: ts.span,
    }
}

fn subst_base_kind(base: &TypeBase, b: &FxHashMap<Symbol, Binding>) -> TypeBase {
    match base {
        TypeBase::Named(path) => TypeBase::Named(subst_path(path, b)),
        TypeBase::Decltype(e) => TypeBase::Decltype(Box::new(subst_expr(e, b))),
        other => other.clone(),
    }
}

fn subst_layer(layer: &TypeLayer, b: &FxHashMap<Symbol, Binding>) -> TypeLayer {
    match layer {
        TypeLayer::Pointer(cv) => TypeLayer::Pointer(*cv),
        TypeLayer::LValueRef => TypeLayer::LValueRef,
        TypeLayer::RValueRef => TypeLayer::RValueRef,
        TypeLayer::Array(size) => TypeLayer::Array(size.as_ref().map(|e| subst_expr(e, b))),
        TypeLayer::Function { params, is_variadic, is_noexcept } => TypeLayer::Function {
            params: params.iter().map(|p| subst_type(p, b)).collect(),
            is_variadic: *is_variadic,
            is_noexcept: *is_noexcept,
        },
    }
}

/// Drops consecutive reference layers down to a single one, innermost
/// layer's value-category winning only when collapsing two rvalue-refs
/// (`T&& && -> T&&`); any lvalue-ref involved collapses to `&`.
fn collapse_references(ty: &mut TypeSpecifier) {
    let mut seen_ref = None;
    let mut kept = Vec::with_capacity(ty.layers.len());
    for layer in ty.layers.drain(..) {
        match (&layer, seen_ref) {
            (TypeLayer::LValueRef, Some(_)) => seen_ref = Some(TypeLayer::LValueRef),
            (TypeLayer::RValueRef, Some(TypeLayer::LValueRef)) => {}
            (TypeLayer::RValueRef, Some(TypeLayer::RValueRef)) => {}
            (TypeLayer::LValueRef, None) | (TypeLayer::RValueRef, None) => {
                seen_ref = Some(layer.clone());
                kept.push(layer);
            }
            _ => kept.push(layer),
        }
    }
    ty.layers = kept;
}

fn subst_path(path: &Path, b: &FxHashMap<Symbol, Binding>) -> Path {
    Path {
        is_global: path.is_global,
        segments: path
            .segments
            .iter()
            .map(|seg| PathSegment {
                name: seg.name,
                template_args: seg.template_args.iter().map(|a| subst_template_arg(a, b)).collect(),
            })
            .collect(),
        span: path.span,
    }
}

fn subst_template_arg(arg: &TemplateArg, b: &FxHashMap<Symbol, Binding>) -> TemplateArg {
    match arg {
        TemplateArg::Type(ts) => TemplateArg::Type(subst_type(ts, b)),
        TemplateArg::Expr(e) => TemplateArg::Expr(subst_expr(e, b)),
    }
}

fn subst_block(block: &Block, b: &FxHashMap<Symbol, Binding>) -> Block {
    Block { stmts: block.stmts.iter().map(|s| subst_stmt(s, b)).collect(), span: block.span }
}

fn subst_stmt(stmt: &Stmt, b: &FxHashMap<Symbol, Binding>) -> Stmt {
    match stmt {
        Stmt::Expr(e) => Stmt::Expr(subst_expr(e, b)),
        Stmt::Decl(decls) => Stmt::Decl(decls.iter().map(|d| subst_var_decl(d, b)).collect()),
        Stmt::Block(blk) => Stmt::Block(subst_block(blk, b)),
        Stmt::If { init, is_constexpr, condition, then_branch, else_branch } => Stmt::If {
            init: init.as_ref().map(|s| Box::new(subst_stmt(s, b))),
            is_constexpr: *is_constexpr,
            condition: subst_expr(condition, b),
            then_branch: Box::new(subst_stmt(then_branch, b)),
            else_branch: else_branch.as_ref().map(|s| Box::new(subst_stmt(s, b))),
        },
        Stmt::For { init, condition, increment, body } => Stmt::For {
            init: init.as_ref().map(|s| Box::new(subst_stmt(s, b))),
            condition: condition.as_ref().map(|e| subst_expr(e, b)),
            increment: increment.as_ref().map(|e| subst_expr(e, b)),
            body: Box::new(subst_stmt(body, b)),
        },
        Stmt::RangedFor { init, binding, binding_ty, range, body } => Stmt::RangedFor {
            init: init.as_ref().map(|s| Box::new(subst_stmt(s, b))),
            binding: *binding,
            binding_ty: binding_ty.as_ref().map(|t| subst_type(t, b)),
            range: subst_expr(range, b),
            body: Box::new(subst_stmt(body, b)),
        },
        Stmt::While { condition, body } => Stmt::While { condition: subst_expr(condition, b), body: Box::new(subst_stmt(body, b)) },
        Stmt::DoWhile { body, condition } => Stmt::DoWhile { body: Box::new(subst_stmt(body, b)), condition: subst_expr(condition, b) },
        Stmt::Switch { init, discriminant, body } => Stmt::Switch {
            init: init.as_ref().map(|s| Box::new(subst_stmt(s, b))),
            discriminant: subst_expr(discriminant, b),
            body: Box::new(subst_stmt(body, b)),
        },
        Stmt::Case { value, span } => Stmt::Case { value: subst_expr(value, b), span: *span },
        Stmt::Return { value, span } => Stmt::Return { value: value.as_ref().map(|e| subst_expr(e, b)), span: *span },
        Stmt::Try { body, handlers } => Stmt::Try {
            body: subst_block(body, b),
            handlers: handlers
                .iter()
                .map(|h| ast::CatchClause {
                    exception: h.exception.as_ref().map(|(name, ty)| (*name, subst_type(ty, b))),
                    is_catch_all: h.is_catch_all,
                    body: subst_block(&h.body, b),
                })
                .collect(),
        },
        Stmt::Throw { value, span } => Stmt::Throw { value: value.as_ref().map(|e| subst_expr(e, b)), span: *span },
        other => other.clone(),
    }
}

fn subst_expr(expr: &Expr, b: &FxHashMap<Symbol, Binding>) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Name(path) => {
            if let Some(seg) = path.segments.first() {
                if path.segments.len() == 1 && seg.template_args.is_empty() {
                    if let Some(Binding::Value(bound)) = b.get(&seg.name) {
                        return bound.clone();
                    }
                }
            }
            ExprKind::Name(subst_path(path, b))
        }
        ExprKind::Unary { op, operand, is_postfix } => {
            ExprKind::Unary { op: *op, operand: Box::new(subst_expr(operand, b)), is_postfix: *is_postfix }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            ExprKind::Binary { op: *op, lhs: Box::new(subst_expr(lhs, b)), rhs: Box::new(subst_expr(rhs, b)) }
        }
        ExprKind::Assign { op, lhs, rhs } => {
            ExprKind::Assign { op: *op, lhs: Box::new(subst_expr(lhs, b)), rhs: Box::new(subst_expr(rhs, b)) }
        }
        ExprKind::Ternary { condition, then_expr, else_expr } => ExprKind::Ternary {
            condition: Box::new(subst_expr(condition, b)),
            then_expr: Box::new(subst_expr(then_expr, b)),
            else_expr: Box::new(subst_expr(else_expr, b)),
        },
        ExprKind::Comma { lhs, rhs } => ExprKind::Comma { lhs: Box::new(subst_expr(lhs, b)), rhs: Box::new(subst_expr(rhs, b)) },
        ExprKind::Call { callee, args } => {
            ExprKind::Call { callee: Box::new(subst_expr(callee, b)), args: args.iter().map(|a| subst_expr(a, b)).collect() }
        }
        ExprKind::Member { object, name, is_arrow } => {
            ExprKind::Member { object: Box::new(subst_expr(object, b)), name: *name, is_arrow: *is_arrow }
        }
        ExprKind::Subscript { object, index } => {
            ExprKind::Subscript { object: Box::new(subst_expr(object, b)), index: Box::new(subst_expr(index, b)) }
        }
        ExprKind::Cast { kind, ty, operand } => {
            ExprKind::Cast { kind: *kind, ty: subst_type(ty, b), operand: Box::new(subst_expr(operand, b)) }
        }
        ExprKind::New { ty, args, placement } => ExprKind::New {
            ty: subst_type(ty, b),
            args: args.iter().map(|a| subst_expr(a, b)).collect(),
            placement: placement.iter().map(|a| subst_expr(a, b)).collect(),
        },
        ExprKind::Delete { operand, is_array } => ExprKind::Delete { operand: Box::new(subst_expr(operand, b)), is_array: *is_array },
        ExprKind::InitializerList(items) => ExprKind::InitializerList(items.iter().map(|e| subst_expr(e, b)).collect()),
        other => other.clone(),
    };
    Expr { kind, span: expr.span }
}

/// Tries class-template-argument-deduction guides in declared order (spec
/// §4.D), where each guide is a constructor's parameter list. The first
/// guide whose parameter types structurally match `arg_types` one-for-one
/// against the class's own type parameters wins; no partial ordering
/// between multiple matching guides is attempted (first match wins, a
/// documented simplification over full guide-ranking).
pub fn deduce_from_guides(
    class_params: &[TemplateParam],
    guides: &[Vec<Param>],
    arg_exprs: &[Expr],
) -> Result<Vec<TemplateArg>, SubstitutionFailure> {
    'guide: for guide in guides {
        if guide.len() != arg_exprs.len() {
            continue;
        }
        let mut deduced: FxHashMap<Symbol, TemplateArg> = FxHashMap::default();
        for (param, arg) in guide.iter().zip(arg_exprs) {
            if let TypeBase::TemplateParam(name) = &param.ty.base {
                if class_params.iter().any(|p| matches!(p, TemplateParam::Type { name: n, .. } if n == name)) {
                    // No type is recoverable from a bare `Expr` without the
                    // inferred type of `arg` (that's a `faxc-sem` type-check
                    // concern upstream of this module); record the
                    // expression's textual shape so distinct call sites at
                    // least deduce distinct, stable arguments.
                    deduced.insert(
                        *name,
                        TemplateArg::Type(TypeSpecifier {
                            base: TypeBase::Decltype(Box::new(arg.clone())),
                            cv: Default::default(),
                            layers: Vec::new(),
                            span: arg.span,
                        }),
                    );
                    continue;
                }
            }
            if !matches!(&param.ty.base, TypeBase::TemplateParam(_)) {
                continue 'guide;
            }
        }
        if deduced.len() == class_params.iter().filter(|p| matches!(p, TemplateParam::Type { .. })).count() {
            return Ok(class_params
                .iter()
                .filter_map(|p| match p {
                    TemplateParam::Type { name, .. } => deduced.get(name).cloned(),
                    _ => None,
                })
                .collect());
        }
    }
    Err(SubstitutionFailure::DeductionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_par::ast::CvQualifiers;
    use faxc_util::StringTable;

    fn sym(table: &mut StringTable, s: &str) -> Symbol {
        Symbol::from_u32(table.intern(s))
    }

    fn dummy_ty(base: TypeBase) -> TypeSpecifier {
        TypeSpecifier { base, cv: CvQualifiers::default(), layers: Vec::new(), span: faxc_util::Span::DUMMY }
    }

    #[test]
    fn substitutes_template_param_in_function_return_type() {
        let mut table = StringTable::new();
        let t = sym(&mut table, "T");
        let params = vec![TemplateParam::Type { name: t, default: None, is_pack: false }];
        let body = Item::Function(FunctionItem {
            name: sym(&mut table, "id"),
            params: vec![Param { name: Some(sym(&mut table, "v")), ty: dummy_ty(TypeBase::TemplateParam(t)), default: None }],
            is_variadic: false,
            ret_type: dummy_ty(TypeBase::TemplateParam(t)),
            body: None,
            linkage: ast::Linkage::External,
            calling_convention: ast::CallingConvention::Cdecl,
            is_virtual: false,
            is_static: false,
            is_const: false,
            is_noexcept: false,
            is_constexpr: false,
            is_consteval: false,
            is_explicit: false,
            is_deleted: false,
            is_defaulted: false,
            span: faxc_util::Span::DUMMY,
        });
        let args = vec![TemplateArg::Type(dummy_ty(TypeBase::Int))];
        let instantiated = instantiate(&params, &body, &args).expect("substitution should succeed");
        match instantiated {
            Item::Function(f) => {
                assert!(matches!(f.ret_type.base, TypeBase::Int));
                assert!(matches!(f.params[0].ty.base, TypeBase::Int));
            }
            _ => panic!("expected a function item"),
        }
    }

    #[test]
    fn memoization_key_is_stable_for_identical_args() {
        let args = vec![TemplateArg::Type(dummy_ty(TypeBase::Int))];
        assert_eq!(fingerprint(&args), fingerprint(&args));
    }

    #[test]
    fn arity_mismatch_without_default_is_rejected() {
        let mut table = StringTable::new();
        let t = sym(&mut table, "T");
        let params = vec![TemplateParam::Type { name: t, default: None, is_pack: false }];
        let err = bind_params(&params, &[]).unwrap_err();
        assert!(matches!(err, SubstitutionFailure::ArityMismatch { .. }));
    }

    #[test]
    fn reference_collapsing_keeps_single_lvalue_ref() {
        let mut table = StringTable::new();
        let t = sym(&mut table, "T");
        let mut bound = dummy_ty(TypeBase::Int);
        bound.layers.push(TypeLayer::LValueRef);
        let mut bindings = FxHashMap::default();
        bindings.insert(t, Binding::Type(bound));
        let mut use_site = dummy_ty(TypeBase::TemplateParam(t));
        use_site.layers.push(TypeLayer::RValueRef);
        let result = subst_type(&use_site, &bindings);
        assert_eq!(result.layers.len(), 1);
        assert!(matches!(result.layers[0], TypeLayer::LValueRef));
    }
}
