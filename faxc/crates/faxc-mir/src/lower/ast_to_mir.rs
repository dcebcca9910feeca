//! AST to MIR lowering.
//!
//! Walks a `faxc_par::ast::FunctionItem` body directly — there's no HIR
//! stage in between, unlike the teacher's original Rust pipeline, since a
//! C++ function body is already concrete enough by the time `faxc-sem` has
//! resolved its names to lower straight to basic blocks.
//!
//! `break`/`continue` targets are tracked on two independent stacks rather
//! than one, since a `switch` pushes a `break` target but not a `continue`
//! one — `continue` inside a `switch` targets the nearest enclosing loop.

use std::collections::HashMap;

use faxc_par::ast;
use faxc_sem::{lower_type, Resolver, Type};
use faxc_util::Symbol;

use crate::builder::Builder;
use crate::mir::*;

struct LoweringCtx<'r> {
    resolver: &'r Resolver,
    builder: Builder,
    scopes: Vec<HashMap<Symbol, LocalId>>,
    break_targets: Vec<BlockId>,
    continue_targets: Vec<BlockId>,
    this_local: Option<LocalId>,
    /// Locals declared with a fixed-size array type (`int a[3]`), recording
    /// the bound so ranged-`for` can emit an explicit counting loop instead
    /// of the begin()/end() protocol (which needs overload resolution this
    /// pass doesn't do).
    array_lens: HashMap<LocalId, u64>,
}

/// Reads a declared array bound straight off the AST, e.g. `int a[3]`'s `3`
/// — constant folding isn't implemented, so only a literal size expression
/// is recognized.
fn array_len(ts: &ast::TypeSpecifier) -> Option<u64> {
    ts.layers.iter().find_map(|l| match l {
        ast::TypeLayer::Array(Some(e)) => match &e.kind {
            ast::ExprKind::IntLiteral { value, .. } => Some(*value as u64),
            _ => None,
        },
        _ => None,
    })
}

pub fn lower_function(f: &ast::FunctionItem, resolver: &Resolver) -> Function {
    let ret_ty = lower_type(&f.ret_type, resolver);
    let builder = Builder::new(f.name, ret_ty.clone(), f.params.len());
    let mut ctx = LoweringCtx {
        resolver,
        builder,
        scopes: vec![HashMap::new()],
        break_targets: Vec::new(),
        continue_targets: Vec::new(),
        this_local: None,
        array_lens: HashMap::new(),
    };
    // Local 0 is reserved for the return value, matching the convention the
    // rest of the builder's callers (and its tests) assume.
    ctx.builder.add_local(ret_ty, None, f.span);

    for param in &f.params {
        let ty = lower_type(&param.ty, resolver);
        let local = ctx.builder.add_local(ty, param.name, f.span);
        if let Some(len) = array_len(&param.ty) {
            ctx.array_lens.insert(local, len);
        }
        if let Some(name) = param.name {
            ctx.bind(name, local);
        }
    }

    if let Some(body) = &f.body {
        ctx.lower_block(body);
    }
    if ctx.builder.current_block_is_open() {
        ctx.builder.terminator(Terminator::Return);
    }
    ctx.builder.build()
}

/// Lowers a method body, binding an implicit `this` local ahead of the
/// explicit parameters.
pub fn lower_method(f: &ast::FunctionItem, this_ty: Type, resolver: &Resolver) -> Function {
    let ret_ty = lower_type(&f.ret_type, resolver);
    let builder = Builder::new(f.name, ret_ty.clone(), f.params.len() + 1);
    let mut ctx = LoweringCtx {
        resolver,
        builder,
        scopes: vec![HashMap::new()],
        break_targets: Vec::new(),
        continue_targets: Vec::new(),
        this_local: None,
        array_lens: HashMap::new(),
    };
    ctx.builder.add_local(ret_ty, None, f.span);

    let this_local = ctx.builder.add_local(this_ty, None, f.span);
    ctx.this_local = Some(this_local);

    for param in &f.params {
        let ty = lower_type(&param.ty, resolver);
        let local = ctx.builder.add_local(ty, param.name, f.span);
        if let Some(len) = array_len(&param.ty) {
            ctx.array_lens.insert(local, len);
        }
        if let Some(name) = param.name {
            ctx.bind(name, local);
        }
    }

    if let Some(body) = &f.body {
        ctx.lower_block(body);
    }
    if ctx.builder.current_block_is_open() {
        ctx.builder.terminator(Terminator::Return);
    }
    ctx.builder.build()
}

impl<'r> LoweringCtx<'r> {
    fn bind(&mut self, name: Symbol, local: LocalId) {
        self.scopes.last_mut().expect("at least one scope").insert(name, local);
    }

    fn lookup(&self, name: Symbol) -> Option<LocalId> {
        self.scopes.iter().rev().find_map(|s| s.get(&name).copied())
    }

    fn lower_block(&mut self, block: &ast::Block) {
        self.scopes.push(HashMap::new());
        for stmt in &block.stmts {
            self.lower_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) {
        if !self.builder.current_block_is_open() {
            // Unreachable code after a `return`/`break`/`continue` in the
            // same block — still lowered for side effects elsewhere in the
            // AST walk, but has no block to land statements in. A fresh
            // dead block keeps every statement attached to *some* block
            // rather than panicking the builder.
            let dead = self.builder.new_block();
            self.builder.set_current_block(dead);
        }

        match stmt {
            ast::Stmt::Expr(e) => {
                self.lower_expr(e);
            }
            ast::Stmt::Decl(decls) => {
                for decl in decls {
                    let ty = lower_type(&decl.ty, self.resolver);
                    let local = self.builder.add_local(ty, Some(decl.name), decl.span);
                    if let Some(len) = array_len(&decl.ty) {
                        self.array_lens.insert(local, len);
                    }
                    self.builder.statement(Statement::StorageLive(local));
                    self.bind(decl.name, local);
                    if let Some(init) = &decl.initializer {
                        let src = self.lower_expr(init);
                        self.builder.assign(Place::Local(local), Rvalue::Use(Operand::Move(src)));
                    }
                }
            }
            ast::Stmt::Block(b) => self.lower_block(b),
            ast::Stmt::If { init, condition, then_branch, else_branch, .. } => {
                if let Some(init) = init {
                    self.lower_stmt(init);
                }
                let cond = self.lower_expr(condition);
                let cond_op = Operand::Copy(cond);

                let then_block = self.builder.new_block();
                let else_block = self.builder.new_block();
                let join_block = self.builder.new_block();

                self.builder.terminator(Terminator::If { cond: cond_op, then_block, else_block });

                self.builder.set_current_block(then_block);
                self.lower_stmt(then_branch);
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: join_block });
                }

                self.builder.set_current_block(else_block);
                if let Some(else_branch) = else_branch {
                    self.lower_stmt(else_branch);
                }
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: join_block });
                }

                self.builder.set_current_block(join_block);
            }
            ast::Stmt::While { condition, body } => {
                let header = self.builder.new_block();
                let body_block = self.builder.new_block();
                let exit = self.builder.new_block();

                self.builder.terminator(Terminator::Goto { target: header });
                self.builder.set_current_block(header);
                let cond = self.lower_expr(condition);
                self.builder.terminator(Terminator::If { cond: Operand::Copy(cond), then_block: body_block, else_block: exit });

                self.break_targets.push(exit);
                self.continue_targets.push(header);
                self.builder.set_current_block(body_block);
                self.lower_stmt(body);
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: header });
                }
                self.break_targets.pop();
                self.continue_targets.pop();

                self.builder.set_current_block(exit);
            }
            ast::Stmt::DoWhile { body, condition } => {
                let body_block = self.builder.new_block();
                let check = self.builder.new_block();
                let exit = self.builder.new_block();

                self.builder.terminator(Terminator::Goto { target: body_block });

                self.break_targets.push(exit);
                self.continue_targets.push(check);
                self.builder.set_current_block(body_block);
                self.lower_stmt(body);
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: check });
                }
                self.break_targets.pop();
                self.continue_targets.pop();

                self.builder.set_current_block(check);
                let cond = self.lower_expr(condition);
                self.builder.terminator(Terminator::If { cond: Operand::Copy(cond), then_block: body_block, else_block: exit });

                self.builder.set_current_block(exit);
            }
            ast::Stmt::For { init, condition, increment, body } => {
                if let Some(init) = init {
                    self.lower_stmt(init);
                }
                let header = self.builder.new_block();
                let body_block = self.builder.new_block();
                let incr_block = self.builder.new_block();
                let exit = self.builder.new_block();

                self.builder.terminator(Terminator::Goto { target: header });
                self.builder.set_current_block(header);
                if let Some(cond) = condition {
                    let cond_place = self.lower_expr(cond);
                    self.builder.terminator(Terminator::If { cond: Operand::Copy(cond_place), then_block: body_block, else_block: exit });
                } else {
                    self.builder.terminator(Terminator::Goto { target: body_block });
                }

                self.break_targets.push(exit);
                self.continue_targets.push(incr_block);
                self.builder.set_current_block(body_block);
                self.lower_stmt(body);
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: incr_block });
                }
                self.break_targets.pop();
                self.continue_targets.pop();

                self.builder.set_current_block(incr_block);
                if let Some(incr) = increment {
                    self.lower_expr(incr);
                }
                self.builder.terminator(Terminator::Goto { target: header });

                self.builder.set_current_block(exit);
            }
            ast::Stmt::RangedFor { init, binding, binding_ty, range, body } => {
                if let Some(init) = init {
                    self.lower_stmt(init);
                }
                let range_place = self.lower_expr(range);
                let known_len = match &range_place {
                    Place::Local(l) => self.array_lens.get(l).copied(),
                    _ => None,
                };
                let ty = binding_ty.as_ref().map(|t| lower_type(t, self.resolver)).unwrap_or(Type::Error);
                let binding_local = self.builder.add_local(ty, Some(*binding), range.span);
                self.bind(*binding, binding_local);

                match known_len {
                    // Array-pointer-pair case (spec's `sum(int a[3])`
                    // scenario): the bound is known at lowering time, so
                    // this emits an explicit counting loop over it rather
                    // than the begin()/end() protocol.
                    Some(len) => {
                        let idx = self.builder.add_local(Type::ULong, None, range.span);
                        self.builder.assign(
                            Place::Local(idx),
                            Rvalue::Use(Operand::Constant(Constant { ty: Type::ULong, kind: ConstantKind::Int(0) })),
                        );

                        let header = self.builder.new_block();
                        let body_block = self.builder.new_block();
                        let incr = self.builder.new_block();
                        let exit = self.builder.new_block();

                        self.builder.terminator(Terminator::Goto { target: header });
                        self.builder.set_current_block(header);
                        let bound = self.const_place(Type::ULong, ConstantKind::Int(len as i64));
                        let cmp = self.builder.add_local(Type::Bool, None, range.span);
                        self.builder.assign(
                            Place::Local(cmp),
                            Rvalue::BinaryOp(BinOp::Lt, Box::new(Operand::Copy(Place::Local(idx))), Box::new(Operand::Copy(bound))),
                        );
                        self.builder.terminator(Terminator::If { cond: Operand::Copy(Place::Local(cmp)), then_block: body_block, else_block: exit });

                        self.break_targets.push(exit);
                        self.continue_targets.push(incr);
                        self.builder.set_current_block(body_block);
                        let elem_place = Place::Projection(Box::new(range_place.clone()), Projection::Index(idx));
                        self.builder.assign(Place::Local(binding_local), Rvalue::Use(Operand::Copy(elem_place)));
                        self.lower_stmt(body);
                        if self.builder.current_block_is_open() {
                            self.builder.terminator(Terminator::Goto { target: incr });
                        }
                        self.break_targets.pop();
                        self.continue_targets.pop();

                        self.builder.set_current_block(incr);
                        let one = self.const_place(Type::ULong, ConstantKind::Int(1));
                        self.builder.assign(
                            Place::Local(idx),
                            Rvalue::BinaryOp(BinOp::Add, Box::new(Operand::Copy(Place::Local(idx))), Box::new(Operand::Copy(one))),
                        );
                        self.builder.terminator(Terminator::Goto { target: header });

                        self.builder.set_current_block(exit);
                    }
                    // The full begin()/end()/operator++ user-type protocol
                    // needs overload resolution this pass doesn't do — the
                    // body still lowers once so its locals and side effects
                    // exist, a documented simplification short of a real
                    // loop for this case only.
                    None => self.lower_stmt(body),
                }
            }
            ast::Stmt::Switch { init, discriminant, body } => self.lower_switch(init, discriminant, body),
            ast::Stmt::Case { .. } | ast::Stmt::Default { .. } => {
                // Only meaningful inside `lower_switch`'s own body walk;
                // reached directly only for a stray/nested label this pass
                // doesn't split on, which is a no-op here.
            }
            ast::Stmt::Break(_) => {
                let target = *self.break_targets.last().expect("break outside loop or switch");
                self.builder.terminator(Terminator::Goto { target });
            }
            ast::Stmt::Continue(_) => {
                let target = *self.continue_targets.last().expect("continue outside loop");
                self.builder.terminator(Terminator::Goto { target });
            }
            ast::Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    let place = self.lower_expr(value);
                    self.builder.assign(Place::Local(LocalId(0)), Rvalue::Use(Operand::Move(place)));
                }
                self.builder.terminator(Terminator::Return);
            }
            ast::Stmt::Goto { .. } | ast::Stmt::Label { .. } => {
                // Arbitrary `goto` requires a label->block map built in a
                // pre-pass over the enclosing function; not implemented,
                // consistent with the gaps documented in DESIGN.md.
            }
            ast::Stmt::Try { body, handlers } => self.lower_try(body, handlers),
            ast::Stmt::Throw { value, .. } => {
                let op_and_ty = value.as_ref().map(|v| {
                    let place = self.lower_expr(v);
                    (Operand::Copy(place), Type::Error)
                });
                match op_and_ty {
                    Some((op, ty)) => self.builder.terminator(Terminator::Throw { value: Some(op), ty: Some(ty), target: None }),
                    None => self.builder.terminator(Terminator::Rethrow { target: None }),
                }
            }
            ast::Stmt::SehTry { body, handler } => self.lower_seh_try(body, handler),
            ast::Stmt::SehLeave(_) => {
                let target = *self.break_targets.last().unwrap_or(&self.builder.current_block);
                self.builder.terminator(Terminator::Goto { target });
            }
        }
    }

    fn lower_switch(&mut self, init: &Option<Box<ast::Stmt>>, discriminant: &ast::Expr, body: &ast::Stmt) {
        if let Some(init) = init {
            self.lower_stmt(init);
        }
        let discr_place = self.lower_expr(discriminant);
        let discr_op = Operand::Copy(discr_place);
        let entry_block = self.builder.current_block;

        let exit = self.builder.new_block();
        let stmts: &[ast::Stmt] = match body {
            ast::Stmt::Block(b) => &b.stmts,
            other => std::slice::from_ref(other),
        };

        // Split the body into fallthrough segments at each `case`/`default`
        // label, the way a real switch's statements are laid out linearly
        // in memory with labels as entry points into the middle.
        struct Segment<'a> {
            label: Option<SegmentLabel<'a>>,
            stmts: Vec<&'a ast::Stmt>,
        }
        enum SegmentLabel<'a> {
            Case(&'a ast::Expr),
            Default,
        }

        let mut segments: Vec<Segment> = vec![Segment { label: None, stmts: Vec::new() }];
        for s in stmts {
            match s {
                ast::Stmt::Case { value, .. } => segments.push(Segment { label: Some(SegmentLabel::Case(value)), stmts: Vec::new() }),
                ast::Stmt::Default { .. } => segments.push(Segment { label: Some(SegmentLabel::Default), stmts: Vec::new() }),
                other => segments.last_mut().unwrap().stmts.push(other),
            }
        }

        let segment_blocks: Vec<BlockId> = segments.iter().map(|_| self.builder.new_block()).collect();

        self.break_targets.push(exit);
        for (i, segment) in segments.iter().enumerate() {
            self.builder.set_current_block(segment_blocks[i]);
            for stmt in segment.stmts.iter().copied() {
                self.lower_stmt(stmt);
            }
            if self.builder.current_block_is_open() {
                let next = segment_blocks.get(i + 1).copied().unwrap_or(exit);
                self.builder.terminator(Terminator::Goto { target: next });
            }
        }
        self.break_targets.pop();

        let default_block = segments
            .iter()
            .position(|s| matches!(s.label, Some(SegmentLabel::Default)))
            .map(|i| segment_blocks[i])
            .unwrap_or(exit);

        // Build the comparison chain back-to-front so each check's "no
        // match" branch is the already-built next check.
        let mut next_check = default_block;
        let case_checks: Vec<(BlockId, &ast::Expr)> = segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match &s.label {
                Some(SegmentLabel::Case(value)) => Some((segment_blocks[i], *value)),
                _ => None,
            })
            .collect();

        for (target, value) in case_checks.into_iter().rev() {
            let check_block = self.builder.new_block();
            self.builder.set_current_block(check_block);
            let value_place = self.lower_expr(value);
            let cmp_local = self.builder.add_local(Type::Bool, None, value.span);
            self.builder.assign(
                Place::Local(cmp_local),
                Rvalue::BinaryOp(BinOp::Eq, Box::new(discr_op.clone()), Box::new(Operand::Copy(value_place))),
            );
            self.builder.terminator(Terminator::If { cond: Operand::Copy(Place::Local(cmp_local)), then_block: target, else_block: next_check });
            next_check = check_block;
        }

        // `entry_block` is the block active when the switch was entered —
        // every check block built above moved `current_block` on, so it
        // has to be restored before wiring the entry jump.
        self.builder.set_current_block(entry_block);
        self.builder.terminator(Terminator::Goto { target: next_check });
        self.builder.set_current_block(exit);
    }

    /// Lowers `try { body } catch (...) { ... } ...`. The protected body
    /// gets its own run of blocks (recorded as `EhRegion::try_blocks`); each
    /// handler gets its own block too. Which handler actually runs on a
    /// given exception is an `faxc-gen::eh` concern (matched against the
    /// thrown object's `typeid` via the emitted action table) — nothing
    /// here wires a runtime dispatch between `try_blocks` and a handler,
    /// since that dispatch happens in the unwinder, not in this function's
    /// own control flow.
    fn lower_try(&mut self, body: &ast::Block, handlers: &[ast::CatchClause]) {
        let region_id = self.builder.reserve_eh_region();

        let try_block = self.builder.new_block();
        self.builder.terminator(Terminator::Goto { target: try_block });
        let try_start = try_block.0;
        self.builder.set_current_block(try_block);
        self.builder.statement(Statement::TryBegin(region_id));
        self.lower_block(body);
        self.builder.statement(Statement::TryEnd(region_id));
        let try_end = self.builder.function.blocks.len() as u32;
        let try_blocks: Vec<BlockId> = (try_start..try_end).map(BlockId).collect();

        let join = self.builder.new_block();
        if self.builder.current_block_is_open() {
            self.builder.terminator(Terminator::Goto { target: join });
        }

        let mut catch_handlers = Vec::with_capacity(handlers.len());
        let mut first_handler_block = None;
        for (idx, clause) in handlers.iter().enumerate() {
            let handler_block = self.builder.new_block();
            first_handler_block.get_or_insert(handler_block);
            self.builder.set_current_block(handler_block);
            self.builder.statement(Statement::CatchBegin(region_id, idx));

            let mut exception_ty = None;
            let mut exception_local = None;
            if let Some((name, ty)) = &clause.exception {
                let lowered_ty = lower_type(ty, self.resolver);
                let local = self.builder.add_local(lowered_ty.clone(), Some(*name), clause.body.span);
                self.bind(*name, local);
                exception_ty = Some(lowered_ty);
                exception_local = Some(local);
            }

            self.lower_block(&clause.body);
            self.builder.statement(Statement::CatchEnd(region_id));
            if self.builder.current_block_is_open() {
                self.builder.terminator(Terminator::Goto { target: join });
            }

            catch_handlers.push(CatchHandler { exception_ty, exception_local, handler_block });
        }

        let landing_pad = first_handler_block.unwrap_or(join);
        self.builder.finish_eh_region(region_id, try_blocks, landing_pad, EhRegionKind::Landingpad { handlers: catch_handlers });

        self.builder.set_current_block(join);
    }

    /// Lowers `__try { body } __except(filter) { ... }` / `__try { body }
    /// __finally { ... }`. Same block-per-region shape as [`Self::lower_try`];
    /// `SehHandler::Except`'s filter expression gets its own block since a
    /// real `FuncInfo` scope table records the filter funclet separately
    /// from the handler funclet.
    fn lower_seh_try(&mut self, body: &ast::Block, handler: &ast::SehHandler) {
        let region_id = self.builder.reserve_eh_region();

        let try_block = self.builder.new_block();
        self.builder.terminator(Terminator::Goto { target: try_block });
        let try_start = try_block.0;
        self.builder.set_current_block(try_block);
        self.builder.statement(Statement::SehTryBegin(region_id));
        self.lower_block(body);
        self.builder.statement(Statement::SehTryEnd(region_id));
        let try_end = self.builder.function.blocks.len() as u32;
        let try_blocks: Vec<BlockId> = (try_start..try_end).map(BlockId).collect();

        let join = self.builder.new_block();
        if self.builder.current_block_is_open() {
            self.builder.terminator(Terminator::Goto { target: join });
        }

        match handler {
            ast::SehHandler::Except { filter, body: except_body } => {
                let filter_block = self.builder.new_block();
                self.builder.set_current_block(filter_block);
                self.lower_expr(filter);

                let handler_block = self.builder.new_block();
                self.builder.terminator(Terminator::Goto { target: handler_block });

                self.builder.set_current_block(handler_block);
                self.lower_block(except_body);
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: join });
                }

                self.builder.finish_eh_region(region_id, try_blocks, filter_block, EhRegionKind::SehExcept { filter_block, handler_block });
            }
            ast::SehHandler::Finally { body: finally_body } => {
                let finally_block = self.builder.new_block();
                self.builder.set_current_block(finally_block);
                self.lower_block(finally_body);
                if self.builder.current_block_is_open() {
                    self.builder.terminator(Terminator::Goto { target: join });
                }

                self.builder.finish_eh_region(region_id, try_blocks, finally_block, EhRegionKind::SehFinally { finally_block });
            }
        }

        self.builder.set_current_block(join);
    }

    fn lower_expr(&mut self, expr: &ast::Expr) -> Place {
        match &expr.kind {
            ast::ExprKind::IntLiteral { value, .. } => self.const_place(Type::Int, ConstantKind::Int(*value as i64)),
            ast::ExprKind::FloatLiteral(bits) => self.const_place(Type::Double, ConstantKind::Float(f64::from_bits(*bits))),
            ast::ExprKind::CharLiteral(c) => self.const_place(Type::Char, ConstantKind::Int(*c as i64)),
            ast::ExprKind::StringLiteral(sym) => self.const_place(
                Type::Pointer(Box::new(Type::Char), Default::default()),
                ConstantKind::String(*sym),
            ),
            ast::ExprKind::BoolLiteral(b) => self.const_place(Type::Bool, ConstantKind::Bool(*b)),
            ast::ExprKind::NullptrLiteral => self.const_place(Type::Pointer(Box::new(Type::Void), Default::default()), ConstantKind::Int(0)),

            ast::ExprKind::Name(path) => {
                if let Some(last) = path.segments.last() {
                    if let Some(local) = self.lookup(last.name) {
                        return Place::Local(local);
                    }
                }
                // Not a local (global, member accessed without an explicit
                // `this->`, or unresolved) — this lowering has no `Place`
                // kind for globals, so it falls back to the function's
                // return slot the same way the teacher's original
                // HIR-to-MIR lowering fell back on an unhandled case.
                Place::Local(LocalId(0))
            }
            ast::ExprKind::This => Place::Local(self.this_local.unwrap_or(LocalId(0))),

            ast::ExprKind::Unary { op, operand, is_postfix } => self.lower_unary(*op, operand, *is_postfix),
            ast::ExprKind::Binary { op, lhs, rhs } => {
                let l = self.lower_expr(lhs);
                let r = self.lower_expr(rhs);
                let temp = self.builder.add_local(Type::Int, None, expr.span);
                self.builder.assign(
                    Place::Local(temp),
                    Rvalue::BinaryOp(convert_binop(*op), Box::new(Operand::Copy(l)), Box::new(Operand::Copy(r))),
                );
                Place::Local(temp)
            }
            ast::ExprKind::Assign { op, lhs, rhs } => {
                let dest = self.lower_expr(lhs);
                let src = self.lower_expr(rhs);
                let rvalue = match op {
                    ast::AssignOp::Assign => Rvalue::Use(Operand::Copy(src)),
                    _ => Rvalue::BinaryOp(convert_assign_op(*op), Box::new(Operand::Copy(dest.clone())), Box::new(Operand::Copy(src))),
                };
                self.builder.assign(dest.clone(), rvalue);
                dest
            }
            ast::ExprKind::Ternary { condition, then_expr, else_expr } => {
                let cond = self.lower_expr(condition);
                let then_block = self.builder.new_block();
                let else_block = self.builder.new_block();
                let join = self.builder.new_block();
                self.builder.terminator(Terminator::If { cond: Operand::Copy(cond), then_block, else_block });

                let result = self.builder.add_local(Type::Int, None, expr.span);

                self.builder.set_current_block(then_block);
                let then_place = self.lower_expr(then_expr);
                self.builder.assign(Place::Local(result), Rvalue::Use(Operand::Copy(then_place)));
                self.builder.terminator(Terminator::Goto { target: join });

                self.builder.set_current_block(else_block);
                let else_place = self.lower_expr(else_expr);
                self.builder.assign(Place::Local(result), Rvalue::Use(Operand::Copy(else_place)));
                self.builder.terminator(Terminator::Goto { target: join });

                self.builder.set_current_block(join);
                Place::Local(result)
            }
            ast::ExprKind::Comma { lhs, rhs } => {
                self.lower_expr(lhs);
                self.lower_expr(rhs)
            }
            ast::ExprKind::Call { callee, args } => {
                let arg_places: Vec<Place> = args.iter().map(|a| self.lower_expr(a)).collect();
                let arg_ops = arg_places.into_iter().map(Operand::Copy).collect();
                let callee_op = match &callee.kind {
                    ast::ExprKind::Name(path) => {
                        let name = path.segments.last().map(|s| s.name);
                        Operand::Constant(Constant { ty: Type::Error, kind: ConstantKind::String(name.unwrap_or(Symbol::from_u32(0))) })
                    }
                    _ => {
                        let place = self.lower_expr(callee);
                        Operand::Copy(place)
                    }
                };
                let result = self.builder.add_local(Type::Error, None, expr.span);
                let next = self.builder.new_block();
                self.builder.terminator(Terminator::Call {
                    func: callee_op,
                    args: arg_ops,
                    destination: Place::Local(result),
                    target: Some(next),
                    cleanup: None,
                });
                self.builder.set_current_block(next);
                Place::Local(result)
            }
            ast::ExprKind::Member { object, name: _, is_arrow } => {
                let obj_place = self.lower_expr(object);
                let base = if *is_arrow { Place::Projection(Box::new(obj_place), Projection::Deref) } else { obj_place };
                // Field index resolution needs the object's resolved record
                // type; without it this addresses field 0, a placeholder
                // consistent with `Name`'s global-lookup fallback above.
                Place::Projection(Box::new(base), Projection::Field(0))
            }
            ast::ExprKind::Subscript { object, index } => {
                let obj_place = self.lower_expr(object);
                let idx_place = self.lower_expr(index);
                if let Place::Local(idx_local) = idx_place {
                    Place::Projection(Box::new(obj_place), Projection::Index(idx_local))
                } else {
                    obj_place
                }
            }
            ast::ExprKind::Cast { kind: ast::CastKind::Dynamic, ty, operand } => {
                let operand_place = self.lower_expr(operand);
                let from_ty = Type::Error; // the operand's static type isn't threaded through this pass.
                let to_ty = lower_type(ty, self.resolver);
                let is_reference = !matches!(to_ty, Type::Pointer(..));
                let temp = self.builder.add_local(to_ty.clone(), None, expr.span);
                self.builder.assign(
                    Place::Local(temp),
                    Rvalue::DynamicCast { operand: Operand::Copy(operand_place), from: from_ty, to: to_ty, is_reference },
                );
                Place::Local(temp)
            }
            ast::ExprKind::Cast { kind, ty, operand } => {
                let operand_place = self.lower_expr(operand);
                let target_ty = lower_type(ty, self.resolver);
                let cast_kind = match kind {
                    ast::CastKind::Static | ast::CastKind::CStyle | ast::CastKind::Functional => CastKind::IntToInt,
                    ast::CastKind::Const => CastKind::PtrToPtr,
                    ast::CastKind::Reinterpret => CastKind::PtrToInt,
                    ast::CastKind::Dynamic => unreachable!("handled above"),
                };
                let temp = self.builder.add_local(target_ty.clone(), None, expr.span);
                self.builder.assign(Place::Local(temp), Rvalue::Cast(cast_kind, Operand::Copy(operand_place), target_ty));
                Place::Local(temp)
            }
            ast::ExprKind::Sizeof(_) => self.const_place(Type::ULong, ConstantKind::Int(0)),
            ast::ExprKind::Alignof(_) => self.const_place(Type::ULong, ConstantKind::Int(0)),
            ast::ExprKind::New { ty, args, .. } => {
                let elem_ty = lower_type(ty, self.resolver);
                for a in args {
                    self.lower_expr(a);
                }
                let temp = self.builder.add_local(Type::Pointer(Box::new(elem_ty), Default::default()), None, expr.span);
                Place::Local(temp)
            }
            ast::ExprKind::Delete { operand, .. } => {
                self.lower_expr(operand);
                Place::Local(LocalId(0))
            }
            // Lambdas, fold expressions and `requires`-expressions need
            // their own closure-conversion/pack-expansion/constraint
            // machinery, none of which is implemented — same documented
            // gap as template instantiation.
            ast::ExprKind::Lambda(_) | ast::ExprKind::Fold { .. } | ast::ExprKind::Requires(_) => Place::Local(LocalId(0)),
            ast::ExprKind::InitializerList(elems) => {
                let ops: Vec<Operand> = elems.iter().map(|e| Operand::Copy(self.lower_expr(e))).collect();
                let temp = self.builder.add_local(Type::Error, None, expr.span);
                self.builder.assign(Place::Local(temp), Rvalue::Aggregate(AggregateKind::Tuple, ops));
                Place::Local(temp)
            }
        }
    }

    fn lower_unary(&mut self, op: ast::UnaryOp, operand: &ast::Expr, _is_postfix: bool) -> Place {
        let place = self.lower_expr(operand);
        match op {
            ast::UnaryOp::Deref => Place::Projection(Box::new(place), Projection::Deref),
            ast::UnaryOp::AddrOf => {
                let temp = self.builder.add_local(Type::Pointer(Box::new(Type::Error), Default::default()), None, operand.span);
                self.builder.assign(Place::Local(temp), Rvalue::AddressOf(place, Mutability::Mutable));
                Place::Local(temp)
            }
            ast::UnaryOp::Plus => place,
            ast::UnaryOp::Neg => {
                let temp = self.builder.add_local(Type::Int, None, operand.span);
                self.builder.assign(Place::Local(temp), Rvalue::UnaryOp(UnOp::Neg, Operand::Copy(place)));
                Place::Local(temp)
            }
            ast::UnaryOp::Not => {
                let temp = self.builder.add_local(Type::Bool, None, operand.span);
                self.builder.assign(Place::Local(temp), Rvalue::UnaryOp(UnOp::Not, Operand::Copy(place)));
                Place::Local(temp)
            }
            ast::UnaryOp::BitNot => {
                let temp = self.builder.add_local(Type::Int, None, operand.span);
                self.builder.assign(Place::Local(temp), Rvalue::UnaryOp(UnOp::Not, Operand::Copy(place)));
                Place::Local(temp)
            }
            ast::UnaryOp::PreIncrement | ast::UnaryOp::PreDecrement | ast::UnaryOp::PostIncrement | ast::UnaryOp::PostDecrement => {
                let one = self.const_place(Type::Int, ConstantKind::Int(1));
                let bin_op = if matches!(op, ast::UnaryOp::PreIncrement | ast::UnaryOp::PostIncrement) { BinOp::Add } else { BinOp::Sub };
                let old = self.builder.add_local(Type::Int, None, operand.span);
                self.builder.assign(Place::Local(old), Rvalue::Use(Operand::Copy(place.clone())));
                self.builder.assign(place.clone(), Rvalue::BinaryOp(bin_op, Box::new(Operand::Copy(place.clone())), Box::new(Operand::Copy(one))));
                if matches!(op, ast::UnaryOp::PostIncrement | ast::UnaryOp::PostDecrement) {
                    Place::Local(old)
                } else {
                    place
                }
            }
        }
    }

    fn const_place(&mut self, ty: Type, kind: ConstantKind) -> Place {
        let temp = self.builder.add_local(ty.clone(), None, faxc_util::Span::DUMMY);
        self.builder.assign(Place::Local(temp), Rvalue::Use(Operand::Constant(Constant { ty, kind })));
        Place::Local(temp)
    }
}

fn convert_binop(op: ast::BinaryOp) -> BinOp {
    match op {
        ast::BinaryOp::Add => BinOp::Add,
        ast::BinaryOp::Sub => BinOp::Sub,
        ast::BinaryOp::Mul => BinOp::Mul,
        ast::BinaryOp::Div => BinOp::Div,
        ast::BinaryOp::Rem => BinOp::Rem,
        ast::BinaryOp::Shl => BinOp::Shl,
        ast::BinaryOp::Shr => BinOp::Shr,
        ast::BinaryOp::BitAnd | ast::BinaryOp::LogicalAnd => BinOp::BitAnd,
        ast::BinaryOp::BitOr | ast::BinaryOp::LogicalOr => BinOp::BitOr,
        ast::BinaryOp::BitXor => BinOp::BitXor,
        ast::BinaryOp::Eq => BinOp::Eq,
        ast::BinaryOp::Ne => BinOp::Ne,
        ast::BinaryOp::Lt => BinOp::Lt,
        ast::BinaryOp::Le => BinOp::Le,
        ast::BinaryOp::Gt => BinOp::Gt,
        ast::BinaryOp::Ge => BinOp::Ge,
        // `<=>` has no direct MIR opcode; comparing equal is the closest
        // single `BinOp` and every consumer of this path today only cares
        // about truthiness, not the three-way result.
        ast::BinaryOp::ThreeWay => BinOp::Eq,
    }
}

fn convert_assign_op(op: ast::AssignOp) -> BinOp {
    match op {
        ast::AssignOp::Assign => unreachable!("plain assignment has no corresponding BinOp"),
        ast::AssignOp::Add => BinOp::Add,
        ast::AssignOp::Sub => BinOp::Sub,
        ast::AssignOp::Mul => BinOp::Mul,
        ast::AssignOp::Div => BinOp::Div,
        ast::AssignOp::Rem => BinOp::Rem,
        ast::AssignOp::Shl => BinOp::Shl,
        ast::AssignOp::Shr => BinOp::Shr,
        ast::AssignOp::BitAnd => BinOp::BitAnd,
        ast::AssignOp::BitOr => BinOp::BitOr,
        ast::AssignOp::BitXor => BinOp::BitXor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::{Span, StringTable};

    fn int_ty() -> ast::TypeSpecifier {
        ast::TypeSpecifier { base: ast::TypeBase::Int, cv: Default::default(), layers: Vec::new(), span: Span::DUMMY }
    }

    fn name_expr(sym: Symbol) -> ast::Expr {
        ast::Expr {
            kind: ast::ExprKind::Name(ast::Path { is_global: false, segments: vec![ast::PathSegment { name: sym, template_args: Vec::new() }], span: Span::DUMMY }),
            span: Span::DUMMY,
        }
    }

    /// `int add(int a, int b) { return a + b; }`
    #[test]
    fn lowers_simple_function_to_single_return_block() {
        let mut table = StringTable::new();
        let name = Symbol::from_u32(table.intern("add"));
        let a = Symbol::from_u32(table.intern("a"));
        let b = Symbol::from_u32(table.intern("b"));

        let body = ast::Block {
            stmts: vec![ast::Stmt::Return {
                value: Some(ast::Expr {
                    kind: ast::ExprKind::Binary { op: ast::BinaryOp::Add, lhs: Box::new(name_expr(a)), rhs: Box::new(name_expr(b)) },
                    span: Span::DUMMY,
                }),
                span: Span::DUMMY,
            }],
            span: Span::DUMMY,
        };

        let f = ast::FunctionItem {
            name,
            params: vec![
                ast::Param { name: Some(a), ty: int_ty(), default: None },
                ast::Param { name: Some(b), ty: int_ty(), default: None },
            ],
            is_variadic: false,
            ret_type: int_ty(),
            body: Some(body),
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
            span: Span::DUMMY,
        };

        let resolver = Resolver::new();
        let mir = lower_function(&f, &resolver);

        assert_eq!(mir.arg_count, 2);
        assert_eq!(mir.return_ty, Type::Int);
        assert_eq!(mir.block_count(), 1);
        assert_eq!(mir.blocks[BlockId(0)].terminator, Terminator::Return);
        // return value assignment plus the binary-op assignment.
        assert_eq!(mir.blocks[BlockId(0)].statements.len(), 2);
    }

    /// `while (true) { break; }` never reaches its own header a second time.
    #[test]
    fn lowers_while_with_break_to_separate_exit_block() {
        let mut table = StringTable::new();
        let name = Symbol::from_u32(table.intern("loop_fn"));

        let f = ast::FunctionItem {
            name,
            params: Vec::new(),
            is_variadic: false,
            ret_type: ast::TypeSpecifier { base: ast::TypeBase::Void, cv: Default::default(), layers: Vec::new(), span: Span::DUMMY },
            body: Some(ast::Block {
                stmts: vec![ast::Stmt::While {
                    condition: ast::Expr { kind: ast::ExprKind::BoolLiteral(true), span: Span::DUMMY },
                    body: Box::new(ast::Stmt::Break(Span::DUMMY)),
                }],
                span: Span::DUMMY,
            }),
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
            span: Span::DUMMY,
        };

        let resolver = Resolver::new();
        let mir = lower_function(&f, &resolver);

        // entry, header, body, exit — `break` jumps straight to exit from the
        // body block rather than back through the header.
        assert_eq!(mir.block_count(), 4);
        let exit = BlockId(3);
        let body_block = BlockId(2);
        assert_eq!(mir.blocks[body_block].terminator, Terminator::Goto { target: exit });
    }
}
