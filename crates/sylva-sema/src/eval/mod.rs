// src/eval/mod.rs
//
// The constant evaluator: a bound-tree interpreter producing four-state
// values. Control flow threads explicit state — local variable frames, a
// return slot per call, a break/continue signal — rather than host-level
// recursion tricks, and function recursion is bounded by the configured
// depth limit.
//
// The binder has already widened context-determined operands; binary
// operations here assert equal widths and never re-widen.

use rustc_hash::FxHashMap;
use sylva_numeric::{ConstantValue, Logic, SVInt};
use sylva_text::SourceRange;

use crate::binder::{
    BinaryOp, CaseItem, ExprKind, Expression, Statement, StmtKind, SystemFunc, UnaryOp,
};
use crate::compilation::Compilation;
use crate::errors::EvalError;
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::{Type, TypeId};

/// Result of executing one statement.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Option<ConstantValue>),
}

struct Frame {
    locals: FxHashMap<SymbolId, ConstantValue>,
}

pub struct EvalContext<'a> {
    comp: &'a Compilation,
    frames: Vec<Frame>,
    /// Values of unit-scope variables, owned by the caller (a scripting
    /// session keeps these alive across inputs).
    globals: Option<&'a mut FxHashMap<SymbolId, ConstantValue>>,
    depth: usize,
    steps: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(comp: &'a Compilation) -> EvalContext<'a> {
        EvalContext {
            comp,
            frames: Vec::new(),
            globals: None,
            depth: 0,
            steps: 0,
        }
    }

    pub fn with_globals(
        comp: &'a Compilation,
        globals: &'a mut FxHashMap<SymbolId, ConstantValue>,
    ) -> EvalContext<'a> {
        EvalContext {
            comp,
            frames: Vec::new(),
            globals: Some(globals),
            depth: 0,
            steps: 0,
        }
    }

    fn error(&self, error: EvalError, range: SourceRange) {
        self.comp
            .diagnostics
            .borrow_mut()
            .add(sylva_text::Diagnostic::new(&error, range));
    }

    fn read_symbol(&mut self, id: SymbolId, range: SourceRange) -> ConstantValue {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.locals.get(&id) {
                return v.clone();
            }
        }
        if let Some(globals) = &self.globals {
            if let Some(v) = globals.get(&id) {
                return v.clone();
            }
        }

        let sym = self.comp.symbol(id);
        match &sym.kind {
            SymbolKind::Parameter { .. } => self.comp.parameter_value(id),
            SymbolKind::EnumValue { value, .. } => ConstantValue::Int(value.clone()),
            _ => {
                self.error(
                    EvalError::ValueNotAvailable { name: sym.name.clone() },
                    range,
                );
                ConstantValue::Invalid
            }
        }
    }

    fn write_symbol(&mut self, id: SymbolId, value: ConstantValue) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.locals.get_mut(&id) {
                *slot = value;
                return;
            }
        }
        if let Some(globals) = &mut self.globals {
            if globals.contains_key(&id) {
                globals.insert(id, value);
                return;
            }
        }
        // A fresh binding lands in the innermost frame, or the globals if
        // no call is active.
        match self.frames.last_mut() {
            Some(frame) => {
                frame.locals.insert(id, value);
            }
            None => {
                if let Some(globals) = &mut self.globals {
                    globals.insert(id, value);
                }
            }
        }
    }

    /// The default (uninitialized) value of a type: all-X for four-state
    /// integrals, zero for two-state.
    pub fn default_value(&self, ty: TypeId) -> ConstantValue {
        let types = self.comp.types.borrow();
        if types.is_integral(ty) {
            let width = types.bit_width(ty).max(1);
            let signed = types.is_signed(ty);
            if types.is_four_state(ty) {
                ConstantValue::Int(SVInt::filled(width, signed, Logic::X))
            } else {
                ConstantValue::Int(SVInt::zero(width, signed))
            }
        } else if types.is_floating(ty) {
            ConstantValue::Real(0.0)
        } else if types.is_string(ty) {
            ConstantValue::Str(String::new())
        } else {
            ConstantValue::Invalid
        }
    }

    // ----- expressions ----------------------------------------------------

    pub fn eval(&mut self, expr: &Expression) -> ConstantValue {
        match &expr.kind {
            ExprKind::Invalid => ConstantValue::Invalid,
            ExprKind::IntLiteral(v) => ConstantValue::Int(v.clone()),
            ExprKind::RealLiteral(v) => ConstantValue::Real(*v),
            ExprKind::StringLiteral(s) => ConstantValue::Str(s.clone()),
            ExprKind::UnbasedUnsizedLiteral(l) => {
                // Self-determined use: a single bit of the given state.
                let mut v = SVInt::zero(1, false);
                v.set_bit(0, *l);
                ConstantValue::Int(v)
            }
            ExprKind::NullLiteral => ConstantValue::Null,
            ExprKind::UnboundedLiteral => ConstantValue::Unbounded,
            ExprKind::NamedValue(id) | ExprKind::HierarchicalValue(id) => {
                self.read_symbol(*id, expr.range)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand);
                self.eval_unary(*op, value)
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, expr),
            ExprKind::Conditional { cond, if_true, if_false } => {
                let c = self.eval(cond);
                match c.to_logic() {
                    Logic::One => self.eval(if_true),
                    Logic::Zero => self.eval(if_false),
                    // Unknown selector: merge the branches bit-by-bit.
                    _ => {
                        let t = self.eval(if_true);
                        let f = self.eval(if_false);
                        merge_conditional(t, f)
                    }
                }
            }
            ExprKind::Concat { parts } => {
                let mut values = Vec::new();
                for part in parts {
                    if let ExprKind::Replication { count: 0, .. } = part.kind {
                        continue;
                    }
                    match self.eval(part) {
                        ConstantValue::Int(v) => values.push(v),
                        _ => return ConstantValue::Invalid,
                    }
                }
                if values.is_empty() {
                    return ConstantValue::Invalid;
                }
                ConstantValue::Int(SVInt::concat(&values))
            }
            ExprKind::Replication { count, operand } => {
                if *count == 0 {
                    return ConstantValue::Invalid;
                }
                match self.eval(operand) {
                    ConstantValue::Int(v) => ConstantValue::Int(v.replicate(*count)),
                    _ => ConstantValue::Invalid,
                }
            }
            ExprKind::ElementSelect { value, index } => {
                let v = self.eval(value);
                let ix = self.eval(index);
                self.eval_element_select(v, ix, expr)
            }
            ExprKind::RangeSelect { value, msb, lsb } => match self.eval(value) {
                ConstantValue::Int(v) => {
                    ConstantValue::Int(v.slice(*msb as u32, (*lsb).max(0) as u32))
                }
                _ => ConstantValue::Invalid,
            },
            ExprKind::MemberSelect { value, field } => {
                let v = self.eval(value);
                self.eval_member_select(value.ty, v, *field)
            }
            ExprKind::Call { subroutine, args } => self.eval_call(*subroutine, args, expr),
            ExprKind::SystemCall { func, args } => self.eval_system_call(*func, args),
            ExprKind::Conversion { operand } => {
                // Unbased unsized literals expand to the context width
                // with the fill bit replicated.
                if let ExprKind::UnbasedUnsizedLiteral(l) = operand.kind {
                    let (width, signed, _) = self.comp.integral_traits(expr.ty);
                    return ConstantValue::Int(SVInt::filled(width.max(1), signed, l));
                }
                let value = self.eval(operand);
                self.convert(value, expr.ty)
            }
            ExprKind::Assignment { target, value, .. } => {
                let v = self.eval(value);
                self.write_symbol(*target, v.clone());
                v
            }
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, value: ConstantValue) -> ConstantValue {
        match (op, value) {
            (_, ConstantValue::Invalid) => ConstantValue::Invalid,
            (UnaryOp::Plus, v) => v,
            (UnaryOp::Minus, ConstantValue::Int(v)) => ConstantValue::Int(v.negate()),
            (UnaryOp::Minus, ConstantValue::Real(v)) => ConstantValue::Real(-v),
            (UnaryOp::BitwiseNot, ConstantValue::Int(v)) => ConstantValue::Int(v.bitnot()),
            (UnaryOp::LogicalNot, v) => logic_result(v.to_logic().not()),
            (UnaryOp::ReductionAnd, ConstantValue::Int(v)) => logic_result(v.reduction_and()),
            (UnaryOp::ReductionNand, ConstantValue::Int(v)) => {
                logic_result(v.reduction_and().not())
            }
            (UnaryOp::ReductionOr, ConstantValue::Int(v)) => logic_result(v.reduction_or()),
            (UnaryOp::ReductionNor, ConstantValue::Int(v)) => logic_result(v.reduction_or().not()),
            (UnaryOp::ReductionXor, ConstantValue::Int(v)) => logic_result(v.reduction_xor()),
            (UnaryOp::ReductionXnor, ConstantValue::Int(v)) => {
                logic_result(v.reduction_xor().not())
            }
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        expr: &Expression,
    ) -> ConstantValue {
        // Logical operators evaluate both sides (constant context) and
        // combine four-state truth.
        if matches!(
            op,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::LogicalImplies | BinaryOp::LogicalIff
        ) {
            let l = self.eval(left).to_logic();
            let r = self.eval(right).to_logic();
            let out = match op {
                BinaryOp::LogicalAnd => l.and(r),
                BinaryOp::LogicalOr => l.or(r),
                BinaryOp::LogicalImplies => l.not().or(r),
                _ => l.xor(r).not(),
            };
            return logic_result(out);
        }

        let lv = self.eval(left);
        let rv = self.eval(right);
        match (lv, rv) {
            (ConstantValue::Int(l), ConstantValue::Int(r)) => {
                self.eval_int_binary(op, l, r, expr)
            }
            (ConstantValue::Real(l), ConstantValue::Real(r)) => eval_real_binary(op, l, r),
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_int_binary(
        &mut self,
        op: BinaryOp,
        l: SVInt,
        r: SVInt,
        expr: &Expression,
    ) -> ConstantValue {
        use BinaryOp::*;
        let signed = l.is_signed() && r.is_signed();
        let value = match op {
            Add => l.add(&r),
            Sub => l.sub(&r),
            Mul => l.mul(&r),
            Div => {
                if r.is_zero() {
                    self.error(EvalError::DivideByZero, expr.range);
                }
                l.div(&r)
            }
            Mod => {
                if r.is_zero() {
                    self.error(EvalError::DivideByZero, expr.range);
                }
                l.rem(&r)
            }
            Pow => l.pow(&r),
            BitAnd => l.bitand(&r),
            BitOr => l.bitor(&r),
            BitXor => l.bitxor(&r),
            BitXnor => l.bitxor(&r).bitnot(),
            Shl | AShl | LShr | AShr => {
                let Some(amount) = r.as_u64() else {
                    // Unknown shift amounts poison the whole result.
                    return ConstantValue::Int(SVInt::filled(
                        l.width(),
                        l.is_signed(),
                        Logic::X,
                    ));
                };
                let amount = amount.min(u32::MAX as u64) as u32;
                match op {
                    Shl | AShl => l.shl(amount),
                    LShr => l.lshr(amount),
                    _ => l.ashr(amount),
                }
            }
            Eq => return logic_result(l.logical_eq(&r)),
            Ne => return logic_result(l.logical_eq(&r).not()),
            CaseEq => return logic_result(Logic::from_bool(l.case_eq(&r))),
            CaseNe => return logic_result(Logic::from_bool(!l.case_eq(&r))),
            WildcardEq => return logic_result(l.wildcard_eq(&r)),
            WildcardNe => return logic_result(l.wildcard_eq(&r).not()),
            Lt => return logic_result(l.less_than(&r, signed)),
            Le => return logic_result(r.less_than(&l, signed).not()),
            Gt => return logic_result(r.less_than(&l, signed)),
            Ge => return logic_result(l.less_than(&r, signed).not()),
            LogicalAnd | LogicalOr | LogicalImplies | LogicalIff => unreachable!(),
        };
        ConstantValue::Int(value)
    }

    fn eval_element_select(
        &mut self,
        value: ConstantValue,
        index: ConstantValue,
        expr: &Expression,
    ) -> ConstantValue {
        let index = match index.integer().and_then(|v| v.as_i64()) {
            Some(ix) => ix,
            None => {
                // An unknown index reads as X.
                return self.default_unknown(expr.ty);
            }
        };
        match value {
            ConstantValue::Int(v) => {
                if index < 0 || index as u32 >= v.width() {
                    self.error(EvalError::IndexOutOfRange { index }, expr.range);
                    return self.default_unknown(expr.ty);
                }
                let mut out = SVInt::zero(1, false);
                out.set_bit(0, v.get_bit(index as u32));
                ConstantValue::Int(out)
            }
            ConstantValue::Array(elems) | ConstantValue::Queue(elems) => {
                match elems.get(index as usize) {
                    Some(e) => e.clone(),
                    None => {
                        self.error(EvalError::IndexOutOfRange { index }, expr.range);
                        self.default_unknown(expr.ty)
                    }
                }
            }
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_member_select(
        &self,
        value_ty: TypeId,
        value: ConstantValue,
        field: usize,
    ) -> ConstantValue {
        match value {
            ConstantValue::Struct(fields) => {
                fields.get(field).cloned().unwrap_or(ConstantValue::Invalid)
            }
            ConstantValue::Int(v) => {
                // Packed struct: fields lay out MSB-first.
                let types = self.comp.types.borrow();
                let canonical = types.canonical(value_ty);
                let Type::PackedStruct { fields, .. } = types.get(canonical) else {
                    return ConstantValue::Invalid;
                };
                let mut msb = types.bit_width(canonical) as i64 - 1;
                for (i, f) in fields.iter().enumerate() {
                    let w = types.bit_width(f.ty) as i64;
                    if i == field {
                        return ConstantValue::Int(
                            v.slice(msb as u32, (msb - w + 1).max(0) as u32),
                        );
                    }
                    msb -= w;
                }
                ConstantValue::Invalid
            }
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_call(
        &mut self,
        subroutine: SymbolId,
        args: &[Expression],
        expr: &Expression,
    ) -> ConstantValue {
        if self.depth >= self.comp.options.max_constexpr_depth {
            self.error(EvalError::ExceededMaxDepth, expr.range);
            return ConstantValue::Invalid;
        }

        let Some(body) = self.comp.subroutine_body(subroutine) else {
            self.error(EvalError::NotConstant, expr.range);
            return ConstantValue::Invalid;
        };
        let formals = self.comp.subroutine_args(subroutine);
        let ret_ty = self.comp.subroutine_return_type(subroutine);

        // Arguments bind by copy into the new frame.
        let mut frame = Frame {
            locals: FxHashMap::default(),
        };
        for (formal, arg) in formals.iter().zip(args) {
            let value = self.eval(arg);
            frame.locals.insert(*formal, value);
        }

        // The implicit return variable starts out as the type's default.
        let ret_var = self.return_variable(subroutine);
        if let Some(ret_var) = ret_var {
            frame.locals.insert(ret_var, self.default_value(ret_ty));
        }

        self.frames.push(frame);
        self.depth += 1;
        let flow = self.exec(&body);
        self.depth -= 1;
        let frame = self.frames.pop().expect("call frame");

        let raw = match flow {
            Flow::Return(Some(v)) => v,
            _ => match ret_var.and_then(|rv| frame.locals.get(&rv).cloned()) {
                Some(v) => v,
                None => ConstantValue::Invalid,
            },
        };
        self.convert(raw, ret_ty)
    }

    fn return_variable(&self, subroutine: SymbolId) -> Option<SymbolId> {
        let name = self.comp.symbol(subroutine).name.clone();
        let scope = self.comp.subroutine_scope(subroutine);
        self.comp.with_scope(scope, |data| data.name_map.get(&name).copied())
    }

    fn eval_system_call(&mut self, func: SystemFunc, args: &[Expression]) -> ConstantValue {
        match func {
            SystemFunc::Clog2 => {
                let Some(arg) = args.first() else {
                    return ConstantValue::Invalid;
                };
                let value = self.eval(arg);
                let Some(v) = value.integer() else {
                    return ConstantValue::Invalid;
                };
                if v.has_unknown() {
                    return ConstantValue::Int(SVInt::filled(32, true, Logic::X));
                }
                ConstantValue::Int(SVInt::from_u64(clog2(v)))
            }
            SystemFunc::Bits => {
                let width = args
                    .first()
                    .map(|a| self.comp.types.borrow().bit_width(a.ty))
                    .unwrap_or(0);
                ConstantValue::Int(SVInt::from_u64(width as u64))
            }
            SystemFunc::Signed | SystemFunc::Unsigned => {
                let Some(arg) = args.first() else {
                    return ConstantValue::Invalid;
                };
                match self.eval(arg) {
                    ConstantValue::Int(v) => ConstantValue::Int(if func == SystemFunc::Signed {
                        v.as_signed()
                    } else {
                        v.as_unsigned()
                    }),
                    other => other,
                }
            }
        }
    }

    /// Value conversion to a target type, following the source value's
    /// signedness for width extension.
    pub fn convert(&self, value: ConstantValue, target: TypeId) -> ConstantValue {
        let types = self.comp.types.borrow();
        if types.is_error(target) {
            return value;
        }
        if types.is_integral(target) {
            let width = types.bit_width(target).max(1);
            let signed = types.is_signed(target);
            let four_state = types.is_four_state(target);
            drop(types);
            return match value {
                ConstantValue::Int(v) => {
                    let mut out = v.resize(width);
                    out = if signed { out.as_signed() } else { out.as_unsigned() };
                    if !four_state && out.has_unknown() {
                        // Two-state targets flatten X/Z to zero.
                        out = flatten_unknown(&out);
                    }
                    ConstantValue::Int(out)
                }
                ConstantValue::Real(r) => {
                    let rounded = r.round();
                    let mut out = SVInt::from_i64(rounded as i64).resize(width);
                    out = if signed { out.as_signed() } else { out.as_unsigned() };
                    ConstantValue::Int(out)
                }
                other => other,
            };
        }
        if types.is_floating(target) {
            drop(types);
            return match value {
                ConstantValue::Int(v) => {
                    let f = match v.as_i64() {
                        Some(i) if v.is_signed() => i as f64,
                        _ => v.as_u64().map(|u| u as f64).unwrap_or(f64::NAN),
                    };
                    ConstantValue::Real(f)
                }
                other => other,
            };
        }
        value
    }

    fn default_unknown(&self, ty: TypeId) -> ConstantValue {
        let (width, signed, four) = self.comp.integral_traits(ty);
        if four {
            ConstantValue::Int(SVInt::filled(width.max(1), signed, Logic::X))
        } else {
            ConstantValue::Int(SVInt::zero(width.max(1), signed))
        }
    }

    // ----- statements -----------------------------------------------------

    /// Executes a statement list at the top level (no enclosing call).
    pub fn exec_root(&mut self, stmt: &Statement) -> ConstantValue {
        match self.exec(stmt) {
            Flow::Return(Some(v)) => v,
            _ => ConstantValue::Invalid,
        }
    }

    fn step(&mut self, range: SourceRange) -> bool {
        self.steps += 1;
        if self.steps > self.comp.options.max_constexpr_steps {
            self.error(EvalError::InfiniteLoop, range);
            return false;
        }
        true
    }

    fn exec(&mut self, stmt: &Statement) -> Flow {
        match &stmt.kind {
            StmtKind::Invalid | StmtKind::Empty => Flow::Normal,
            StmtKind::Block(stmts) => {
                for s in stmts {
                    match self.exec(s) {
                        Flow::Normal => {}
                        other => return other,
                    }
                }
                Flow::Normal
            }
            StmtKind::VarDecl { symbol, initializer } => {
                let value = match initializer {
                    Some(init) => self.eval(init),
                    None => {
                        let ty = self.comp.symbol_type(*symbol);
                        self.default_value(ty)
                    }
                };
                match self.frames.last_mut() {
                    Some(frame) => {
                        frame.locals.insert(*symbol, value);
                    }
                    None => {
                        if let Some(globals) = &mut self.globals {
                            globals.insert(*symbol, value);
                        }
                    }
                }
                Flow::Normal
            }
            StmtKind::Expr(expr) => {
                self.eval(expr);
                Flow::Normal
            }
            StmtKind::If { cond, then_stmt, else_stmt } => {
                let c = self.eval(cond);
                if c.is_true() {
                    self.exec(then_stmt)
                } else if let Some(e) = else_stmt {
                    self.exec(e)
                } else {
                    Flow::Normal
                }
            }
            StmtKind::Case { expr, items, default } => {
                let selector = self.eval(expr);
                let Some(sel) = selector.integer() else {
                    return Flow::Normal;
                };
                for CaseItem { exprs, stmt } in items {
                    for e in exprs {
                        let v = self.eval(e);
                        if let Some(v) = v.integer() {
                            if sel.case_eq(&v.resize(sel.width())) {
                                return self.exec(stmt);
                            }
                        }
                    }
                }
                match default {
                    Some(d) => self.exec(d),
                    None => Flow::Normal,
                }
            }
            StmtKind::For { init, cond, steps, body } => {
                for s in init {
                    self.exec(s);
                }
                loop {
                    if !self.step(stmt.range) {
                        return Flow::Normal;
                    }
                    if let Some(c) = cond {
                        if !self.eval(c).is_true() {
                            break;
                        }
                    }
                    match self.exec(body) {
                        Flow::Break => break,
                        Flow::Return(v) => return Flow::Return(v),
                        Flow::Normal | Flow::Continue => {}
                    }
                    for s in steps {
                        self.eval(s);
                    }
                }
                Flow::Normal
            }
            StmtKind::While { cond, body } => {
                loop {
                    if !self.step(stmt.range) {
                        return Flow::Normal;
                    }
                    if !self.eval(cond).is_true() {
                        break;
                    }
                    match self.exec(body) {
                        Flow::Break => break,
                        Flow::Return(v) => return Flow::Return(v),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Flow::Normal
            }
            StmtKind::DoWhile { cond, body } => {
                loop {
                    if !self.step(stmt.range) {
                        return Flow::Normal;
                    }
                    match self.exec(body) {
                        Flow::Break => break,
                        Flow::Return(v) => return Flow::Return(v),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval(cond).is_true() {
                        break;
                    }
                }
                Flow::Normal
            }
            StmtKind::Repeat { count, body } => {
                let n = self
                    .eval(count)
                    .integer()
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0);
                for _ in 0..n {
                    if !self.step(stmt.range) {
                        return Flow::Normal;
                    }
                    match self.exec(body) {
                        Flow::Break => break,
                        Flow::Return(v) => return Flow::Return(v),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Flow::Normal
            }
            StmtKind::Forever { body } => loop {
                if !self.step(stmt.range) {
                    return Flow::Normal;
                }
                match self.exec(body) {
                    Flow::Break => return Flow::Normal,
                    Flow::Return(v) => return Flow::Return(v),
                    Flow::Normal | Flow::Continue => {}
                }
            },
            StmtKind::Return(expr) => {
                let value = expr.as_ref().map(|e| self.eval(e));
                Flow::Return(value)
            }
            StmtKind::Break => Flow::Break,
            StmtKind::Continue => Flow::Continue,
        }
    }
}

fn eval_real_binary(op: BinaryOp, l: f64, r: f64) -> ConstantValue {
    use BinaryOp::*;
    match op {
        Add => ConstantValue::Real(l + r),
        Sub => ConstantValue::Real(l - r),
        Mul => ConstantValue::Real(l * r),
        Div => ConstantValue::Real(l / r),
        Pow => ConstantValue::Real(l.powf(r)),
        Eq => logic_result(Logic::from_bool(l == r)),
        Ne => logic_result(Logic::from_bool(l != r)),
        Lt => logic_result(Logic::from_bool(l < r)),
        Le => logic_result(Logic::from_bool(l <= r)),
        Gt => logic_result(Logic::from_bool(l > r)),
        Ge => logic_result(Logic::from_bool(l >= r)),
        _ => ConstantValue::Invalid,
    }
}

fn logic_result(l: Logic) -> ConstantValue {
    let mut v = SVInt::zero(1, false);
    v.set_bit(0, l);
    ConstantValue::Int(v)
}

/// Bitwise merge for a conditional with unknown selector: agreeing known
/// bits survive, everything else becomes X.
fn merge_conditional(t: ConstantValue, f: ConstantValue) -> ConstantValue {
    match (t, f) {
        (ConstantValue::Int(t), ConstantValue::Int(f)) if t.width() == f.width() => {
            let mut out = SVInt::zero(t.width(), t.is_signed() && f.is_signed());
            for i in 0..t.width() {
                let tb = t.get_bit(i);
                let fb = f.get_bit(i);
                let bit = if tb == fb && !tb.is_unknown() { tb } else { Logic::X };
                out.set_bit(i, bit);
            }
            ConstantValue::Int(out)
        }
        (ConstantValue::Real(t), ConstantValue::Real(f)) if t == f => ConstantValue::Real(t),
        _ => ConstantValue::Invalid,
    }
}

/// Two-state flattening: X/Z bits become zero.
fn flatten_unknown(v: &SVInt) -> SVInt {
    let mut out = SVInt::zero(v.width(), v.is_signed());
    for i in 0..v.width() {
        if v.get_bit(i) == Logic::One {
            out.set_bit(i, Logic::One);
        }
    }
    out
}

/// Ceiling log2 per `$clog2`: 0 for values <= 1.
fn clog2(v: &SVInt) -> u64 {
    // Highest set bit of (v - 1).
    let one = SVInt::new(v.width(), false, 1);
    if v.is_zero() || v.case_eq(&one) {
        return 0;
    }
    let m = v.sub(&one);
    let mut highest = 0;
    for i in 0..m.width() {
        if m.get_bit(i) == Logic::One {
            highest = i;
        }
    }
    (highest + 1) as u64
}
