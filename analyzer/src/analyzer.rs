//! Main analyzer implementation.

use crate::catalog::{self, FnSig, OLD_RECORD, RECORD};
use crate::{AnalyzerError, Scope, VarBinding};
use std::collections::HashSet;
use warden_parser::{
    parse_expression, parse_program, AssignStmt, AssignTarget, Call, Expr, IfStmt, Program, Span,
    Stmt,
};

/// The Analyzer performs name resolution and capability checks on a parsed
/// snippet. It does not execute anything.
pub struct Analyzer {
    /// Current variable scope.
    scope: Scope,
    /// Modules brought in by `import`.
    imports: HashSet<String>,
    /// Expression mode: every allow-listed module is callable without import.
    all_modules: bool,
    loop_depth: usize,
    /// Accumulated errors (analysis continues after the first one).
    errors: Vec<AnalyzerError>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            scope: Scope::new(),
            imports: HashSet::new(),
            all_modules: false,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    /// Make every allow-listed module available without `import`.
    pub fn with_all_modules(mut self) -> Self {
        self.all_modules = true;
        self
    }

    /// Analyze a whole snippet.
    pub fn analyze_program(mut self, program: &Program) -> Result<(), Vec<AnalyzerError>> {
        for stmt in &program.stmts {
            self.analyze_stmt(stmt);
        }
        self.finish()
    }

    /// Analyze a standalone expression.
    pub fn analyze_expression(mut self, expr: &Expr) -> Result<(), Vec<AnalyzerError>> {
        self.analyze_expr(expr);
        self.finish()
    }

    fn finish(self) -> Result<(), Vec<AnalyzerError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn error(&mut self, err: AnalyzerError) {
        self.errors.push(err);
    }

    // ==================== STATEMENTS ====================

    fn analyze_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(l) => {
                self.analyze_expr(&l.value);
                self.declare(VarBinding::local(&l.name), l.span);
            }
            Stmt::Assign(a) => self.analyze_assign(a),
            Stmt::Import(i) => {
                for (name, span) in &i.modules {
                    if catalog::is_dunder(name) {
                        self.error(AnalyzerError::dunder_access(name, *span));
                    } else if catalog::is_module(name) {
                        self.imports.insert(name.clone());
                    } else {
                        self.error(AnalyzerError::forbidden_import(name, *span));
                    }
                }
            }
            Stmt::If(i) => self.analyze_if(i),
            Stmt::For(f) => {
                self.analyze_expr(&f.iterable);
                self.scope.push();
                self.declare(VarBinding::loop_var(&f.var), f.span);
                self.loop_depth += 1;
                for stmt in &f.body {
                    self.analyze_stmt(stmt);
                }
                self.loop_depth -= 1;
                self.scope.pop();
            }
            Stmt::While(w) => {
                self.analyze_expr(&w.condition);
                self.loop_depth += 1;
                self.analyze_block(&w.body);
                self.loop_depth -= 1;
            }
            Stmt::Break(span) => self.check_in_loop("break", *span),
            Stmt::Continue(span) => self.check_in_loop("continue", *span),
            Stmt::Return(_) => {}
            Stmt::Expr(e) => self.analyze_expr(e),
        }
    }

    fn analyze_block(&mut self, block: &[Stmt]) {
        self.scope.push();
        for stmt in block {
            self.analyze_stmt(stmt);
        }
        self.scope.pop();
    }

    fn analyze_if(&mut self, stmt: &IfStmt) {
        for (condition, body) in &stmt.branches {
            self.analyze_expr(condition);
            self.analyze_block(body);
        }
        if let Some(body) = &stmt.else_block {
            self.analyze_block(body);
        }
    }

    fn check_in_loop(&mut self, keyword: &'static str, span: Span) {
        if self.loop_depth == 0 {
            self.error(AnalyzerError::loop_control_outside_loop(keyword, span));
        }
    }

    fn declare(&mut self, binding: VarBinding, span: Span) {
        if !self.check_name(&binding.name, span) {
            return;
        }
        if catalog::is_reserved(&binding.name) {
            self.error(AnalyzerError::reserved_name(&binding.name, span));
            return;
        }
        let name = binding.name.clone();
        if !self.scope.define(binding) {
            self.error(AnalyzerError::duplicate_variable(name, span));
        }
    }

    fn analyze_assign(&mut self, stmt: &AssignStmt) {
        self.analyze_expr(&stmt.value);

        match &stmt.target {
            AssignTarget::Var(name, span) => {
                if !self.check_name(name, *span) {
                    return;
                }
                if catalog::is_reserved(name) {
                    self.error(AnalyzerError::read_only(name, *span));
                    return;
                }
                match self.scope.lookup(name) {
                    None => self.error(AnalyzerError::undefined_variable(name, *span)),
                    Some(binding) if !binding.mutable => {
                        self.error(AnalyzerError::read_only(name, *span))
                    }
                    Some(_) => {}
                }
            }
            AssignTarget::Field { base, field, span } => {
                if self.check_name(field, *span) {
                    self.check_container(base, *span);
                }
            }
            AssignTarget::Index { base, index, span } => {
                self.analyze_expr(index);
                self.check_container(base, *span);
            }
        }
    }

    /// A name whose fields or elements are being written.
    fn check_container(&mut self, base: &str, span: Span) {
        if !self.check_name(base, span) || base == RECORD {
            return;
        }
        if catalog::is_reserved(base) {
            self.error(AnalyzerError::read_only(base, span));
            return;
        }
        match self.scope.lookup(base) {
            None => self.error(AnalyzerError::undefined_variable(base, span)),
            Some(binding) if !binding.mutable => self.error(AnalyzerError::read_only(base, span)),
            Some(_) => {}
        }
    }

    // ==================== EXPRESSIONS ====================

    fn analyze_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Var(name, span) => {
                if !self.check_name(name, *span) {
                    return;
                }
                if name == RECORD || name == OLD_RECORD || self.scope.is_defined(name) {
                    return;
                }
                if catalog::builtin(name).is_some() || catalog::is_module(name) {
                    self.error(AnalyzerError::not_a_value(name, *span));
                } else {
                    self.error(AnalyzerError::undefined_variable(name, *span));
                }
            }
            Expr::Field(base, name, span) => {
                self.analyze_expr(base);
                self.check_name(name, *span);
            }
            Expr::Index(base, index, _) => {
                self.analyze_expr(base);
                self.analyze_expr(index);
            }
            Expr::Call(call) => self.analyze_call(call),
            Expr::MethodCall(receiver, call) => self.analyze_method_call(receiver, call),
            Expr::BinaryOp(_, left, right, _) => {
                self.analyze_expr(left);
                self.analyze_expr(right);
            }
            Expr::UnaryOp(_, operand, _) => self.analyze_expr(operand),
            Expr::List(items, _) => {
                for item in items {
                    self.analyze_expr(item);
                }
            }
            Expr::Map(entries, _) => {
                for (_, value) in entries {
                    self.analyze_expr(value);
                }
            }
        }
    }

    fn analyze_call(&mut self, call: &Call) {
        if self.check_name(&call.name, call.span) {
            match catalog::builtin(&call.name) {
                Some(sig) => self.check_arity(sig, &call.name, call.args.len(), call.span),
                None => self.error(AnalyzerError::unknown_function(&call.name, call.span)),
            }
        }
        for arg in &call.args {
            self.analyze_expr(arg);
        }
    }

    fn analyze_method_call(&mut self, receiver: &Expr, call: &Call) {
        if let Expr::Var(name, span) = receiver {
            if let Some(module) = catalog::module(name) {
                if !self.all_modules && !self.imports.contains(name.as_str()) {
                    self.error(AnalyzerError::module_not_imported(name, *span));
                }
                let qualified = format!("{}.{}", name, call.name);
                if self.check_name(&call.name, call.span) {
                    match module.function(&call.name) {
                        Some(sig) => self.check_arity(sig, &qualified, call.args.len(), call.span),
                        None => self.error(AnalyzerError::unknown_function(qualified, call.span)),
                    }
                }
                for arg in &call.args {
                    self.analyze_expr(arg);
                }
                return;
            }
        }

        // `x.f(a)` is `f(x, a)`
        if self.check_name(&call.name, call.span) {
            match catalog::builtin(&call.name) {
                Some(sig) => self.check_arity(sig, &call.name, call.args.len() + 1, call.span),
                None => self.error(AnalyzerError::unknown_function(&call.name, call.span)),
            }
        }
        self.analyze_expr(receiver);
        for arg in &call.args {
            self.analyze_expr(arg);
        }
    }

    fn check_arity(&mut self, sig: &FnSig, name: &str, count: usize, span: Span) {
        if !sig.accepts(count) {
            self.error(AnalyzerError::wrong_arity(
                name,
                sig.min_args,
                sig.max_args,
                count,
                span,
            ));
        }
    }

    /// Report capability errors for a name. Returns `false` if one was reported.
    fn check_name(&mut self, name: &str, span: Span) -> bool {
        if catalog::is_dunder(name) {
            self.error(AnalyzerError::dunder_access(name, span));
            false
        } else if catalog::is_forbidden(name) {
            self.error(AnalyzerError::forbidden_primitive(name, span));
            false
        } else {
            true
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and analyze a snippet.
pub fn analyze_source(source: &str) -> Result<Program, Vec<AnalyzerError>> {
    let program = parse_program(source).map_err(|e| vec![AnalyzerError::from(e)])?;
    Analyzer::new().analyze_program(&program)?;
    Ok(program)
}

/// Parse and analyze a standalone expression, with all modules available.
pub fn analyze_expression_source(source: &str) -> Result<Expr, Vec<AnalyzerError>> {
    let expr = parse_expression(source).map_err(|e| vec![AnalyzerError::from(e)])?;
    Analyzer::new().with_all_modules().analyze_expression(&expr)?;
    Ok(expr)
}
