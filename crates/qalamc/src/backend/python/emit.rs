//! Python source emitter

use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::*;
use crate::frontend::sema::{PrimitiveType, TypeInfo};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

const INDENT: &str = "    ";

/// Names that would collide with Python syntax or with names the
/// generated module relies on. User identifiers in this set get a `_` suffix.
const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "float", "input", "int", "main", "math", "print", "range",
    "self", "sys",
];

/// Names bound by one Python function (or the module)
#[derive(Debug, Default)]
struct Frame {
    /// Variables and parameters, in declaration order
    variables: Vec<String>,
    /// Every name bound here, including constants, types and procedures
    bindings: HashSet<String>,
    types: HashMap<String, TypeInfo>,
    procedures: HashMap<String, Vec<PassMode>>,
}

impl Frame {
    fn for_block(block: &Block, params: &[Param]) -> Self {
        let mut frame = Frame::default();
        frame
            .variables
            .extend(params.iter().map(|p| p.name.clone()));
        frame.variables.extend(
            block
                .variables
                .iter()
                .flat_map(|decl| decl.names.iter().cloned()),
        );
        frame.bindings.extend(frame.variables.iter().cloned());
        frame
            .bindings
            .extend(block.constants.iter().map(|c| c.name.clone()));
        for def in &block.types {
            frame.bindings.insert(def.name.clone());
            frame.types.insert(def.name.clone(), def.ty.clone());
        }
        for proc in &block.procedures {
            frame.bindings.insert(proc.name.clone());
            frame
                .procedures
                .insert(proc.name.clone(), proc.params.iter().map(|p| p.mode).collect());
        }
        frame
    }
}

/// Code generator that converts a checked AST to Python 3 source
pub struct CodeGenerator {
    lines: Vec<String>,
    indent: usize,
    frames: Vec<Frame>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
            frames: Vec::new(),
        }
    }

    /// Generate a complete Python module for `program`
    pub fn generate(&mut self, program: &Program) -> CompileResult<String> {
        self.lines.clear();
        self.indent = 0;
        self.frames.clear();

        let block = &program.block;
        self.frames.push(Frame::for_block(block, &[]));

        self.line("#!/usr/bin/env python3");
        self.line("# -*- coding: utf-8 -*-");
        self.line("\"\"\"");
        self.line(format!("برنامج: {}", program.name));
        self.line(format!("Program: {}", program.name));
        self.line("مولّد تلقائياً من مترجم قلم");
        self.line("Auto-generated by the Qalam compiler");
        self.line("\"\"\"");
        self.blank();
        self.line("import sys");
        self.line("import math");
        self.blank();

        if !block.constants.is_empty() {
            self.line("# ===== الثوابت - Constants =====");
            for constant in &block.constants {
                self.emit_constant(constant);
            }
            self.blank();
        }

        if !block.types.is_empty() {
            self.line("# ===== الأنواع - Types =====");
            for def in &block.types {
                self.emit_type_def(def);
            }
            self.blank();
        }

        if !block.variables.is_empty() {
            self.line("# ===== المتغيرات - Variables =====");
            for decl in &block.variables {
                self.emit_var_decl(decl);
            }
            self.blank();
        }

        if !block.procedures.is_empty() {
            self.line("# ===== الإجراءات - Procedures =====");
            for proc in &block.procedures {
                self.emit_procedure(proc)?;
            }
        }

        self.line("# ===== البرنامج الرئيسي - Main Program =====");
        self.line("def main():");
        self.indent += 1;
        self.frames.push(Frame::default());
        self.emit_scope_declarations();
        self.emit_body(&block.body)?;
        self.frames.pop();
        self.indent -= 1;
        self.blank();

        self.line("if __name__ == '__main__':");
        self.indent += 1;
        self.line("main()");
        self.indent -= 1;

        let mut output = self.lines.join("\n");
        output.push('\n');
        Ok(output)
    }

    // =========================================================================
    // Output helpers
    // =========================================================================

    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        self.lines.push(format!("{}{}", INDENT.repeat(self.indent), text));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    fn emit_constant(&mut self, constant: &ConstantDef) {
        let value = literal(&constant.value);
        self.line(format!(
            "{} = {}  # ثابت - Constant",
            py_name(&constant.name),
            value
        ));
    }

    fn emit_type_def(&mut self, def: &TypeDef) {
        let name = py_name(&def.name);
        match &def.spec {
            TypeSpec::Record { fields } => {
                self.line(format!("class {}:", name));
                self.indent += 1;
                self.line("\"\"\"سجل - Record type\"\"\"");
                self.line("def __init__(self):");
                self.indent += 1;
                let mut emitted = false;
                for group in fields {
                    let default = self.default_value(&group.type_name);
                    for field in &group.names {
                        self.line(format!("self.{} = {}", py_name(field), default));
                        emitted = true;
                    }
                }
                if !emitted {
                    self.line("pass");
                }
                self.indent -= 2;
                self.blank();
            }
            TypeSpec::List { element, size } => {
                self.line(format!(
                    "# {}: قائمة من {} عنصر من نوع {}",
                    name, size, element
                ));
                self.line(format!(
                    "# {}: List of {} elements of type {}",
                    name, size, element
                ));
            }
        }
    }

    fn emit_var_decl(&mut self, decl: &VarDecl) {
        let default = self.default_value(&decl.type_name);
        for name in &decl.names {
            self.line(format!("{} = {}", py_name(name), default));
        }
    }

    /// Python expression building a fresh default value of a named type
    fn default_value(&self, type_name: &str) -> String {
        let user_type = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.types.get(type_name));

        match user_type {
            Some(TypeInfo::Record { .. }) => format!("{}()", py_name(type_name)),
            Some(TypeInfo::List { element, size }) => {
                let element_default = self.default_value(element);
                if self.is_primitive_name(element) {
                    format!("[{}] * {}", element_default, size)
                } else {
                    format!("[{} for _ in range({})]", element_default, size)
                }
            }
            Some(TypeInfo::Primitive(p)) => primitive_default(*p).to_string(),
            None => match PrimitiveType::from_name(type_name) {
                Some(p) => primitive_default(p).to_string(),
                None => "None".to_string(),
            },
        }
    }

    fn is_primitive_name(&self, type_name: &str) -> bool {
        let shadowed = self
            .frames
            .iter()
            .any(|frame| frame.types.contains_key(type_name));
        !shadowed && PrimitiveType::from_name(type_name).is_some()
    }

    fn emit_procedure(&mut self, proc: &ProcedureDef) -> CompileResult<()> {
        let params: Vec<_> = proc.params.iter().map(|p| py_name(&p.name)).collect();
        self.line(format!("def {}({}):", py_name(&proc.name), params.join(", ")));
        self.indent += 1;
        self.line(format!("\"\"\"اجراء - Procedure: {}\"\"\"", proc.name));

        self.frames.push(Frame::for_block(&proc.block, &proc.params));
        self.emit_scope_declarations();

        let block = &proc.block;
        for constant in &block.constants {
            self.emit_constant(constant);
        }
        for def in &block.types {
            self.emit_type_def(def);
        }
        for decl in &block.variables {
            self.emit_var_decl(decl);
        }
        for nested in &block.procedures {
            self.emit_procedure(nested)?;
        }
        self.emit_stmt(&block.body)?;

        let by_reference: Vec<_> = proc.by_reference_params().map(|p| py_name(&p.name)).collect();
        if !by_reference.is_empty() {
            self.line(format!("return {}", by_reference.join(", ")));
        }

        self.frames.pop();
        self.indent -= 1;
        self.blank();
        Ok(())
    }

    /// `global`/`nonlocal` lines for outer variables visible in the current frame
    fn emit_scope_declarations(&mut self) {
        for text in self.scope_declarations() {
            self.line(text);
        }
    }

    fn scope_declarations(&self) -> Vec<String> {
        let Some((current, outer)) = self.frames.split_last() else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = current.bindings.iter().map(String::as_str).collect();
        let mut globals = Vec::new();
        let mut nonlocals = Vec::new();

        // Innermost enclosing frame first, so a nearer binding hides an outer one
        for (level, frame) in outer.iter().enumerate().rev() {
            for name in &frame.variables {
                if seen.contains(name.as_str()) {
                    continue;
                }
                if level == 0 {
                    globals.push(py_name(name));
                } else {
                    nonlocals.push(py_name(name));
                }
                seen.insert(name.as_str());
            }
            seen.extend(frame.bindings.iter().map(String::as_str));
        }

        let mut lines = Vec::new();
        if !globals.is_empty() {
            lines.push(format!("global {}", globals.join(", ")));
        }
        if !nonlocals.is_empty() {
            lines.push(format!("nonlocal {}", nonlocals.join(", ")));
        }
        lines
    }

    fn lookup_procedure(&self, name: &str) -> Option<&[PassMode]> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.procedures.get(name))
            .map(Vec::as_slice)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Statement used as the body of a compound Python statement
    fn emit_body(&mut self, stmt: &Stmt) -> CompileResult<()> {
        if stmt.is_empty() {
            self.line("pass");
            Ok(())
        } else {
            self.emit_stmt(stmt)
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Assignment { target, value } => {
                let text = format!("{} = {}", self.expr(target), self.expr(value));
                self.line(text);
            }

            StmtKind::Input { target } => {
                let read = match target.ty.as_ref().and_then(TypeInfo::as_primitive) {
                    Some(PrimitiveType::Integer) => "int(input())",
                    Some(PrimitiveType::Real) => "float(input())",
                    Some(PrimitiveType::Boolean) => "input().lower() in ['صح', 'true', '1', 'yes']",
                    _ => "input()",
                };
                let text = format!("{} = {}", self.expr(target), read);
                self.line(text);
            }

            StmtKind::Output { items } => {
                let items: Vec<_> = items.iter().map(|e| self.expr(e)).collect();
                self.line(format!("print({})", items.join(", ")));
            }

            StmtKind::Call { name, args } => self.emit_call(name, args)?,

            StmtKind::If {
                condition,
                then_branch,
                elif_parts,
                else_branch,
            } => {
                let text = format!("if {}:", self.expr(condition));
                self.line(text);
                self.indented(then_branch)?;
                for (condition, body) in elif_parts {
                    let text = format!("elif {}:", self.expr(condition));
                    self.line(text);
                    self.indented(body)?;
                }
                if let Some(body) = else_branch {
                    self.line("else:");
                    self.indented(body)?;
                }
            }

            StmtKind::ForLoop {
                variable,
                start,
                end,
                step,
                body,
            } => {
                let var = py_name(variable);
                let start = self.expr(start);
                let end = self.expr(end);
                let header = match step {
                    None => format!("for {} in range({}, {} + 1):", var, start, end),
                    Some(step) => {
                        let step_text = self.expr(step);
                        match constant_sign(step) {
                            Some(true) => format!(
                                "for {} in range({}, {} + 1, {}):",
                                var, start, end, step_text
                            ),
                            Some(false) => format!(
                                "for {} in range({}, {} - 1, {}):",
                                var, start, end, step_text
                            ),
                            None => format!(
                                "for {v} in range({s}, {e} + (1 if {st} > 0 else -1), {st}):",
                                v = var,
                                s = start,
                                e = end,
                                st = step_text
                            ),
                        }
                    }
                };
                self.line(header);
                self.indented(body)?;
            }

            StmtKind::WhileLoop { condition, body } => {
                let text = format!("while {}:", self.expr(condition));
                self.line(text);
                self.indented(body)?;
            }

            StmtKind::RepeatUntil { body, condition } => {
                self.line("while True:");
                self.indent += 1;
                self.emit_stmt(body)?;
                let text = format!("if {}:", self.expr(condition));
                self.line(text);
                self.indent += 1;
                self.line("break");
                self.indent -= 2;
            }

            StmtKind::Compound(stmts) => {
                for stmt in stmts {
                    self.emit_stmt(stmt)?;
                }
            }

            StmtKind::Empty => {}
        }
        Ok(())
    }

    fn indented(&mut self, body: &Stmt) -> CompileResult<()> {
        self.indent += 1;
        let result = self.emit_body(body);
        self.indent -= 1;
        result
    }

    /// Call with write-back of by-reference arguments
    fn emit_call(&mut self, name: &str, args: &[Expr]) -> CompileResult<()> {
        let modes = self
            .lookup_procedure(name)
            .ok_or_else(|| CompileError::codegen(format!("call to unknown procedure '{}'", name)))?
            .to_vec();

        let rendered: Vec<_> = args.iter().map(|a| self.expr(a)).collect();
        let call = format!("{}({})", py_name(name), rendered.join(", "));

        let targets: Vec<&str> = modes
            .iter()
            .zip(args.iter().zip(&rendered))
            .filter(|(mode, _)| **mode == PassMode::ByReference)
            .map(|(_, (arg, text))| {
                if arg.is_variable_access() {
                    text.as_str()
                } else {
                    "_"
                }
            })
            .collect();

        if targets.iter().all(|t| *t == "_") {
            self.line(call);
        } else {
            self.line(format!("{} = {}", targets.join(", "), call));
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Binary { op, left, right } => {
                // Integer-typed `/` must stay an int in Python
                let op = match op {
                    BinaryOp::Div if expr.ty == Some(TypeInfo::integer()) => "//",
                    op => binary_op(*op),
                };
                format!("({} {} {})", self.expr(left), op, self.expr(right))
            }
            ExprKind::Unary { op, operand } => {
                let op = match op {
                    UnaryOp::Plus => "+",
                    UnaryOp::Minus => "-",
                    UnaryOp::Not => "not ",
                };
                format!("({}{})", op, self.expr(operand))
            }
            ExprKind::VarAccess { name, selectors } => {
                let mut text = py_name(name).into_owned();
                for selector in selectors {
                    match &selector.kind {
                        SelectorKind::Index(index) => {
                            text.push('[');
                            text.push_str(&self.expr(index));
                            text.push(']');
                        }
                        SelectorKind::Field(field) => {
                            text.push('.');
                            text.push_str(&py_name(field));
                        }
                    }
                }
                text
            }
            ExprKind::Literal(value) => literal(value),
            ExprKind::ConstantRef { name, value } => match value {
                Some(value) => literal(value),
                None => py_name(name).into_owned(),
            },
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn py_name(name: &str) -> Cow<'_, str> {
    if RESERVED.contains(&name) {
        Cow::Owned(format!("{}_", name))
    } else {
        Cow::Borrowed(name)
    }
}

fn primitive_default(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::Integer => "0",
        PrimitiveType::Real => "0.0",
        PrimitiveType::Boolean => "False",
        PrimitiveType::Char => "''",
        PrimitiveType::StringRef => "\"\"",
    }
}

fn binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::IntDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::LtEq => "<=",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

/// Python literal for a constant value
fn literal(value: &ConstValue) -> String {
    match value {
        ConstValue::Integer(v) => v.to_string(),
        ConstValue::Real(v) => format!("{:?}", v),
        ConstValue::Boolean(true) => "True".to_string(),
        ConstValue::Boolean(false) => "False".to_string(),
        ConstValue::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        ConstValue::Char(c) => match c {
            '\\' => "'\\\\'".to_string(),
            '\'' => "'\\''".to_string(),
            c => format!("'{}'", c),
        },
    }
}

/// Sign of a step known at compile time: `Some(true)` when positive
fn constant_sign(expr: &Expr) -> Option<bool> {
    match &expr.kind {
        ExprKind::Literal(ConstValue::Integer(n))
        | ExprKind::ConstantRef {
            value: Some(ConstValue::Integer(n)),
            ..
        } => Some(*n > 0),
        ExprKind::Literal(ConstValue::Real(v))
        | ExprKind::ConstantRef {
            value: Some(ConstValue::Real(v)),
            ..
        } => Some(*v > 0.0),
        ExprKind::Unary {
            op: UnaryOp::Minus,
            operand,
        } => constant_sign(operand).map(|positive| !positive),
        ExprKind::Unary {
            op: UnaryOp::Plus,
            operand,
        } => constant_sign(operand),
        _ => None,
    }
}
