//! Semantic analyzer: parse tree to typed AST
//!
//! A single depth-first pass. Every check reports into the analyzer's error
//! list and the walk continues with a fallback, so one run surfaces all
//! problems. Procedures are visible only after their definition (no forward
//! references); a procedure can call itself.

use super::error::{SemanticError, SemanticErrorKind};
use super::symbol_table::{ParamSymbol, Symbol, SymbolKind, SymbolReport, SymbolTable};
use super::types::{TypeChecker, TypeInfo};
use crate::common::Span;
use crate::frontend::ast::*;
use crate::frontend::parser::tree::*;
use crate::frontend::parser::DEFAULT_MAX_DEPTH;
use std::collections::BTreeMap;

/// Result of analyzing one program
#[derive(Debug)]
pub struct Analysis {
    /// Typed AST; only meaningful for code generation when `errors` is empty
    pub program: Program,
    pub errors: Vec<SemanticError>,
    pub symbols: SymbolReport,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Semantic analyzer for type checking and scope resolution
pub struct SemanticAnalyzer {
    pub(super) table: SymbolTable,
    errors: Vec<SemanticError>,
    depth: usize,
    max_depth: usize,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            errors: Vec::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Analyze a parsed program
    pub fn analyze(mut self, tree: &ProgramTree) -> Analysis {
        log::debug!("analyzing program '{}'", tree.name.text);
        let block = self.visit_block(&tree.block);
        let program = Program::new(tree.name.text.clone(), block, tree.span);

        if !self.errors.is_empty() {
            log::debug!("analysis found {} error(s)", self.errors.len());
        }

        Analysis {
            program,
            errors: self.errors,
            symbols: self.table.report(),
        }
    }

    pub(super) fn error(&mut self, kind: SemanticErrorKind, message: impl Into<String>, span: Span) {
        let error = SemanticError::new(kind, message, Some(span));
        log::trace!("{:?} at {}: {}", kind, span, error.message);
        self.errors.push(error);
    }

    /// Returns false (after reporting) when the nesting limit is reached
    pub(super) fn enter_nesting(&mut self, span: Span) -> bool {
        if self.depth >= self.max_depth {
            self.error(
                SemanticErrorKind::NestingTooDeep,
                format!("nesting too deep (limit {})", self.max_depth),
                span,
            );
            return false;
        }
        self.depth += 1;
        true
    }

    pub(super) fn leave_nesting(&mut self) {
        self.depth -= 1;
    }

    /// Run `f` inside a new scope owned by `owner`
    fn with_scope<R>(&mut self, owner: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.table.enter_scope(owner);
        let result = f(self);
        self.table.exit_scope();
        result
    }

    // =========================================================================
    // Blocks and definitions
    // =========================================================================

    fn visit_block(&mut self, tree: &BlockTree) -> Block {
        let constants = tree
            .constants
            .iter()
            .filter_map(|def| self.visit_constant_def(def))
            .collect();
        let types = tree
            .types
            .iter()
            .filter_map(|def| self.visit_type_def(def))
            .collect();
        let variables = tree
            .variables
            .iter()
            .map(|group| self.visit_var_group(group))
            .collect();
        let procedures = tree
            .procedures
            .iter()
            .filter_map(|proc| self.visit_procedure(proc))
            .collect();
        let body = self.visit_compound(&tree.body);

        Block {
            constants,
            types,
            variables,
            procedures,
            body,
            span: tree.span,
        }
    }

    fn visit_constant_def(&mut self, def: &ConstantDefTree) -> Option<ConstantDef> {
        let value = match &def.value {
            ConstantValueTree::Literal(literal) => Some(literal_value(literal)),
            ConstantValueTree::Name(ident) => match self.table.lookup(&ident.text, false) {
                Some(symbol) if symbol.is_constant => symbol.value.clone(),
                Some(_) => {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        format!("'{}' is not a constant", ident.text),
                        ident.span,
                    );
                    None
                }
                None => {
                    self.error(
                        SemanticErrorKind::UndefinedSymbol,
                        format!("undefined constant '{}'", ident.text),
                        ident.span,
                    );
                    None
                }
            },
        };

        let name = &def.name.text;
        if self.table.is_defined(name) {
            self.error(
                SemanticErrorKind::DuplicateDeclaration,
                format!("constant '{}' conflicts with a visible declaration", name),
                def.name.span,
            );
            return None;
        }

        // Inserted even without a value so later uses do not cascade
        if let Err(e) = self
            .table
            .insert(Symbol::constant(name.clone(), value.clone(), def.span))
        {
            self.error(SemanticErrorKind::DuplicateDeclaration, e.to_string(), def.name.span);
        }

        let value = value?;
        Some(ConstantDef {
            name: name.clone(),
            ty: value.type_info(),
            value,
            span: def.span,
        })
    }

    fn visit_type_def(&mut self, def: &TypeDefTree) -> Option<TypeDef> {
        let name = &def.name.text;
        if self.table.is_defined(name) {
            self.error(
                SemanticErrorKind::DuplicateDeclaration,
                format!("type '{}' conflicts with a visible declaration", name),
                def.name.span,
            );
            return None;
        }

        let (spec, ty) = match &def.spec {
            CompositeTypeTree::List { size, element } => {
                if self.table.lookup_type(&element.text).is_none() {
                    self.error(
                        SemanticErrorKind::UndefinedSymbol,
                        format!("undefined type '{}'", element.text),
                        element.span,
                    );
                }
                (
                    TypeSpec::List {
                        element: element.text.clone(),
                        size: *size,
                    },
                    TypeInfo::List {
                        element: element.text.clone(),
                        size: *size,
                    },
                )
            }
            CompositeTypeTree::Record { fields: groups } => {
                let mut fields = BTreeMap::new();
                let mut defs = Vec::new();
                for group in groups {
                    let ty = self.resolve_type(&group.type_name);
                    let mut names = Vec::new();
                    for field in &group.names {
                        if fields.contains_key(&field.text) {
                            self.error(
                                SemanticErrorKind::DuplicateDeclaration,
                                format!("duplicate field '{}' in record '{}'", field.text, name),
                                field.span,
                            );
                            continue;
                        }
                        fields.insert(field.text.clone(), ty.clone());
                        names.push(field.text.clone());
                    }
                    if !names.is_empty() {
                        defs.push(FieldDef {
                            names,
                            type_name: group.type_name.text.clone(),
                            span: group.span,
                        });
                    }
                }
                (TypeSpec::Record { fields: defs }, TypeInfo::Record { fields })
            }
        };

        if let Err(e) = self
            .table
            .insert(Symbol::type_def(name.clone(), ty.clone(), def.span))
        {
            self.error(SemanticErrorKind::DuplicateDeclaration, e.to_string(), def.name.span);
        }

        Some(TypeDef {
            name: name.clone(),
            spec,
            ty,
            span: def.span,
        })
    }

    /// Resolve a declared type name, falling back to Integer
    fn resolve_type(&mut self, name: &Ident) -> TypeInfo {
        match self.table.lookup_type(&name.text) {
            Some(ty) => ty,
            None => {
                self.error(
                    SemanticErrorKind::UndefinedSymbol,
                    format!("undefined type '{}'", name.text),
                    name.span,
                );
                TypeInfo::integer()
            }
        }
    }

    fn visit_var_group(&mut self, group: &NameGroupTree) -> VarDecl {
        let ty = self.resolve_type(&group.type_name);
        let mut names = Vec::new();

        for ident in &group.names {
            match self
                .table
                .insert(Symbol::variable(ident.text.clone(), ty.clone(), ident.span))
            {
                Ok(()) => names.push(ident.text.clone()),
                Err(e) => self.error(SemanticErrorKind::DuplicateDeclaration, e.to_string(), ident.span),
            }
        }

        VarDecl {
            names,
            type_name: group.type_name.text.clone(),
            ty,
            span: group.span,
        }
    }

    fn visit_procedure(&mut self, tree: &ProcedureTree) -> Option<ProcedureDef> {
        if !self.enter_nesting(tree.span) {
            return None;
        }
        let def = self.visit_procedure_inner(tree);
        self.leave_nesting();
        Some(def)
    }

    fn visit_procedure_inner(&mut self, tree: &ProcedureTree) -> ProcedureDef {
        let name = tree.name.text.clone();

        let mut params = Vec::new();
        for group in &tree.params {
            let ty = self.resolve_type(&group.group.type_name);
            let mode = group.mode.unwrap_or_default();
            for ident in &group.group.names {
                params.push(Param {
                    name: ident.text.clone(),
                    type_name: group.group.type_name.text.clone(),
                    ty: ty.clone(),
                    mode,
                    span: ident.span,
                });
            }
        }

        let signature = params
            .iter()
            .map(|p| ParamSymbol {
                name: p.name.clone(),
                ty: p.ty.clone(),
                mode: p.mode,
            })
            .collect();
        if let Err(e) = self
            .table
            .insert(Symbol::procedure(name.clone(), signature, tree.name.span))
        {
            self.error(SemanticErrorKind::DuplicateDeclaration, e.to_string(), tree.name.span);
        }

        let block = self.with_scope(&name, |this| {
            for param in &params {
                if let Err(e) = this
                    .table
                    .insert(Symbol::parameter(param.name.clone(), param.ty.clone(), param.span))
                {
                    this.error(SemanticErrorKind::DuplicateDeclaration, e.to_string(), param.span);
                }
            }
            this.visit_block(&tree.block)
        });

        ProcedureDef {
            name,
            params,
            block,
            span: tree.span,
        }
    }

    // =========================================================================
    // Instructions
    // =========================================================================

    fn visit_compound(&mut self, tree: &CompoundTree) -> Stmt {
        let stmts = tree
            .instructions
            .iter()
            .map(|instr| self.visit_instruction(instr))
            .collect();
        Stmt::new(StmtKind::Compound(stmts), tree.span)
    }

    fn visit_instruction(&mut self, tree: &InstructionTree) -> Stmt {
        if !self.enter_nesting(tree.span) {
            return Stmt::new(StmtKind::Empty, tree.span);
        }
        let stmt = self.visit_instruction_inner(tree);
        self.leave_nesting();
        stmt
    }

    fn visit_instruction_inner(&mut self, tree: &InstructionTree) -> Stmt {
        let span = tree.span;

        let kind = match &tree.kind {
            InstructionKind::Assignment { target, value } => {
                let target = self.visit_target(target);
                let value = self.visit_expression(value);
                if let (Some(target_ty), Some(value_ty)) = (&target.ty, &value.ty) {
                    if !TypeChecker::are_compatible(value_ty, target_ty) {
                        let message = format!("cannot assign {} to {}", value_ty, target_ty);
                        self.error(SemanticErrorKind::TypeMismatch, message, span);
                    }
                }
                StmtKind::Assignment { target, value }
            }

            InstructionKind::Input(target) => StmtKind::Input {
                target: self.visit_target(target),
            },

            InstructionKind::Output(items) => StmtKind::Output {
                items: items.iter().map(|e| self.visit_expression(e)).collect(),
            },

            InstructionKind::Call { name, args } => self.visit_call(name, args, span),

            InstructionKind::If(tree) => return self.visit_if(tree, span),

            InstructionKind::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                if !self.table.is_variable(&variable.text) {
                    if self.table.is_defined(&variable.text) {
                        self.error(
                            SemanticErrorKind::NotAVariable,
                            format!("loop counter '{}' is not a variable", variable.text),
                            variable.span,
                        );
                    } else {
                        self.error(
                            SemanticErrorKind::UndefinedSymbol,
                            format!("undefined variable '{}'", variable.text),
                            variable.span,
                        );
                    }
                }
                let start = self.visit_loop_bound(start, "start");
                let end = self.visit_loop_bound(end, "end");
                let step = step.as_ref().map(|s| self.visit_expression(s));
                let body = Box::new(self.visit_instruction(body));
                StmtKind::ForLoop {
                    variable: variable.text.clone(),
                    start,
                    end,
                    step,
                    body,
                }
            }

            InstructionKind::While { condition, body } => {
                let condition = self.visit_condition(condition);
                let body = Box::new(self.visit_instruction(body));
                StmtKind::WhileLoop { condition, body }
            }

            InstructionKind::Repeat { body, condition } => {
                let body = Box::new(self.visit_instruction(body));
                let condition = self.visit_condition(condition);
                StmtKind::RepeatUntil { body, condition }
            }

            InstructionKind::Compound(compound) => return self.visit_compound(compound),

            InstructionKind::Empty => StmtKind::Empty,
        };

        Stmt::new(kind, span)
    }

    /// Variable access written to by an assignment or input
    fn visit_target(&mut self, access: &VariableAccessTree) -> Expr {
        let target = self.visit_variable_access(access);
        if let ExprKind::ConstantRef { name, .. } = &target.kind {
            let message = format!("cannot assign to constant '{}'", name);
            self.error(SemanticErrorKind::NotAVariable, message, target.span);
        }
        target
    }

    fn visit_call(&mut self, name: &Ident, args: &[ExpressionTree], span: Span) -> StmtKind {
        let params = match self.table.lookup(&name.text, false) {
            Some(symbol) if symbol.kind == SymbolKind::Procedure => Some(symbol.params.clone()),
            Some(_) => {
                self.error(
                    SemanticErrorKind::NotAProcedure,
                    format!("'{}' is not a procedure", name.text),
                    name.span,
                );
                None
            }
            None => {
                self.error(
                    SemanticErrorKind::UndefinedSymbol,
                    format!("undefined procedure '{}'", name.text),
                    name.span,
                );
                None
            }
        };

        let args: Vec<Expr> = args.iter().map(|a| self.visit_expression(a)).collect();

        if let Some(params) = params {
            if params.len() != args.len() {
                self.error(
                    SemanticErrorKind::ArityMismatch,
                    format!(
                        "procedure '{}' expects {} argument(s), got {}",
                        name.text,
                        params.len(),
                        args.len()
                    ),
                    span,
                );
            } else {
                for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
                    if let Some(arg_ty) = &arg.ty {
                        if !TypeChecker::are_compatible(arg_ty, &param.ty) {
                            let message = format!(
                                "argument {} of '{}': cannot pass {} as {}",
                                i + 1,
                                name.text,
                                arg_ty,
                                param.ty
                            );
                            self.error(SemanticErrorKind::TypeMismatch, message, arg.span);
                        }
                    }
                }
            }
        }

        StmtKind::Call {
            name: name.text.clone(),
            args,
        }
    }

    fn visit_if(&mut self, tree: &IfTree, span: Span) -> Stmt {
        let mut parts = Vec::with_capacity(tree.conditions.len());
        for (i, condition) in tree.conditions.iter().enumerate() {
            let condition = self.visit_condition(condition);
            let body = match tree.instructions.get(i) {
                Some(body) => self.visit_instruction(body),
                None => Stmt::new(StmtKind::Empty, condition.span),
            };
            parts.push((condition, body));
        }
        let else_branch = tree
            .else_body()
            .map(|body| Box::new(self.visit_instruction(body)));

        let mut parts = parts.into_iter();
        let Some((condition, then_branch)) = parts.next() else {
            return Stmt::new(StmtKind::Empty, span);
        };

        Stmt::new(
            StmtKind::If {
                condition,
                then_branch: Box::new(then_branch),
                elif_parts: parts.collect(),
                else_branch,
            },
            span,
        )
    }

    /// Condition of if/while/repeat; must be Boolean
    fn visit_condition(&mut self, tree: &ExpressionTree) -> Expr {
        let condition = self.visit_expression(tree);
        if !condition.ty.as_ref().is_some_and(TypeChecker::is_boolean) {
            let found = condition
                .ty
                .as_ref()
                .map_or_else(|| "an ill-typed expression".to_string(), |t| t.to_string());
            self.error(
                SemanticErrorKind::ConditionNotBoolean,
                format!("condition must be منطقي, found {}", found),
                condition.span,
            );
        }
        condition
    }

    fn visit_loop_bound(&mut self, tree: &ExpressionTree, which: &str) -> Expr {
        let bound = self.visit_expression(tree);
        if let Some(ty) = &bound.ty {
            if !TypeChecker::is_numeric(ty) {
                let message = format!("loop {} must be numeric, found {}", which, ty);
                self.error(SemanticErrorKind::NumericRequired, message, bound.span);
            }
        }
        bound
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn literal_value(literal: &LiteralTree) -> ConstValue {
    match &literal.kind {
        LiteralKind::Integer(v) => ConstValue::Integer(*v),
        LiteralKind::Real(v) => ConstValue::Real(*v),
        LiteralKind::String(s) => ConstValue::String(s.clone()),
        LiteralKind::Char(c) => ConstValue::Char(*c),
        LiteralKind::Boolean(b) => ConstValue::Boolean(*b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;
    use SemanticErrorKind::*;

    fn analyze(decls: &str, body: &str) -> Analysis {
        let source = format!("برنامج ت؛\n{}\n{{\n{}\n}}.", decls, body);
        let tree = Parser::new(&source).unwrap().parse().unwrap();
        SemanticAnalyzer::new().analyze(&tree)
    }

    fn kinds(analysis: &Analysis) -> Vec<SemanticErrorKind> {
        analysis.errors.iter().map(|e| e.kind).collect()
    }

    fn body(analysis: &Analysis) -> &[Stmt] {
        match &analysis.program.block.body.kind {
            StmtKind::Compound(stmts) => stmts,
            other => panic!("expected compound body, got {:?}", other),
        }
    }

    fn assigned_value(stmt: &Stmt) -> &Expr {
        match &stmt.kind {
            StmtKind::Assignment { value, .. } => value,
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_program_has_no_errors() {
        let analysis = analyze(
            "ثابت حد = 10؛ باي = 3.14؛
             نوع نقطة = سجل { س، ص: حقيقي؛ }؛ ارقام = قائمة[5] من صحيح؛
             متغير ن: نقطة؛ أ: ارقام؛ ع، م: صحيح؛ ح: حقيقي؛ ب: منطقي؛
             اجراء ضاعف(بالمرجع ق: صحيح) { ق = ق * 2؛ }",
            "ع = حد؛ ح = ع + باي؛ ح = 2؛ ن.س = ح؛ أ[0] = ع \\ 2 % 3؛ ضاعف(ع)؛
             لكل م من 1 الى حد نفذ اطبع(م، ن.ص)؛
             طالما ((ع > 0) && !ب) نفذ ع = ع - 1؛
             كرر ع = ع + 1؛ حتى (ع >= 3)؛
             اذا (ع == 3) فان اطبع(\"ثلاثة\")؛ وإلا اطبع(ع)؛
             اقرأ(ح)؛",
        );
        assert_eq!(analysis.errors, Vec::new());
        assert!(analysis.is_ok());
        assert_eq!(analysis.program.block.constants.len(), 2);
        assert_eq!(analysis.program.block.procedures[0].params[0].mode, PassMode::ByReference);
    }

    #[test]
    fn test_real_assigned_to_integer() {
        let analysis = analyze("متغير س: صحيح؛", "س = 3.5؛");
        assert_eq!(kinds(&analysis), vec![TypeMismatch]);
        match &body(&analysis)[0].kind {
            StmtKind::Assignment { target, value } => {
                assert_eq!(target.ty, Some(TypeInfo::integer()));
                assert_eq!(value.ty, Some(TypeInfo::real()));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_mismatch_suppresses_argument_checks() {
        let analysis = analyze(
            "اجراء جمع(أ، ب: صحيح) { }",
            "جمع(1، 2، \"نص\")؛",
        );
        assert_eq!(kinds(&analysis), vec![ArityMismatch]);
        match &body(&analysis)[0].kind {
            StmtKind::Call { name, args } => {
                assert_eq!(name, "جمع");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_argument_type_mismatch_per_position() {
        let analysis = analyze(
            "اجراء جمع(أ: صحيح؛ ب: حقيقي) { }",
            "جمع(\"نص\"، صح)؛ جمع(1، 2)؛",
        );
        assert_eq!(kinds(&analysis), vec![TypeMismatch, TypeMismatch]);
        assert!(analysis.errors[0].message.contains("argument 1"));
        assert!(analysis.errors[1].message.contains("argument 2"));
    }

    #[test]
    fn test_relational_error_cascades_into_condition() {
        let analysis = analyze(
            "متغير س: خيط_رمزي؛",
            "اذا (س > 5) فان اطبع(س)؛ وإلا اطبع(1)؛",
        );
        assert_eq!(kinds(&analysis), vec![OperatorTypeError, ConditionNotBoolean]);
        assert!(analysis.errors[0].message.contains("خيط_رمزي"));
        assert!(analysis.errors[0].message.contains("صحيح"));
    }

    #[test]
    fn test_record_field_access() {
        let analysis = analyze(
            "نوع نقطة = سجل { س: صحيح؛ ص: حقيقي؛ }؛ متغير ن: نقطة؛ أ: صحيح؛ ح: حقيقي؛",
            "أ = ن.س؛ ح = ن.ص؛ أ = ن.ع؛",
        );
        assert_eq!(kinds(&analysis), vec![FieldNotFound]);
        let stmts = body(&analysis);
        assert_eq!(assigned_value(&stmts[0]).ty, Some(TypeInfo::integer()));
        assert_eq!(assigned_value(&stmts[1]).ty, Some(TypeInfo::real()));

        let missing = assigned_value(&stmts[2]);
        assert_eq!(missing.ty, None);
        match &missing.kind {
            ExprKind::VarAccess { name, selectors } => {
                assert_eq!(name, "ن");
                assert_eq!(selectors.len(), 1);
            }
            other => panic!("expected variable access, got {:?}", other),
        }
    }

    #[test]
    fn test_list_index() {
        let analysis = analyze(
            "نوع ارقام = قائمة[5] من صحيح؛ متغير م: ارقام؛ أ: صحيح؛",
            "أ = م[0]؛ أ = م[صح]؛",
        );
        assert_eq!(kinds(&analysis), vec![IndexNotNumeric]);
        assert_eq!(assigned_value(&body(&analysis)[0]).ty, Some(TypeInfo::integer()));
    }

    #[test]
    fn test_selector_chain_narrows_step_by_step() {
        let analysis = analyze(
            "نوع نقطة = سجل { س: صحيح؛ }؛ نقاط = قائمة[3] من نقطة؛ شبكة = قائمة[2] من نقاط؛
             متغير ش: شبكة؛ أ: صحيح؛",
            "أ = ش[1][2].س؛",
        );
        assert_eq!(analysis.errors, Vec::new());
        let value = assigned_value(&body(&analysis)[0]);
        assert_eq!(value.ty, Some(TypeInfo::integer()));
        match &value.kind {
            ExprKind::VarAccess { selectors, .. } => {
                let types: Vec<_> = selectors.iter().map(|s| s.ty.clone()).collect();
                assert_eq!(types[0], Some(TypeInfo::List { element: "نقطة".into(), size: 3 }));
                assert!(types[1].as_ref().is_some_and(TypeInfo::is_record));
                assert_eq!(types[2], Some(TypeInfo::integer()));
            }
            other => panic!("expected variable access, got {:?}", other),
        }
    }

    #[test]
    fn test_selectors_on_wrong_types() {
        let analysis = analyze("متغير أ: صحيح؛", "أ = أ[1]؛ أ = أ.س؛");
        assert_eq!(kinds(&analysis), vec![NotAList, NotARecord]);
    }

    #[test]
    fn test_variable_redeclaration_and_shadowing() {
        let analysis = analyze("متغير أ: صحيح؛ أ: حقيقي؛", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);

        let analysis = analyze(
            "متغير أ: صحيح؛ اجراء ب() متغير أ: حقيقي؛ { أ = 1.5؛ }",
            "أ = 1؛",
        );
        assert_eq!(analysis.errors, Vec::new());
    }

    #[test]
    fn test_constant_may_not_shadow() {
        let analysis = analyze("متغير أ: صحيح؛ اجراء ب() ثابت أ = 1؛ { }", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);

        let analysis = analyze("ثابت صحيح = 1؛", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);
    }

    #[test]
    fn test_chained_constants_inherit_value() {
        let analysis = analyze("ثابت أ = -2.5؛ ب = أ؛", "اطبع(ب)؛");
        assert_eq!(analysis.errors, Vec::new());
        let chained = &analysis.program.block.constants[1];
        assert_eq!(chained.value, ConstValue::Real(-2.5));
        assert_eq!(chained.ty, TypeInfo::real());

        match &body(&analysis)[0].kind {
            StmtKind::Output { items } => {
                assert_eq!(items[0].ty, Some(TypeInfo::real()));
                assert!(matches!(
                    &items[0].kind,
                    ExprKind::ConstantRef { name, value: Some(ConstValue::Real(v)) } if name == "ب" && *v == -2.5
                ));
            }
            other => panic!("expected output, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_from_non_constant() {
        let analysis = analyze("ثابت أ = مجهول؛", "");
        assert_eq!(kinds(&analysis), vec![UndefinedSymbol]);
        assert!(analysis.program.block.constants.is_empty());
    }

    #[test]
    fn test_constant_is_not_assignable() {
        let analysis = analyze("ثابت ك = 1؛", "ك = 2؛ اقرأ(ك)؛");
        assert_eq!(kinds(&analysis), vec![NotAVariable, NotAVariable]);
    }

    #[test]
    fn test_call_resolution() {
        let analysis = analyze("متغير أ: صحيح؛", "ب(1)؛ أ(2)؛");
        assert_eq!(kinds(&analysis), vec![UndefinedSymbol, NotAProcedure]);
    }

    #[test]
    fn test_no_forward_references_but_recursion() {
        let analysis = analyze("اجراء أ() { ب()؛ } اجراء ب() { أ()؛ }", "");
        assert_eq!(kinds(&analysis), vec![UndefinedSymbol]);

        let analysis = analyze(
            "اجراء عد(ن: صحيح) { اذا (ن > 0) فان عد(ن - 1)؛ }",
            "عد(3)؛",
        );
        assert_eq!(analysis.errors, Vec::new());
    }

    #[test]
    fn test_duplicate_procedure_body_still_analyzed() {
        let analysis = analyze("اجراء أ() { } اجراء أ() { ب = 1؛ }", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration, UndefinedSymbol]);
    }

    #[test]
    fn test_for_loop_checks() {
        let analysis = analyze(
            "ثابت ك = 1؛ متغير خ: خيط_رمزي؛ م: صحيح؛",
            "لكل س من 1 الى 2 نفذ ؛
             لكل ك من 1 الى 2 نفذ ؛
             لكل م من \"أ\" الى خ نفذ ؛
             لكل م من 10 الى 1 بخطوة -1 نفذ ؛",
        );
        assert_eq!(
            kinds(&analysis),
            vec![UndefinedSymbol, NotAVariable, NumericRequired, NumericRequired]
        );
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        let analysis = analyze(
            "متغير أ: صحيح؛",
            "طالما (أ) نفذ ؛ كرر ؛ حتى (أ + 1)؛ اذا (صح) فان ؛",
        );
        assert_eq!(kinds(&analysis), vec![ConditionNotBoolean, ConditionNotBoolean]);
    }

    #[test]
    fn test_unary_operator_errors() {
        let analysis = analyze("متغير ب: منطقي؛ أ: صحيح؛", "أ = -ب؛ ب = !أ؛");
        assert_eq!(kinds(&analysis), vec![OperatorTypeError, OperatorTypeError]);
    }

    #[test]
    fn test_unresolved_type_falls_back_to_integer() {
        let analysis = analyze("متغير أ: مجهول؛", "أ = 1؛");
        assert_eq!(kinds(&analysis), vec![UndefinedSymbol]);
        assert_eq!(analysis.program.block.variables[0].ty, TypeInfo::integer());
    }

    #[test]
    fn test_duplicate_record_field() {
        let analysis = analyze("نوع ن = سجل { س: صحيح؛ س: حقيقي؛ }؛", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);
        match &analysis.program.block.types[0].ty {
            TypeInfo::Record { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields.get("س"), Some(&TypeInfo::integer()));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_type_name_is_not_a_value() {
        let analysis = analyze("نوع ل = قائمة[2] من صحيح؛ متغير أ: صحيح؛", "أ = ل؛");
        assert_eq!(kinds(&analysis), vec![NotAVariable]);
    }

    #[test]
    fn test_if_chain_pairing() {
        let analysis = analyze(
            "متغير أ: صحيح؛",
            "اذا (أ == 1) فان أ = 1؛ وإلا اذا (أ == 2) فان أ = 2؛ وإلا اذا (أ == 3) فان أ = 3؛ وإلا أ = 0؛",
        );
        assert_eq!(analysis.errors, Vec::new());
        match &body(&analysis)[0].kind {
            StmtKind::If {
                then_branch,
                elif_parts,
                else_branch,
                ..
            } => {
                assert!(matches!(then_branch.kind, StmtKind::Assignment { .. }));
                assert_eq!(elif_parts.len(), 2);
                let else_value = assigned_value(else_branch.as_ref().unwrap());
                assert!(matches!(else_value.kind, ExprKind::Literal(ConstValue::Integer(0))));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!(
            "برنامج ت؛ متغير أ: صحيح؛ {{ أ = {}1{}؛ }}.",
            "(".repeat(20),
            ")".repeat(20)
        );
        let tree = Parser::new(&source).unwrap().parse().unwrap();
        let analysis = SemanticAnalyzer::new().with_max_depth(8).analyze(&tree);
        assert_eq!(kinds(&analysis), vec![NestingTooDeep]);
    }

    #[test]
    fn test_error_position_format() {
        let analysis = analyze("متغير أ: صحيح؛", "أ = ب؛");
        assert_eq!(
            analysis.errors[0].format(),
            "خطأ دلالي في السطر 4, العمود 4: undefined identifier 'ب'"
        );
    }

    #[test]
    fn test_symbol_report_covers_procedure_scopes() {
        let analysis = analyze(
            "ثابت ح = 1؛ متغير أ: صحيح؛ اجراء ب(س: حقيقي) متغير ل: منطقي؛ { }",
            "",
        );
        let report = &analysis.symbols;
        let param = report.entries.iter().find(|e| e.name == "س").unwrap();
        assert_eq!(param.kind, SymbolKind::Parameter);
        assert_eq!(param.scope, "ب");
        assert_eq!(param.scope_level, 1);
        assert_eq!(report.count(SymbolKind::Variable), 2);
        assert_eq!(report.count(SymbolKind::Constant), 1);
        assert_eq!(report.count(SymbolKind::Procedure), 1);
    }

    #[test]
    fn test_nesting_limit_on_procedures() {
        let source = format!(
            "برنامج ت؛ {}{}{{ }}.",
            "اجراء ا() ".repeat(20),
            "{ } ".repeat(20)
        );
        let tree = Parser::new(&source).unwrap().parse().unwrap();
        let analysis = SemanticAnalyzer::new().with_max_depth(8).analyze(&tree);
        assert_eq!(kinds(&analysis), vec![NestingTooDeep]);

        let analysis = SemanticAnalyzer::new().analyze(&tree);
        assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_duplicate_type_definitions() {
        let analysis = analyze("نوع ن = قائمة[2] من صحيح؛ ن = قائمة[3] من حقيقي؛", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);
        assert_eq!(analysis.program.block.types.len(), 1);
        assert_eq!(
            analysis.program.block.types[0].ty,
            TypeInfo::List {
                element: "صحيح".to_string(),
                size: 2
            }
        );
    }

    #[test]
    fn test_local_type_may_not_shadow_outer_name() {
        let analysis = analyze(
            "متغير ن: صحيح؛ اجراء ا() نوع ن = قائمة[2] من صحيح؛ { }",
            "",
        );
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);
        assert!(analysis.program.block.procedures[0].block.types.is_empty());
    }

    #[test]
    fn test_unresolved_list_element_type() {
        let analysis = analyze("نوع ل = قائمة[3] من مجهول؛", "");
        assert_eq!(kinds(&analysis), vec![UndefinedSymbol]);
        assert_eq!(analysis.errors[0].message, "undefined type 'مجهول'");
    }

    #[test]
    fn test_unresolved_param_type_falls_back_to_integer() {
        let analysis = analyze("اجراء ا(س: مجهول) { س = 1؛ }", "");
        assert_eq!(kinds(&analysis), vec![UndefinedSymbol]);
        let param = &analysis.program.block.procedures[0].params[0];
        assert_eq!(param.ty, TypeInfo::integer());
    }

    #[test]
    fn test_duplicate_param_name() {
        let analysis = analyze("اجراء ا(س، س: صحيح) { }", "");
        assert_eq!(kinds(&analysis), vec![DuplicateDeclaration]);
        assert_eq!(analysis.errors[0].message, "'س' is already declared in this scope");
    }

    #[test]
    fn test_boolean_literals_before_semicolon() {
        let analysis = analyze("متغير ب: منطقي؛", "ب = صح؛ ب = خطأ؛");
        assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    }
}
