//! Expression typing
//!
//! Each visit returns the built node with its type attached. A `None`
//! type means an error was already reported below; operators over such
//! operands stay silent so a single mistake yields a single diagnostic.

use super::analyzer::{literal_value, SemanticAnalyzer};
use super::error::SemanticErrorKind;
use super::symbol_table::SymbolKind;
use super::types::{TypeChecker, TypeInfo};
use crate::common::Span;
use crate::frontend::ast::*;
use crate::frontend::parser::tree::*;

impl SemanticAnalyzer {
    pub(super) fn visit_expression(&mut self, tree: &ExpressionTree) -> Expr {
        if !self.enter_nesting(tree.span) {
            return Expr::new(ExprKind::Literal(ConstValue::Integer(0)), tree.span, None);
        }

        let left = self.visit_simple_expression(&tree.left);
        let expr = match &tree.relation {
            Some((op, right)) => {
                let right = self.visit_simple_expression(right);
                self.binary(*op, left, right)
            }
            None => left,
        };

        self.leave_nesting();
        expr
    }

    fn visit_simple_expression(&mut self, tree: &SimpleExpressionTree) -> Expr {
        let mut expr = self.visit_term(&tree.first);
        if let Some((op, sign_span)) = tree.sign {
            expr = self.unary(op, expr, sign_span);
        }
        for (op, term) in &tree.rest {
            let right = self.visit_term(term);
            expr = self.binary(*op, expr, right);
        }
        expr
    }

    fn visit_term(&mut self, tree: &TermTree) -> Expr {
        let mut expr = self.visit_factor(&tree.first);
        for (op, factor) in &tree.rest {
            let right = self.visit_factor(factor);
            expr = self.binary(*op, expr, right);
        }
        expr
    }

    fn visit_factor(&mut self, tree: &FactorTree) -> Expr {
        match &tree.kind {
            FactorKind::Variable(access) => self.visit_variable_access(access),
            FactorKind::Literal(literal) => {
                let value = literal_value(literal);
                let ty = value.type_info();
                Expr::new(ExprKind::Literal(value), literal.span, Some(ty))
            }
            FactorKind::Parenthesized(inner) => self.visit_expression(inner),
            FactorKind::Not(operand) => {
                if !self.enter_nesting(tree.span) {
                    return Expr::new(ExprKind::Literal(ConstValue::Boolean(false)), tree.span, None);
                }
                let operand = self.visit_factor(operand);
                self.leave_nesting();
                self.unary(UnaryOp::Not, operand, tree.span)
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        let ty = match (&left.ty, &right.ty) {
            (Some(l), Some(r)) => {
                let result = TypeChecker::result_type(op, l, r);
                if result.is_none() {
                    let message = format!(
                        "operator '{}' cannot be applied to {} and {}",
                        op.symbol(),
                        l,
                        r
                    );
                    self.error(SemanticErrorKind::OperatorTypeError, message, span);
                }
                result
            }
            _ => None,
        };

        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
            ty,
        )
    }

    fn unary(&mut self, op: UnaryOp, operand: Expr, op_span: Span) -> Expr {
        let span = op_span.merge(operand.span);
        let ty = match &operand.ty {
            Some(t) => {
                let result = TypeChecker::unary_result_type(op, t);
                if result.is_none() {
                    let message = format!("operator '{}' cannot be applied to {}", op.symbol(), t);
                    self.error(SemanticErrorKind::OperatorTypeError, message, span);
                }
                result
            }
            None => None,
        };

        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
            ty,
        )
    }

    /// Resolve `name{selector}` to a constant reference or a typed access
    pub(super) fn visit_variable_access(&mut self, tree: &VariableAccessTree) -> Expr {
        let name = tree.name.text.clone();
        let symbol = self
            .table
            .lookup(&name, false)
            .map(|s| (s.kind, s.ty.clone(), s.value.clone()));

        match symbol {
            Some((SymbolKind::Constant, ty, value)) => {
                let ty = if tree.selectors.is_empty() {
                    ty
                } else {
                    self.visit_selectors(&tree.selectors, ty).1
                };
                Expr::new(ExprKind::ConstantRef { name, value }, tree.span, ty)
            }
            Some((SymbolKind::Variable | SymbolKind::Parameter, ty, _)) => {
                let (selectors, ty) = self.visit_selectors(&tree.selectors, ty);
                Expr::new(ExprKind::VarAccess { name, selectors }, tree.span, ty)
            }
            Some((kind, _, _)) => {
                let message = format!("'{}' names a {}, not a variable", name, kind);
                self.error(SemanticErrorKind::NotAVariable, message, tree.name.span);
                let (selectors, _) = self.visit_selectors(&tree.selectors, None);
                Expr::new(ExprKind::VarAccess { name, selectors }, tree.span, None)
            }
            None => {
                let message = format!("undefined identifier '{}'", name);
                self.error(SemanticErrorKind::UndefinedSymbol, message, tree.name.span);
                let (selectors, _) = self.visit_selectors(&tree.selectors, None);
                Expr::new(ExprKind::VarAccess { name, selectors }, tree.span, None)
            }
        }
    }

    /// Apply selectors left to right, each narrowing the previous type
    fn visit_selectors(
        &mut self,
        trees: &[SelectorTree],
        base: Option<TypeInfo>,
    ) -> (Vec<Selector>, Option<TypeInfo>) {
        let mut current = base;
        let mut selectors = Vec::with_capacity(trees.len());

        for tree in trees {
            let (kind, next) = match &tree.kind {
                SelectorTreeKind::Index(index) => {
                    let index = self.visit_expression(index);
                    if let Some(ty) = &index.ty {
                        if !TypeChecker::is_numeric(ty) {
                            let message = format!("list index must be numeric, found {}", ty);
                            self.error(SemanticErrorKind::IndexNotNumeric, message, index.span);
                        }
                    }
                    let next = match &current {
                        Some(TypeInfo::List { element, .. }) => self.table.lookup_type(element),
                        Some(other) => {
                            let message = format!("cannot index a value of type {}", other);
                            self.error(SemanticErrorKind::NotAList, message, tree.span);
                            None
                        }
                        None => None,
                    };
                    (SelectorKind::Index(Box::new(index)), next)
                }
                SelectorTreeKind::Field(field) => {
                    let next = match &current {
                        Some(TypeInfo::Record { fields }) => match fields.get(&field.text) {
                            Some(ty) => Some(ty.clone()),
                            None => {
                                let message = format!("record has no field '{}'", field.text);
                                self.error(SemanticErrorKind::FieldNotFound, message, field.span);
                                None
                            }
                        },
                        Some(other) => {
                            let message = format!(
                                "cannot select field '{}' from a value of type {}",
                                field.text, other
                            );
                            self.error(SemanticErrorKind::NotARecord, message, tree.span);
                            None
                        }
                        None => None,
                    };
                    (SelectorKind::Field(field.text.clone()), next)
                }
            };

            selectors.push(Selector {
                kind,
                span: tree.span,
                ty: next.clone(),
            });
            current = next;
        }

        (selectors, current)
    }
}
