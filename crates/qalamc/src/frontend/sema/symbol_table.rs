//! Symbol table and scope management
//!
//! Scopes form a stack: index 0 is the global scope, pre-seeded with the
//! built-in types. Popped scopes are kept so the whole program's symbols can
//! be reported after analysis.

use super::types::{PrimitiveType, TypeInfo};
use crate::common::Span;
use crate::frontend::ast::{ConstValue, PassMode};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Constant,
    Type,
    Variable,
    Parameter,
    Procedure,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 5] = [
        SymbolKind::Constant,
        SymbolKind::Type,
        SymbolKind::Variable,
        SymbolKind::Parameter,
        SymbolKind::Procedure,
    ];
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Constant => "ثابت",
            SymbolKind::Type => "نوع",
            SymbolKind::Variable => "متغير",
            SymbolKind::Parameter => "معامل",
            SymbolKind::Procedure => "اجراء",
        };
        write!(f, "{}", name)
    }
}

/// Formal parameter as recorded on a procedure symbol
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSymbol {
    pub name: String,
    pub ty: TypeInfo,
    pub mode: PassMode,
}

/// A symbol in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Option<TypeInfo>,
    pub value: Option<ConstValue>,
    pub params: Vec<ParamSymbol>,
    pub scope_level: usize,
    pub is_constant: bool,
    /// `None` for built-ins
    pub span: Option<Span>,
}

impl Symbol {
    fn new(name: impl Into<String>, kind: SymbolKind, ty: Option<TypeInfo>, span: Option<Span>) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            value: None,
            params: Vec::new(),
            scope_level: 0,
            is_constant: kind == SymbolKind::Constant,
            span,
        }
    }

    pub fn constant(name: impl Into<String>, value: Option<ConstValue>, span: Span) -> Self {
        let ty = value.as_ref().map(ConstValue::type_info);
        Self {
            value,
            ..Self::new(name, SymbolKind::Constant, ty, Some(span))
        }
    }

    pub fn type_def(name: impl Into<String>, ty: TypeInfo, span: Span) -> Self {
        Self::new(name, SymbolKind::Type, Some(ty), Some(span))
    }

    pub fn variable(name: impl Into<String>, ty: TypeInfo, span: Span) -> Self {
        Self::new(name, SymbolKind::Variable, Some(ty), Some(span))
    }

    pub fn parameter(name: impl Into<String>, ty: TypeInfo, span: Span) -> Self {
        Self::new(name, SymbolKind::Parameter, Some(ty), Some(span))
    }

    pub fn procedure(name: impl Into<String>, params: Vec<ParamSymbol>, span: Span) -> Self {
        Self {
            params,
            ..Self::new(name, SymbolKind::Procedure, None, Some(span))
        }
    }

    fn builtin(ty: PrimitiveType) -> Self {
        Self::new(ty.name(), SymbolKind::Type, Some(TypeInfo::Primitive(ty)), None)
    }

    pub fn is_builtin(&self) -> bool {
        self.span.is_none()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SymbolError {
    #[error("'{0}' is already declared in this scope")]
    DuplicateSymbol(String),
}

/// A scope containing symbols
#[derive(Debug)]
struct Scope {
    owner: String,
    level: usize,
    symbols: HashMap<String, Symbol>,
}

impl Scope {
    fn new(owner: impl Into<String>, level: usize) -> Self {
        Self {
            owner: owner.into(),
            level,
            symbols: HashMap::new(),
        }
    }
}

/// Stack of lexical scopes
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    retired: Vec<Scope>,
}

pub const GLOBAL_SCOPE: &str = "global";

impl SymbolTable {
    pub fn new() -> Self {
        let mut global = Scope::new(GLOBAL_SCOPE, 0);
        for ty in PrimitiveType::ALL {
            global.symbols.insert(ty.name().to_string(), Symbol::builtin(ty));
        }
        Self {
            scopes: vec![global],
            retired: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Insert into the current scope; outer scopes are not consulted
    pub fn insert(&mut self, mut symbol: Symbol) -> Result<(), SymbolError> {
        let level = self.scope_level();
        let scope = self.current();
        if scope.symbols.contains_key(&symbol.name) {
            return Err(SymbolError::DuplicateSymbol(symbol.name));
        }
        symbol.scope_level = level;
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Nearest enclosing declaration of `name`
    pub fn lookup(&self, name: &str, current_only: bool) -> Option<&Symbol> {
        if current_only {
            return self.scopes.last().and_then(|s| s.symbols.get(name));
        }
        self.scopes.iter().rev().find_map(|s| s.symbols.get(name))
    }

    /// Resolve a declared type name
    pub fn lookup_type(&self, name: &str) -> Option<TypeInfo> {
        self.lookup(name, false)
            .filter(|s| s.kind == SymbolKind::Type)
            .and_then(|s| s.ty.clone())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name, false).is_some()
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.lookup(name, false)
            .is_some_and(|s| matches!(s.kind, SymbolKind::Variable | SymbolKind::Parameter))
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.lookup(name, false).is_some_and(|s| s.is_constant)
    }

    pub fn is_procedure(&self, name: &str) -> bool {
        self.lookup(name, false)
            .is_some_and(|s| s.kind == SymbolKind::Procedure)
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeInfo> {
        self.lookup(name, false).and_then(|s| s.ty.as_ref())
    }

    pub fn get_constant_value(&self, name: &str) -> Option<&ConstValue> {
        self.lookup(name, false)
            .filter(|s| s.is_constant)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_procedure_params(&self, name: &str) -> Option<&[ParamSymbol]> {
        self.lookup(name, false)
            .filter(|s| s.kind == SymbolKind::Procedure)
            .map(|s| s.params.as_slice())
    }

    pub fn enter_scope(&mut self, owner: impl Into<String>) {
        let level = self.scopes.len();
        self.scopes.push(Scope::new(owner, level));
    }

    /// Pop the current scope
    ///
    /// # Panics
    ///
    /// When called on the global scope; every exit must pair with an enter.
    pub fn exit_scope(&mut self) {
        assert!(self.scopes.len() > 1, "exit_scope called on the global scope");
        if let Some(scope) = self.scopes.pop() {
            self.retired.push(scope);
        }
    }

    /// Run `f` inside a fresh scope that is popped on return
    pub fn with_scope<R>(&mut self, owner: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.enter_scope(owner);
        let result = f(self);
        self.exit_scope();
        result
    }

    pub fn scope_level(&self) -> usize {
        self.scopes.len() - 1
    }

    /// All user-declared symbols, in source order, with per-kind counts
    pub fn report(&self) -> SymbolReport {
        let mut entries: Vec<SymbolEntry> = self
            .scopes
            .iter()
            .chain(self.retired.iter())
            .flat_map(|scope| {
                scope.symbols.values().filter_map(move |symbol| {
                    let span = symbol.span?;
                    Some(SymbolEntry {
                        name: symbol.name.clone(),
                        kind: symbol.kind,
                        ty: symbol.ty.as_ref().map(ToString::to_string),
                        value: symbol.value.as_ref().map(ToString::to_string),
                        scope: scope.owner.clone(),
                        scope_level: scope.level,
                        span,
                    })
                })
            })
            .collect();
        entries.sort_by_key(|e| (e.span.start, e.span.end));

        let stats = SymbolKind::ALL
            .into_iter()
            .map(|kind| (kind, entries.iter().filter(|e| e.kind == kind).count()))
            .collect();

        SymbolReport { entries, stats }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of the symbol report
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Option<String>,
    pub value: Option<String>,
    pub scope: String,
    pub scope_level: usize,
    pub span: Span,
}

/// Every declared symbol of a compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolReport {
    pub entries: Vec<SymbolEntry>,
    pub stats: Vec<(SymbolKind, usize)>,
}

impl SymbolReport {
    pub fn count(&self, kind: SymbolKind) -> usize {
        self.stats
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }
}

impl fmt::Display for SymbolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "جدول الرموز - Symbol table")?;
        writeln!(
            f,
            "{:<16} {:<8} {:<24} {:<12} {:<16} {:>5} {:>8}",
            "name", "kind", "type", "value", "scope", "level", "line"
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "{:<16} {:<8} {:<24} {:<12} {:<16} {:>5} {:>8}",
                e.name,
                e.kind.to_string(),
                e.ty.as_deref().unwrap_or("-"),
                e.value.as_deref().unwrap_or("-"),
                e.scope,
                e.scope_level,
                e.span.line
            )?;
        }
        writeln!(f)?;
        write!(f, "total: {}", self.entries.len())?;
        for (kind, count) in &self.stats {
            write!(f, ", {}: {}", kind, count)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(line: usize) -> Span {
        Span::new(line * 10, line * 10 + 1, line, 0)
    }

    #[test]
    fn test_builtins_are_preloaded() {
        let table = SymbolTable::new();
        for ty in PrimitiveType::ALL {
            assert_eq!(table.lookup_type(ty.name()), Some(TypeInfo::Primitive(ty)));
        }
        assert_eq!(table.scope_level(), 0);
        assert!(table.report().entries.is_empty());
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        table.insert(Symbol::variable("س", TypeInfo::integer(), at(1))).unwrap();
        let err = table
            .insert(Symbol::variable("س", TypeInfo::real(), at(2)))
            .unwrap_err();
        assert_eq!(err, SymbolError::DuplicateSymbol("س".to_string()));
        assert_eq!(table.get_type("س"), Some(&TypeInfo::integer()));
    }

    #[test]
    fn test_shadowing_in_nested_scope() {
        let mut table = SymbolTable::new();
        table.insert(Symbol::variable("س", TypeInfo::integer(), at(1))).unwrap();
        table.enter_scope("ا");
        assert!(table.insert(Symbol::variable("س", TypeInfo::real(), at(2))).is_ok());
        assert_eq!(table.get_type("س"), Some(&TypeInfo::real()));
        assert!(table.lookup("س", true).is_some());
        table.exit_scope();
        assert_eq!(table.get_type("س"), Some(&TypeInfo::integer()));
    }

    #[test]
    fn test_scope_round_trip() {
        let mut table = SymbolTable::new();
        table.insert(Symbol::variable("أ", TypeInfo::integer(), at(1))).unwrap();
        table.insert(Symbol::constant("ك", Some(ConstValue::Integer(3)), at(2))).unwrap();

        let before: Vec<_> = ["أ", "ك", "صحيح", "مجهول"]
            .iter()
            .map(|n| table.lookup(n, false).map(|s| (s.kind, s.ty.clone())))
            .collect();

        table.with_scope("ا", |inner| {
            inner.insert(Symbol::variable("محلي", TypeInfo::boolean(), at(3))).unwrap();
            inner.insert(Symbol::variable("أ", TypeInfo::string(), at(4))).unwrap();
            assert_eq!(inner.scope_level(), 1);
        });

        let after: Vec<_> = ["أ", "ك", "صحيح", "مجهول"]
            .iter()
            .map(|n| table.lookup(n, false).map(|s| (s.kind, s.ty.clone())))
            .collect();
        assert_eq!(before, after);
        assert!(table.lookup("محلي", false).is_none());
        assert_eq!(table.scope_level(), 0);
    }

    #[test]
    #[should_panic(expected = "global scope")]
    fn test_exit_global_scope_panics() {
        let mut table = SymbolTable::new();
        table.exit_scope();
    }

    #[test]
    fn test_kind_predicates() {
        let mut table = SymbolTable::new();
        table.insert(Symbol::constant("ك", Some(ConstValue::Real(2.5)), at(1))).unwrap();
        table.insert(Symbol::variable("م", TypeInfo::integer(), at(2))).unwrap();
        let params = vec![ParamSymbol {
            name: "ع".to_string(),
            ty: TypeInfo::integer(),
            mode: PassMode::ByReference,
        }];
        table.insert(Symbol::procedure("ا", params.clone(), at(3))).unwrap();
        table.enter_scope("ا");
        table.insert(Symbol::parameter("ع", TypeInfo::integer(), at(4))).unwrap();

        assert!(table.is_constant("ك"));
        assert!(!table.is_variable("ك"));
        assert!(table.is_variable("م"));
        assert!(table.is_variable("ع"));
        assert!(table.is_procedure("ا"));
        assert!(!table.is_procedure("م"));
        assert_eq!(table.get_constant_value("ك"), Some(&ConstValue::Real(2.5)));
        assert_eq!(table.get_type("ك"), Some(&TypeInfo::real()));
        assert_eq!(table.get_procedure_params("ا"), Some(params.as_slice()));
        assert_eq!(table.lookup_type("م"), None);
        assert_eq!(table.lookup("ع", false).map(|s| s.scope_level), Some(1));
    }

    #[test]
    fn test_report_keeps_retired_scopes() {
        let mut table = SymbolTable::new();
        table.insert(Symbol::variable("س", TypeInfo::integer(), at(1))).unwrap();
        table.insert(Symbol::procedure("ا", Vec::new(), at(2))).unwrap();
        table.with_scope("ا", |t| {
            t.insert(Symbol::variable("ص", TypeInfo::real(), at(3))).unwrap();
        });

        let report = table.report();
        let names: Vec<_> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["س", "ا", "ص"]);
        assert_eq!(report.entries[2].scope, "ا");
        assert_eq!(report.entries[2].scope_level, 1);
        assert_eq!(report.count(SymbolKind::Variable), 2);
        assert_eq!(report.count(SymbolKind::Procedure), 1);
        assert_eq!(report.count(SymbolKind::Constant), 0);

        let text = report.to_string();
        assert!(text.contains("total: 3"));
        assert!(text.contains("حقيقي"));
    }
}
