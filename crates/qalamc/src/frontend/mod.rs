//! Frontend trait and the Qalam frontend
//!
//! The frontend is responsible for:
//! 1. Lexing source code into tokens
//! 2. Parsing tokens into a concrete parse tree
//! 3. Semantic analysis, producing the typed AST

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

use crate::common::{CompileError, CompileResult, DiagnosticReporter};
use ast::Program;
use lexer::Lexer;
use parser::{Parser, DEFAULT_MAX_DEPTH};
use sema::{Analysis, SemanticAnalyzer};

/// Configuration options passed to the frontend
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub dump_symbols: bool,
    pub verbose: bool,
    /// Nesting limit for instructions and expressions
    pub max_depth: usize,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dump_tokens: false,
            dump_ast: false,
            dump_symbols: false,
            verbose: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

/// Trait for language frontends
///
/// A frontend takes source code and produces a checked AST. Diagnostics
/// are rendered through the context's reporter before an error is returned.
pub trait Frontend: Send + Sync {
    /// The name of this frontend
    fn name(&self) -> &'static str;

    /// File extensions this frontend handles
    fn extensions(&self) -> &'static [&'static str];

    /// Lex, parse and analyze `source`
    fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<Program>;

    /// Optional: dump tokens for debugging
    fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let _ = source;
        Ok(String::new())
    }
}

/// Parse and analyze `source` without rendering diagnostics
///
/// Syntax errors are returned as `Err`; semantic errors are collected in
/// the returned [`Analysis`].
pub fn analyze_source(source: &str, max_depth: usize) -> CompileResult<Analysis> {
    let tree = Parser::new(source)?.with_max_depth(max_depth).parse()?;
    Ok(SemanticAnalyzer::new().with_max_depth(max_depth).analyze(&tree))
}

/// Frontend for Qalam source files
pub struct QalamFrontend;

impl QalamFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for QalamFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for QalamFrontend {
    fn name(&self) -> &'static str {
        "qalam"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".qlm", ".txt"]
    }

    fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<Program> {
        // Phase 1: Lexing (optional token dump)
        if config.dump_tokens {
            match self.dump_tokens(source) {
                Ok(dump) => {
                    eprintln!("=== Tokens ===");
                    eprint!("{}", dump);
                    eprintln!("=== End Tokens ===\n");
                }
                Err(e) => {
                    ctx.reporter.report_error(ctx.file_id, &e);
                    return Err(e);
                }
            }
        }

        // Phase 2: Parsing and semantic analysis
        log::info!("parsing {}", ctx.filename);
        let analysis = match analyze_source(source, config.max_depth) {
            Ok(analysis) => analysis,
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                return Err(e);
            }
        };

        if config.dump_ast {
            eprintln!("=== AST ===");
            eprintln!("{:#?}", analysis.program);
            eprintln!("=== End AST ===\n");
        }

        if config.dump_symbols {
            eprintln!("{}", analysis.symbols);
        }

        if !analysis.is_ok() {
            for error in &analysis.errors {
                ctx.reporter
                    .report_at(ctx.file_id, "semantic error", &error.message, error.span);
            }
            return Err(CompileError::semantic(analysis.errors.len()));
        }

        log::info!("semantic analysis passed");
        if config.verbose {
            log::info!(
                "{} symbol(s), {} variable(s)",
                analysis.symbols.entries.len(),
                analysis.symbols.count(sema::SymbolKind::Variable)
            );
        }
        log::debug!(
            "program '{}': {} procedure(s), {} top-level statement(s)",
            analysis.program.name,
            analysis.program.block.procedures.len(),
            match &analysis.program.block.body.kind {
                ast::StmtKind::Compound(stmts) => stmts.len(),
                _ => 1,
            }
        );

        Ok(analysis.program)
    }

    fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let tokens = Lexer::new(source).tokenize_all()?;
        log::debug!("{} token(s)", tokens.len());
        Ok(tokens
            .iter()
            .map(|t| format!("{}\t{}\n", t.span, t.kind))
            .collect())
    }
}
