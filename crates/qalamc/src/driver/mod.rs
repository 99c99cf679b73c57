//! Compilation driver and pipeline orchestration

use crate::backend::{Backend, BackendConfig, BackendOutput, PythonBackend};
use crate::common::{CompileResult, DiagnosticReporter};
use crate::frontend::ast::Program;
use crate::frontend::{CompileContext, Frontend, FrontendConfig, QalamFrontend};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the program name for the default output file
pub const GENERATED_SUFFIX: &str = "_generated.py";

/// Compilation pipeline that connects a frontend to a backend
pub struct Pipeline {
    frontend: Box<dyn Frontend>,
    backend: Box<dyn Backend>,
}

impl Pipeline {
    pub fn new(frontend: Box<dyn Frontend>, backend: Box<dyn Backend>) -> Self {
        Self { frontend, backend }
    }

    pub fn frontend(&self) -> &dyn Frontend {
        self.frontend.as_ref()
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Whether `path` has one of the frontend's source extensions
    pub fn accepts(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        self.frontend
            .extensions()
            .iter()
            .any(|ext| name.ends_with(ext))
    }

    /// Lex, parse and analyze source text, reporting diagnostics
    pub fn compile_source(
        &self,
        source: &str,
        filename: &str,
        config: &FrontendConfig,
        reporter: &DiagnosticReporter,
        file_id: usize,
    ) -> CompileResult<Program> {
        let ctx = CompileContext::new(filename.to_string(), file_id, reporter);
        self.frontend.compile(source, &ctx, config)
    }

    /// Generate target code for an analyzed program
    pub fn generate_output(
        &self,
        program: &Program,
        config: &BackendConfig,
    ) -> CompileResult<BackendOutput> {
        self.backend.generate(program, config)
    }

    /// Compile `input` and write the generated file
    ///
    /// Without an explicit `output`, the file is named after the program
    /// and placed next to the source. Returns the path written.
    pub fn compile_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        frontend_config: &FrontendConfig,
        backend_config: &BackendConfig,
        reporter: &mut DiagnosticReporter,
    ) -> CompileResult<PathBuf> {
        if !self.accepts(input) {
            log::warn!(
                "{} does not have a {} extension ({})",
                input.display(),
                self.frontend.name(),
                self.frontend.extensions().join(", ")
            );
        }
        let source = fs::read_to_string(input)?;
        let filename = input.display().to_string();
        let file_id = reporter.add_file(filename.clone(), source.clone());

        log::info!(
            "compiling {} with {} -> {}",
            filename,
            self.frontend.name(),
            self.backend.target()
        );
        let program =
            self.compile_source(&source, &filename, frontend_config, reporter, file_id)?;
        let generated = match self.generate_output(&program, backend_config) {
            Ok(generated) => generated,
            Err(e) => {
                reporter.report_error(file_id, &e);
                return Err(e);
            }
        };

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input, &program.name),
        };
        generated.write_to(&path)?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Box::new(QalamFrontend::new()), Box::new(PythonBackend::new()))
    }
}

/// `{program}_generated.py` in the directory of `input`
pub fn default_output_path(input: &Path, program_name: &str) -> PathBuf {
    let file_name = format!("{}{}", program_name, GENERATED_SUFFIX);
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CompileError;
    use crate::runner::{self, RunConfig, RunOutcome};
    use codespan_reporting::term::termcolor::ColorChoice;
    use pretty_assertions::assert_eq;

    fn compile_in(dir: &Path, source: &str, output: Option<&Path>) -> CompileResult<PathBuf> {
        let input = dir.join("prog.qlm");
        fs::write(&input, source).unwrap();
        let mut reporter = DiagnosticReporter::with_color(ColorChoice::Never);
        Pipeline::default().compile_file(
            &input,
            output,
            &FrontendConfig::default(),
            &BackendConfig::default(),
            &mut reporter,
        )
    }

    #[test]
    fn test_default_pipeline() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.frontend().name(), "qalam");
        assert_eq!(pipeline.backend().name(), "python");
    }

    #[test]
    fn test_writes_generated_file_named_after_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = compile_in(
            dir.path(),
            "برنامج مرحبا؛ متغير س: صحيح؛ { س = 2؛ اطبع(س)؛ }.",
            None,
        )
        .unwrap();

        assert_eq!(path, dir.path().join("مرحبا_generated.py"));
        let code = fs::read_to_string(&path).unwrap();
        assert!(code.starts_with("#!/usr/bin/env python3\n# -*- coding: utf-8 -*-\n"));
        assert!(code.contains("Program: مرحبا\n"));
        assert!(code.contains("\n\nimport sys\nimport math\n"));
        assert!(code.contains("    print(س)\n"));
    }

    #[test]
    fn test_explicit_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.py");
        let path = compile_in(dir.path(), "برنامج ت؛ { }.", Some(&out)).unwrap();
        assert_eq!(path, out);
        assert!(out.exists());
    }

    #[test]
    fn test_semantic_errors_prevent_generation() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_in(dir.path(), "برنامج ت؛ { س = 1؛ ص = 2؛ }.", None).unwrap_err();

        assert!(matches!(err, CompileError::Semantic { count: 2 }));
        assert!(!dir.path().join("ت_generated.py").exists());
    }

    #[test]
    fn test_syntax_error_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_in(dir.path(), "برنامج ت؛ { س = ؛ }.", None).unwrap_err();
        assert!(matches!(err, CompileError::Parser { .. }));
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = DiagnosticReporter::with_color(ColorChoice::Never);
        let err = Pipeline::default()
            .compile_file(
                &dir.path().join("missing.qlm"),
                None,
                &FrontendConfig::default(),
                &BackendConfig::default(),
                &mut reporter,
            )
            .unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }

    #[test]
    fn test_circle_sample_compiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = compile_in(
            dir.path(),
            include_str!("../../samples/حساب_الدائرة.qlm"),
            None,
        )
        .unwrap();

        let code = fs::read_to_string(path).unwrap();
        assert!(code.contains("باي = 3.14  # ثابت - Constant\n"));
        assert!(code.contains("    نصف_القطر = float(input())\n"));
        assert!(code.contains("    المساحة = احسب_مساحة(المساحة, نصف_القطر)\n"));
        assert!(code.contains("    return س\n"));
    }

    #[test]
    fn test_exercises_sample_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = compile_in(dir.path(), include_str!("../../samples/تمارين.qlm"), None).unwrap();
        assert_eq!(path, dir.path().join("تمارين_generated.py"));

        if runner::find_python().is_none() {
            eprintln!("skipping run: no Python interpreter on PATH");
            return;
        }
        let outcome = runner::run_script(&path, &RunConfig::default()).unwrap();
        assert_eq!(outcome, RunOutcome::Success);
    }

    #[test]
    fn test_accepts_source_extensions() {
        let pipeline = Pipeline::default();
        assert!(pipeline.accepts(Path::new("دروس/حساب_الدائرة.qlm")));
        assert!(pipeline.accepts(Path::new("prog.txt")));
        assert!(!pipeline.accepts(Path::new("prog.py")));
        assert!(!pipeline.accepts(Path::new("qlm")));
    }

    #[test]
    fn test_unknown_extension_still_compiles() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prog.src");
        fs::write(&input, "برنامج ت؛ { }.").unwrap();
        let mut reporter = DiagnosticReporter::with_color(ColorChoice::Never);
        let path = Pipeline::default()
            .compile_file(
                &input,
                None,
                &FrontendConfig::default(),
                &BackendConfig::default(),
                &mut reporter,
            )
            .unwrap();
        assert_eq!(path, dir.path().join("ت_generated.py"));
    }

    #[test]
    fn test_default_output_path_without_parent() {
        assert_eq!(
            default_output_path(Path::new("prog.qlm"), "ت"),
            PathBuf::from("ت_generated.py")
        );
    }
}
