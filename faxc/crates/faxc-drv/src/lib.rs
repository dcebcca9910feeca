//! faxc-drv - Compiler Driver
//!
//! ============================================================================
//! COMPILER DRIVER OVERVIEW
//! ============================================================================
//!
//! Compiler driver adalah entry point dan orchestrator untuk seluruh
//! compilation pipeline. Driver bertanggung jawab untuk:
//!
//! 1. COMMAND LINE PARSING
//!    - Parse arguments dan flags
//!    - Validate options
//!    - Setup configuration
//!
//! 2. FILE MANAGEMENT
//!    - Read source files
//!    - Manage output paths
//!
//! 3. PIPELINE ORCHESTRATION
//!    - Run compilation phases dalam urutan yang benar
//!    - Handle errors antar phases
//!    - Manage intermediate artifacts
//!
//! 4. ERROR REPORTING
//!    - Aggregate diagnostics dari semua phases
//!    - Format dan display errors
//!    - Exit dengan appropriate code
//!
//! ============================================================================
//! COMPILATION PIPELINE
//! ============================================================================
//!
//! ```text
//! Source Files (.cpp)
//!        │
//!        ▼
//!   [Read Files]
//!        │
//!        ▼
//!   [Lexer] ──▶ Token Stream
//!        │
//!        ▼
//!   [Parser + Resolver] ──▶ AST (names bound, `faxc-sem::DefTable` populated)
//!        │
//!        ▼
//!   [MIR Generation] ──▶ MIR
//!        │
//!        ▼
//!   [LIR Generation] ──▶ LIR
//!        │
//!        ▼
//!   [Register Allocation + Code Generation] ──▶ Assembly / Object File
//!        │
//!        ▼
//!   [Linking] ──▶ Executable
//! ```
//!
//! PHASES DETAIL:
//! --------------
//!
//! Phase 1: Lexical Analysis
//! - Input: Source code (text)
//! - Output: Token stream
//! - Tool: faxc-lex
//! - Errors: Invalid characters, unterminated strings
//!
//! Phase 2: Parsing + Name Resolution
//! - Input: Token stream
//! - Output: Abstract Syntax Tree (AST) with every name in it resolved
//! - Tool: faxc-par (syntax) + faxc-sem (the `SemanticHooks` it calls back
//!   into while parsing, plus the second pass over free functions/globals
//!   once parsing finishes)
//! - Errors: Syntax errors, unresolved names
//!
//! Phase 3: MIR Generation
//! - Input: resolved AST
//! - Output: Mid-level IR (MIR)
//! - Tool: faxc-mir
//! - There's no separate HIR stage: a resolved C++ function body is already
//!   concrete enough to lower straight to basic blocks.
//!
//! Phase 4: LIR Generation
//! - Input: MIR
//! - Output: Low-level IR (LIR), still in virtual registers
//! - Tool: faxc-lir
//!
//! Phase 5: Code Generation
//! - Input: LIR
//! - Output: Assembly text or a relocatable object file (ELF64/PE-COFF)
//! - Tool: faxc-gen (register allocation, encoding, object emission all
//!   happen inside this one phase)
//!
//! Phase 6: Linking
//! - Input: Object files
//! - Output: Executable
//! - Tool: System linker (ld, link.exe, etc.), via faxc-gen::linker
//!
//! ============================================================================
//! COMMAND LINE INTERFACE
//! ============================================================================
//!
//! USAGE:
//!
//! Compile file:
//!   faxc main.cpp
//!
//! Specify output:
//!   faxc main.cpp -o myprogram
//!
//! Multiple files:
//!   faxc file1.cpp file2.cpp file3.cpp -o program
//!
//! Optimization levels:
//!   faxc -O0 main.cpp    # No optimization (debug)
//!   faxc -O1 main.cpp    # Basic optimization
//!   faxc -O2 main.cpp    # Standard optimization (default)
//!   faxc -O3 main.cpp    # Aggressive optimization
//!   faxc -Os main.cpp    # Optimize for size
//!
//! Emit intermediate representations:
//!   faxc --emit-tokens main.cpp     # Lexer output
//!   faxc --emit-ast main.cpp        # Parser output
//!   faxc --emit-mir main.cpp        # MIR
//!   faxc --emit-lir main.cpp        # LIR
//!   faxc --emit-asm main.cpp        # Assembly
//!   faxc -S main.cpp                # Same as --emit-asm
//!
//! Stop after specific phase:
//!   faxc -c main.cpp      # Compile to object file only
//!
//! Cross compilation:
//!   faxc --target x86_64-pc-windows-gnu main.cpp
//!   faxc --target x86_64-unknown-linux-gnu main.cpp
//!
//! Debug options:
//!   faxc -g main.cpp              # Include debug info
//!   faxc --verbose main.cpp       # Verbose output
//!   faxc -Werror main.cpp         # Treat warnings as errors
//!
//! ============================================================================
//! CONFIGURATION
//! ============================================================================
//!
//! Fields:
//! - input_files: Vec<PathBuf>
//! - output_file: Option<PathBuf>
//! - opt_level: OptLevel
//! - target: String
//! - emit: EmitType
//! - debug: bool
//! - verbose: bool
//! - warnings_as_errors: bool
//! - libraries: Vec<String>
//! - library_paths: Vec<PathBuf>
//!
//! ============================================================================
//! ERROR HANDLING
//! ============================================================================
//!
//! Error Levels:
//! -------------
//! - ERROR: Fatal error, compilation fails
//! - WARNING: Non-fatal, compilation succeeds
//!
//! Error Aggregation:
//! ------------------
//! Compiler mengumpulkan semua error sebelum exit, lewat `faxc_util::Handler`.
//! Ini memungkinkan user untuk melihat semua masalah dalam sekali compile.
//!
//! Exit Codes:
//! -----------
//! - 0: Success
//! - 1: Compilation error
//! - 3: Command line error

use std::path::PathBuf;

use faxc_util::{FileId, Handler, SourceMap, StringTable};

/// Compiler configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Input source files
    pub input_files: Vec<PathBuf>,

    /// Output file path (None untuk default)
    pub output_file: Option<PathBuf>,

    /// Optimization level
    pub opt_level: OptLevel,

    /// Target triple
    pub target: String,

    /// Emit type (what to produce)
    pub emit: EmitType,

    /// Include debug information
    pub debug: bool,

    /// Verbose output
    pub verbose: bool,

    /// Treat warnings as errors
    pub warnings_as_errors: bool,

    /// Libraries to link
    pub libraries: Vec<String>,

    /// Library search paths
    pub library_paths: Vec<PathBuf>,

    /// Working directory
    pub working_dir: PathBuf,
}

/// Optimization level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    /// No optimization
    None,
    /// Basic optimization
    Less,
    /// Standard optimization
    #[default]
    Default,
    /// Aggressive optimization
    Aggressive,
    /// Optimize for size
    Size,
}

/// Emit type - what output to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitType {
    /// Tokens only
    Tokens,
    /// AST only
    Ast,
    /// MIR only
    Mir,
    /// LIR only
    Lir,
    /// Assembly
    Asm,
    /// Object file
    Object,
    /// Full executable
    Executable,
}

impl Default for EmitType {
    fn default() -> Self {
        EmitType::Executable
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_files: Vec::new(),
            output_file: None,
            opt_level: OptLevel::default(),
            target: default_target(),
            emit: EmitType::Executable,
            debug: false,
            verbose: false,
            warnings_as_errors: false,
            libraries: Vec::new(),
            library_paths: Vec::new(),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Compilation session
///
/// Session menyimpan state untuk satu invocation compiler.
pub struct Session {
    /// Configuration
    pub config: Config,

    /// Source map (all loaded files)
    pub sources: SourceMap,

    /// Diagnostic handler
    pub diagnostics: Handler,

    /// String interner, shared by the lexer and every later stage that
    /// needs to turn a `Symbol` back into text (mangling, object emission).
    pub interner: StringTable,
}

impl Session {
    /// Create new session
    pub fn new(config: Config) -> Self {
        Self { config, sources: SourceMap::new(), diagnostics: Handler::new(), interner: StringTable::new() }
    }

    /// Run compilation
    pub fn compile(&mut self) -> Result<(), CompileError> {
        if self.config.verbose {
            eprintln!("Configuration: {:?}", self.config);
        }

        let file_ids = self.read_sources()?;
        let results = self.run_pipeline(&file_ids)?;
        self.print_diagnostics();

        if self.diagnostics.has_errors() {
            return Err(CompileError::CompilationFailed);
        }
        if self.config.warnings_as_errors && self.diagnostics.warning_count() > 0 {
            return Err(CompileError::CompilationFailed);
        }

        self.emit_output(results)
    }

    /// Prints every diagnostic collected so far to stderr, in the order
    /// they were raised, with a source snippet when the span resolves.
    fn print_diagnostics(&self) {
        for diag in self.diagnostics.diagnostics() {
            match self.sources.format_span(diag.span) {
                Some(location) => eprintln!("{}: {}\n{}", diag.level, diag.message, location),
                None => eprintln!("{}: {}", diag.level, diag.message),
            }
            for note in &diag.notes {
                eprintln!("  note: {note}");
            }
            for help in &diag.helps {
                eprintln!("  help: {help}");
            }
        }
    }

    /// Read all source files, returning their assigned `FileId`s in order.
    fn read_sources(&mut self) -> Result<Vec<FileId>, CompileError> {
        let mut ids = Vec::with_capacity(self.config.input_files.len());
        for path in &self.config.input_files {
            if self.config.verbose {
                eprintln!("Reading: {}", path.display());
            }
            let content = std::fs::read_to_string(path).map_err(|e| CompileError::IoError(path.clone(), e))?;
            ids.push(self.sources.add_file(path.display().to_string(), content));
        }
        Ok(ids)
    }

    /// Run compilation pipeline
    fn run_pipeline(&mut self, file_ids: &[FileId]) -> Result<CompilationResults, CompileError> {
        let mut results = CompilationResults::default();

        // Phases 1-2: lexing feeds straight into parsing, since
        // `faxc_par::Parser` owns its `faxc_lex::Lexer` rather than pulling
        // from an abstract token source. One `Resolver` is shared across
        // every translation unit in this compilation, so a name defined in
        // one file resolves the same way for the rest.
        let mut resolver = faxc_sem::Resolver::new();
        let mut translation_units = Vec::new();
        let mut all_tokens = Vec::new();

        for &file_id in file_ids {
            let source = self.sources.get(file_id).expect("file_id came from read_sources");
            if self.config.verbose {
                eprintln!("Lexing {}", source.name());
            }
            let lexer = faxc_lex::Lexer::new(source.content(), file_id, &mut self.interner, &self.diagnostics);

            if self.config.emit == EmitType::Tokens {
                let mut lexer = lexer;
                let tokens: Vec<_> = std::iter::from_fn(|| {
                    let tok = lexer.next_token();
                    (!tok.kind.is_eof()).then_some(tok)
                })
                .collect();
                all_tokens.push((file_id, tokens));
                continue;
            }

            if self.config.verbose {
                eprintln!("Parsing {}", source.name());
            }
            let mut hooks = faxc_sem::Hooks::new(&mut resolver, &self.diagnostics);
            let mut parser = faxc_par::Parser::new(lexer, &self.diagnostics, &mut hooks);
            let tu = parser.parse_translation_unit();
            translation_units.push((file_id, tu));
        }

        if self.config.emit == EmitType::Tokens {
            results.tokens = all_tokens;
            return Ok(results);
        }

        for (_, tu) in &translation_units {
            faxc_sem::resolve_translation_unit(tu, &mut resolver, &self.diagnostics);
        }
        if self.config.emit == EmitType::Ast {
            results.asts = translation_units;
            return Ok(results);
        }

        // Phase 3: MIR generation, one function at a time.
        let mut fns = Vec::new();
        for (file_id, tu) in translation_units {
            for item in tu {
                if let faxc_par::ast::Item::Function(f) = item {
                    if f.body.is_some() {
                        fns.push((file_id, f));
                    }
                }
            }
        }

        let mut mir_fns = Vec::new();
        for (file_id, f) in &fns {
            if self.config.verbose {
                eprintln!("Lowering {} to MIR", f.name.as_str(&self.interner));
            }
            mir_fns.push((*file_id, faxc_mir::lower_function(f, &resolver)));
        }
        if self.config.emit == EmitType::Mir {
            results.mirs = mir_fns;
            return Ok(results);
        }

        // Phase 4: LIR generation.
        let mut lir_fns = Vec::new();
        for (file_id, mir) in &mir_fns {
            lir_fns.push((*file_id, faxc_lir::lower_mir_to_lir(mir)));
        }
        if self.config.emit == EmitType::Lir {
            results.lirs = lir_fns;
            return Ok(results);
        }

        // Phase 5: Code generation.
        let format = object_format_for_target(&self.config.target);
        match self.config.emit {
            EmitType::Asm => {
                for (file_id, lir) in &lir_fns {
                    let text = faxc_gen::asm_text::render_function(lir, &self.interner);
                    results.asm.push((*file_id, text));
                }
            }
            EmitType::Object | EmitType::Executable => {
                let mut builder = faxc_gen::ObjectBuilder::new(format);
                for (_, lir) in &lir_fns {
                    let emitted = faxc_gen::emitter::emit_function(lir, &self.interner).map_err(CompileError::CodeGen)?;
                    builder.add_function(&emitted);
                }
                results.object = Some(builder.finish());
            }
            _ => unreachable!("earlier emit kinds already returned"),
        }

        Ok(results)
    }

    /// Emit output
    fn emit_output(&self, results: CompilationResults) -> Result<(), CompileError> {
        match self.config.emit {
            EmitType::Tokens => {
                for (_, tokens) in results.tokens {
                    println!("{:?}", tokens);
                }
            }
            EmitType::Ast => {
                for (_, ast) in results.asts {
                    println!("{:#?}", ast);
                }
            }
            EmitType::Mir => {
                for (_, mir) in results.mirs {
                    println!("{:#?}", mir);
                }
            }
            EmitType::Lir => {
                for (_, lir) in results.lirs {
                    println!("{:#?}", lir);
                }
            }
            EmitType::Asm => {
                let output = self.output_path("s");
                let text: String = results.asm.into_iter().map(|(_, t)| t).collect();
                std::fs::write(&output, text).map_err(|e| CompileError::IoError(output, e))?;
            }
            EmitType::Object => {
                let output = self.output_path("o");
                let bytes = results.object.unwrap_or_default();
                std::fs::write(&output, bytes).map_err(|e| CompileError::IoError(output, e))?;
            }
            EmitType::Executable => {
                let output = self.config.output_file.clone().unwrap_or_else(|| PathBuf::from("a.out"));
                let object_path = output.with_extension("o");
                let bytes = results.object.unwrap_or_default();
                std::fs::write(&object_path, bytes).map_err(|e| CompileError::IoError(object_path.clone(), e))?;

                let linker = faxc_gen::linker::Linker::new(self.config.target.clone());
                linker
                    .link(&[object_path.as_path()], &output, &self.config.libraries)
                    .map_err(CompileError::Link)?;
            }
        }

        Ok(())
    }

    fn output_path(&self, default_ext: &str) -> PathBuf {
        self.config.output_file.clone().unwrap_or_else(|| PathBuf::from(format!("a.{default_ext}")))
    }
}

#[derive(Default)]
struct CompilationResults {
    tokens: Vec<(FileId, Vec<faxc_lex::Token>)>,
    asts: Vec<(FileId, faxc_par::ast::TranslationUnit)>,
    mirs: Vec<(FileId, faxc_mir::Function)>,
    lirs: Vec<(FileId, faxc_lir::Function)>,
    asm: Vec<(FileId, String)>,
    object: Option<Vec<u8>>,
}

/// Picks the relocatable object format a target triple's platform uses.
fn object_format_for_target(target: &str) -> faxc_gen::ObjectFormat {
    if target.contains("windows") {
        faxc_gen::ObjectFormat::Coff
    } else {
        faxc_gen::ObjectFormat::Elf
    }
}

/// Compile error
#[derive(Debug)]
pub enum CompileError {
    IoError(PathBuf, std::io::Error),
    CompilationFailed,
    CodeGen(faxc_gen::CodeGenError),
    Link(String),
    InvalidArguments(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::IoError(path, e) => write!(f, "IO error for {}: {}", path.display(), e),
            CompileError::CompilationFailed => write!(f, "compilation failed"),
            CompileError::CodeGen(e) => write!(f, "code generation failed: {e}"),
            CompileError::Link(msg) => write!(f, "link failed: {msg}"),
            CompileError::InvalidArguments(s) => write!(f, "invalid arguments: {s}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Get default target triple
fn default_target() -> String {
    std::env::var("TARGET").unwrap_or_else(|_| {
        if cfg!(target_os = "windows") {
            "x86_64-pc-windows-msvc".to_string()
        } else if cfg!(target_os = "macos") {
            "x86_64-apple-darwin".to_string()
        } else {
            "x86_64-unknown-linux-gnu".to_string()
        }
    })
}

const USAGE: &str = "\
Usage: faxc [options] <input...>

Options:
  -o <path>        write output to <path>
  -O0/-O1/-O2/-O3   optimization level (default -O2)
  -Os               optimize for size
  -g                include debug info
  -c                emit object file only
  -S, --emit-asm    emit assembly
  --emit-tokens     emit lexer tokens
  --emit-ast        emit parsed AST
  --emit-mir        emit MIR
  --emit-lir        emit LIR
  --target <triple> cross-compilation target
  -l <name>         link library
  -L <path>         add library search path
  --verbose         verbose diagnostics
  -Werror           treat warnings as errors
  -h, --help        print this help and exit
  -V, --version     print version and exit";

/// Parses `std::env::args`, runs a [`Session`], and reports the result —
/// the entry point `src/main.rs` calls.
pub fn run() -> Result<(), CompileError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }
    if args.iter().any(|a| a == "-V" || a == "--version") {
        println!("faxc {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let config = parse_args(&args)?;
    let mut session = Session::new(config);
    session.compile()
}

fn parse_args(args: &[String]) -> Result<Config, CompileError> {
    let mut config = Config::default();
    config.input_files.clear();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-o" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| CompileError::InvalidArguments("-o needs a path".into()))?;
                config.output_file = Some(PathBuf::from(path));
            }
            "-O0" => config.opt_level = OptLevel::None,
            "-O1" => config.opt_level = OptLevel::Less,
            "-O2" => config.opt_level = OptLevel::Default,
            "-O3" => config.opt_level = OptLevel::Aggressive,
            "-Os" => config.opt_level = OptLevel::Size,
            "-g" => config.debug = true,
            "--verbose" => config.verbose = true,
            "-Werror" => config.warnings_as_errors = true,
            "-c" => config.emit = EmitType::Object,
            "-S" | "--emit-asm" => config.emit = EmitType::Asm,
            "--emit-tokens" => config.emit = EmitType::Tokens,
            "--emit-ast" => config.emit = EmitType::Ast,
            "--emit-mir" => config.emit = EmitType::Mir,
            "--emit-lir" => config.emit = EmitType::Lir,
            "--target" => {
                i += 1;
                let target = args.get(i).ok_or_else(|| CompileError::InvalidArguments("--target needs a triple".into()))?;
                config.target = target.clone();
            }
            "-l" => {
                i += 1;
                let lib = args.get(i).ok_or_else(|| CompileError::InvalidArguments("-l needs a library name".into()))?;
                config.libraries.push(lib.clone());
            }
            "-L" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| CompileError::InvalidArguments("-L needs a path".into()))?;
                config.library_paths.push(PathBuf::from(path));
            }
            other if other.starts_with('-') => {
                return Err(CompileError::InvalidArguments(format!("unknown flag: {other}")));
            }
            path => config.input_files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    if config.input_files.is_empty() {
        return Err(CompileError::InvalidArguments("no input files".into()));
    }

    Ok(config)
}
