//! Edge case integration tests for faxc-drv

use faxc_drv::{CompileError, Config, EmitType, Session};
use std::path::PathBuf;

fn write_source(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write source");
    path
}

// ==================== CONFIG TESTS ====================

#[test]
fn test_edge_default_config() {
    let config = Config::default();
    assert!(config.input_files.is_empty());
    assert_eq!(config.emit, EmitType::Executable);
    assert!(!config.verbose);
    assert!(!config.debug);
    assert!(!config.warnings_as_errors);
}

#[test]
fn test_edge_single_input() {
    let mut config = Config::default();
    config.input_files.push(PathBuf::from("test.cpp"));
    assert_eq!(config.input_files.len(), 1);
}

#[test]
fn test_edge_multiple_inputs() {
    let mut config = Config::default();
    for i in 0..10 {
        config.input_files.push(PathBuf::from(format!("test{}.cpp", i)));
    }
    assert_eq!(config.input_files.len(), 10);
}

#[test]
fn test_edge_output_file() {
    let mut config = Config::default();
    config.output_file = Some(PathBuf::from("output.exe"));
    assert!(config.output_file.is_some());
}

#[test]
fn test_edge_all_emit_types() {
    let _tokens = EmitType::Tokens;
    let _ast = EmitType::Ast;
    let _mir = EmitType::Mir;
    let _lir = EmitType::Lir;
    let _asm = EmitType::Asm;
    let _object = EmitType::Object;
    let _exe = EmitType::Executable;
}

#[test]
fn test_edge_verbose_config() {
    let mut config = Config::default();
    config.verbose = true;
    assert!(config.verbose);
}

#[test]
fn test_edge_custom_target() {
    let mut config = Config::default();
    config.target = "wasm32-unknown-unknown".to_string();
    assert_eq!(config.target, "wasm32-unknown-unknown");
}

// ==================== SESSION TESTS ====================

#[test]
fn test_edge_new_session() {
    let config = Config::default();
    let session = Session::new(config);
    assert!(!session.diagnostics.has_errors());
}

// ==================== COMPILATION TESTS ====================

#[test]
fn test_edge_compile_empty_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "empty.cpp", "");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Tokens;

    let mut session = Session::new(config);
    // An empty translation unit has no `main`, but lexing/tokenizing it
    // should never panic.
    let _ = session.compile();
}

#[test]
fn test_edge_compile_whitespace_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "ws.cpp", "   \n\t  \n  ");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Tokens;

    let mut session = Session::new(config);
    session.compile().expect("whitespace-only input should lex cleanly");
}

#[test]
fn test_edge_compile_simple_fn() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "simple.cpp", "int main() { return 0; }");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Ast;

    let mut session = Session::new(config);
    session.compile().expect("simple function should parse");
}

#[test]
fn test_edge_compile_to_tokens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "test.cpp", "int main() { int x = 42; return x; }");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Tokens;

    let mut session = Session::new(config);
    session.compile().expect("tokenizing should succeed");
}

#[test]
fn test_edge_compile_to_ast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "test.cpp", "int main() { return 0; }");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Ast;

    let mut session = Session::new(config);
    session.compile().expect("parsing should succeed");
}

#[test]
fn test_edge_compile_to_mir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "test.cpp", "int main() { int x = 1; return x; }");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Mir;

    let mut session = Session::new(config);
    session.compile().expect("MIR lowering should succeed");
}

#[test]
fn test_edge_compile_to_lir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "test.cpp", "int main() { int x = 1; return x; }");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Lir;

    let mut session = Session::new(config);
    session.compile().expect("LIR lowering should succeed");
}

// ==================== ERROR CASES ====================

#[test]
fn test_err_missing_input_file() {
    let mut config = Config::default();
    config.input_files.push(PathBuf::from("/nonexistent/path/does_not_exist.cpp"));
    config.emit = EmitType::Tokens;

    let mut session = Session::new(config);
    let result = session.compile();
    assert!(result.is_err(), "compiling a missing file should fail");
    match result.unwrap_err() {
        CompileError::IoError(..) => {}
        other => panic!("expected CompileError::IoError, got {other:?}"),
    }
}

#[test]
fn test_err_unterminated_string() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "test.cpp", "int main() { const char* s = \"unterminated; }");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Tokens;

    let mut session = Session::new(config);
    // The lexer should report the error through the diagnostic handler
    // rather than panicking.
    let _ = session.compile();
}

#[test]
fn test_err_missing_brace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_source(&dir, "test.cpp", "int main() { int x = 1;");

    let mut config = Config::default();
    config.input_files.push(path);
    config.emit = EmitType::Ast;

    let mut session = Session::new(config);
    let _ = session.compile();
}

// ==================== SOURCE MAP / FILE ID TESTS ====================

#[test]
fn test_edge_new_source_map() {
    let sm = faxc_util::SourceMap::new();
    assert_eq!(sm.file_count(), 0);
}

#[test]
fn test_edge_source_map_single() {
    let mut sm = faxc_util::SourceMap::new();
    sm.add_file("test.cpp", "content".to_string());
    assert_eq!(sm.file_count(), 1);
}

#[test]
fn test_edge_source_map_many() {
    let mut sm = faxc_util::SourceMap::new();
    for i in 0..100 {
        sm.add_file(format!("test{}.cpp", i), "content".to_string());
    }
    assert_eq!(sm.file_count(), 100);
}

#[test]
fn test_edge_source_map_empty_content() {
    let mut sm = faxc_util::SourceMap::new();
    let id = sm.add_file("empty.cpp", "".to_string());
    let file = sm.get(id).expect("just-added file should be present");
    assert_eq!(file.content(), "");
}

#[test]
fn test_edge_source_map_large_content() {
    let mut sm = faxc_util::SourceMap::new();
    let large = "int main() { ".to_string() + &"int x = 1; ".repeat(10_000) + "return 0; }";
    let id = sm.add_file("large.cpp", large.clone());
    assert_eq!(sm.get(id).unwrap().content(), large);
}

#[test]
fn test_edge_file_id_zero() {
    let id = faxc_util::FileId::new(0);
    assert_eq!(id.0, 0);
}

// ==================== COMPILE ERROR TESTS ====================

#[test]
fn test_edge_compile_error_display() {
    let err = CompileError::CompilationFailed;
    assert_eq!(err.to_string(), "compilation failed");

    let io_err = CompileError::IoError(
        PathBuf::from("test.cpp"),
        std::io::Error::new(std::io::ErrorKind::Other, "test"),
    );
    assert!(io_err.to_string().contains("test.cpp"));

    let link_err = CompileError::Link("undefined reference".to_string());
    assert!(link_err.to_string().contains("undefined reference"));
}
