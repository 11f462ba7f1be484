use std::fs;
use std::path::Path;
use std::process::Command;

use c4c::{BuildConfig, CompileError, build};
use tempfile::TempDir;

fn config_in(dir: &TempDir, source: &str) -> BuildConfig {
  let source_path = dir.path().join("prog.c4");
  fs::write(&source_path, source).unwrap();
  let mut config = BuildConfig::new(source_path);
  config.output = dir.path().join("prog");
  config
}

fn tool_available(tool: &str, version_flag: &str) -> bool {
  Command::new(tool)
    .arg(version_flag)
    .output()
    .is_ok_and(|output| output.status.success())
}

#[test]
fn emit_asm_writes_only_the_assembly() {
  let dir = tempfile::tempdir().unwrap();
  let mut config = config_in(&dir, "var x = 3; exit(x);");
  config.emit_asm_only = true;

  let artifact = build(&config).unwrap();

  assert_eq!(artifact, dir.path().join("prog.asm"));
  let asm = fs::read_to_string(&artifact).unwrap();
  assert!(asm.contains("push QWORD [rsp + 0]"));
  assert!(!dir.path().join("prog").exists());
}

#[test]
fn output_named_like_an_intermediate_is_left_alone() {
  let dir = tempfile::tempdir().unwrap();
  let mut config = config_in(&dir, "exit(5);");
  config.output = dir.path().join("prog.asm");
  config.emit_asm_only = true;
  fs::write(&config.output, "not mine to touch").unwrap();

  let artifact = build(&config).unwrap();

  assert_eq!(artifact, dir.path().join("prog.asm.asm"));
  assert!(fs::read_to_string(&artifact).unwrap().contains("mov rdi, 5"));
  assert_eq!(fs::read_to_string(&config.output).unwrap(), "not mine to touch");
  assert_ne!(config.obj_path(), config.output);
}

#[test]
fn failed_compilation_writes_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let mut config = config_in(&dir, "exit(1)");
  config.emit_asm_only = true;

  let err = build(&config).unwrap_err();

  assert!(matches!(err, CompileError::Parse { .. }));
  let entries: Vec<_> = fs::read_dir(dir.path())
    .unwrap()
    .map(|entry| entry.unwrap().file_name())
    .collect();
  assert_eq!(entries, vec!["prog.c4"]);
}

#[test]
fn failed_compilation_keeps_previous_output_untouched() {
  let dir = tempfile::tempdir().unwrap();
  let mut config = config_in(&dir, "exit(y);");
  config.emit_asm_only = true;
  fs::write(config.asm_path(), "previous").unwrap();

  assert!(build(&config).is_err());
  assert_eq!(fs::read_to_string(config.asm_path()).unwrap(), "previous");
}

#[test]
fn missing_source_is_an_io_error() {
  let dir = tempfile::tempdir().unwrap();
  let config = BuildConfig::new(dir.path().join("missing.c4"));

  let err = build(&config).unwrap_err();

  assert!(matches!(err, CompileError::Io { action: "read", .. }));
  assert!(err.to_string().contains("missing.c4"));
}

fn run(dir: &TempDir, source: &str) -> Option<i32> {
  let config = config_in(dir, source);
  let exe = build(&config).unwrap();
  assert!(!config.asm_path().exists());
  assert!(!config.obj_path().exists());
  Command::new(Path::new(&exe)).status().unwrap().code()
}

#[test]
#[ignore = "needs nasm and ld on an x86-64 Linux host; run with --ignored"]
fn compiled_programs_exit_with_their_status() {
  assert!(
    cfg!(all(target_os = "linux", target_arch = "x86_64")),
    "executables are x86-64 Linux ELF"
  );
  assert!(tool_available("nasm", "-v"), "nasm not found on PATH");
  assert!(tool_available("ld", "--version"), "ld not found on PATH");

  let cases = [
    ("exit(42);", 42),
    ("exit(256);", 0),
    ("var x = 256; exit(x);", 0),
    ("var x = 7; exit(x);", 7),
    ("var x = 300; exit(x);", 44),
    ("var a = 1; var b = 2; var c = 3; exit(a);", 1),
    ("var a = 1; var b = 2; var c = 3; exit(b);", 2),
    ("var x = 1; exit(x); exit(9);", 1),
    ("var x = 5;", 0),
    ("", 0),
  ];
  for (source, expected) in cases {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run(&dir, source), Some(expected), "{source}");
  }

  let dir = tempfile::tempdir().unwrap();
  let mut config = config_in(&dir, "exit(3);");
  config.output = dir.path().join("prog.asm");
  let exe = build(&config).unwrap();
  assert_eq!(exe, config.output);
  assert_eq!(Command::new(&exe).status().unwrap().code(), Some(3));
}
