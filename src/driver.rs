//! Build driver: reads the source file, writes the assembly and runs the
//! external toolchain (`nasm`, then `ld`) to produce an executable.
//!
//! The assembly file only appears once the whole pipeline succeeded, so a
//! failed compilation leaves nothing behind that could be assembled.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use snafu::{ResultExt, ensure};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{CompileResult, IoSnafu, ToolSpawnSnafu, ToolchainSnafu};

/// Options for one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
  /// Source file to compile.
  pub source: PathBuf,
  /// Path of the executable. The intermediates are named by appending
  /// `.asm` and `.o` to it.
  pub output: PathBuf,
  /// Stop once the assembly file is written.
  pub emit_asm_only: bool,
  /// Keep the `.asm` and `.o` files after linking.
  pub keep_intermediates: bool,
}

impl BuildConfig {
  pub fn new(source: impl Into<PathBuf>) -> Self {
    Self {
      source: source.into(),
      output: PathBuf::from("out"),
      emit_asm_only: false,
      keep_intermediates: false,
    }
  }

  pub fn asm_path(&self) -> PathBuf {
    self.intermediate(".asm")
  }

  pub fn obj_path(&self) -> PathBuf {
    self.intermediate(".o")
  }

  /// Append `suffix` to the whole output name, so an output that already
  /// ends in `.asm` or `.o` never collides with its own intermediates.
  fn intermediate(&self, suffix: &str) -> PathBuf {
    let mut name = self.output.clone().into_os_string();
    name.push(suffix);
    PathBuf::from(name)
  }
}

/// Run the whole build and return the path of the final artifact: the
/// executable, or the assembly file when `emit_asm_only` is set.
pub fn build(config: &BuildConfig) -> CompileResult<PathBuf> {
  let source = fs::read_to_string(&config.source).context(IoSnafu {
    action: "read",
    path: &config.source,
  })?;
  debug!(path = %config.source.display(), bytes = source.len(), "read source");

  let asm = crate::generate_assembly(&source)?;
  let asm_path = config.asm_path();
  write_atomically(&asm_path, &asm)?;
  info!(path = %asm_path.display(), "wrote assembly");

  if config.emit_asm_only {
    return Ok(asm_path);
  }

  let obj_path = config.obj_path();
  let linked = assemble(&asm_path, &obj_path).and_then(|()| link(&obj_path, &config.output));

  if !config.keep_intermediates {
    for path in [&asm_path, &obj_path] {
      if let Err(err) = fs::remove_file(path)
        && path.exists()
      {
        warn!(path = %path.display(), %err, "failed to remove intermediate file");
      }
    }
  }

  linked?;
  info!(path = %config.output.display(), "linked executable");
  Ok(config.output.clone())
}

/// Write `contents` through a temporary file in the destination directory
/// and rename it into place.
pub fn write_atomically(path: &Path, contents: &str) -> CompileResult<()> {
  let dir = path
    .parent()
    .filter(|parent| !parent.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));

  let mut file = NamedTempFile::new_in(dir).context(IoSnafu {
    action: "create a temporary file in",
    path: dir,
  })?;
  file.write_all(contents.as_bytes()).context(IoSnafu {
    action: "write",
    path: file.path(),
  })?;
  file
    .persist(path)
    .map_err(|err| err.error)
    .context(IoSnafu {
      action: "write",
      path,
    })?;
  Ok(())
}

/// `nasm -felf64 <asm> -o <obj>`
pub fn assemble(asm: &Path, obj: &Path) -> CompileResult<()> {
  run_tool(
    "nasm",
    &[
      OsStr::new("-felf64"),
      asm.as_os_str(),
      OsStr::new("-o"),
      obj.as_os_str(),
    ],
  )
}

/// `ld <obj> -o <exe>`
pub fn link(obj: &Path, exe: &Path) -> CompileResult<()> {
  run_tool("ld", &[obj.as_os_str(), OsStr::new("-o"), exe.as_os_str()])
}

fn run_tool(tool: &'static str, args: &[&OsStr]) -> CompileResult<()> {
  debug!(tool, ?args, "running external tool");
  let output = Command::new(tool)
    .args(args)
    .output()
    .context(ToolSpawnSnafu { tool })?;

  ensure!(
    output.status.success(),
    ToolchainSnafu {
      tool,
      status: output.status,
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
  );
  Ok(())
}
