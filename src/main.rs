use std::path::PathBuf;
use std::process::ExitCode;

use c4c::BuildConfig;
use clap::{ArgAction, Parser};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// The source file to compile
  source: PathBuf,

  /// Path of the executable; the .asm and .o files are placed next to it
  #[arg(short, long, default_value = "out")]
  output: PathBuf,

  /// Only write the assembly file, do not assemble or link
  #[arg(long)]
  emit_asm: bool,

  /// Keep the .asm and .o files after linking
  #[arg(long)]
  keep_intermediates: bool,

  /// Log more (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

impl Cli {
  fn build_config(&self) -> BuildConfig {
    BuildConfig {
      source: self.source.clone(),
      output: self.output.clone(),
      emit_asm_only: self.emit_asm,
      keep_intermediates: self.keep_intermediates || self.emit_asm,
    }
  }

  fn log_level(&self) -> Level {
    match self.verbose {
      0 => Level::WARN,
      1 => Level::INFO,
      2 => Level::DEBUG,
      _ => Level::TRACE,
    }
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_max_level(cli.log_level())
    .with_writer(std::io::stderr)
    .init();

  match c4c::build(&cli.build_config()) {
    Ok(path) => {
      tracing::info!(path = %path.display(), "build finished");
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("{}: error: {err}", cli.source.display());
      ExitCode::FAILURE
    }
  }
}
