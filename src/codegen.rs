//! Code generation: lower the parsed program into x86-64 NASM assembly.
//!
//! The emitter uses a simple stack machine. Every variable is one 64-bit word
//! pushed onto the machine stack when it is declared, and the generator keeps
//! a virtual count of live words so each slot can be addressed relative to
//! `rsp` however much has been pushed since.

use tracing::{debug, trace};

use crate::error::{CompileResult, DuplicateDeclarationSnafu, Location, UndeclaredIdentifierSnafu};
use crate::parser::{Expr, Program, Stmt};

const WORD_SIZE: usize = 8;
const SYS_EXIT: u64 = 60;

/// Symbol table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
  pub name: String,
  /// Value of the stack counter when the variable's slot was pushed.
  pub stack_offset: usize,
  /// Byte offset of the declaration, for diagnostics.
  pub loc: usize,
}

/// State of a single generation pass.
#[derive(Debug)]
pub struct Generator<'a> {
  source: &'a str,
  asm: String,
  stack_size: usize,
  vars: Vec<Var>,
}

impl<'a> Generator<'a> {
  pub fn new(source: &'a str) -> Self {
    let mut asm = String::new();
    asm.push_str("global _start\n");
    asm.push_str("_start:\n");
    Self {
      source,
      asm,
      stack_size: 0,
      vars: Vec::new(),
    }
  }

  /// Number of words currently live on the evaluation stack.
  pub fn stack_size(&self) -> usize {
    self.stack_size
  }

  /// Declared variables in declaration order.
  pub fn variables(&self) -> &[Var] {
    &self.vars
  }

  /// Emit every statement in order. On error nothing usable is produced.
  pub fn emit_program(&mut self, program: &Program) -> CompileResult<()> {
    for stmt in program.iter() {
      self.emit_stmt(stmt)?;
    }
    Ok(())
  }

  /// Append the fall-through `exit(0)` and hand back the assembly text.
  pub fn finish(mut self) -> String {
    self.emit("mov rdi, 0");
    self.emit_exit_syscall();
    debug!(
      bytes = self.asm.len(),
      variables = self.vars.len(),
      stack_size = self.stack_size,
      "generated assembly"
    );
    self.asm
  }

  fn emit_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
      Stmt::Exit { expr, .. } => {
        self.emit_load_status(expr)?;
        self.emit_exit_syscall();
      }
      Stmt::VarDeclare { name, expr, loc } => {
        if let Some(previous) = self.lookup(name) {
          return DuplicateDeclarationSnafu {
            name,
            at: Location::at(self.source, *loc),
            previous: Location::at(self.source, previous.loc),
          }
          .fail();
        }

        let stack_offset = self.stack_size;
        self.emit_push_expr(expr)?;
        let var = Var {
          name: name.clone(),
          stack_offset,
          loc: *loc,
        };
        trace!(?var, "declared variable");
        self.vars.push(var);
      }
    }
    Ok(())
  }

  /// Put the exit status in `rdi`. Literals are loaded directly, variables
  /// go through the stack.
  fn emit_load_status(&mut self, expr: &Expr) -> CompileResult<()> {
    match expr {
      Expr::IntLiteral { value, .. } => self.emit(&format!("mov rdi, {value}")),
      Expr::Identifier { .. } => {
        self.emit_push_expr(expr)?;
        self.pop("rdi");
      }
    }
    Ok(())
  }

  /// Push the value of `expr` as a new stack word.
  fn emit_push_expr(&mut self, expr: &Expr) -> CompileResult<()> {
    match expr {
      Expr::IntLiteral { value, .. } => {
        self.emit(&format!("mov rax, {value}"));
        self.push("rax");
      }
      Expr::Identifier { name, loc } => {
        let Some(var) = self.lookup(name) else {
          return UndeclaredIdentifierSnafu {
            name,
            at: Location::at(self.source, *loc),
          }
          .fail();
        };
        let operand = self.slot_operand(var);
        self.push(&operand);
      }
    }
    Ok(())
  }

  /// `rsp`-relative operand for a variable at the current stack depth.
  fn slot_operand(&self, var: &Var) -> String {
    let depth = self.stack_size - var.stack_offset - 1;
    format!("QWORD [rsp + {}]", depth * WORD_SIZE)
  }

  fn emit_exit_syscall(&mut self) {
    self.emit(&format!("mov rax, {SYS_EXIT}"));
    self.emit("syscall");
  }

  fn lookup(&self, name: &str) -> Option<&Var> {
    self.vars.iter().find(|var| var.name == name)
  }

  fn push(&mut self, operand: &str) {
    self.emit(&format!("push {operand}"));
    self.stack_size += 1;
  }

  fn pop(&mut self, reg: &str) {
    debug_assert!(self.stack_size > 0, "pop from an empty evaluation stack");
    self.emit(&format!("pop {reg}"));
    self.stack_size = self.stack_size.saturating_sub(1);
  }

  fn emit(&mut self, line: &str) {
    self.asm.push_str("    ");
    self.asm.push_str(line);
    self.asm.push('\n');
  }
}

/// Emit assembly for a whole program.
pub fn generate(program: &Program, source: &str) -> CompileResult<String> {
  let mut generator = Generator::new(source);
  generator.emit_program(program)?;
  Ok(generator.finish())
}
