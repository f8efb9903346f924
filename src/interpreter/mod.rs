//! Tree-walking interpreter (spec.md §4.3, §4.4) — environment stack, value
//! coercions, command execution, builtins, and tag calls.

pub mod array;
pub mod builtins;
pub mod calls;
pub mod env;
pub mod error;
pub mod exec;
pub mod expr;
pub mod value;

use crate::diagnostic::Diagnostic;
use crate::parser::{self, TopLevel};
use env::EnvStack;
use error::{RunResult, RuntimeSignal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
pub use value::{MValue, Scalar};

/// A host-provided native function: receives the already-evaluated argument
/// values and may return a scalar result (spec.md §4.4, §6 "Host
/// extension").
pub type NativeFn = Box<dyn Fn(&[MValue]) -> Option<Scalar>>;
pub type HostFunctions = HashMap<String, NativeFn>;

/// Bounds execution so a host can recover from a runaway program (SPEC_FULL
/// §2.3). spec.md §5 leaves cancellation to the host; this is the hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub max_steps: Option<u64>,
}

/// What a command (or a whole command list) handed back to its caller
/// (spec.md §4.3.1). `Halt` is not a variant here — see
/// [`error::RuntimeSignal`] for why.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Continue,
    Quit(Option<Scalar>),
}

/// The result of evaluating a program (spec.md §6).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvalResult {
    pub output: String,
    pub errors: Vec<Diagnostic>,
}

pub struct Interpreter<'a> {
    env: EnvStack,
    output: String,
    output_column: usize,
    host: &'a HostFunctions,
    program: &'a TopLevel,
    rng: StdRng,
    limits: Limits,
    steps: u64,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a TopLevel, host: &'a HostFunctions, limits: Limits) -> Self {
        Self {
            env: EnvStack::new(),
            output: String::new(),
            output_column: 0,
            host,
            program,
            rng: StdRng::from_entropy(),
            limits,
            steps: 0,
        }
    }

    /// Deterministic-RNG construction for tests that assert exact `$R`
    /// sequences (SPEC_FULL §3).
    pub fn with_seed(program: &'a TopLevel, host: &'a HostFunctions, limits: Limits, seed: u64) -> Self {
        let mut me = Self::new(program, host, limits);
        me.rng = StdRng::seed_from_u64(seed);
        me
    }

    pub(super) fn charge_step(&mut self, pos: (usize, usize)) -> RunResult<()> {
        if let Some(max) = self.limits.max_steps {
            self.steps += 1;
            if self.steps > max {
                return Err(error::rt_err("step budget exceeded", pos));
            }
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) {
        self.output.push_str(s);
        self.output_column += s.chars().count();
    }

    fn write_newline(&mut self) {
        self.output.push('\n');
        self.output_column = 0;
    }

    fn write_reset(&mut self) {
        self.output.clear();
        self.output_column = 0;
    }

    fn write_pad_to(&mut self, col: usize) {
        while self.output_column < col {
            self.output.push(' ');
            self.output_column += 1;
        }
    }

    /// Runs the whole program from its first top-level command (spec.md
    /// §2's pipeline: tags are addressable entry points for calls, but the
    /// program itself executes top to bottom like any tag body).
    pub fn run(&mut self) -> RunResult<()> {
        let program = self.program;
        self.exec_commands(&program.commands)?;
        Ok(())
    }
}

fn run_with(source: &str, host: &HostFunctions, limits: Limits, seed: Option<u64>) -> EvalResult {
    let (program, parse_errors) = parser::parse(source);
    let mut errors: Vec<Diagnostic> = parse_errors.into_iter().map(Diagnostic::from).collect();

    let mut interp = match seed {
        Some(s) => Interpreter::with_seed(&program, host, limits, s),
        None => Interpreter::new(&program, host, limits),
    };
    if let Err(signal) = interp.run() {
        // A plain `halt` is ordinary termination, not a diagnostic; only a
        // genuine runtime error is reported (spec.md §7).
        if let RuntimeSignal::Error(e) = signal {
            errors.push(e.into());
        }
    }
    EvalResult {
        output: interp.output.clone(),
        errors,
    }
}

/// The library's entry point (spec.md §6): `evaluate(source) -> {output, errors}`.
pub fn evaluate(source: &str) -> EvalResult {
    evaluate_with_host(source, &HostFunctions::new())
}

/// As [`evaluate`], but with an injected table of host-native functions
/// (spec.md §4.4, §6 "Host extension").
pub fn evaluate_with_host(source: &str, host: &HostFunctions) -> EvalResult {
    run_with(source, host, Limits::default(), None)
}

/// As [`evaluate_with_host`], bounded by `limits` and seeded for
/// deterministic `$R` (SPEC_FULL §2.3, §3).
pub fn evaluate_with_limits(
    source: &str,
    host: &HostFunctions,
    limits: Limits,
    seed: Option<u64>,
) -> EvalResult {
    run_with(source, host, limits, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_to_right_precedence() {
        let r = evaluate(" w 3+4*3");
        assert_eq!(r.output, "21");
        assert!(r.errors.is_empty());
    }

    #[test]
    fn division_forms() {
        assert_eq!(evaluate(" w 5/2").output, "2.5");
        assert_eq!(evaluate(" w 5\\2").output, "2");
        assert_eq!(evaluate(" w 5#2").output, "1");
        assert_eq!(evaluate(" w -5#2").output, "-1");
    }

    #[test]
    fn for_loop_sweep() {
        let r = evaluate("f i=1:1:5 w !,\"i: \",i");
        assert_eq!(r.output, "\ni: 1\ni: 2\ni: 3\ni: 4\ni: 5");
        assert!(r.errors.is_empty());
    }

    #[test]
    fn array_iteration_collation_order() {
        let r = evaluate(" s arr(1)=\"a\",arr(2)=\"c\",arr(10)=\"b\" f  s k=$O(arr(k)) q:k=\"\"  w arr(k)");
        assert_eq!(r.output, "acb");
        assert!(r.errors.is_empty());
    }

    #[test]
    fn non_overlapping_merge() {
        let r = evaluate(
            " s dst(\"a\")=\"1\",dst(\"b\")=\"2\",dst(\"c\")=\"3\"\n s src(\"c\")=\"4\",src(\"d\")=\"5\"\n m dst=src\n f  s k=$O(dst(k)) q:k=\"\"  w k,\"=\",dst(k),\" \"",
        );
        assert_eq!(r.output, "a=1 b=2 c=4 d=5 ");
        assert!(r.errors.is_empty());
    }

    #[test]
    fn extract_assignment_splices() {
        let r = evaluate(" s string=\"Hello, world!\" s $E(string,3,5)=\"110\" w string");
        assert_eq!(r.output, "He110, world!");
        assert!(r.errors.is_empty());
    }

    #[test]
    fn select_with_all_false_errors() {
        let ok = evaluate(" w $S(0:\"a\",1&1:\"b\",1!1:\"c\")");
        assert_eq!(ok.output, "b");

        let bad = evaluate(" w $S(0:\"a\",0:\"b\")");
        assert!(bad.errors.iter().any(|e| e.message.contains("All select conditions were false")));
    }

    #[test]
    fn command_prefix_write() {
        let r = evaluate(" wRIte !,\"Hello, world\"");
        assert_eq!(r.output, "\nHello, world");
    }
}
