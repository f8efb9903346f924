pub mod diagnostic;
pub mod interpreter;
pub mod parser;
pub mod tokenizer;

pub use diagnostic::{Diagnostic, Severity};
pub use interpreter::{evaluate, evaluate_with_host, evaluate_with_limits, EvalResult, HostFunctions, Limits, MValue, NativeFn, Scalar};
