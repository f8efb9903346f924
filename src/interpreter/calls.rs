//! Tag calls and host-native calls (spec.md §4.4).

use super::env::Slot;
use super::error::{rt_err, RunResult};
use super::value::{MValue, Scalar};
use super::{ControlFlow, Interpreter};
use crate::parser::{CallArg, CallExpr};

/// What a call argument evaluates to before it's bound into the callee's
/// frame — computed before the new frame is pushed, since a `.name` ref
/// needs the *caller's* current frame index (spec.md §3, §4.2.3).
enum Binding {
    Value(MValue),
    Indirect(usize, String),
}

impl<'a> Interpreter<'a> {
    /// Runs the tag/program body starting at `index` in the flat top-level
    /// command list, through to the end or a `Quit`/`Halt` (spec.md §4.4).
    pub(super) fn run_tag(&mut self, index: usize) -> RunResult<ControlFlow> {
        let program = self.program;
        self.exec_commands(&program.commands[index..])
    }

    /// Evaluates a call's arguments and, if its name matches a registered
    /// host native, invokes that instead of looking it up as a tag.
    fn try_call_host(&mut self, call: &CallExpr) -> RunResult<Option<Option<Scalar>>> {
        if !self.host.contains_key(&call.name) {
            return Ok(None);
        }
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let v = match arg {
                CallArg::Expr(e) => MValue::from(self.eval_expr(e)?),
                // A host native has no write-back channel, so a `.name`
                // reference argument is passed by current value only.
                CallArg::Ref(name) => self
                    .env
                    .read_var(name)
                    .map_err(|m| rt_err(m, call.position))?,
            };
            args.push(v);
        }
        let f = &self.host[&call.name];
        Ok(Some(f(&args)))
    }

    /// Calls a user tag or host native for its return value (spec.md §4.4).
    /// Used both by `do name(...)` (value discarded) and `$$name(...)`.
    pub(super) fn call_tag(&mut self, call: &CallExpr) -> RunResult<Option<Scalar>> {
        self.charge_step(call.position)?;

        if let Some(result) = self.try_call_host(call)? {
            return Ok(result);
        }

        let Some(tag) = self.program.tags.get(&call.name).cloned() else {
            return Err(rt_err(format!("unknown tag '{}'", call.name), call.position));
        };

        let mut bindings = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let binding = match arg {
                CallArg::Ref(name) => {
                    if !self.env.exists(name) {
                        return Err(rt_err(
                            format!("reference argument to non-existent variable '{name}'"),
                            call.position,
                        ));
                    }
                    let caller_frame = self.env.current_frame_for(name);
                    Binding::Indirect(caller_frame, name.clone())
                }
                CallArg::Expr(e) => Binding::Value(MValue::from(self.eval_expr(e)?)),
            };
            bindings.push(binding);
        }

        self.env.push();
        for (i, param) in tag.params.iter().enumerate() {
            match bindings.get(i) {
                Some(Binding::Indirect(frame, name)) => {
                    self.env.bind_indirect(param, *frame, name.clone())
                }
                Some(Binding::Value(v)) => self.env.push_bindings(param, Slot::value(v.clone())),
                None => self.env.push_bindings(param, Slot::value(MValue::empty())),
            }
        }

        let depth_before_body = self.env.depth();
        let outcome = self.run_tag(tag.index);
        // The call's own frame is torn down on every exit path, including a
        // propagating `Halt` (spec.md §3 "Lifecycle").
        self.env.truncate(depth_before_body - 1);

        match outcome? {
            ControlFlow::Continue => Ok(None),
            ControlFlow::Quit(v) => Ok(v),
        }
    }
}
