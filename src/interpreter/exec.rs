//! Command execution (spec.md §4.3.4, §4.3.6).

use super::error::{rt_err, RunResult, RuntimeSignal};
use super::value::{descend_mut_no_vivify, descend_vivify, MValue};
use super::{ControlFlow, Interpreter};
use crate::parser::{Command, CommandKind, Expr, ForArg, ForParam, SetTarget, VarRef, WriteArg};

impl<'a> Interpreter<'a> {
    /// Runs a command list as one scope: a `new` executed anywhere inside it
    /// is popped the moment this list is left, by any exit path — fall
    /// through, `Quit`, or a propagating `Halt` (spec.md §3 "Lifecycle",
    /// §4.3.4 `new`). Every nested body (`do` block, `if`/`else`/`for`
    /// in-line body) and the top-level tag body itself go through here, so
    /// this one function is where that scoping rule lives.
    pub(super) fn exec_commands(&mut self, cmds: &[Command]) -> RunResult<ControlFlow> {
        let depth_before = self.env.depth();
        let mut result = Ok(ControlFlow::Continue);
        for cmd in cmds {
            match self.exec_command(cmd) {
                Ok(ControlFlow::Continue) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }
        self.env.truncate(depth_before);
        result
    }

    fn exec_command(&mut self, cmd: &Command) -> RunResult<ControlFlow> {
        self.charge_step(cmd.position)?;
        if let Some(cond) = &cmd.postcond {
            if !self.eval_expr(cond)?.is_truthy() {
                return Ok(ControlFlow::Continue);
            }
        }
        match &cmd.kind {
            CommandKind::Write(args) => {
                self.exec_write(args)?;
                Ok(ControlFlow::Continue)
            }
            CommandKind::Quit(expr) => {
                let value = match expr {
                    Some(e) => Some(self.eval_expr(e)?),
                    None => None,
                };
                Ok(ControlFlow::Quit(value))
            }
            CommandKind::DoCall(call) => {
                self.call_tag(call)?;
                Ok(ControlFlow::Continue)
            }
            CommandKind::DoBlock(body) => {
                // A `Quit` inside the block ends the block, not the
                // enclosing tag (spec.md §4.3.4 `do`); the block isn't a
                // call-with-return, so any quit value is discarded.
                match self.exec_commands(body)? {
                    ControlFlow::Continue | ControlFlow::Quit(_) => Ok(ControlFlow::Continue),
                }
            }
            CommandKind::If(conds, body) => self.exec_if(conds, body),
            CommandKind::Else(body) => self.exec_else(body),
            CommandKind::For(arg, body) => self.exec_for(arg, body, cmd.position),
            CommandKind::Set(assigns) => {
                self.exec_set(assigns)?;
                Ok(ControlFlow::Continue)
            }
            CommandKind::New(names) => {
                self.exec_new(names);
                Ok(ControlFlow::Continue)
            }
            CommandKind::Kill(targets) => {
                self.exec_kill(targets)?;
                Ok(ControlFlow::Continue)
            }
            CommandKind::Merge(dst, src) => {
                self.exec_merge(dst, src)?;
                Ok(ControlFlow::Continue)
            }
            CommandKind::Halt => Err(RuntimeSignal::Halt),
        }
    }

    fn exec_if(&mut self, conds: &[Expr], body: &[Command]) -> RunResult<ControlFlow> {
        let mut all_true = true;
        for c in conds {
            if !self.eval_expr(c)?.is_truthy() {
                all_true = false;
            }
        }
        self.env.test_flag = all_true;
        if all_true {
            self.exec_commands(body)
        } else {
            Ok(ControlFlow::Continue)
        }
    }

    fn exec_else(&mut self, body: &[Command]) -> RunResult<ControlFlow> {
        if !self.env.test_flag {
            self.exec_commands(body)
        } else {
            Ok(ControlFlow::Continue)
        }
    }

    /// spec.md §4.3.6. A `Quit` from the body always ends the whole `for`
    /// (every sweep, and the no-argument form), yielding `Continue` to the
    /// enclosing block.
    fn exec_for(
        &mut self,
        arg: &Option<ForArg>,
        body: &[Command],
        pos: (usize, usize),
    ) -> RunResult<ControlFlow> {
        let Some(for_arg) = arg else {
            loop {
                self.charge_step(pos)?;
                match self.exec_commands(body)? {
                    ControlFlow::Continue => continue,
                    ControlFlow::Quit(_) => return Ok(ControlFlow::Continue),
                }
            }
        };

        for param in &for_arg.params {
            match param {
                ForParam::Start(e) => {
                    let v = self.eval_expr(e)?;
                    self.write_named(&for_arg.var, MValue::from(v), pos)?;
                    if let ControlFlow::Quit(_) = self.exec_commands(body)? {
                        return Ok(ControlFlow::Continue);
                    }
                }
                ForParam::StartStep(s, step) => {
                    let mut cur = self.eval_expr(s)?.to_number();
                    let step_v = self.eval_expr(step)?.to_number();
                    loop {
                        self.charge_step(pos)?;
                        self.write_named(&for_arg.var, MValue::from_num(cur), pos)?;
                        if let ControlFlow::Quit(_) = self.exec_commands(body)? {
                            return Ok(ControlFlow::Continue);
                        }
                        cur += step_v;
                    }
                }
                ForParam::StartStepLimit(s, step, limit) => {
                    let mut cur = self.eval_expr(s)?.to_number();
                    let step_v = self.eval_expr(step)?.to_number();
                    let limit_v = self.eval_expr(limit)?.to_number();
                    loop {
                        if (step_v >= 0.0 && cur > limit_v) || (step_v < 0.0 && cur < limit_v) {
                            break;
                        }
                        self.charge_step(pos)?;
                        self.write_named(&for_arg.var, MValue::from_num(cur), pos)?;
                        if let ControlFlow::Quit(_) = self.exec_commands(body)? {
                            return Ok(ControlFlow::Continue);
                        }
                        cur += step_v;
                    }
                }
            }
        }
        Ok(ControlFlow::Continue)
    }

    fn write_named(&mut self, name: &str, value: MValue, pos: (usize, usize)) -> RunResult<()> {
        self.env.write_var(name, value).map_err(|m| rt_err(m, pos))
    }

    fn exec_set(&mut self, assigns: &[(SetTarget, Expr)]) -> RunResult<()> {
        for (target, expr) in assigns {
            let value = self.eval_expr(expr)?;
            match target {
                SetTarget::Var(v) => self.eval_var_write(v, MValue::from(value))?,
                SetTarget::Extract(var, start, end) => {
                    self.splice_extract(var, start, end, &value.to_m_string())?;
                }
            }
        }
        Ok(())
    }

    /// `set $E(var, start[, end]) = value` — splice `value` into `var`'s
    /// string form over the same half-open-on-read, inclusive `[start, end]`
    /// range as the `$E` builtin (spec.md §4.3.4, §4.3.5).
    fn splice_extract(
        &mut self,
        var: &VarRef,
        start: &Expr,
        end: &Option<Box<Expr>>,
        replacement: &str,
    ) -> RunResult<()> {
        let start_n = self.eval_expr(start)?.to_number();
        let end_n = match end {
            Some(e) => self.eval_expr(e)?.to_number(),
            None => start_n,
        };
        let current = self.eval_var_read(var)?.to_m_string();
        let chars: Vec<char> = current.chars().collect();
        let len = chars.len();
        let start_idx = (start_n.max(1.0) as usize).min(len + 1);
        let end_idx = (end_n.max(0.0) as usize).min(len);
        let head: String = chars[..start_idx.saturating_sub(1).min(len)].iter().collect();
        let tail: String = if end_idx < len {
            chars[end_idx..].iter().collect()
        } else {
            String::new()
        };
        self.eval_var_write(var, MValue::from_str(format!("{head}{replacement}{tail}")))
    }

    fn exec_new(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.env.push();
        for n in names {
            self.env
                .push_bindings(n, super::env::Slot::value(MValue::empty()));
        }
    }

    fn exec_kill(&mut self, targets: &[VarRef]) -> RunResult<()> {
        if targets.is_empty() {
            self.env.reset_locals();
            return Ok(());
        }
        for t in targets {
            self.kill_ref(t)?;
        }
        Ok(())
    }

    fn kill_ref(&mut self, v: &VarRef) -> RunResult<()> {
        if v.subscripts.is_empty() {
            self.env
                .kill_var(&v.name)
                .map_err(|m| rt_err(m, v.position))?;
            return Ok(());
        }
        let mut keys = self.eval_keys(&v.subscripts)?;
        let Some(last) = keys.pop() else {
            return Ok(());
        };
        if let Some(root) = self
            .env
            .resolve_mut_if_exists(&v.name)
            .map_err(|m| rt_err(m, v.position))?
        {
            if let Some(parent) = descend_mut_no_vivify(root, &keys) {
                if let Some(arr) = parent.as_array_mut_opt() {
                    arr.children.remove(&last);
                }
            }
        }
        Ok(())
    }

    /// `merge dst = src`: deep-copies every child subtree of `src` into
    /// `dst` (spec.md §4.3.4).
    fn exec_merge(&mut self, dst: &VarRef, src: &VarRef) -> RunResult<()> {
        let dst_keys = self.eval_keys(&dst.subscripts)?;
        let src_keys = self.eval_keys(&src.subscripts)?;
        let pos = dst.position;

        if dst.name == src.name {
            let (shorter, longer): (&[String], &[String]) = if dst_keys.len() <= src_keys.len() {
                (&dst_keys, &src_keys)
            } else {
                (&src_keys, &dst_keys)
            };
            if longer.starts_with(shorter) {
                return Err(rt_err("merge of overlapping variables", pos));
            }
        }

        let src_children: Vec<(String, MValue)> = match self
            .lookup(&src.name, &src_keys)
            .map_err(|m| rt_err(m, pos))?
        {
            Some(mv) => match mv.as_array() {
                Some(arr) => arr.children.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let dst_root = self.env.resolve_mut(&dst.name).map_err(|m| rt_err(m, pos))?;
        let dst_node = descend_vivify(dst_root, &dst_keys);
        let arr = dst_node.as_array_mut();
        for (k, v) in src_children {
            arr.children.insert(k, v);
        }
        Ok(())
    }

    fn exec_write(&mut self, args: &[WriteArg]) -> RunResult<()> {
        for a in args {
            match a {
                WriteArg::Expr(e) => {
                    let v = self.eval_expr(e)?;
                    self.write_str(&v.to_m_string());
                }
                WriteArg::Reset => self.write_reset(),
                WriteArg::Newline => self.write_newline(),
                WriteArg::Pad(e) => {
                    let col = self.eval_expr(e)?.to_number().max(0.0) as usize;
                    self.write_pad_to(col);
                }
            }
        }
        Ok(())
    }
}
