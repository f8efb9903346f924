//! Expression evaluation and variable resolution (spec.md §4.2.4, §4.3.2,
//! §4.3.3). Parsing already produced the `Expr` tree (`parser::expr`); this
//! module walks it.

use super::error::{rt_err, RunResult};
use super::value::{assign_preserving_children, descend_read, descend_vivify, MValue, Scalar};
use super::Interpreter;
use crate::parser::{BinOp, Builtin, Expr, Position, UnaryOp, VarRef};

impl<'a> Interpreter<'a> {
    /// Evaluates every subscript expression to its string key, left to
    /// right, before any lookup happens — so a lookup never holds a live
    /// borrow of the environment across a call that might mutate it
    /// (spec.md §4.3.3).
    pub(super) fn eval_keys(&mut self, subs: &[Expr]) -> RunResult<Vec<String>> {
        let mut keys = Vec::with_capacity(subs.len());
        for e in subs {
            keys.push(self.eval_expr(e)?.to_m_string());
        }
        Ok(keys)
    }

    /// Non-creating read of `name(keys...)`, or the bare name if `keys` is
    /// empty. `None` if any step of the path is absent (spec.md §4.3.3).
    pub(super) fn lookup(&self, name: &str, keys: &[String]) -> Result<Option<&MValue>, String> {
        let base = self.env.resolve_ref(name)?;
        Ok(match base {
            None => None,
            Some(mv) if keys.is_empty() => Some(mv),
            Some(mv) => descend_read(mv, keys),
        })
    }

    pub(super) fn eval_var_read(&mut self, v: &VarRef) -> RunResult<Scalar> {
        let keys = self.eval_keys(&v.subscripts)?;
        let found = self.lookup(&v.name, &keys).map_err(|m| rt_err(m, v.position))?;
        Ok(found.map(MValue::to_scalar).unwrap_or_else(Scalar::empty))
    }

    pub(super) fn eval_var_write(&mut self, v: &VarRef, value: MValue) -> RunResult<()> {
        let keys = self.eval_keys(&v.subscripts)?;
        if keys.is_empty() {
            self.env
                .write_var(&v.name, value)
                .map_err(|m| rt_err(m, v.position))?;
        } else {
            let root = self
                .env
                .resolve_mut(&v.name)
                .map_err(|m| rt_err(m, v.position))?;
            assign_preserving_children(descend_vivify(root, &keys), value);
        }
        Ok(())
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> RunResult<Scalar> {
        match expr {
            Expr::Num(n) => Ok(Scalar::Num(*n)),
            Expr::Str(s) => Ok(Scalar::Str(s.clone())),
            Expr::Var(v) => self.eval_var_read(v),
            Expr::Paren(inner) => self.eval_expr(inner),
            Expr::Unary(op, inner, pos) => {
                let v = self.eval_expr(inner)?;
                Ok(self.eval_unary(*op, &v, *pos))
            }
            Expr::Binary {
                left,
                op,
                right,
                negated,
                position,
            } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                let mut result = self.eval_binop(*op, &l, &r, *position);
                if *negated {
                    result = Scalar::from_bool(!result.is_truthy());
                }
                Ok(result)
            }
            Expr::Call(call) => {
                let v = self.call_tag(call)?;
                Ok(v.unwrap_or_else(Scalar::empty))
            }
            Expr::Builtin(b, pos) => self.eval_builtin(b, *pos),
        }
    }

    fn eval_unary(&self, op: UnaryOp, v: &Scalar, _pos: Position) -> Scalar {
        match op {
            UnaryOp::Not => Scalar::from_bool(!v.is_truthy()),
            UnaryOp::Plus => Scalar::Num(v.to_number()),
            UnaryOp::Minus => Scalar::Num(-v.to_number()),
        }
    }

    /// Strictly left-to-right, no-precedence binary operators (spec.md
    /// §4.2.4, §4.3.2). None of these can fail; `_pos` is kept for symmetry
    /// with the rest of the evaluator and in case a future operator needs to
    /// report one.
    fn eval_binop(&self, op: BinOp, l: &Scalar, r: &Scalar, _pos: Position) -> Scalar {
        match op {
            BinOp::Or => Scalar::from_bool(l.is_truthy() || r.is_truthy()),
            BinOp::And => Scalar::from_bool(l.is_truthy() && r.is_truthy()),
            BinOp::Eq => Scalar::from_bool(l.to_m_string() == r.to_m_string()),
            BinOp::Lt => Scalar::from_bool(l.to_number() < r.to_number()),
            BinOp::Gt => Scalar::from_bool(l.to_number() > r.to_number()),
            BinOp::Add => Scalar::Num(l.to_number() + r.to_number()),
            BinOp::Sub => Scalar::Num(l.to_number() - r.to_number()),
            BinOp::Mul => Scalar::Num(l.to_number() * r.to_number()),
            BinOp::Pow => Scalar::Num(l.to_number().powf(r.to_number())),
            BinOp::Div => Scalar::Num(l.to_number() / r.to_number()),
            // `\` is floor division (spec.md §4.2.4); `#` is Rust's
            // truncating remainder, independently required to satisfy
            // `-5#2 = -1` (spec.md §8).
            BinOp::IntDiv => Scalar::Num((l.to_number() / r.to_number()).floor()),
            BinOp::Mod => Scalar::Num(l.to_number() % r.to_number()),
            BinOp::Concat => Scalar::Str(format!("{}{}", l.to_m_string(), r.to_m_string())),
        }
    }
}
