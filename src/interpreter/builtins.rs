//! Builtin `$`-functions (spec.md §4.3.5).

use super::error::{rt_err, RunResult};
use super::value::MValue;
use super::Interpreter;
use crate::parser::{Builtin, Position};
use rand::Rng;

impl<'a> Interpreter<'a> {
    pub(super) fn eval_builtin(&mut self, b: &Builtin, pos: Position) -> RunResult<super::value::Scalar> {
        use super::value::Scalar;
        match b {
            Builtin::Order(var, dir_expr) => {
                let dir = match dir_expr {
                    Some(e) => self.eval_expr(e)?.to_number(),
                    None => 1.0,
                };
                if dir != 1.0 && dir != -1.0 {
                    return Err(rt_err("invalid direction for $O", pos));
                }
                let mut keys = self.eval_keys(&var.subscripts)?;
                // A subscript-less `$O` argument is a parse error (recorded
                // separately); evaluating it anyway must not panic.
                let Some(last) = keys.pop() else {
                    return Ok(Scalar::Str(String::new()));
                };
                let parent = self.lookup(&var.name, &keys).map_err(|m| rt_err(m, pos))?;
                let next = match parent.and_then(MValue::as_array) {
                    Some(arr) => {
                        if dir == 1.0 {
                            arr.children.next_key(&last)
                        } else {
                            arr.children.prev_key(&last)
                        }
                    }
                    None => None,
                };
                Ok(Scalar::Str(next.unwrap_or("").to_string()))
            }

            Builtin::Length(e) => {
                let s = self.eval_expr(e)?.to_m_string();
                Ok(Scalar::Num(s.chars().count() as f64))
            }

            Builtin::Extract(s, start, end) => {
                let s = self.eval_expr(s)?.to_m_string();
                let chars: Vec<char> = s.chars().collect();
                let len = chars.len();
                match (start, end) {
                    (None, None) => Ok(Scalar::Str(chars.first().map(|c| c.to_string()).unwrap_or_default())),
                    (Some(n), None) => {
                        let n = self.eval_expr(n)?.to_number();
                        let idx = n as i64;
                        if idx < 1 || idx as usize > len {
                            Ok(Scalar::Str(String::new()))
                        } else {
                            Ok(Scalar::Str(chars[idx as usize - 1].to_string()))
                        }
                    }
                    (Some(a), Some(b)) => {
                        let a = self.eval_expr(a)?.to_number();
                        let b = self.eval_expr(b)?.to_number();
                        let start = (a.max(1.0) as usize).min(len + 1);
                        let end = (b.max(0.0) as usize).min(len);
                        if start > end {
                            Ok(Scalar::Str(String::new()))
                        } else {
                            Ok(Scalar::Str(chars[start - 1..end].iter().collect()))
                        }
                    }
                    (None, Some(_)) => unreachable!("parser never produces end without start"),
                }
            }

            Builtin::Select(pairs) => {
                for (cond, value) in pairs {
                    if self.eval_expr(cond)?.is_truthy() {
                        return self.eval_expr(value);
                    }
                }
                Err(rt_err("All select conditions were false", pos))
            }

            Builtin::Find(hay, needle, start) => {
                let hay = self.eval_expr(hay)?.to_m_string();
                let needle = self.eval_expr(needle)?.to_m_string();
                let start_n = match start {
                    Some(e) => self.eval_expr(e)?.to_number() as i64,
                    None => 1,
                };
                if needle.is_empty() {
                    return Ok(Scalar::Num(1.0));
                }
                let hay_chars: Vec<char> = hay.chars().collect();
                let needle_chars: Vec<char> = needle.chars().collect();
                let start_idx = (start_n.max(1) - 1) as usize;
                let mut found = 0usize;
                if start_idx <= hay_chars.len() {
                    let upper = hay_chars.len().saturating_sub(needle_chars.len());
                    for i in start_idx..=upper {
                        if i + needle_chars.len() > hay_chars.len() {
                            continue;
                        }
                        if hay_chars[i..i + needle_chars.len()] == needle_chars[..] {
                            found = i + needle_chars.len() + 1;
                            break;
                        }
                    }
                }
                Ok(Scalar::Num(found as f64))
            }

            Builtin::Random(n) => {
                let n = self.eval_expr(n)?.to_number();
                let hi = n.max(0.0) as i64;
                Ok(Scalar::Num(self.rng.gen_range(0..=hi) as f64))
            }

            Builtin::Ascii(e) => {
                let s = self.eval_expr(e)?.to_m_string();
                Ok(Scalar::Num(s.chars().next().map(|c| c as u32 as f64).unwrap_or(-1.0)))
            }

            Builtin::Char(e) => {
                let n = self.eval_expr(e)?.to_number() as u32;
                Ok(Scalar::Str(char::from_u32(n).map(|c| c.to_string()).unwrap_or_default()))
            }
        }
    }
}
