//! Environments, the environment stack, and variable/subscript resolution
//! (spec.md §3, §4.3.3).

use super::value::{assign_preserving_children, MValue, Scalar};
use std::collections::HashMap;

/// A value stored directly in an environment slot: either an ordinary
/// `MValue`, or an indirect reference left behind by a `.name` by-reference
/// call argument (spec.md §3, §4.2.3, §9 "Indirect arguments").
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(MValue),
    Indirect { frame: usize, name: String },
}

impl Slot {
    pub fn value(v: impl Into<MValue>) -> Self {
        Slot::Value(v.into())
    }
}

impl From<Scalar> for MValue {
    fn from(s: Scalar) -> Self {
        MValue::Scalar(s)
    }
}

/// One stack frame: an ordered mapping from identifier to [`Slot`]
/// (spec.md §3). Frames are small, so a `Vec` with linear lookup keeps
/// insertion order without extra bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    names: Vec<String>,
    slots: HashMap<String, Slot>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn set(&mut self, name: &str, slot: Slot) {
        if !self.slots.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.slots.insert(name.to_string(), slot);
    }

    pub fn remove(&mut self, name: &str) -> Option<Slot> {
        self.names.retain(|n| n != name);
        self.slots.remove(name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.slots.clear();
    }
}

/// How many indirect-reference hops to follow before declaring a cycle
/// (spec.md §9: "a cycle-breaking counter is prudent").
const MAX_INDIRECTION_HOPS: usize = 64;

/// The environment stack (spec.md §3). Index 0 is the global frame, home of
/// `$TEST` (spec.md §9) and of any name that no pushed frame shadows.
#[derive(Debug, Clone)]
pub struct EnvStack {
    frames: Vec<Environment>,
    /// `$TEST`, set by `if`/`else`. Lives conceptually in frame 0; kept as
    /// dedicated state rather than a variable slot because spec.md's
    /// grammar has no production for reading a bare special variable
    /// (see SPEC_FULL.md §3).
    pub test_flag: bool,
}

impl Default for EnvStack {
    fn default() -> Self {
        Self {
            frames: vec![Environment::new()],
            test_flag: false,
        }
    }
}

impl EnvStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(Environment::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    pub fn global_mut(&mut self) -> &mut Environment {
        &mut self.frames[0]
    }

    /// `kill` with no arguments: replace all local environments with a
    /// single fresh global frame (spec.md §4.3.4). `$TEST` is untouched,
    /// since it is not a local.
    pub fn reset_locals(&mut self) {
        self.frames = vec![Environment::new()];
    }

    fn frame_index_for_read(&self, name: &str) -> Option<usize> {
        self.frames.iter().rposition(|f| f.contains(name))
    }

    fn frame_index_for_write(&self, name: &str) -> usize {
        self.frame_index_for_read(name).unwrap_or(0)
    }

    /// Follows indirect-reference slots to the frame/name they ultimately
    /// name, bounded by [`MAX_INDIRECTION_HOPS`].
    fn follow_indirect(&self, mut frame: usize, mut name: String) -> Result<(usize, String), String> {
        for _ in 0..MAX_INDIRECTION_HOPS {
            match self.frames[frame].get(&name) {
                Some(Slot::Indirect { frame: f, name: n }) => {
                    frame = *f;
                    name = n.clone();
                }
                _ => return Ok((frame, name)),
            }
        }
        Err("indirect reference cycle detected".to_string())
    }

    /// Reads a top-level (unsubscripted) variable by name. Missing slots
    /// read as `""` (spec.md §3 invariants, §4.3.3).
    pub fn read_var(&self, name: &str) -> Result<MValue, String> {
        let Some(frame) = self.frame_index_for_read(name) else {
            return Ok(MValue::empty());
        };
        let (frame, name) = self.follow_indirect(frame, name.to_string())?;
        match self.frames[frame].get(&name) {
            Some(Slot::Value(v)) => Ok(v.clone()),
            _ => Ok(MValue::empty()),
        }
    }

    /// Resolves a variable for write, creating the slot (as an empty array
    /// node ready to be promoted, or left absent if the caller only needs
    /// the scalar) in the target frame if it doesn't exist yet. An existing
    /// array node with children keeps its children — only its self-value is
    /// replaced (spec.md §3 Data Model, Glossary "Self-value").
    pub fn write_var(&mut self, name: &str, value: MValue) -> Result<(), String> {
        let frame = self.frame_index_for_write(name);
        let (frame, name) = self.follow_indirect(frame, name.to_string())?;
        match self.frames[frame].get_mut(&name) {
            Some(Slot::Value(existing)) => assign_preserving_children(existing, value),
            _ => self.frames[frame].set(&name, Slot::Value(value)),
        }
        Ok(())
    }

    /// Returns a mutable handle to the `MValue` a (possibly indirect)
    /// variable ultimately names, creating it as an empty array node if
    /// absent. Used by subscript resolution (spec.md §4.3.3) and `merge`.
    pub fn resolve_mut(&mut self, name: &str) -> Result<&mut MValue, String> {
        let frame = self.frame_index_for_write(name);
        let (frame, name) = self.follow_indirect(frame, name.to_string())?;
        if !self.frames[frame].contains(&name) {
            self.frames[frame].set(&name, Slot::Value(MValue::empty()));
        }
        match self.frames[frame].get_mut(&name) {
            Some(Slot::Value(v)) => Ok(v),
            _ => unreachable!("follow_indirect never returns an indirect slot"),
        }
    }

    /// Non-creating read access to the `MValue` a variable names, for
    /// subscripted reads (spec.md §4.3.3: "If reading and any intermediate
    /// is absent, the final read yields \"\"").
    pub fn resolve_ref(&self, name: &str) -> Result<Option<&MValue>, String> {
        let Some(frame) = self.frame_index_for_read(name) else {
            return Ok(None);
        };
        let (frame, name) = self.follow_indirect(frame, name.to_string())?;
        match self.frames[frame].get(&name) {
            Some(Slot::Value(v)) => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    /// Non-creating mutable access to the `MValue` a variable names, for
    /// `kill` on a subscripted reference: never vivifies the variable itself
    /// just to discover it has nothing to delete.
    pub fn resolve_mut_if_exists(&mut self, name: &str) -> Result<Option<&mut MValue>, String> {
        let Some(frame) = self.frame_index_for_read(name) else {
            return Ok(None);
        };
        let (frame, name) = self.follow_indirect(frame, name.to_string())?;
        Ok(match self.frames[frame].get_mut(&name) {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        })
    }

    /// Deletes a top-level variable (spec.md §4.3.4 `kill`).
    pub fn kill_var(&mut self, name: &str) -> Result<(), String> {
        let frame = self.frame_index_for_write(name);
        let (frame, name) = self.follow_indirect(frame, name.to_string())?;
        self.frames[frame].remove(&name);
        Ok(())
    }

    /// Binds `.name` into the current top frame as an indirect reference
    /// pointing at the caller's slot (spec.md §4.2.3, §4.4).
    pub fn bind_indirect(&mut self, param: &str, caller_frame: usize, caller_name: String) {
        let top = self.frames.len() - 1;
        self.frames[top].set(param, Slot::Indirect {
            frame: caller_frame,
            name: caller_name,
        });
    }

    /// The frame index that a fresh variable reference evaluated *right
    /// now* would be written into, for binding `.name` arguments before
    /// the callee's frame is pushed.
    pub fn current_frame_for(&self, name: &str) -> usize {
        self.frame_index_for_write(name)
    }

    /// Whether `name` is currently set in any frame. Used to reject a
    /// `.name` reference argument naming a variable that was never set
    /// (spec.md §7: "reference argument to non-existent variable"),
    /// rather than silently binding an indirect reference that would
    /// vivify a fresh global slot on first write.
    pub fn exists(&self, name: &str) -> bool {
        self.frame_index_for_read(name).is_some()
    }

    pub fn top_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn push_bindings(&mut self, name: &str, slot: Slot) {
        let top = self.frames.len() - 1;
        self.frames[top].set(name, slot);
    }
}
