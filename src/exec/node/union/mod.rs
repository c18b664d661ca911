// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
//! UNION exec node.
//!
//! Responsibilities:
//! - Sequences pass-through children, materialized children, and constant
//!   expression groups into one output stream with a fixed schema.
//! - Drives each child's open/read/close lifecycle, swallowing empty
//!   intermediate chunks and detecting overall exhaustion.
//! - Delegates per-column move-vs-clone decisions to the transfer engine.

mod transfer;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::common::ids::SlotId;
use crate::exec::chunk::Chunk;
use crate::exec::descriptors::TupleDescriptor;
use crate::exec::error::{ExecError, ExecResult};
use crate::exec::expr::{ExprArena, ExprId};
use crate::exec::node::ExecNode;
use crate::runtime::profile::{Counter, RuntimeProfile};
use crate::runtime::runtime_state::RuntimeState;

pub(crate) use transfer::{clone_column, move_column};

/// One destination slot's pass-through mapping entry: the source slot to
/// read from, and how many destination slots share that source slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotItem {
    pub slot_id: SlotId,
    pub ref_count: usize,
}

/// How pass-through children map their columns onto the output schema.
/// Decided once at construction; the legacy positional fallback is a
/// distinct variant rather than a runtime-inspected special case.
#[derive(Clone, Debug)]
enum PassThroughMode {
    /// One dest-slot keyed map per pass-through child.
    Mapped(Vec<HashMap<SlotId, SlotItem>>),
    /// Positional 1:1 mapping assuming the child produces exactly one
    /// source row shape. Kept for plans from older frontends.
    Positional,
}

/// Construction parameters resolved by the plan-lowering layer.
pub struct UnionNodeParams {
    pub node_id: i32,
    pub tuple_desc: TupleDescriptor,
    pub children: Vec<Box<dyn ExecNode>>,
    /// Children with index below this are pass-through; the rest are
    /// materialized through their expression lists.
    pub first_materialized_child_idx: usize,
    /// One expression list per child (lists for pass-through children are
    /// ignored); empty when the node has no materialized children.
    pub child_expr_lists: Vec<Vec<ExprId>>,
    /// One expression list per constant row group.
    pub const_expr_lists: Vec<Vec<ExprId>>,
    /// Per pass-through child: destination slot id -> source slot id.
    /// `None` selects the legacy positional mapping.
    pub pass_through_slot_maps: Option<Vec<BTreeMap<SlotId, SlotId>>>,
    pub arena: Arc<ExprArena>,
}

pub struct UnionNode {
    name: String,
    tuple_desc: TupleDescriptor,
    children: Vec<Box<dyn ExecNode>>,
    first_materialized_child_idx: usize,
    child_expr_lists: Vec<Vec<ExprId>>,
    const_expr_lists: Vec<Vec<ExprId>>,
    pass_through_mode: PassThroughMode,
    arena: Arc<ExprArena>,

    // Sequencer state, owned exclusively and mutated only by get_next.
    child_idx: usize,
    /// True when the child at `child_idx` has not been opened yet (either
    /// never started, or the previous child just exhausted and we advanced).
    child_eos: bool,
    const_expr_list_idx: usize,
    children_closed: Vec<bool>,
    opened: bool,
    closed: bool,
    failed: bool,

    num_rows_returned: i64,
    profile: RuntimeProfile,
    rows_returned_counter: Counter,
}

// Children are trait objects, so Debug is hand-rolled over the sequencer
// state instead of derived.
impl fmt::Debug for UnionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionNode")
            .field("name", &self.name)
            .field("num_children", &self.children.len())
            .field("first_materialized_child_idx", &self.first_materialized_child_idx)
            .field("child_idx", &self.child_idx)
            .field("child_eos", &self.child_eos)
            .field("const_expr_list_idx", &self.const_expr_list_idx)
            .field("opened", &self.opened)
            .field("closed", &self.closed)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl UnionNode {
    pub fn try_new(params: UnionNodeParams) -> ExecResult<Self> {
        let UnionNodeParams {
            node_id,
            tuple_desc,
            children,
            first_materialized_child_idx,
            child_expr_lists,
            const_expr_lists,
            pass_through_slot_maps,
            arena,
        } = params;

        let slot_count = tuple_desc.slot_count();
        if first_materialized_child_idx > children.len() {
            return Err(ExecError::internal(format!(
                "first_materialized_child_idx {} out of bounds for {} children",
                first_materialized_child_idx,
                children.len()
            )));
        }
        if first_materialized_child_idx < children.len() {
            if child_expr_lists.len() != children.len() {
                return Err(ExecError::internal(format!(
                    "child expr list count mismatch: lists={} children={}",
                    child_expr_lists.len(),
                    children.len()
                )));
            }
            for (idx, exprs) in child_expr_lists
                .iter()
                .enumerate()
                .skip(first_materialized_child_idx)
            {
                if exprs.len() != slot_count {
                    return Err(ExecError::internal(format!(
                        "child {} expr list length {} does not match {} output slots",
                        idx,
                        exprs.len(),
                        slot_count
                    )));
                }
            }
        }
        for (idx, exprs) in const_expr_lists.iter().enumerate() {
            if exprs.len() != slot_count {
                return Err(ExecError::internal(format!(
                    "const expr list {} length {} does not match {} output slots",
                    idx,
                    exprs.len(),
                    slot_count
                )));
            }
        }

        let pass_through_mode = match pass_through_slot_maps {
            Some(maps) => {
                if maps.len() != first_materialized_child_idx {
                    return Err(ExecError::internal(format!(
                        "pass-through slot map count mismatch: maps={} pass-through children={}",
                        maps.len(),
                        first_materialized_child_idx
                    )));
                }
                let mut converted = Vec::with_capacity(maps.len());
                for (child, map) in maps.iter().enumerate() {
                    let inverted = convert_pass_through_slot_map(map);
                    for slot in tuple_desc.slots() {
                        if !inverted.contains_key(&slot.id) {
                            return Err(ExecError::internal(format!(
                                "pass-through slot map for child {} misses destination slot {}",
                                child, slot.id
                            )));
                        }
                    }
                    converted.push(inverted);
                }
                PassThroughMode::Mapped(converted)
            }
            None => PassThroughMode::Positional,
        };

        let name = format!("UnionNode (id={node_id})");
        let profile = RuntimeProfile::new(name.clone());
        let rows_returned_counter = profile.counter("RowsReturned");
        let children_closed = vec![false; children.len()];

        Ok(Self {
            name,
            tuple_desc,
            children,
            first_materialized_child_idx,
            child_expr_lists,
            const_expr_lists,
            pass_through_mode,
            arena,
            child_idx: 0,
            child_eos: false,
            const_expr_list_idx: 0,
            children_closed,
            opened: false,
            closed: false,
            failed: false,
            num_rows_returned: 0,
            profile,
            rows_returned_counter,
        })
    }

    pub fn profile(&self) -> &RuntimeProfile {
        &self.profile
    }

    fn has_more_passthrough(&self) -> bool {
        self.child_idx < self.first_materialized_child_idx
    }

    fn has_more_materialized(&self) -> bool {
        self.child_idx < self.children.len()
    }

    fn has_more_const(&self) -> bool {
        self.const_expr_list_idx < self.const_expr_lists.len()
    }

    fn open_current_child(&mut self, state: &RuntimeState) -> ExecResult<()> {
        debug!(target: "vexec::union", node = %self.name, child = self.child_idx, "open child");
        self.children[self.child_idx].open(state)
    }

    fn close_current_child(&mut self, state: &RuntimeState) -> ExecResult<()> {
        debug!(target: "vexec::union", node = %self.name, child = self.child_idx, "close child");
        // Marked closed before the call: a failed close still consumes the
        // child's single close, so the node-level close must not retry it.
        self.children_closed[self.child_idx] = true;
        self.children[self.child_idx].close(state)
    }

    /// Pull from the current pass-through child. Returns an empty chunk when
    /// the child just exhausted (caller re-evaluates the phase); otherwise a
    /// non-empty projected chunk.
    fn get_next_passthrough(&mut self, state: &RuntimeState) -> ExecResult<Chunk> {
        if self.child_eos {
            self.open_current_child(state)?;
            self.child_eos = false;
        }

        loop {
            let (tmp_chunk, eos) = self.children[self.child_idx].get_next(state)?;
            if eos {
                self.child_eos = true;
                self.close_current_child(state)?;
                self.child_idx += 1;
                return Ok(Chunk::new());
            }
            if tmp_chunk.is_empty() {
                continue;
            }
            return self.project_passthrough(&tmp_chunk);
        }
    }

    fn get_next_materialize(&mut self, state: &RuntimeState) -> ExecResult<Chunk> {
        if self.child_eos {
            self.open_current_child(state)?;
            self.child_eos = false;
        }

        loop {
            let (tmp_chunk, eos) = self.children[self.child_idx].get_next(state)?;
            if eos {
                self.child_eos = true;
                self.close_current_child(state)?;
                self.child_idx += 1;
                return Ok(Chunk::new());
            }
            if tmp_chunk.is_empty() {
                continue;
            }
            return self.materialize_chunk(&tmp_chunk);
        }
    }

    fn get_next_const(&mut self) -> ExecResult<Chunk> {
        // Constant expressions evaluate against a zero-column single-row
        // context so the resulting columns carry exactly one row.
        let context = Chunk::with_row_count(1);
        let mut dest = Chunk::with_row_count(1);
        for (i, dest_slot) in self.tuple_desc.slots().iter().enumerate() {
            let expr = self.const_expr_lists[self.const_expr_list_idx][i];
            let column = self
                .arena
                .eval(expr, &context)
                .map_err(ExecError::expr)?;
            move_column(&mut dest, column, dest_slot, 1).map_err(ExecError::internal)?;
        }
        self.const_expr_list_idx += 1;
        Ok(dest)
    }

    fn project_passthrough(&self, src_chunk: &Chunk) -> ExecResult<Chunk> {
        let row_count = src_chunk.len();
        let mut dest = Chunk::with_row_count(row_count);
        match &self.pass_through_mode {
            PassThroughMode::Mapped(maps) => {
                let map = &maps[self.child_idx];
                for dest_slot in self.tuple_desc.slots() {
                    // Validated at construction: every dest slot has an entry.
                    let item = map[&dest_slot.id];
                    let column = src_chunk
                        .column_by_slot_id(item.slot_id)
                        .map_err(ExecError::internal)?;
                    // Multiple destination slots may draw from one source
                    // slot; only a sole consumer may take the column by move.
                    if item.ref_count <= 1 {
                        move_column(&mut dest, column.clone(), dest_slot, row_count)
                            .map_err(ExecError::internal)?;
                    } else {
                        clone_column(&mut dest, column, dest_slot, row_count)
                            .map_err(ExecError::internal)?;
                    }
                }
            }
            PassThroughMode::Positional => {
                if src_chunk.num_columns() != self.tuple_desc.slot_count() {
                    return Err(ExecError::UnsupportedLegacyInterface(format!(
                        "positional pass-through requires one source row shape: \
                         child {} produced {} columns for {} output slots",
                        self.child_idx,
                        src_chunk.num_columns(),
                        self.tuple_desc.slot_count()
                    )));
                }
                for (dest_slot, (_, column)) in
                    self.tuple_desc.slots().iter().zip(src_chunk.iter())
                {
                    move_column(&mut dest, column.clone(), dest_slot, row_count)
                        .map_err(ExecError::internal)?;
                }
            }
        }
        Ok(dest)
    }

    fn materialize_chunk(&self, src_chunk: &Chunk) -> ExecResult<Chunk> {
        let row_count = src_chunk.len();
        let mut dest = Chunk::with_row_count(row_count);
        for (i, dest_slot) in self.tuple_desc.slots().iter().enumerate() {
            let expr = self.child_expr_lists[self.child_idx][i];
            let column = self
                .arena
                .eval(expr, src_chunk)
                .map_err(ExecError::expr)?;
            move_column(&mut dest, column, dest_slot, row_count).map_err(ExecError::internal)?;
        }
        Ok(dest)
    }

    fn get_next_inner(&mut self, state: &RuntimeState) -> ExecResult<(Chunk, bool)> {
        if state.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        loop {
            if self.has_more_passthrough() {
                let chunk = self.get_next_passthrough(state)?;
                if !self.child_eos {
                    self.num_rows_returned += chunk.len() as i64;
                    self.rows_returned_counter.set(self.num_rows_returned);
                    return Ok((chunk, false));
                }
                // Child exhausted with an empty chunk: re-evaluate the phase
                // instead of surfacing a zero-row batch.
            } else if self.has_more_materialized() {
                let chunk = self.get_next_materialize(state)?;
                if !self.child_eos {
                    self.num_rows_returned += chunk.len() as i64;
                    self.rows_returned_counter.set(self.num_rows_returned);
                    return Ok((chunk, false));
                }
            } else if self.has_more_const() {
                let chunk = self.get_next_const()?;
                self.num_rows_returned += chunk.len() as i64;
                self.rows_returned_counter.set(self.num_rows_returned);
                return Ok((chunk, false));
            } else {
                return Ok((Chunk::new(), true));
            }
        }
    }
}

impl ExecNode for UnionNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self, state: &RuntimeState) -> ExecResult<()> {
        if self.opened {
            return Err(ExecError::internal(format!("{} opened twice", self.name)));
        }
        self.opened = true;
        if !self.children.is_empty() {
            self.open_current_child(state)?;
        }
        Ok(())
    }

    fn get_next(&mut self, state: &RuntimeState) -> ExecResult<(Chunk, bool)> {
        if !self.opened {
            return Err(ExecError::internal(format!(
                "{} get_next before open",
                self.name
            )));
        }
        if self.failed {
            return Err(ExecError::internal(format!(
                "{} get_next after a previous error",
                self.name
            )));
        }
        match self.get_next_inner(state) {
            Ok(out) => Ok(out),
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }

    fn close(&mut self, state: &RuntimeState) -> ExecResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut first_err = None;
        for idx in 0..self.children.len() {
            if self.children_closed[idx] {
                continue;
            }
            self.children_closed[idx] = true;
            if let Err(err) = self.children[idx].close(state) {
                debug!(target: "vexec::union", node = %self.name, child = idx, error = %err, "child close failed");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Invert a raw dest-slot -> src-slot map into per-dest `SlotItem`s, counting
/// how many destination slots share each source slot.
fn convert_pass_through_slot_map(slot_map: &BTreeMap<SlotId, SlotId>) -> HashMap<SlotId, SlotItem> {
    let mut src_ref_counts: HashMap<SlotId, usize> = HashMap::new();
    for src in slot_map.values() {
        *src_ref_counts.entry(*src).or_insert(0) += 1;
    }

    let mut out = HashMap::with_capacity(slot_map.len());
    for (dest, src) in slot_map {
        out.insert(
            *dest,
            SlotItem {
                slot_id: *src,
                ref_count: src_ref_counts[src],
            },
        );
    }
    out
}
