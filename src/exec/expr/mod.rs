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
mod literal;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, Float64Array, Int64Array, new_null_array};
use arrow::compute::cast;
use arrow::compute::kernels::numeric::{add, mul, sub};
use arrow::datatypes::DataType;

use crate::common::ids::SlotId;
use crate::exec::chunk::{Chunk, Column};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExprId(pub usize);

#[derive(Clone, Debug)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
}

#[derive(Clone, Debug)]
pub enum ExprNode {
    Literal(LiteralValue),
    /// Column reference resolved through the chunk's slot-id map.
    SlotRef(SlotId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
}

/// Flat arena of compiled expressions with per-node declared output types.
///
/// Literal evaluation hands out the same shared single-value array on every
/// call (cached per ExprId), so consumers that place a constant into an
/// output chunk must re-materialize it rather than alias the shared storage.
#[derive(Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
    types: Vec<DataType>,
    literal_cache: Mutex<HashMap<usize, ArrayRef>>,
}

impl ExprArena {
    pub fn push(&mut self, node: ExprNode) -> ExprId {
        self.push_typed(node, DataType::Null)
    }

    pub fn push_typed(&mut self, node: ExprNode, data_type: DataType) -> ExprId {
        let id = ExprId(self.nodes.len());
        self.nodes.push(node);
        self.types.push(data_type);
        id
    }

    pub fn node(&self, id: ExprId) -> Option<&ExprNode> {
        self.nodes.get(id.0)
    }

    pub fn data_type(&self, id: ExprId) -> Option<&DataType> {
        self.types.get(id.0)
    }

    /// Evaluate `id` against `chunk`. The resulting column's row count
    /// always equals `chunk.len()`; literals come back as constant columns.
    pub fn eval(&self, id: ExprId, chunk: &Chunk) -> Result<Column, String> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or_else(|| "invalid ExprId".to_string())?;
        match node {
            ExprNode::Literal(v) => {
                let nullable = matches!(v, LiteralValue::Null);
                let value = self.literal_array(id, v)?;
                Column::constant(value, nullable, chunk.len())
            }
            ExprNode::SlotRef(slot_id) => Ok(chunk.column_by_slot_id(*slot_id)?.clone()),
            ExprNode::Add(a, b) => self.eval_numeric_binop(id, *a, *b, chunk, BinOp::Add),
            ExprNode::Sub(a, b) => self.eval_numeric_binop(id, *a, *b, chunk, BinOp::Sub),
            ExprNode::Mul(a, b) => self.eval_numeric_binop(id, *a, *b, chunk, BinOp::Mul),
        }
    }

    /// The cached shared single-value array for a literal node. A typed NULL
    /// materializes with its declared type so downstream framing stays
    /// type-correct.
    fn literal_array(&self, id: ExprId, value: &LiteralValue) -> Result<ArrayRef, String> {
        let mut cache = self
            .literal_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = cache.get(&id.0) {
            return Ok(Arc::clone(existing));
        }
        let declared = self.types.get(id.0).cloned().unwrap_or(DataType::Null);
        let array = if matches!(value, LiteralValue::Null) && !matches!(declared, DataType::Null) {
            new_null_array(&declared, 1)
        } else {
            let raw = literal::eval_single(value)?;
            if matches!(declared, DataType::Null) || raw.data_type() == &declared {
                raw
            } else {
                cast(&raw, &declared).map_err(|e| {
                    format!(
                        "literal cast failed from {:?} to {:?}: {}",
                        raw.data_type(),
                        declared,
                        e
                    )
                })?
            }
        };
        cache.insert(id.0, Arc::clone(&array));
        Ok(array)
    }

    fn eval_numeric_binop(
        &self,
        expr: ExprId,
        a: ExprId,
        b: ExprId,
        chunk: &Chunk,
        op: BinOp,
    ) -> Result<Column, String> {
        let lhs = self.eval(a, chunk)?;
        let rhs = self.eval(b, chunk)?;
        let nullable = lhs.is_nullable() || rhs.is_nullable();
        let lhs = lhs.materialize()?;
        let rhs = rhs.materialize()?;
        let result = eval_numeric_binop_arrays(lhs, rhs, op)?;
        let output_type = self.data_type(expr).cloned().unwrap_or(DataType::Null);
        let result = cast_numeric_output(result, &output_type)?;
        Ok(Column::vector(result, nullable))
    }
}

#[derive(Copy, Clone, Debug)]
enum BinOp {
    Add,
    Sub,
    Mul,
}

fn cast_to_i64(arr: &ArrayRef) -> Result<&Int64Array, String> {
    arr.as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| format!("expected Int64Array, got {:?}", arr.data_type()))
}

fn cast_to_f64(arr: &ArrayRef) -> Result<&Float64Array, String> {
    arr.as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| format!("expected Float64Array, got {:?}", arr.data_type()))
}

fn eval_numeric_binop_arrays(lhs: ArrayRef, rhs: ArrayRef, op: BinOp) -> Result<ArrayRef, String> {
    let is_float = |dt: &DataType| matches!(dt, DataType::Float32 | DataType::Float64);

    if is_float(lhs.data_type()) || is_float(rhs.data_type()) {
        let lhs_f64_arr = if matches!(lhs.data_type(), DataType::Float64) {
            lhs
        } else {
            cast(&lhs, &DataType::Float64).map_err(|e| e.to_string())?
        };
        let rhs_f64_arr = if matches!(rhs.data_type(), DataType::Float64) {
            rhs
        } else {
            cast(&rhs, &DataType::Float64).map_err(|e| e.to_string())?
        };
        let lhs_f64 = cast_to_f64(&lhs_f64_arr)?;
        let rhs_f64 = cast_to_f64(&rhs_f64_arr)?;
        let result = match op {
            BinOp::Add => add(lhs_f64, rhs_f64),
            BinOp::Sub => sub(lhs_f64, rhs_f64),
            BinOp::Mul => mul(lhs_f64, rhs_f64),
        };
        result.map_err(|e| e.to_string())
    } else {
        let lhs_i64_arr = if matches!(lhs.data_type(), DataType::Int64) {
            lhs
        } else {
            cast(&lhs, &DataType::Int64).map_err(|e| e.to_string())?
        };
        let rhs_i64_arr = if matches!(rhs.data_type(), DataType::Int64) {
            rhs
        } else {
            cast(&rhs, &DataType::Int64).map_err(|e| e.to_string())?
        };
        let lhs_i64 = cast_to_i64(&lhs_i64_arr)?;
        let rhs_i64 = cast_to_i64(&rhs_i64_arr)?;
        let result = match op {
            BinOp::Add => add(lhs_i64, rhs_i64),
            BinOp::Sub => sub(lhs_i64, rhs_i64),
            BinOp::Mul => mul(lhs_i64, rhs_i64),
        };
        result.map_err(|e| e.to_string())
    }
}

fn cast_numeric_output(result: ArrayRef, output_type: &DataType) -> Result<ArrayRef, String> {
    if matches!(output_type, DataType::Null) || result.data_type() == output_type {
        return Ok(result);
    }
    cast(&result, output_type).map_err(|e| {
        format!(
            "arithmetic output cast failed from {:?} to {:?}: {}",
            result.data_type(),
            output_type,
            e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int32Array, StringArray};

    fn chunk_with_int_column(slot: SlotId, values: Vec<i32>) -> Chunk {
        let mut chunk = Chunk::new();
        chunk
            .append_column(
                Column::vector(Arc::new(Int32Array::from(values)) as ArrayRef, false),
                slot,
            )
            .expect("append");
        chunk
    }

    #[test]
    fn slot_ref_returns_chunk_column() {
        let mut arena = ExprArena::default();
        let expr = arena.push_typed(ExprNode::SlotRef(SlotId::new(1)), DataType::Int32);
        let chunk = chunk_with_int_column(SlotId::new(1), vec![1, 2, 3]);

        let col = arena.eval(expr, &chunk).expect("eval");
        assert_eq!(col.len(), 3);
        assert!(!col.is_constant());
    }

    #[test]
    fn add_slot_and_literal_evaluates_per_row() {
        let mut arena = ExprArena::default();
        let slot = arena.push_typed(ExprNode::SlotRef(SlotId::new(1)), DataType::Int32);
        let one = arena.push_typed(ExprNode::Literal(LiteralValue::Int32(1)), DataType::Int32);
        let sum = arena.push_typed(ExprNode::Add(slot, one), DataType::Int64);

        let chunk = chunk_with_int_column(SlotId::new(1), vec![10, 20, 30]);
        let col = arena.eval(sum, &chunk).expect("eval");
        let arr = col.materialize().expect("materialize");
        let arr = arr.as_any().downcast_ref::<Int64Array>().expect("i64");
        assert_eq!(arr.values(), &[11, 21, 31]);
    }

    #[test]
    fn literal_eval_returns_shared_storage_across_calls() {
        let mut arena = ExprArena::default();
        let lit = arena.push_typed(
            ExprNode::Literal(LiteralValue::Utf8("x".to_string())),
            DataType::Utf8,
        );
        let chunk = Chunk::with_row_count(5);

        let first = arena.eval(lit, &chunk).expect("eval");
        let second = arena.eval(lit, &chunk).expect("eval");
        assert!(first.is_constant());
        assert_eq!(first.len(), 5);
        assert!(Arc::ptr_eq(first.backing_array(), second.backing_array()));
        let value = first
            .backing_array()
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("utf8");
        assert_eq!(value.value(0), "x");
    }

    #[test]
    fn typed_null_literal_uses_declared_type() {
        let mut arena = ExprArena::default();
        let lit = arena.push_typed(ExprNode::Literal(LiteralValue::Null), DataType::Utf8);
        let chunk = Chunk::with_row_count(2);

        let col = arena.eval(lit, &chunk).expect("eval");
        assert!(col.is_constant());
        assert!(col.is_nullable());
        assert_eq!(col.data_type(), &DataType::Utf8);
        assert_eq!(col.null_count(), 2);
    }
}
