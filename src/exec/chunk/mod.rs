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
mod column;

pub use column::{Column, deep_copy_array, replicate_single_value};

use std::collections::HashMap;

use crate::common::ids::SlotId;

/// A chunk of data: ordered columns keyed by slot id, all sharing one row
/// count. The row count is carried explicitly so a zero-column chunk (the
/// evaluation context for constant expressions) can still have rows.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
    columns: Vec<Column>,
    slot_ids: Vec<SlotId>,
    slot_id_to_index: HashMap<SlotId, usize>,
    num_rows: usize,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-column chunk with an explicit logical row count.
    pub fn with_row_count(num_rows: usize) -> Self {
        Self {
            num_rows,
            ..Self::default()
        }
    }

    /// Append a column under `slot_id`, in declaration order.
    ///
    /// The first column of a fresh chunk fixes the row count; later appends
    /// must match it. Slot id collisions would make lookups ambiguous and
    /// are rejected.
    pub fn append_column(&mut self, column: Column, slot_id: SlotId) -> Result<(), String> {
        if self.slot_id_to_index.contains_key(&slot_id) {
            return Err(format!("duplicate slot id {} in chunk", slot_id));
        }
        if self.columns.is_empty() && self.num_rows == 0 {
            self.num_rows = column.len();
        } else if column.len() != self.num_rows {
            return Err(format!(
                "column row count mismatch for slot {}: chunk={} column={}",
                slot_id,
                self.num_rows,
                column.len()
            ));
        }
        self.slot_id_to_index.insert(slot_id, self.columns.len());
        self.slot_ids.push(slot_id);
        self.columns.push(column);
        Ok(())
    }

    pub fn column_by_slot_id(&self, slot_id: SlotId) -> Result<&Column, String> {
        let idx = self
            .slot_id_to_index
            .get(&slot_id)
            .copied()
            .ok_or_else(|| {
                format!(
                    "slot id {} not found in chunk (num_columns={}, slot_ids={:?})",
                    slot_id,
                    self.columns.len(),
                    self.slot_ids
                )
            })?;
        Ok(&self.columns[idx])
    }

    pub fn len(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn slot_ids(&self) -> &[SlotId] {
        &self.slot_ids
    }

    /// Columns paired with their slot ids, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &Column)> {
        self.slot_ids.iter().copied().zip(self.columns.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int32Array};
    use std::sync::Arc;

    fn int_column(values: Vec<i32>) -> Column {
        Column::vector(Arc::new(Int32Array::from(values)) as ArrayRef, false)
    }

    #[test]
    fn first_append_fixes_row_count() {
        let mut chunk = Chunk::new();
        chunk
            .append_column(int_column(vec![1, 2, 3]), SlotId::new(1))
            .expect("append");
        let err = chunk
            .append_column(int_column(vec![1]), SlotId::new(2))
            .expect_err("row count mismatch");
        assert!(err.contains("row count mismatch"), "err={}", err);
        assert_eq!(chunk.len(), 3);
    }

    #[test]
    fn rejects_duplicate_slot_id() {
        let mut chunk = Chunk::new();
        chunk
            .append_column(int_column(vec![1]), SlotId::new(7))
            .expect("append");
        let err = chunk
            .append_column(int_column(vec![2]), SlotId::new(7))
            .expect_err("duplicate");
        assert!(err.contains("duplicate slot id"), "err={}", err);
    }

    #[test]
    fn zero_column_chunk_carries_explicit_row_count() {
        let chunk = Chunk::with_row_count(1);
        assert_eq!(chunk.len(), 1);
        assert_eq!(chunk.num_columns(), 0);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn column_lookup_by_slot_id() {
        let mut chunk = Chunk::new();
        chunk
            .append_column(int_column(vec![5, 6]), SlotId::new(3))
            .expect("append");
        let col = chunk.column_by_slot_id(SlotId::new(3)).expect("present");
        assert_eq!(col.len(), 2);
        let err = chunk.column_by_slot_id(SlotId::new(9)).expect_err("absent");
        assert!(err.contains("not found"), "err={}", err);
    }
}
