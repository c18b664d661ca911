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
//! Column transfer engine for the UNION node.
//!
//! Reconciles a source column's (nullability, constant-ness) framing against
//! a destination slot's (type, nullability) contract and row count, choosing
//! between zero-copy transfer, constant re-materialization, and nullable
//! re-framing. The clone path additionally deep-copies storage so multiple
//! destination slots fed by one source column never alias buffers.

use arrow::array::new_null_array;
use arrow::compute::cast;

use crate::exec::chunk::{Chunk, Column, deep_copy_array, replicate_single_value};
use crate::exec::descriptors::SlotDescriptor;

/// Transfer `src` into `dest` under `slot`, taking ownership.
///
/// A nullable-framed constant is the null constant: it is rebuilt as a fresh
/// all-null column of the slot's type, independent of the source storage. A
/// non-nullable constant is expanded into a freshly allocated column every
/// time; constant values may be shared singletons elsewhere in the plan and
/// must never reach an output chunk by alias.
pub(crate) fn move_column(
    dest: &mut Chunk,
    src: Column,
    slot: &SlotDescriptor,
    row_count: usize,
) -> Result<(), String> {
    match src {
        Column::Const { nullable: true, .. } => {
            let values = new_null_array(&slot.data_type, row_count);
            dest.append_column(Column::vector(values, true), slot.id)
        }
        Column::Vector {
            nullable: true, ..
        } => dest.append_column(src, slot.id),
        Column::Const {
            value,
            nullable: false,
            ..
        } => {
            let expanded = replicate_single_value(&value, row_count)?;
            let expanded = cast_to_slot_type(expanded, slot)?;
            dest.append_column(Column::vector(expanded, slot.nullable), slot.id)
        }
        Column::Vector {
            values,
            nullable: false,
        } => {
            if slot.nullable {
                // Re-frame as nullable; every existing row stays valid and
                // the storage transfers without copying.
                dest.append_column(Column::vector(values, true), slot.id)
            } else {
                dest.append_column(Column::vector(values, false), slot.id)
            }
        }
    }
}

/// Transfer `src` into `dest` under `slot`, duplicating storage.
///
/// Used when the same source column feeds multiple destination slots: each
/// consumer gets independently owned buffers so a downstream in-place
/// mutation of one output column cannot leak into its siblings.
pub(crate) fn clone_column(
    dest: &mut Chunk,
    src: &Column,
    slot: &SlotDescriptor,
    row_count: usize,
) -> Result<(), String> {
    if src.is_nullable() || !slot.nullable {
        let duplicated = match src {
            Column::Vector { values, nullable } => {
                Column::vector(deep_copy_array(values)?, *nullable)
            }
            Column::Const {
                value,
                nullable,
                len,
            } => Column::constant(deep_copy_array(value)?, *nullable, *len)?,
        };
        dest.append_column(duplicated, slot.id)
    } else {
        // Non-nullable source under a nullable destination: duplicate the
        // values, then frame nullable. Constants are expanded here rather
        // than kept const so the nullable framing stays unambiguous.
        let values = match src {
            Column::Vector { values, .. } => deep_copy_array(values)?,
            Column::Const { value, .. } => replicate_single_value(value, row_count)?,
        };
        dest.append_column(Column::vector(values, true), slot.id)
    }
}

fn cast_to_slot_type(
    values: arrow::array::ArrayRef,
    slot: &SlotDescriptor,
) -> Result<arrow::array::ArrayRef, String> {
    if values.data_type() == &slot.data_type {
        return Ok(values);
    }
    cast(&values, &slot.data_type).map_err(|e| {
        format!(
            "constant cast failed from {:?} to {:?} for slot {}: {}",
            values.data_type(),
            slot.data_type,
            slot.id,
            e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::SlotId;
    use arrow::array::{Array, ArrayRef, Int32Array, StringArray};
    use arrow::datatypes::DataType;
    use std::sync::Arc;

    fn slot(id: u32, data_type: DataType, nullable: bool) -> SlotDescriptor {
        SlotDescriptor::new(SlotId::new(id), data_type, nullable)
    }

    fn buffer_ptr(array: &ArrayRef) -> *const u8 {
        array.to_data().buffers()[0].as_ptr()
    }

    #[test]
    fn move_nullable_vector_transfers_as_is() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
        let src = Column::vector(Arc::clone(&values), true);
        let mut dest = Chunk::new();

        move_column(&mut dest, src, &slot(1, DataType::Int32, true), 3).expect("move");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert!(out.is_nullable());
        assert!(Arc::ptr_eq(out.backing_array(), &values), "must be zero-copy");
    }

    #[test]
    fn move_nullable_constant_rebuilds_all_null_column() {
        let value: ArrayRef = Arc::new(Int32Array::from(vec![None::<i32>]));
        let src = Column::constant(value, true, 1).expect("const");
        let mut dest = Chunk::new();

        move_column(&mut dest, src, &slot(1, DataType::Int32, true), 4).expect("move");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert_eq!(out.len(), 4);
        assert_eq!(out.null_count(), 4);
        assert!(!out.is_constant());
    }

    #[test]
    fn move_constant_allocates_fresh_column_per_call() {
        let value: ArrayRef = Arc::new(StringArray::from(vec!["x"]));
        let mut first = Chunk::new();
        let mut second = Chunk::new();
        let dest_slot = slot(1, DataType::Utf8, false);

        let src = Column::constant(Arc::clone(&value), false, 3).expect("const");
        move_column(&mut first, src, &dest_slot, 3).expect("move");
        let src = Column::constant(Arc::clone(&value), false, 3).expect("const");
        move_column(&mut second, src, &dest_slot, 3).expect("move");

        let a = first.column_by_slot_id(SlotId::new(1)).expect("column");
        let b = second.column_by_slot_id(SlotId::new(1)).expect("column");
        let a_arr = a.materialize().expect("materialize");
        let b_arr = b.materialize().expect("materialize");
        assert_ne!(buffer_ptr(&a_arr), buffer_ptr(&b_arr), "no shared storage");
        assert_ne!(
            buffer_ptr(&a_arr),
            buffer_ptr(&value),
            "must not alias the shared constant"
        );
        let a_str = a_arr.as_any().downcast_ref::<StringArray>().expect("utf8");
        assert_eq!(a_str.len(), 3);
        assert_eq!(a_str.value(2), "x");
    }

    #[test]
    fn move_wraps_non_nullable_vector_for_nullable_slot() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let src = Column::vector(Arc::clone(&values), false);
        let mut dest = Chunk::new();

        move_column(&mut dest, src, &slot(1, DataType::Int32, true), 2).expect("move");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert!(out.is_nullable());
        assert_eq!(out.null_count(), 0);
        assert!(Arc::ptr_eq(out.backing_array(), &values), "re-frame is zero-copy");
    }

    #[test]
    fn move_keeps_non_nullable_vector_for_non_nullable_slot() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let src = Column::vector(Arc::clone(&values), false);
        let mut dest = Chunk::new();

        move_column(&mut dest, src, &slot(1, DataType::Int32, false), 2).expect("move");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert!(!out.is_nullable());
        assert!(Arc::ptr_eq(out.backing_array(), &values));
    }

    #[test]
    fn clone_duplicates_storage() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let src = Column::vector(Arc::clone(&values), false);
        let mut dest = Chunk::new();

        clone_column(&mut dest, &src, &slot(1, DataType::Int32, false), 3).expect("clone");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        let out_arr = out.materialize().expect("materialize");
        assert_ne!(buffer_ptr(&out_arr), buffer_ptr(&values));
    }

    #[test]
    fn clone_wraps_non_nullable_source_for_nullable_slot() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let src = Column::vector(Arc::clone(&values), false);
        let mut dest = Chunk::new();

        clone_column(&mut dest, &src, &slot(1, DataType::Int32, true), 3).expect("clone");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert!(out.is_nullable());
        assert_eq!(out.null_count(), 0);
        let out_arr = out.materialize().expect("materialize");
        assert_ne!(buffer_ptr(&out_arr), buffer_ptr(&values));
    }

    #[test]
    fn clone_preserves_nullable_source_framing() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None]));
        let src = Column::vector(Arc::clone(&values), true);
        let mut dest = Chunk::new();

        clone_column(&mut dest, &src, &slot(1, DataType::Int32, true), 2).expect("clone");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert!(out.is_nullable());
        assert_eq!(out.null_count(), 1);
        assert!(!Arc::ptr_eq(out.backing_array(), &values));
    }

    #[test]
    fn move_casts_constant_to_slot_type() {
        let value: ArrayRef = Arc::new(Int32Array::from(vec![9]));
        let src = Column::constant(value, false, 2).expect("const");
        let mut dest = Chunk::new();

        move_column(&mut dest, src, &slot(1, DataType::Int64, false), 2).expect("move");
        let out = dest.column_by_slot_id(SlotId::new(1)).expect("column");
        assert_eq!(out.data_type(), &DataType::Int64);
        assert_eq!(out.len(), 2);
    }
}
