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
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array, new_empty_array};
use arrow::compute::take;
use arrow::datatypes::DataType;

/// A single column of a chunk.
///
/// Nullability and constant-ness are framing, observable independently of
/// the underlying storage: `nullable` records whether the column's contract
/// admits nulls, not whether any row currently is null.
#[derive(Clone, Debug)]
pub enum Column {
    /// Fully materialized vector, one value per row.
    Vector { values: ArrayRef, nullable: bool },
    /// One logical value repeated `len` times. `value` holds exactly one row
    /// and may be shared with other plan fragments (literals hand out the
    /// same `Arc` on every evaluation), so consumers must never mutate or
    /// alias it into an output without re-materializing.
    Const {
        value: ArrayRef,
        nullable: bool,
        len: usize,
    },
}

impl Column {
    pub fn vector(values: ArrayRef, nullable: bool) -> Self {
        Self::Vector { values, nullable }
    }

    /// Build a constant column; `value` must hold exactly one row.
    pub fn constant(value: ArrayRef, nullable: bool, len: usize) -> Result<Self, String> {
        if value.len() != 1 {
            return Err(format!(
                "constant column value must be single-row, got {} rows",
                value.len()
            ));
        }
        Ok(Self::Const {
            value,
            nullable,
            len,
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Vector { values, .. } => values.len(),
            Self::Const { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Vector { nullable, .. } | Self::Const { nullable, .. } => *nullable,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Const { .. })
    }

    pub fn data_type(&self) -> &DataType {
        match self {
            Self::Vector { values, .. } => values.data_type(),
            Self::Const { value, .. } => value.data_type(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Self::Vector { values, .. } => values.null_count(),
            Self::Const { value, len, .. } => {
                if value.null_count() > 0 {
                    *len
                } else {
                    0
                }
            }
        }
    }

    /// Flatten to a plain arrow array of `self.len()` rows. Constants are
    /// expanded into a freshly allocated array; vectors are returned as-is
    /// (shared `Arc`, zero copy).
    pub fn materialize(&self) -> Result<ArrayRef, String> {
        match self {
            Self::Vector { values, .. } => Ok(Arc::clone(values)),
            Self::Const { value, len, .. } => replicate_single_value(value, *len),
        }
    }

    /// The backing array, without const expansion. Exposed for transfer-path
    /// decisions and tests; row count only matches `len()` for vectors.
    pub fn backing_array(&self) -> &ArrayRef {
        match self {
            Self::Vector { values, .. } => values,
            Self::Const { value, .. } => value,
        }
    }
}

/// Expand a single-row array to `len` rows by index replication. Always
/// allocates fresh buffers, never aliases `value`.
pub fn replicate_single_value(value: &ArrayRef, len: usize) -> Result<ArrayRef, String> {
    if value.len() != 1 {
        return Err(format!(
            "replicate expects a single-row array, got {} rows",
            value.len()
        ));
    }
    if len == 0 {
        return Ok(new_empty_array(value.data_type()));
    }
    let indices = UInt32Array::from(vec![0u32; len]);
    take(value.as_ref(), &indices, None).map_err(|e| format!("replicate failed: {}", e))
}

/// Deep-copy an array into independently owned buffers.
///
/// Gather through an identity index vector; a single-input `concat` would
/// short-circuit to a zero-copy slice sharing the source buffers.
pub fn deep_copy_array(array: &ArrayRef) -> Result<ArrayRef, String> {
    if array.is_empty() {
        return Ok(new_empty_array(array.data_type()));
    }
    let indices = UInt32Array::from((0..array.len() as u32).collect::<Vec<u32>>());
    take(array.as_ref(), &indices, None).map_err(|e| format!("deep copy failed: {}", e))
}
