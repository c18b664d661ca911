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
use arrow::datatypes::DataType;

use crate::common::ids::{SlotId, TupleId};

/// A single output column position: stable id, value type, nullability.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotDescriptor {
    pub id: SlotId,
    pub data_type: DataType,
    pub nullable: bool,
}

impl SlotDescriptor {
    pub fn new(id: SlotId, data_type: DataType, nullable: bool) -> Self {
        Self {
            id,
            data_type,
            nullable,
        }
    }
}

/// Ordered slot list describing one row shape. Resolved from the planner's
/// descriptor table at operator construction time and fixed afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TupleDescriptor {
    pub id: TupleId,
    pub slots: Vec<SlotDescriptor>,
}

impl TupleDescriptor {
    pub fn new(id: TupleId, slots: Vec<SlotDescriptor>) -> Self {
        Self { id, slots }
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
