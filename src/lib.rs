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
//! Vectorized query-execution operators.
//!
//! The crate centers on the columnar UNION exec node: it merges the output
//! of heterogeneous child operators and constant-row groups into one stream
//! with a fixed output schema, deciding move-vs-clone per column.

pub mod common;
pub mod exec;
pub mod runtime;

pub use common::ids::{SlotId, TupleId};
pub use common::logging as vexec_logging;
pub use exec::chunk::{Chunk, Column};
pub use exec::descriptors::{SlotDescriptor, TupleDescriptor};
pub use exec::error::{ExecError, ExecResult};
pub use exec::node::ExecNode;
pub use exec::node::chunk_source::ChunkSourceNode;
pub use exec::node::union::{UnionNode, UnionNodeParams};
