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
pub mod chunk_source;
pub mod union;

use crate::exec::chunk::Chunk;
use crate::exec::error::ExecResult;
use crate::runtime::runtime_state::RuntimeState;

/// A pull-based exec node, similar to StarRocks BE's ExecNode.
///
/// Lifecycle: `open` once, `get_next` until it reports end-of-stream, then
/// `close` exactly once. A node must tolerate `close` after an error and
/// must never be read again after it signals end-of-stream.
pub trait ExecNode: Send {
    fn name(&self) -> &str;

    fn open(&mut self, state: &RuntimeState) -> ExecResult<()>;

    /// Produce the next chunk. The boolean is the end-of-stream flag; when
    /// true the chunk is empty and the node is exhausted.
    fn get_next(&mut self, state: &RuntimeState) -> ExecResult<(Chunk, bool)>;

    fn close(&mut self, state: &RuntimeState) -> ExecResult<()>;
}
