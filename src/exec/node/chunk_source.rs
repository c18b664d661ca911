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
//! Finite chunk source node.
//!
//! Responsibilities:
//! - Emits a fixed queue of pre-built chunks in order, then end-of-stream.
//! - Serves as the leaf for VALUES-style inputs and as a union child.

use std::collections::VecDeque;

use crate::exec::chunk::Chunk;
use crate::exec::error::{ExecError, ExecResult};
use crate::exec::node::ExecNode;
use crate::runtime::runtime_state::RuntimeState;

pub struct ChunkSourceNode {
    name: String,
    chunks: VecDeque<Chunk>,
    opened: bool,
    closed: bool,
}

impl ChunkSourceNode {
    pub fn new(chunks: Vec<Chunk>, node_id: i32) -> Self {
        let name = if node_id >= 0 {
            format!("ChunkSource (id={node_id})")
        } else {
            "ChunkSource".to_string()
        };
        Self {
            name,
            chunks: chunks.into(),
            opened: false,
            closed: false,
        }
    }
}

impl ExecNode for ChunkSourceNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self, _state: &RuntimeState) -> ExecResult<()> {
        if self.opened {
            return Err(ExecError::ChildOpenFailed(format!(
                "{} opened twice",
                self.name
            )));
        }
        self.opened = true;
        Ok(())
    }

    fn get_next(&mut self, _state: &RuntimeState) -> ExecResult<(Chunk, bool)> {
        if !self.opened {
            return Err(ExecError::ChildReadFailed(format!(
                "{} read before open",
                self.name
            )));
        }
        if self.closed {
            return Err(ExecError::ChildReadFailed(format!(
                "{} read after close",
                self.name
            )));
        }
        match self.chunks.pop_front() {
            Some(chunk) => Ok((chunk, false)),
            None => Ok((Chunk::new(), true)),
        }
    }

    fn close(&mut self, _state: &RuntimeState) -> ExecResult<()> {
        if self.closed {
            return Err(ExecError::ChildCloseFailed(format!(
                "{} closed twice",
                self.name
            )));
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::SlotId;
    use crate::exec::chunk::Column;
    use arrow::array::{ArrayRef, Int32Array};
    use std::sync::Arc;

    fn one_column_chunk(values: Vec<i32>) -> Chunk {
        let mut chunk = Chunk::new();
        chunk
            .append_column(
                Column::vector(Arc::new(Int32Array::from(values)) as ArrayRef, false),
                SlotId::new(1),
            )
            .expect("append");
        chunk
    }

    #[test]
    fn emits_queued_chunks_then_eos() {
        let state = RuntimeState::default();
        let mut node = ChunkSourceNode::new(vec![one_column_chunk(vec![1]), Chunk::new()], 1);
        node.open(&state).expect("open");

        let (chunk, eos) = node.get_next(&state).expect("next");
        assert!(!eos);
        assert_eq!(chunk.len(), 1);
        let (chunk, eos) = node.get_next(&state).expect("next");
        assert!(!eos);
        assert!(chunk.is_empty());
        let (_, eos) = node.get_next(&state).expect("next");
        assert!(eos);
        node.close(&state).expect("close");
    }

    #[test]
    fn enforces_lifecycle_contract() {
        let state = RuntimeState::default();
        let mut node = ChunkSourceNode::new(vec![], 1);
        assert!(matches!(
            node.get_next(&state),
            Err(ExecError::ChildReadFailed(_))
        ));
        node.open(&state).expect("open");
        assert!(matches!(
            node.open(&state),
            Err(ExecError::ChildOpenFailed(_))
        ));
        node.close(&state).expect("close");
        assert!(matches!(
            node.close(&state),
            Err(ExecError::ChildCloseFailed(_))
        ));
    }
}
