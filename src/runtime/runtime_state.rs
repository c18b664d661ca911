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
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-query execution context shared by the nodes of one pipeline
/// instance, similar to StarRocks BE RuntimeState.
///
/// Carries the cancellation flag and frequently used query options (chunk
/// size). Cloning shares the cancellation flag.
#[derive(Clone, Debug)]
pub struct RuntimeState {
    query_id: Option<String>,
    cancelled: Arc<AtomicBool>,
    chunk_size: usize,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            query_id: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            chunk_size: 4096,
        }
    }
}

impl RuntimeState {
    pub fn new(query_id: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            query_id: Some(query_id.into()),
            cancelled: Arc::new(AtomicBool::new(false)),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    /// Maximum row count per in-memory chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Signal cancellation; observed by every node sharing this state.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
