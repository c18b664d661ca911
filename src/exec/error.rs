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
use thiserror::Error;

/// Errors surfaced by exec nodes.
///
/// The first error returned by `get_next` terminates the node's batch
/// stream; the owning pipeline decides whether to retry the whole query.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("child open failed: {0}")]
    ChildOpenFailed(String),

    #[error("child read failed: {0}")]
    ChildReadFailed(String),

    #[error("child close failed: {0}")]
    ChildCloseFailed(String),

    #[error("expression evaluation failed: {0}")]
    ExpressionEvalFailed(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("unsupported legacy interface: {0}")]
    UnsupportedLegacyInterface(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ExecResult<T> = Result<T, ExecError>;

impl ExecError {
    /// Wrap a lower-layer `String` error from the expression arena.
    pub fn expr(err: impl Into<String>) -> Self {
        Self::ExpressionEvalFailed(err.into())
    }

    pub fn internal(err: impl Into<String>) -> Self {
        Self::Internal(err.into())
    }
}
