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

use arrow::array::{
    ArrayRef, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, NullArray, StringArray,
};

use super::LiteralValue;

/// Build the single-row array backing a constant column for this literal.
pub fn eval_single(value: &LiteralValue) -> Result<ArrayRef, String> {
    match value {
        LiteralValue::Null => Ok(Arc::new(NullArray::new(1))),
        LiteralValue::Bool(v) => Ok(Arc::new(BooleanArray::from(vec![*v]))),
        LiteralValue::Int8(v) => Ok(Arc::new(Int8Array::from(vec![*v]))),
        LiteralValue::Int16(v) => Ok(Arc::new(Int16Array::from(vec![*v]))),
        LiteralValue::Int32(v) => Ok(Arc::new(Int32Array::from(vec![*v]))),
        LiteralValue::Int64(v) => Ok(Arc::new(Int64Array::from(vec![*v]))),
        LiteralValue::Float32(v) => Ok(Arc::new(Float32Array::from(vec![*v]))),
        LiteralValue::Float64(v) => Ok(Arc::new(Float64Array::from(vec![*v]))),
        LiteralValue::Utf8(v) => Ok(Arc::new(StringArray::from(vec![v.as_str()]))),
    }
}
