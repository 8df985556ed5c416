// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A tiny tracked object used across this crate's unit tests.

use labor_core::error::ProcessError;

use crate::meta::SharedMeta;
use crate::object::SharedObject;

#[derive(Debug, Clone, Default)]
pub(crate) struct Counter {
    value: i64,
}

impl Counter {
    pub(crate) fn new(value: i64) -> Self {
        Self { value }
    }
}

impl SharedObject for Counter {
    fn meta(&self) -> &SharedMeta {
        // Leaked once per process: `SharedMeta` has no `const fn` constructor
        // (it builds a `HashSet`), and `meta()` returns `&SharedMeta` rather
        // than an owned value to match how a real tracked type's metadata is
        // typically a `static`, not rebuilt per call.
        static META: std::sync::OnceLock<SharedMeta> = std::sync::OnceLock::new();
        META.get_or_init(|| SharedMeta::new().with_readers(["value"]).with_writers(["increment", "reset"]))
    }

    fn get_member(&self, member: &str) -> Result<serde_json::Value, ProcessError> {
        match member {
            "value" | "" => Ok(serde_json::json!(self.value)),
            other => Err(ProcessError::Coordinator(format!("Counter has no member {other}"))),
        }
    }

    fn call_member(
        &mut self,
        member: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ProcessError> {
        match member {
            "increment" => {
                let by = args.get(0).and_then(serde_json::Value::as_i64).unwrap_or(1);
                self.value += by;
                Ok(serde_json::json!(self.value))
            }
            "reset" => {
                self.value = 0;
                Ok(serde_json::json!(self.value))
            }
            other => Err(ProcessError::Coordinator(format!("Counter has no member {other}"))),
        }
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "value": self.value })
    }

    fn type_name(&self) -> &'static str {
        "Counter"
    }
}
