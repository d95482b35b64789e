//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use codelink_core::{
    ragged, CallbackEvaluator, EvaluationError, NodeCategory, NodeDescriptor, NodeRegistry,
    SocketKind, SocketSpec, Value,
};

pub const NUMBER: &str = "test.Number";
pub const ADD: &str = "test.Add";
pub const DOUBLE: &str = "test.Double";

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Evaluation calls per node, keyed by node name
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<HashMap<String, usize>>>,
    total: Arc<AtomicUsize>,
}

impl CallLog {
    fn record(&self, name: &str) {
        self.total.fetch_add(1, Ordering::SeqCst);
        let mut calls = self.calls.lock().unwrap();
        *calls.entry(name.to_string()).or_default() += 1;
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

fn number(value: &Value) -> Result<f64, EvaluationError> {
    value
        .as_number()
        .ok_or_else(|| EvaluationError::invalid_input("input", "number"))
}

/// Registry with Number, Add and Double classes that log every call
pub fn counting_registry() -> (NodeRegistry, CallLog) {
    let log = CallLog::default();
    let mut registry = NodeRegistry::new();

    let calls = log.clone();
    registry.register(
        NodeDescriptor::new(NUMBER, NodeCategory::Input, "Number")
            .output(SocketSpec::new("Value", SocketKind::Scalar))
            .property("Value", 0.0),
        Arc::new(CallbackEvaluator::new(move |ctx, _| {
            let name = ctx.property("Name").and_then(|p| p.as_text()).unwrap_or("");
            calls.record(name);
            Ok(Value::Number(ctx.number("Value")?))
        })),
    );

    let calls = log.clone();
    registry.register(
        NodeDescriptor::new(ADD, NodeCategory::Math, "Add")
            .input(SocketSpec::new("A", SocketKind::Scalar))
            .input(SocketSpec::new("B", SocketKind::Scalar))
            .output(SocketSpec::new("Result", SocketKind::Scalar)),
        Arc::new(CallbackEvaluator::new(move |ctx, inputs| {
            let name = ctx.property("Name").and_then(|p| p.as_text()).unwrap_or("");
            calls.record(name);
            ragged::zip_map(&[&inputs[0], &inputs[1]], |leaves| {
                Ok(Value::Number(number(leaves[0])? + number(leaves[1])?))
            })
        })),
    );

    let calls = log.clone();
    registry.register(
        NodeDescriptor::new(DOUBLE, NodeCategory::Math, "Double")
            .input(SocketSpec::new("X", SocketKind::Scalar))
            .output(SocketSpec::new("Result", SocketKind::Scalar)),
        Arc::new(CallbackEvaluator::new(move |ctx, inputs| {
            let name = ctx.property("Name").and_then(|p| p.as_text()).unwrap_or("");
            calls.record(name);
            ragged::zip_map(&[&inputs[0]], |leaves| Ok(Value::Number(number(leaves[0])? * 2.0)))
        })),
    );

    (registry, log)
}
