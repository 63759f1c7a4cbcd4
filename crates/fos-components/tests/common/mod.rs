//! Shared helpers for fos-components integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fos_components::{Components, NodeId};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; repeated calls are harmless
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Ordered record of hook invocations
#[derive(Clone, Default)]
pub struct HookLog(Rc<RefCell<Vec<String>>>);

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Hook that records `label`
    pub fn hook(&self, label: &str) -> impl Fn(&mut Components, NodeId) + 'static {
        let log = self.clone();
        let label = label.to_string();
        move |_: &mut Components, _: NodeId| log.push(label.clone())
    }
}

/// Fresh context with the document watched and booted
pub fn booted() -> Components {
    init_tracing();
    let mut c = Components::new();
    c.boot();
    c.run_until_idle();
    c
}

pub fn body(c: &Components) -> NodeId {
    c.document().body().expect("document has a body")
}
