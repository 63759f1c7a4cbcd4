//! fOS Components
//!
//! Custom element upgrades and shadow tree composition on top of `fos-dom`.
//!
//! Two engines share one [`Components`] context:
//! - registration and upgrade: definitions bind a tag to a capability
//!   template and lifecycle hooks, applied once per node
//! - composition and distribution: light children are pooled and
//!   distributed over the insertion points of a chain of shadow roots, and
//!   the resulting composed tree is projected onto the host
//!
//! Deferred work (redistribution, attachment evaluation, bootstrap) runs on a
//! virtual-time [`TaskQueue`] driven by [`Components::advance`].

mod attachment;
mod boot;
mod composition;
mod config;
mod context;
mod distribution;
mod error;
mod registry;
mod scheduler;
mod selector;
mod tasks;
mod template;
mod upgrade;
mod watcher;

pub use attachment::AttachmentTracker;
pub use composition::{Composition, InsertionKind};
pub use config::{AttachmentMode, ComponentsConfig, TemplateStrategy};
pub use context::{ComponentStats, Components};
pub use error::{ComponentError, ComponentResult};
pub use registry::{Definition, DefinitionOptions, Lifecycle, Registry};
pub use scheduler::InvalidationScheduler;
pub use selector::{MatchContext, Selector, TagMatch};
pub use tasks::{TaskKey, TaskQueue};
pub use template::{AppliedBehavior, AttributeChange, AttributeHook, Capability, CapabilitySet, Hook};
pub use upgrade::{Constructor, UpgradeState};
pub use watcher::MutationWatcher;

pub use fos_dom::{DomEvent, DomEventType, NodeId};
