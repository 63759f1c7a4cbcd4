//! Engine configuration
//!
//! Chosen once when the `Components` context is built.

use std::time::Duration;

/// How a definition's capability set is bound to an upgraded node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateStrategy {
    /// Node shares the definition's merged capability set
    #[default]
    Reference,
    /// Every capability is copied onto the node, skipping native properties
    Copy,
}

/// When attached/detached evaluation runs after a structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentMode {
    /// Coalesced into one evaluation per node on the next tick
    #[default]
    Deferred,
    /// Evaluated as soon as the change record is handled
    Immediate,
}

/// Components configuration
#[derive(Debug, Clone)]
pub struct ComponentsConfig {
    /// Coalescing window for host invalidations
    pub invalidation_delay: Duration,
    pub template_strategy: TemplateStrategy,
    pub attachment_mode: AttachmentMode,
    /// Watch every new shadow root (and its older chain) for upgrades
    pub watch_shadow_roots: bool,
    pub document_url: String,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            invalidation_delay: Duration::from_millis(100),
            template_strategy: TemplateStrategy::Reference,
            attachment_mode: AttachmentMode::Deferred,
            watch_shadow_roots: true,
            document_url: "about:blank".to_string(),
        }
    }
}

impl ComponentsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invalidation_delay(mut self, delay: Duration) -> Self {
        self.invalidation_delay = delay;
        self
    }

    pub fn with_template_strategy(mut self, strategy: TemplateStrategy) -> Self {
        self.template_strategy = strategy;
        self
    }

    pub fn with_attachment_mode(mut self, mode: AttachmentMode) -> Self {
        self.attachment_mode = mode;
        self
    }

    pub fn with_watch_shadow_roots(mut self, watch: bool) -> Self {
        self.watch_shadow_roots = watch;
        self
    }

    pub fn with_document_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComponentsConfig::default();
        assert_eq!(config.invalidation_delay, Duration::from_millis(100));
        assert_eq!(config.template_strategy, TemplateStrategy::Reference);
        assert_eq!(config.attachment_mode, AttachmentMode::Deferred);
        assert!(config.watch_shadow_roots);
    }

    #[test]
    fn test_builder() {
        let config = ComponentsConfig::new()
            .with_invalidation_delay(Duration::ZERO)
            .with_template_strategy(TemplateStrategy::Copy)
            .with_attachment_mode(AttachmentMode::Immediate)
            .with_watch_shadow_roots(false)
            .with_document_url("https://example.com/");

        assert_eq!(config.invalidation_delay, Duration::ZERO);
        assert_eq!(config.template_strategy, TemplateStrategy::Copy);
        assert_eq!(config.attachment_mode, AttachmentMode::Immediate);
        assert!(!config.watch_shadow_roots);
        assert_eq!(config.document_url, "https://example.com/");
    }
}
