//! Runtime configuration and builder

use crate::host::Host;
use crate::runtime::Runtime;
use serde::{Deserialize, Serialize};

/// What a loop pass does when two items project to the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Fail the pass with `RenderError::DuplicateKey`
    Reject,
    /// Keep only the last item for each key
    KeepLast,
}

impl Default for DuplicateKeyPolicy {
    fn default() -> Self {
        DuplicateKeyPolicy::Reject
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Drain/deferred rounds one flush may take before giving up
    pub max_flush_rounds: usize,
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Re-select a ternary's branch when its test flips
    pub rebranch_ternaries: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_rounds: 64,
            duplicate_keys: DuplicateKeyPolicy::default(),
            rebranch_ternaries: true,
        }
    }
}

/// Builder for configuring a [`Runtime`]
pub struct RuntimeBuilder<H: Host> {
    host: H,
    config: RuntimeConfig,
}

impl<H: Host> RuntimeBuilder<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            config: RuntimeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_flush_rounds(mut self, rounds: usize) -> Self {
        self.config.max_flush_rounds = rounds;
        self
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.config.duplicate_keys = policy;
        self
    }

    pub fn with_rebranch_ternaries(mut self, enabled: bool) -> Self {
        self.config.rebranch_ternaries = enabled;
        self
    }

    pub fn build(self) -> Runtime<H> {
        Runtime::with_config(self.host, self.config)
    }
}
