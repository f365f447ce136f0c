/// Pass system configuration

pub(crate) const DEFAULT_ROOT_NAME: &str = "Root";

/// Options fixed at `PassSystem` creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSystemConfig {
    /// Run the validate phase and keep per-pass error/warning messages
    pub validation_enabled: bool,
    /// Log the hierarchy at debug level after each frame that changed it
    pub debug_print_hierarchy: bool,
    /// Maximum number of stored messages per pass and severity
    pub message_log_limit: usize,
    /// Name of the root pass (first path component)
    pub root_name: String,
}

impl Default for PassSystemConfig {
    fn default() -> Self {
        Self {
            validation_enabled: cfg!(debug_assertions),
            debug_print_hierarchy: false,
            message_log_limit: 32,
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }
}

impl PassSystemConfig {
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    pub fn with_debug_print_hierarchy(mut self, enabled: bool) -> Self {
        self.debug_print_hierarchy = enabled;
        self
    }

    pub fn with_message_log_limit(mut self, limit: usize) -> Self {
        self.message_log_limit = limit;
        self
    }

    /// Name of the root pass. Must not contain `.`, which separates path
    /// components; `PassSystem::new` falls back to `Root` otherwise.
    pub fn with_root_name(mut self, name: &str) -> Self {
        self.root_name = name.to_string();
        self
    }
}
