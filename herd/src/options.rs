use herd_di::{DEFAULT_INJECTOR_NAME, DEFAULT_PROVIDER_SUFFIX};

/// Naming conventions of a [Container](crate::Container)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Appended to a service name to find its provider
    pub provider_suffix: String,
    /// Reserved service name of the [Injector](herd_di::Injector) handle
    pub injector_name: String,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            provider_suffix: DEFAULT_PROVIDER_SUFFIX.to_string(),
            injector_name: DEFAULT_INJECTOR_NAME.to_string(),
        }
    }
}

impl ContainerOptions {
    pub fn provider_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.provider_suffix = suffix.into();
        self
    }

    pub fn injector_name(mut self, name: impl Into<String>) -> Self {
        self.injector_name = name.into();
        self
    }
}
