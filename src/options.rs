/// Settings for one package load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Materialize default objects and structure defaults in post-load.
    pub materialize_defaults: bool,
    /// Seed only class exports; everything else is created when referenced.
    pub classes_only: bool,
    /// Record a diagnostic when an object leaves bytes before its stopper.
    pub report_unread_bytes: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            materialize_defaults: true,
            classes_only: false,
            report_unread_bytes: true,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_materialize_defaults(mut self, enabled: bool) -> Self {
        self.materialize_defaults = enabled;
        self
    }

    pub fn with_classes_only(mut self, enabled: bool) -> Self {
        self.classes_only = enabled;
        self
    }

    pub fn with_report_unread_bytes(mut self, enabled: bool) -> Self {
        self.report_unread_bytes = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let options = LoadOptions::new();
        assert!(options.materialize_defaults);
        assert!(!options.classes_only);
        let options = options.with_classes_only(true).with_materialize_defaults(false);
        assert!(options.classes_only);
        assert!(!options.materialize_defaults);
        assert!(options.report_unread_bytes);
    }
}
