use std::collections::BTreeSet;

/// Emits every distinct warning only once.
#[derive(Debug, Clone, Default)]
pub struct WarnOnce {
    emitted: BTreeSet<String>,
}

impl WarnOnce {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.emitted.contains(&message) {
            return;
        }
        log::warn!("{message}");
        self.emitted.insert(message);
    }

    pub fn contains(&self, message: &str) -> bool {
        self.emitted.contains(message)
    }

    pub fn len(&self) -> usize {
        self.emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emitted.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use crate::util::warn_once::WarnOnce;

    #[test]
    fn deduplicates_messages() {
        let mut warnings = WarnOnce::default();
        assert!(warnings.is_empty());
        warnings.warn("a");
        warnings.warn("a".to_string());
        warnings.warn("b");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.contains("a"));
        assert_eq!(warnings.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
