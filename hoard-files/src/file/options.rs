use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(debug_assertions)] {
        const STRICT_CHUNKS_DEFAULT: bool = true;
    } else {
        const STRICT_CHUNKS_DEFAULT: bool = false;
    }
}

/// What happens to a reference whose target is not part of the loaded file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ResolvePolicy {
    /// Log it and leave the reference unset
    #[default]
    Lenient,
    /// Fail the load with [`crate::LoadError::DanglingReference`]
    Strict,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Apply legacy folder name lists and index significant names on prepare. Name chunks
    /// are always read.
    pub load_names: bool,
    /// Fail on chunks nobody can load instead of skipping them. Debug builds default to strict.
    pub strict_chunks: bool,
    pub resolve_policy: ResolvePolicy,
}

impl LoadOptions {
    pub fn with_names(mut self, load_names: bool) -> Self {
        self.load_names = load_names;
        self
    }

    pub fn with_strict_chunks(mut self, strict: bool) -> Self {
        self.strict_chunks = strict;
        self
    }

    pub fn with_resolve_policy(mut self, policy: ResolvePolicy) -> Self {
        self.resolve_policy = policy;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            load_names: false,
            strict_chunks: STRICT_CHUNKS_DEFAULT,
            resolve_policy: ResolvePolicy::default(),
        }
    }
}
