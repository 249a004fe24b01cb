//! Per-operation orchestration settings.

use std::sync::Arc;
use std::time::Duration;

use vyral_providers::{AsyncProvider, Provider};

/// Whether results are cached, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Cached { ttl: Duration },
    Bypass,
}

/// How the operation's candidates are run.
#[derive(Clone)]
pub enum Execution {
    /// One request/response call per candidate.
    Direct(Vec<Arc<dyn Provider>>),
    /// Submit to the first accepting candidate, then poll it.
    Polled(Vec<Arc<dyn AsyncProvider>>),
}

impl Execution {
    pub fn candidate_ids(&self) -> Vec<String> {
        match self {
            Execution::Direct(c) => c.iter().map(|p| p.id().to_string()).collect(),
            Execution::Polled(c) => c.iter().map(|p| p.id().to_string()).collect(),
        }
    }
}

/// Everything the orchestrator needs to know about one operation.
#[derive(Clone)]
pub struct OperationDescriptor {
    /// Operation name, first fingerprint component
    pub name: &'static str,
    /// Second fingerprint component (e.g. `generate`, `analyze`)
    pub sub_operation: &'static str,
    /// Params included in the fingerprint
    pub cache_fields: Vec<&'static str>,
    pub cache: CachePolicy,
    pub execution: Execution,
}

impl OperationDescriptor {
    /// Uncached operation with the given execution.
    pub fn new(name: &'static str, execution: Execution) -> Self {
        Self {
            name,
            sub_operation: "",
            cache_fields: Vec::new(),
            cache: CachePolicy::Bypass,
            execution,
        }
    }

    pub fn direct(name: &'static str, candidates: Vec<Arc<dyn Provider>>) -> Self {
        Self::new(name, Execution::Direct(candidates))
    }

    pub fn polled(name: &'static str, candidates: Vec<Arc<dyn AsyncProvider>>) -> Self {
        Self::new(name, Execution::Polled(candidates))
    }

    /// Cache results under a fingerprint of `fields` for `ttl`.
    pub fn cached(
        mut self,
        sub_operation: &'static str,
        fields: &[&'static str],
        ttl: Duration,
    ) -> Self {
        self.sub_operation = sub_operation;
        self.cache_fields = fields.to_vec();
        self.cache = CachePolicy::Cached { ttl };
        self
    }
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("sub_operation", &self.sub_operation)
            .field("cache_fields", &self.cache_fields)
            .field("cache", &self.cache)
            .field("candidates", &self.execution.candidate_ids())
            .finish()
    }
}
