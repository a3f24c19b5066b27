use crate::error::CompileError;
use crate::strategy::{NodeRef, Resource};
use std::collections::BTreeMap;

/// Outputs produced so far in one compilation, keyed by `nodeId.outputId`.
///
/// Consuming an input moves its resource out, so anything still here at the end was
/// never consumed.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: BTreeMap<NodeRef, Resource>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: NodeRef, resource: Resource) -> Result<(), CompileError> {
        if self.entries.contains_key(&key) {
            return Err(CompileError::internal(
                &key.node_id,
                format!("output '{}' was produced twice", key),
            ));
        }
        self.entries.insert(key, resource);
        Ok(())
    }

    /// Moves a resource out. A second `take` of the same key returns `None`.
    pub fn take(&mut self, key: &NodeRef) -> Option<Resource> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &NodeRef) -> Option<&Resource> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &NodeRef) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_snapshot(self) -> BTreeMap<String, Resource> {
        self.entries
            .into_iter()
            .map(|(key, resource)| (key.to_string(), resource))
            .collect()
    }
}
