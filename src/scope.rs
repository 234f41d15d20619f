use crate::error::ScopeError;
use crate::source::TensorId;
use crate::target::TargetTensorHandle;
use std::collections::HashMap;

/// Source tensor -> target tensor mapping for one graph-build session.
///
/// A tensor is present iff it has been legalized and registered. Lookups of
/// unseen tensors fail instead of producing a default handle, and a key can
/// only be registered once.
#[derive(Debug, Default, Clone)]
pub struct ScopeTable {
    entries: HashMap<TensorId, TargetTensorHandle>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, tensor: TensorId) -> Result<&TargetTensorHandle, ScopeError> {
        self.entries.get(&tensor).ok_or(ScopeError::Unresolved { tensor })
    }

    pub fn register(&mut self, tensor: TensorId, handle: TargetTensorHandle) -> Result<(), ScopeError> {
        if self.entries.contains_key(&tensor) {
            return Err(ScopeError::Duplicate { tensor });
        }
        self.entries.insert(tensor, handle);
        Ok(())
    }

    pub fn contains(&self, tensor: TensorId) -> bool {
        self.entries.contains_key(&tensor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by source tensor id.
    pub fn entries(&self) -> Vec<(TensorId, &TargetTensorHandle)> {
        let mut out: Vec<_> = self.entries.iter().map(|(k, v)| (*k, v)).collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }
}
