use crate::error::AdapterError;
use crate::strategy::{Argument, CallDescriptor, Handle};

/// Upper bound on calls in one programmable transaction.
pub const DEFAULT_CALL_LIMIT: usize = 1024;

/// The index of an emitted call, from which result handles are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallResult(u16);

impl CallResult {
    pub fn index(self) -> u16 {
        self.0
    }

    /// The call's return value, when it returns exactly one.
    pub fn single(self) -> Handle {
        Handle::Result(self.0)
    }

    /// Element `index` of the tuple the call returns.
    pub fn nested(self, index: u16) -> Handle {
        Handle::NestedResult(self.0, index)
    }
}

/// The ordered call list being assembled for one compilation.
///
/// Adapters append through [`CallPlan::move_call`]; the builder tags each call with
/// the node currently being compiled.
#[derive(Debug)]
pub struct CallPlan {
    calls: Vec<CallDescriptor>,
    current_node: String,
    limit: usize,
}

impl CallPlan {
    pub fn new(limit: usize) -> Self {
        Self {
            calls: Vec::new(),
            current_node: String::new(),
            limit: limit.min(usize::from(u16::MAX) + 1),
        }
    }

    pub(crate) fn begin_node(&mut self, node_id: &str) {
        self.current_node = node_id.to_string();
    }

    pub fn move_call(
        &mut self,
        target: String,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    ) -> Result<CallResult, AdapterError> {
        if self.calls.len() >= self.limit {
            return Err(AdapterError::CallLimit { limit: self.limit });
        }
        let index = u16::try_from(self.calls.len())
            .map_err(|_| AdapterError::CallLimit { limit: self.limit })?;
        self.calls.push(CallDescriptor {
            node_id: self.current_node.clone(),
            target,
            type_arguments,
            arguments,
        });
        Ok(CallResult(index))
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn calls(&self) -> &[CallDescriptor] {
        &self.calls
    }

    pub(crate) fn into_calls(self) -> Vec<CallDescriptor> {
        self.calls
    }
}

impl Default for CallPlan {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_LIMIT)
    }
}
