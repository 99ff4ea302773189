/// Tunables for a [`VM`](crate::VM).
#[derive(Debug, Clone)]
pub struct VmSettings {
    /// Maximum number of frames on a process's call stack.
    pub max_depth: usize,
    /// Maximum nesting of interpreter runs started from primitives and
    /// host sends. Each one holds native stack until it returns.
    pub max_reentries: usize,
    /// Initial reservation of a process's value stack.
    pub stack_capacity: usize,
    /// Log every send of this selector at `info`.
    pub trace_send: Option<String>,
}

impl Default for VmSettings {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            max_reentries: 128,
            stack_capacity: 256,
            trace_send: None,
        }
    }
}
