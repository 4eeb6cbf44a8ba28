use trellis_types::Op;

/// FIFO of wire ops produced by tree mutations, in causal order.
#[derive(Debug, Default)]
pub struct ChangeRecorder {
    ops: Vec<Op>,
}

impl ChangeRecorder {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Append an op to the back of the queue
    pub fn record(&mut self, op: Op) {
        tracing::trace!(action = op.action(), "recorded op");
        self.ops.push(op);
    }

    /// Drain all ops in emission order
    pub fn take(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    pub fn pending(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drop everything queued, e.g. when a full snapshot supersedes it.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}
