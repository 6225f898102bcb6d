//! File-system gate in front of the embedder's storage handler.

use std::sync::Arc;

use opal_abi::{FsHandler, FsOperation, FsResult, OplError, OplResult};
use opal_lib::{klog_trace, klog_warn};

pub struct FsGate {
    handler: Arc<dyn FsHandler>,
    writable: bool,
}

impl FsGate {
    pub fn new(handler: Arc<dyn FsHandler>, writable: bool) -> Self {
        Self { handler, writable }
    }

    pub fn is_read_only(&self) -> bool {
        !self.writable
    }

    /// Forward `op`, refusing mutations on a read-only gate
    pub fn perform(&self, op: &FsOperation) -> OplResult<FsResult> {
        if !self.writable && !op.is_read_only() {
            klog_warn!("fs: {} refused, storage is read-only", op.name());
            return Err(OplError::AccessDenied);
        }
        klog_trace!("fs: {}", op.name());
        self.handler.perform(op)
    }
}
