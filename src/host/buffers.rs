use std::collections::HashMap;

use crate::filter::FilterParameter;
use crate::foundation::core::BufferId;
use crate::surface::registry::{BufferPayload, BufferRegistry};

/// In-process parameter-buffer registry.
#[derive(Debug, Default)]
pub struct BufferTable {
    buffers: HashMap<BufferId, BufferPayload>,
    next_id: u32,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, payload: BufferPayload) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, payload);
        id
    }

    pub fn insert_filter(&mut self, filter: FilterParameter) -> BufferId {
        self.insert(BufferPayload::Filter(filter))
    }

    pub fn remove(&mut self, id: BufferId) -> Option<BufferPayload> {
        self.buffers.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl BufferRegistry for BufferTable {
    fn resolve(&self, id: BufferId) -> Option<BufferPayload> {
        self.buffers.get(&id).cloned()
    }
}
