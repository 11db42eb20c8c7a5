use crate::foundation::error::VppResult;
use crate::gpu::batch::{BatchEmitter, GpuCommand};

/// Batch emitter that keeps every command, grouped by flush.
#[derive(Debug, Default)]
pub struct RecordingBatch {
    pending: Vec<GpuCommand>,
    flushed: Vec<Vec<GpuCommand>>,
    depth: u32,
    max_depth: u32,
    atomic_sections: usize,
    flushes_in_atomic: usize,
}

impl RecordingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submitted batches in submission order.
    pub fn batches(&self) -> &[Vec<GpuCommand>] {
        &self.flushed
    }

    /// Commands emitted since the last flush.
    pub fn pending(&self) -> &[GpuCommand] {
        &self.pending
    }

    /// Every top-level command, flushed first.
    pub fn commands(&self) -> impl Iterator<Item = &GpuCommand> {
        self.flushed.iter().flatten().chain(self.pending.iter())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands().map(GpuCommand::name).collect()
    }

    /// Commands matching `pred`, including those inside second-level batches.
    pub fn count(&self, pred: impl Fn(&GpuCommand) -> bool) -> usize {
        fn walk(cmds: &[GpuCommand], pred: &dyn Fn(&GpuCommand) -> bool) -> usize {
            cmds.iter()
                .map(|c| {
                    let nested = match c {
                        GpuCommand::BatchBufferStart { commands, .. } => walk(commands, pred),
                        _ => 0,
                    };
                    usize::from(pred(c)) + nested
                })
                .sum()
        }
        self.flushed
            .iter()
            .map(|b| walk(b, &pred))
            .sum::<usize>()
            + walk(&self.pending, &pred)
    }

    pub fn flushes(&self) -> usize {
        self.flushed.len()
    }

    /// Atomic sections opened so far.
    pub fn atomic_sections(&self) -> usize {
        self.atomic_sections
    }

    /// `true` when every `begin_atomic` has been closed and no flush happened inside one.
    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && self.flushes_in_atomic == 0
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl BatchEmitter for RecordingBatch {
    fn begin_atomic(&mut self, _size_hint: usize) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.atomic_sections += 1;
    }

    fn emit(&mut self, cmd: GpuCommand) {
        self.pending.push(cmd);
    }

    fn end_atomic(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn flush(&mut self) -> VppResult<()> {
        if self.depth > 0 {
            self.flushes_in_atomic += 1;
        }
        // An empty batch is never submitted.
        if self.pending.is_empty() {
            return Ok(());
        }
        self.flushed.push(std::mem::take(&mut self.pending));
        Ok(())
    }
}
