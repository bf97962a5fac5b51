use crate::callstack::{CallStack, RoutineContext};

/// Opaque game-state snapshot for save, restore, and undo
///
/// Captures dynamic memory, the routine contexts, the evaluation
/// stack, and the PC to resume at. Consumers outside the engine treat
/// it as an opaque payload: the machine facade only stores and
/// retrieves whole snapshots. The external serialization format
/// (Quetzal or otherwise) is the host's concern.
#[derive(Clone)]
pub struct PortableGameState {
    resume_pc: u32,
    /// Store variable of the save instruction; written with 2
    /// ("restore just happened") after a V4+ restore
    resume_store: Option<u8>,
    frames: Vec<RoutineContext>,
    eval_stack: Vec<u16>,
    dynamic_memory: Vec<u8>,
}

impl PortableGameState {
    /// Capture the current state. `resume_pc` is where execution
    /// continues after a successful restore; for V1-3 saves that is
    /// the save instruction's branch-true target, for V4+ the address
    /// past the instruction.
    pub fn capture(
        resume_pc: u32,
        resume_store: Option<u8>,
        callstack: &CallStack,
        dynamic_memory: Vec<u8>,
    ) -> Self {
        PortableGameState {
            resume_pc,
            resume_store,
            frames: callstack.frames().to_vec(),
            eval_stack: callstack.stack_values().to_vec(),
            dynamic_memory,
        }
    }

    pub fn resume_pc(&self) -> u32 {
        self.resume_pc
    }

    pub fn resume_store(&self) -> Option<u8> {
        self.resume_store
    }

    pub fn dynamic_memory(&self) -> &[u8] {
        &self.dynamic_memory
    }

    /// Re-seat the call stack from this snapshot
    pub fn restore_callstack(&self, callstack: &mut CallStack) {
        callstack.restore_from(self.frames.clone(), self.eval_stack.clone());
    }
}
