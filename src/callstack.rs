use log::debug;

/// Maximum depth of the evaluation stack
pub const STACK_SIZE: usize = 1024;

/// Maximum number of local variables a routine may declare
pub const MAX_LOCALS: usize = 15;

/// One routine activation record
///
/// Created on call, destroyed on return or throw-unwind. Locals are
/// per-context; the evaluation stack is shared, partitioned by
/// `stack_base`.
#[derive(Debug, Clone)]
pub struct RoutineContext {
    /// PC to resume at after the routine returns
    pub return_pc: u32,
    /// Where the return value goes (None = discard)
    pub return_store: Option<u8>,
    /// Number of locals this routine declared (0-15)
    pub num_locals: u8,
    pub locals: [u16; MAX_LOCALS],
    /// Number of arguments the caller actually supplied
    pub arg_count: u8,
    /// Evaluation-stack length at the moment of invocation
    pub stack_base: usize,
}

impl RoutineContext {
    pub fn new(return_pc: u32, return_store: Option<u8>, stack_base: usize) -> Self {
        RoutineContext {
            return_pc,
            return_store,
            num_locals: 0,
            locals: [0; MAX_LOCALS],
            arg_count: 0,
            stack_base,
        }
    }
}

/// Routine activations plus the shared evaluation stack
///
/// The topmost context is "current". Popping the evaluation stack
/// below the current context's `stack_base` is an error.
pub struct CallStack {
    frames: Vec<RoutineContext>,
    stack: Vec<u16>,
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: Vec::new(),
            stack: Vec::with_capacity(STACK_SIZE),
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.stack.clear();
    }

    // ---- evaluation stack ----

    pub fn push(&mut self, value: u16) -> Result<(), String> {
        if self.stack.len() >= STACK_SIZE {
            return Err("evaluation stack overflow".to_string());
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, String> {
        let base = self.frames.last().map_or(0, |f| f.stack_base);
        if self.stack.len() <= base {
            debug!(
                "stack underflow: depth={}, frame base={}, call depth={}",
                self.stack.len(),
                base,
                self.frames.len()
            );
            return Err("evaluation stack underflow".to_string());
        }
        Ok(self.stack.pop().unwrap())
    }

    /// Read the top of stack without popping (Standard 1.1 indirect
    /// reference to variable 0)
    pub fn peek(&self) -> Result<u16, String> {
        let base = self.frames.last().map_or(0, |f| f.stack_base);
        if self.stack.len() <= base {
            return Err("evaluation stack underflow".to_string());
        }
        Ok(*self.stack.last().unwrap())
    }

    /// Overwrite the top of stack in place (Standard 1.1 indirect
    /// write to variable 0)
    pub fn replace_top(&mut self, value: u16) -> Result<(), String> {
        let base = self.frames.last().map_or(0, |f| f.stack_base);
        if self.stack.len() <= base {
            return Err("evaluation stack underflow".to_string());
        }
        *self.stack.last_mut().unwrap() = value;
        Ok(())
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    // ---- routine contexts ----

    pub fn push_context(&mut self, context: RoutineContext) {
        self.frames.push(context);
    }

    pub fn pop_context(&mut self) -> Result<RoutineContext, String> {
        let frame = self
            .frames
            .pop()
            .ok_or("return with no routine active")?;
        // Discard any values the routine left on the evaluation stack
        self.stack.truncate(frame.stack_base);
        Ok(frame)
    }

    pub fn current(&self) -> Option<&RoutineContext> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut RoutineContext> {
        self.frames.last_mut()
    }

    /// Call-stack depth; also the frame number `catch` produces
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop contexts until exactly `target` remain, without running
    /// their returns. Used by `throw`.
    pub fn unwind_to(&mut self, target: usize) -> Result<(), String> {
        if target == 0 || target > self.frames.len() {
            return Err("@throw from an invalid stack frame state".to_string());
        }
        while self.frames.len() > target {
            let frame = self.frames.pop().unwrap();
            self.stack.truncate(frame.stack_base);
        }
        Ok(())
    }

    // ---- local variables of the current context ----

    pub fn read_local(&self, var: u8) -> Result<u16, String> {
        debug_assert!((1..=15).contains(&var));
        let frame = self
            .frames
            .last()
            .ok_or_else(|| format!("illegal variable L{:02x}: no routine active", var - 1))?;
        let index = (var - 1) as usize;
        if index >= frame.num_locals as usize {
            return Err(format!(
                "illegal variable L{:02x}: routine declares {} locals",
                index, frame.num_locals
            ));
        }
        Ok(frame.locals[index])
    }

    pub fn write_local(&mut self, var: u8, value: u16) -> Result<(), String> {
        debug_assert!((1..=15).contains(&var));
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| format!("illegal variable L{:02x}: no routine active", var - 1))?;
        let index = (var - 1) as usize;
        if index >= frame.num_locals as usize {
            return Err(format!(
                "illegal variable L{:02x}: routine declares {} locals",
                index, frame.num_locals
            ));
        }
        frame.locals[index] = value;
        Ok(())
    }

    // ---- snapshot support ----

    pub fn frames(&self) -> &[RoutineContext] {
        &self.frames
    }

    pub fn stack_values(&self) -> &[u16] {
        &self.stack
    }

    pub fn restore_from(&mut self, frames: Vec<RoutineContext>, stack: Vec<u16>) {
        self.frames = frames;
        self.stack = stack;
    }
}
