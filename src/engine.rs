use crate::callstack::{CallStack, RoutineContext, MAX_LOCALS};
use crate::instruction::{Instruction, OperandCount};
use crate::machine::Machine;
use crate::opcode_tables;
use crate::operand::{Operand, OperandType};
use crate::snapshot::PortableGameState;
use crate::zrand::ZRand;
use log::debug;

/// How many undo snapshots @save_undo keeps before discarding the
/// oldest
const MAX_UNDO_STATES: usize = 10;

/// Result of executing one instruction
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// Continue at the next instruction
    Continue,
    /// Branch taken, PC already updated
    Branched,
    /// Routine called, PC at its first instruction
    Called,
    /// Routine returned
    Returned(u16),
    /// The game asked to stop
    Quit,
}

/// The fetch-decode-execute loop
///
/// Owns the call stack and the PC; everything else is reached through
/// the `Machine` facade. A fatal halt is an `Err` out of `run`/`step`;
/// the Standard defines no recovery from one.
pub struct ExecutionEngine<M: Machine> {
    pub machine: M,
    pub pc: u32,
    version: u8,
    pub callstack: CallStack,
    pub(crate) rng: ZRand,
    undo_states: Vec<PortableGameState>,
    instruction_count: u64,
    running: bool,
}

impl<M: Machine> ExecutionEngine<M> {
    pub fn new(machine: M) -> Result<Self, String> {
        let version = machine.version();
        let mut engine = ExecutionEngine {
            machine,
            pc: 0,
            version,
            callstack: CallStack::new(),
            rng: ZRand::new_uniform(),
            undo_states: Vec::new(),
            instruction_count: 0,
            running: true,
        };
        engine.reset()?;
        Ok(engine)
    }

    /// Seat the initial activation. V1-5 run with a dummy main
    /// context that has no locals; V6 calls a main routine.
    fn reset(&mut self) -> Result<(), String> {
        self.callstack.clear();
        let initial = self.machine.initial_pc();
        if self.version == 6 {
            self.do_call(initial as u16, &[], None)?;
        } else {
            self.callstack.push_context(RoutineContext::new(0, None, 0));
            self.pc = initial;
        }
        Ok(())
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run until quit or fatal halt
    pub fn run(&mut self) -> Result<(), String> {
        self.run_with_limit(None)
    }

    /// Run at most `max_instructions` cycles (None = unbounded)
    pub fn run_with_limit(&mut self, max_instructions: Option<u64>) -> Result<(), String> {
        let mut executed = 0u64;
        while self.running {
            if let Some(max) = max_instructions {
                if executed >= max {
                    break;
                }
            }
            self.step()?;
            executed += 1;
        }
        Ok(())
    }

    /// One fetch-decode-execute cycle
    pub fn step(&mut self) -> Result<(), String> {
        let pc = self.pc;
        let inst = Instruction::decode(&self.machine, pc, self.version)
            .map_err(|e| format!("decode error at pc {pc:#07x}: {e}"))?;

        debug!("{:05x}: {}", pc, inst.format_with_version(self.version));
        self.instruction_count += 1;

        // Default advance; branch/call/return overwrite this
        self.pc = pc + inst.size as u32;

        if let ExecutionResult::Quit = self
            .execute_instruction(&inst)
            .map_err(|e| format!("{e} at pc {pc:#07x}"))?
        {
            self.running = false;
        }
        Ok(())
    }

    /// Dispatch one decoded instruction
    ///
    /// The PC must already point past the instruction. Invalid
    /// opcodes were deliberately let through by the decoder and are
    /// reported here with full context.
    pub fn execute_instruction(&mut self, inst: &Instruction) -> Result<ExecutionResult, String> {
        if !opcode_tables::is_valid(inst.operand_count, inst.opcode, self.version) {
            return Err(format!(
                "illegal instruction, type {:?} operand count {:?} opcode {}",
                inst.form, inst.operand_count, inst.opcode
            ));
        }

        let operands = self.resolve_operands(inst)?;
        match inst.operand_count {
            OperandCount::OP0 => self.execute_0op(inst),
            OperandCount::OP1 => self.execute_1op(inst, &operands),
            OperandCount::OP2 => self.execute_2op(inst, &operands),
            OperandCount::VAR => self.execute_var(inst, &operands),
            OperandCount::EXT => self.execute_ext(inst, &operands),
        }
    }

    // ---- operand and variable resolution ----

    /// Resolve all operands to unsigned values, left to right.
    /// Resolving a `Variable` operand numbered 0 pops the evaluation
    /// stack.
    pub fn resolve_operands(&mut self, inst: &Instruction) -> Result<Vec<u16>, String> {
        let mut values = Vec::with_capacity(inst.operands.len());
        for op in &inst.operands {
            values.push(self.operand_value(op)?);
        }
        Ok(values)
    }

    pub fn operand_value(&mut self, operand: &Operand) -> Result<u16, String> {
        match operand.op_type {
            OperandType::SmallConstant | OperandType::LargeConstant => Ok(operand.raw),
            OperandType::Variable => self.variable_value(operand.raw as u8),
            OperandType::Omitted => Err("attempt to resolve an omitted operand".to_string()),
        }
    }

    /// Read variable `var` for value: 0 pops the stack, 1-15 read the
    /// current routine's locals, 16-255 read globals
    pub fn variable_value(&mut self, var: u8) -> Result<u16, String> {
        match var {
            0x00 => self.callstack.pop(),
            0x01..=0x0F => self.callstack.read_local(var),
            _ => self.machine.read_global(var),
        }
    }

    /// Write variable `var`: 0 pushes (never updates in place)
    pub fn set_variable(&mut self, var: u8, value: u16) -> Result<(), String> {
        match var {
            0x00 => self.callstack.push(value),
            0x01..=0x0F => self.callstack.write_local(var, value),
            _ => self.machine.write_global(var, value),
        }
    }

    /// Indirect variable read (load, inc_chk, ...): variable 0 peeks
    /// the stack top without popping (Standard 1.1)
    pub fn variable_value_in_place(&mut self, var: u8) -> Result<u16, String> {
        match var {
            0x00 => self.callstack.peek(),
            _ => self.variable_value(var),
        }
    }

    /// Indirect variable write (store, pull, inc, ...): variable 0
    /// replaces the stack top instead of pushing
    pub fn set_variable_in_place(&mut self, var: u8, value: u16) -> Result<(), String> {
        match var {
            0x00 => self.callstack.replace_top(value),
            _ => self.set_variable(var, value),
        }
    }

    /// Store an instruction result if the opcode declared a store
    /// variable
    pub fn store_result(&mut self, inst: &Instruction, value: u16) -> Result<(), String> {
        if let Some(var) = inst.store_var {
            self.set_variable(var, value)?;
        }
        Ok(())
    }

    // ---- control-flow primitives ----

    /// Resolve a branch decision. Offsets 0 and 1 return false/true
    /// from the current routine instead of jumping; otherwise the
    /// next PC is `address + length + offset - 2`.
    pub fn branch_on_test(
        &mut self,
        inst: &Instruction,
        condition: bool,
    ) -> Result<ExecutionResult, String> {
        let branch = inst
            .branch
            .ok_or_else(|| format!("{} is missing branch data", inst.name(self.version)))?;
        if condition != branch.on_true {
            return Ok(ExecutionResult::Continue);
        }
        match branch.offset {
            0 => self.do_return(0),
            1 => self.do_return(1),
            offset => {
                self.pc = (self.pc as i32 + offset as i32 - 2) as u32;
                Ok(ExecutionResult::Branched)
            }
        }
    }

    /// Invoke the routine at `packed`. Address 0 stores 0 (if a store
    /// was declared) and continues without creating a context.
    pub fn do_call(
        &mut self,
        packed: u16,
        args: &[u16],
        return_store: Option<u8>,
    ) -> Result<ExecutionResult, String> {
        if packed == 0 {
            if let Some(var) = return_store {
                self.set_variable(var, 0)?;
            }
            return Ok(ExecutionResult::Continue);
        }

        let addr = self.machine.unpack_routine_address(packed);
        let num_locals = self.machine.read_byte(addr)? as usize;
        if num_locals > MAX_LOCALS {
            return Err(format!(
                "routine at {addr:#07x} declares {num_locals} locals; the limit is 15"
            ));
        }

        let mut frame = RoutineContext::new(self.pc, return_store, self.callstack.stack_depth());
        frame.num_locals = num_locals as u8;
        frame.arg_count = args.len() as u8;

        let mut entry = addr + 1;
        if self.version <= 4 {
            // V1-4 routine headers carry default values for each local
            for slot in frame.locals.iter_mut().take(num_locals) {
                *slot = self.machine.read_word(entry)?;
                entry += 2;
            }
        }
        for (i, &arg) in args.iter().enumerate().take(num_locals) {
            frame.locals[i] = arg;
        }

        debug!(
            "call {addr:#07x} args {args:?} locals {num_locals} return {:?}",
            return_store
        );
        self.callstack.push_context(frame);
        self.pc = entry;
        Ok(ExecutionResult::Called)
    }

    /// Pop the current context, resume at its return address, and
    /// store `value` into its declared return variable
    pub fn do_return(&mut self, value: u16) -> Result<ExecutionResult, String> {
        let frame = self.callstack.pop_context()?;
        self.pc = frame.return_pc;
        if self.callstack.depth() == 0 {
            // Returning from the outermost activation ends the game
            return Ok(ExecutionResult::Quit);
        }
        if let Some(var) = frame.return_store {
            self.set_variable(var, value)?;
        }
        Ok(ExecutionResult::Returned(value))
    }

    /// Non-local return: unwind to the frame number a `catch`
    /// produced, then return normally with `value`
    pub fn do_throw(&mut self, value: u16, frame_number: u16) -> Result<ExecutionResult, String> {
        self.callstack.unwind_to(frame_number as usize)?;
        self.do_return(value)
    }

    // ---- save / restore / undo ----

    /// @save, both the 0OP branch/store flavors and EXT:0x00
    pub fn do_save(&mut self, inst: &Instruction) -> Result<ExecutionResult, String> {
        let state = self.capture_state(inst)?;
        let ok = self.machine.save(&state);
        if self.version <= 3 {
            self.branch_on_test(inst, ok)
        } else {
            self.store_result(inst, if ok { 1 } else { 0 })?;
            Ok(ExecutionResult::Continue)
        }
    }

    /// @restore; success resumes from the snapshot and never reaches
    /// the next instruction
    pub fn do_restore(&mut self, inst: &Instruction) -> Result<ExecutionResult, String> {
        match self.machine.restore() {
            Some(state) => self.apply_state(state),
            None => {
                if self.version <= 3 {
                    self.branch_on_test(inst, false)
                } else {
                    self.store_result(inst, 0)?;
                    Ok(ExecutionResult::Continue)
                }
            }
        }
    }

    pub fn do_save_undo(&mut self, inst: &Instruction) -> Result<ExecutionResult, String> {
        let state = self.capture_state(inst)?;
        if self.undo_states.len() >= MAX_UNDO_STATES {
            self.undo_states.remove(0);
        }
        self.undo_states.push(state);
        self.store_result(inst, 1)?;
        Ok(ExecutionResult::Continue)
    }

    pub fn do_restore_undo(&mut self, inst: &Instruction) -> Result<ExecutionResult, String> {
        match self.undo_states.pop() {
            Some(state) => self.apply_state(state),
            None => {
                self.store_result(inst, 0)?;
                Ok(ExecutionResult::Continue)
            }
        }
    }

    /// Build a snapshot that resumes as if the save succeeded: V1-3
    /// resume at the branch-true target, V4+ past the instruction
    /// with the store variable remembered for the "restore just
    /// happened" code
    fn capture_state(&self, inst: &Instruction) -> Result<PortableGameState, String> {
        let (resume_pc, resume_store) = if self.version <= 3 {
            let branch = inst
                .branch
                .ok_or_else(|| "save is missing branch data".to_string())?;
            let target = match branch.offset {
                0 | 1 => self.pc,
                offset => (self.pc as i32 + offset as i32 - 2) as u32,
            };
            (target, None)
        } else {
            (self.pc, inst.store_var)
        };
        Ok(PortableGameState::capture(
            resume_pc,
            resume_store,
            &self.callstack,
            self.machine.dynamic_memory(),
        ))
    }

    fn apply_state(&mut self, state: PortableGameState) -> Result<ExecutionResult, String> {
        self.machine.restore_dynamic(state.dynamic_memory())?;
        state.restore_callstack(&mut self.callstack);
        self.pc = state.resume_pc();
        if self.version >= 4 {
            if let Some(var) = state.resume_store() {
                // Code 2: the game is resuming from a restore
                self.set_variable(var, 2)?;
            }
        }
        Ok(ExecutionResult::Branched)
    }

    /// @restart: dynamic memory back to the load image, both stacks
    /// cleared, PC at the initial entry point
    pub fn do_restart(&mut self) -> Result<ExecutionResult, String> {
        self.machine.restart()?;
        self.undo_states.clear();
        self.reset()?;
        Ok(ExecutionResult::Branched)
    }

    // ---- V6 user stacks ----

    /// Push onto a user stack (a table whose first word counts free
    /// slots). Overflow is reported as false, never a fault.
    pub fn push_user_stack(&mut self, stack_addr: u16, value: u16) -> Result<bool, String> {
        let addr = stack_addr as u32;
        let free = self.machine.read_word(addr)?;
        if free == 0 {
            return Ok(false);
        }
        self.machine.write_word(addr + 2 * free as u32, value)?;
        self.machine.write_word(addr, free - 1)?;
        Ok(true)
    }

    /// Pop one value from a user stack
    pub fn pop_user_stack(&mut self, stack_addr: u16) -> Result<u16, String> {
        let addr = stack_addr as u32;
        let free = self.machine.read_word(addr)?;
        let value = self.machine.read_word(addr + 2 * (free as u32 + 1))?;
        self.machine.write_word(addr, free + 1)?;
        Ok(value)
    }

    /// Object 0 is "nothing": accessing it is a game bug, logged and
    /// treated as no result rather than a fault
    pub fn object_is_nothing(&self, opcode_name: &str, obj: u16) -> bool {
        if obj == 0 {
            log::warn!("@{opcode_name} applied to object 0 at pc {:#07x}", self.pc);
            true
        } else {
            false
        }
    }
}
