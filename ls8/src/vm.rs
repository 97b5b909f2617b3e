// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::io::{self, Write};

use thiserror::Error;

use crate::{
    alu::{self, AluError, AluOp, AluOutput, Flags},
    arch::{Address, Register, Word},
    memory::Memory,
    op::{DecodeError, Op},
    registers::Registers,
    trace::Trace,
};

#[derive(Debug, Error)]
pub enum VMError {
    #[error("invalid instruction at address {address:#04x}")]
    Decode {
        address: Address,
        source: DecodeError,
    },
    #[error("memory address {0:#x} is out of bounds")]
    MemoryOutOfBounds(Address),
    #[error("program of {0} bytes does not fit in memory")]
    ProgramTooLarge(usize),
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("program did not halt within {0} steps")]
    StepLimitExceeded(u64),
    #[error("machine has already faulted")]
    Faulted,
    #[error("failed to write output")]
    Output(#[from] io::Error),
}

pub type VMResult = Result<(), VMError>;

/// Why a machine stopped running without faulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// A `HLT` instruction executed.
    Hlt,
    /// The ALU rejected an operation, e.g. a division by zero.
    Arithmetic(AluError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted(HaltReason),
    /// A fatal [`VMError`] stopped the machine.
    Faulted,
}

/// An LS-8 machine. `PRN` output is written to `O`.
pub struct VM<O: Write = io::Stdout> {
    memory: Memory,
    registers: Registers,
    flags: Flags,
    pc: Address,
    state: State,
    steps: u64,
    output: O,
}

impl Default for VM {
    fn default() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<O: Write> VM<O> {
    pub fn with_output(output: O) -> Self {
        Self {
            memory: Memory::default(),
            registers: Registers::default(),
            flags: Flags::NONE,
            pc: 0,
            state: State::Running,
            steps: 0,
            output,
        }
    }

    /// Loads `program` at address 0 and resets the machine to run it.
    pub fn load(&mut self, program: &[Word]) -> VMResult {
        self.memory = Memory::default();
        self.memory.load(program)?;
        self.registers = Registers::default();
        self.flags = Flags::NONE;
        self.pc = 0;
        self.state = State::Running;
        self.steps = 0;
        Ok(())
    }

    /// Runs the machine until it halts.
    pub fn run(&mut self) -> Result<HaltReason, VMError> {
        while self.is_running() {
            self.step()?;
        }
        self.halt_reason()
    }

    /// Runs the machine until it halts, failing if that takes more than
    /// `max_steps` instructions.
    pub fn run_for(&mut self, max_steps: u64) -> Result<HaltReason, VMError> {
        for _ in 0..max_steps {
            if !self.is_running() {
                break;
            }
            self.step()?;
        }
        if self.is_running() {
            self.state = State::Faulted;
            return Err(VMError::StepLimitExceeded(max_steps));
        }
        self.halt_reason()
    }

    fn halt_reason(&self) -> Result<HaltReason, VMError> {
        match self.state {
            State::Halted(reason) => Ok(reason),
            _ => Err(VMError::Faulted),
        }
    }

    /// Fetches, decodes, and executes one instruction. Does nothing once the
    /// machine has stopped.
    pub fn step(&mut self) -> VMResult {
        if self.state != State::Running {
            return Ok(());
        }
        let result = self.execute();
        if let Err(error) = &result {
            log::debug!("faulted at {:#04x}: {}", self.pc, error);
            self.state = State::Faulted;
        }
        result
    }

    fn execute(&mut self) -> VMResult {
        log::trace!("{}", self.trace());

        let op = self.fetch()?;
        log::debug!("{:02X}: {}", self.pc, op);
        self.steps += 1;

        match op {
            Op::Nop => self.advance(op),
            Op::Hlt => {
                self.state = State::Halted(HaltReason::Hlt);
                Ok(())
            }
            Op::Ldi(to, constant) => {
                self.registers.set(to, constant);
                self.advance(op)
            }
            Op::Ld(to, from) => {
                let address = self.registers.get(from) as Address;
                self.registers.set(to, self.memory.read(address)?);
                self.advance(op)
            }
            Op::St(to, from) => {
                let address = self.registers.get(to) as Address;
                self.memory.write(address, self.registers.get(from))?;
                self.advance(op)
            }
            Op::Push(from) => {
                self.push(self.registers.get(from))?;
                self.advance(op)
            }
            Op::Pop(to) => {
                let value = self.pop()?;
                self.registers.set(to, value);
                self.advance(op)
            }
            Op::Prn(from) => {
                writeln!(self.output, "{}", self.registers.get(from))?;
                self.advance(op)
            }
            Op::Call(target) => {
                let return_address = self.pc + op.byte_len();
                let return_address = Word::try_from(return_address)
                    .map_err(|_| VMError::MemoryOutOfBounds(return_address))?;
                self.push(return_address)?;
                self.jump_to_register(target)
            }
            Op::Ret => {
                let return_address = self.pop()?;
                self.jump_to(return_address)
            }
            Op::Jmp(target) => self.jump_to_register(target),
            Op::Jeq(target) => self.jump_if(Flags::EQUAL, target, op),
            Op::Jgt(target) => self.jump_if(Flags::GREATER, target, op),
            Op::Jlt(target) => self.jump_if(Flags::LESS, target, op),
            Op::Jle(target) => {
                self.jump_if(Flags::LESS | Flags::EQUAL, target, op)
            }
            Op::Jge(target) => {
                self.jump_if(Flags::GREATER | Flags::EQUAL, target, op)
            }
            Op::Jne(target) => {
                if self.flags.intersects(Flags::EQUAL) {
                    self.advance(op)
                } else {
                    self.jump_to_register(target)
                }
            }
            Op::Add(a, b) => self.alu(AluOp::Add, a, b, op),
            Op::Sub(a, b) => self.alu(AluOp::Sub, a, b, op),
            Op::Mul(a, b) => self.alu(AluOp::Mul, a, b, op),
            Op::Div(a, b) => self.alu(AluOp::Div, a, b, op),
            Op::Mod(a, b) => self.alu(AluOp::Mod, a, b, op),
            Op::Cmp(a, b) => self.alu(AluOp::Cmp, a, b, op),
            Op::And(a, b) => self.alu(AluOp::And, a, b, op),
            Op::Or(a, b) => self.alu(AluOp::Or, a, b, op),
            Op::Xor(a, b) => self.alu(AluOp::Xor, a, b, op),
            Op::Shl(a, b) => self.alu(AluOp::Shl, a, b, op),
            Op::Shr(a, b) => self.alu(AluOp::Shr, a, b, op),
            // unary operations ignore their second register
            Op::Inc(a) => self.alu(AluOp::Inc, a, a, op),
            Op::Dec(a) => self.alu(AluOp::Dec, a, a, op),
            Op::Not(a) => self.alu(AluOp::Not, a, a, op),
        }
    }

    /// Reads the opcode at the program counter and the two bytes after it.
    fn fetch(&self) -> Result<Op, VMError> {
        let opcode = self.memory.read(self.pc)?;
        let operand_a = self.memory.read(self.pc + 1)?;
        let operand_b = self.memory.read(self.pc + 2)?;
        Op::decode(opcode, operand_a, operand_b).map_err(|source| {
            VMError::Decode {
                address: self.pc,
                source,
            }
        })
    }

    /// Applies `op` to registers `a` and `b`. A rejected operation halts the
    /// machine and leaves the registers untouched.
    fn alu(
        &mut self,
        op: AluOp,
        a: Register,
        b: Register,
        instruction: Op,
    ) -> VMResult {
        match alu::compute(op, self.registers.get(a), self.registers.get(b)) {
            Ok(AluOutput::Store(result)) => self.registers.set(a, result),
            Ok(AluOutput::Compare(flags)) => self.flags = flags,
            Err(error) => {
                log::debug!("{} at {:#04x}: {}", instruction, self.pc, error);
                self.state = State::Halted(HaltReason::Arithmetic(error));
                return Ok(());
            }
        }
        self.advance(instruction)
    }

    fn push(&mut self, value: Word) -> VMResult {
        let stack_pointer = self
            .registers
            .stack_pointer()
            .checked_sub(1)
            .ok_or(VMError::StackOverflow)?;
        self.registers.set_stack_pointer(stack_pointer);
        self.memory.write(stack_pointer as Address, value)
    }

    fn pop(&mut self) -> Result<Word, VMError> {
        let stack_pointer = self.registers.stack_pointer();
        let value = self.memory.read(stack_pointer as Address)?;
        let stack_pointer =
            stack_pointer.checked_add(1).ok_or(VMError::StackUnderflow)?;
        self.registers.set_stack_pointer(stack_pointer);
        Ok(value)
    }

    fn advance(&mut self, op: Op) -> VMResult {
        self.pc += op.byte_len();
        Ok(())
    }

    fn jump_to(&mut self, target: Word) -> VMResult {
        self.pc = target as Address;
        Ok(())
    }

    fn jump_to_register(&mut self, register: Register) -> VMResult {
        self.jump_to(self.registers.get(register))
    }

    fn jump_if(&mut self, flags: Flags, target: Register, op: Op) -> VMResult {
        if self.flags.intersects(flags) {
            self.jump_to_register(target)
        } else {
            self.advance(op)
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of instructions executed since the last [`VM::load`].
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// A read-only snapshot of the machine for diagnostics.
    pub fn trace(&self) -> Trace<'_> {
        Trace::new(self.pc, &self.memory, &self.registers)
    }
}
