// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::fmt;

use crate::{
    arch::{Address, FETCH_WINDOW},
    memory::Memory,
    registers::Registers,
};

/// Read-only dump of the program counter, the fetch window at the program
/// counter, and every register, all in hexadecimal:
///
/// ```text
/// TRACE: 03 | 82 01 09 | 08 00 00 00 00 00 00 F4
/// ```
///
/// Bytes of the fetch window past the end of memory are shown as `--`.
pub struct Trace<'a> {
    pc: Address,
    memory: &'a Memory,
    registers: &'a Registers,
}

impl<'a> Trace<'a> {
    pub fn new(
        pc: Address,
        memory: &'a Memory,
        registers: &'a Registers,
    ) -> Self {
        Self {
            pc,
            memory,
            registers,
        }
    }
}

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRACE: {:02X} |", self.pc)?;
        for offset in 0..FETCH_WINDOW {
            match self.memory.peek(self.pc + offset) {
                Some(byte) => write!(f, " {:02X}", byte)?,
                None => write!(f, " --")?,
            }
        }
        write!(f, " |")?;
        for value in self.registers.as_slice() {
            write!(f, " {:02X}", value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{op::Op, program::encode_program, trace::Trace, vm::VM};

    #[test]
    fn formats_machine_state() {
        let mut vm = VM::with_output(Vec::<u8>::new());
        vm.load(&encode_program(&[Op::Ldi(0, 8), Op::Ldi(1, 9), Op::Hlt]))
            .expect("program should fit in memory");
        vm.step().expect("LDI should run");
        assert_eq!(
            "TRACE: 03 | 82 01 09 | 08 00 00 00 00 00 00 F4",
            vm.trace().to_string()
        );
    }

    #[test]
    fn marks_bytes_past_end_of_memory() {
        let vm = VM::with_output(Vec::<u8>::new());
        let trace = Trace::new(0xFE, vm.memory(), vm.registers());
        assert_eq!(
            "TRACE: FE | 00 00 -- | 00 00 00 00 00 00 00 F4",
            trace.to_string()
        );
    }
}
