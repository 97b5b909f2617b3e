// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::fmt;

use enum_tags::enum_tags;
use paste::paste;
use static_assertions::const_assert_eq;
use thiserror::Error;

use crate::{
    arch::{Register, Word, REGISTER_COUNT, WORD_BITS},
    coding::CodeAsWord,
    decode,
};

/// Smallest sized integer type that can fit an op code.
pub type RawOpCode = u8;

/// Bits for the instruction identifier (`DDDD`).
pub const INSTRUCTION_ID_BITS: u32 = 4;
/// Bit marking instructions that set the program counter themselves (`C`).
pub const SETS_PC_BITS: u32 = 1;
/// Bit marking instructions handled by the ALU (`B`).
pub const ALU_FLAG_BITS: u32 = 1;
/// Bits for the number of operand bytes following the opcode (`AA`).
pub const OPERAND_COUNT_BITS: u32 = 2;

const_assert_eq!(
    WORD_BITS as u32,
    INSTRUCTION_ID_BITS + SETS_PC_BITS + ALU_FLAG_BITS + OPERAND_COUNT_BITS
);

/// The fields of an opcode byte, laid out as `AABCDDDD` from most to least
/// significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeLayout {
    pub identifier: Word,
    pub sets_pc: bool,
    pub alu: bool,
    pub operand_count: Word,
}

impl OpcodeLayout {
    pub fn of(opcode: RawOpCode) -> Self {
        decode!(opcode; RawOpCode;
            @(
                identifier: Word = [..INSTRUCTION_ID_BITS..],
                sets_pc: bool = [..SETS_PC_BITS..],
                alu: bool = [..ALU_FLAG_BITS..],
                operand_count: Word = [..OPERAND_COUNT_BITS..]
            ) => Self {
                identifier,
                sets_pc,
                alu,
                operand_count,
            }
        )
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> RawOpCode {
        crate::encode!(RawOpCode;
            [..INSTRUCTION_ID_BITS..] = self.identifier,
            [..SETS_PC_BITS..] = self.sets_pc,
            [..ALU_FLAG_BITS..] = self.alu,
            [..OPERAND_COUNT_BITS..] = self.operand_count
        )
    }

    /// Length in bytes of an instruction with this opcode.
    pub fn instruction_len(&self) -> usize {
        1 + self.operand_count as usize
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode {0:#010b}")]
    UnknownOpcode(RawOpCode),
    #[error("register operand {0} is out of range")]
    InvalidRegister(Word),
}

/// An LS-8 instruction. Each variant's discriminant is its opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[enum_tags(public, repr(RawOpCode))]
pub enum Op {
    /// `Self::Nop` has no effect.
    Nop = 0b00000000,
    /// `Self::Hlt` stops the machine.
    Hlt = 0b00000001,
    /// `Self::Ldi(a, i)` loads the literal `i` into register `a`.
    Ldi(Register, Word) = 0b10000010,
    /// `Self::Ld(a, b)` loads the byte at the address in register `b` into
    /// register `a`.
    Ld(Register, Register) = 0b10000011,
    /// `Self::St(a, b)` stores register `b` at the address in register `a`.
    St(Register, Register) = 0b10000100,
    Push(Register) = 0b01000101,
    Pop(Register) = 0b01000110,
    /// `Self::Prn(a)` prints register `a` in decimal.
    Prn(Register) = 0b01000111,
    Add(Register, Register) = 0b10100000,
    Sub(Register, Register) = 0b10100001,
    Mul(Register, Register) = 0b10100010,
    Div(Register, Register) = 0b10100011,
    Mod(Register, Register) = 0b10100100,
    Inc(Register) = 0b01100101,
    Dec(Register) = 0b01100110,
    /// `Self::Cmp(a, b)` sets the flag register from comparing `a` to `b`.
    Cmp(Register, Register) = 0b10100111,
    And(Register, Register) = 0b10101000,
    Not(Register) = 0b01101001,
    Or(Register, Register) = 0b10101010,
    Xor(Register, Register) = 0b10101011,
    Shl(Register, Register) = 0b10101100,
    Shr(Register, Register) = 0b10101101,
    /// `Self::Call(a)` pushes the address of the next instruction and jumps
    /// to the address in register `a`.
    Call(Register) = 0b01010000,
    /// `Self::Ret` pops the return address pushed by [`Op::Call`].
    Ret = 0b00010001,
    Jmp(Register) = 0b01010100,
    Jeq(Register) = 0b01010101,
    Jne(Register) = 0b01010110,
    Jgt(Register) = 0b01010111,
    Jlt(Register) = 0b01011000,
    Jle(Register) = 0b01011001,
    Jge(Register) = 0b01011010,
}

/// The operand bytes of an [`Op`], grouped by encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// No operands.
    N,
    /// One register.
    A(Register),
    /// Two registers.
    AB(Register, Register),
    /// A register and an immediate byte.
    AI(Register, Word),
}

impl Operands {
    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        match self {
            Self::N => 0,
            Self::A(..) => 1,
            Self::AB(..) | Self::AI(..) => 2,
        }
    }
}

macro_rules! decode_op {
    (@operands $variant:ident as N, $a:expr, $b:expr) => {
        Ok(Self::$variant)
    };
    (@operands $variant:ident as A, $a:expr, $b:expr) => {
        Ok(Self::$variant(register($a)?))
    };
    (@operands $variant:ident as AB, $a:expr, $b:expr) => {
        Ok(Self::$variant(register($a)?, register($b)?))
    };
    (@operands $variant:ident as AI, $a:expr, $b:expr) => {
        Ok(Self::$variant(register($a)?, $b))
    };
    ($opcode:expr, $a:expr, $b:expr; $($variant:ident as $encoding:ident),* $(,)?) => {
        paste! {
            match $opcode {
                $(
                    Self::[<$variant:upper _TAG>] =>
                        decode_op!(@operands $variant as $encoding, $a, $b),
                )*
                unknown => Err(DecodeError::UnknownOpcode(unknown)),
            }
        }
    };
}

impl Op {
    /// Decodes the instruction whose opcode is `opcode`, given the two
    /// bytes that follow it in memory. Bytes the instruction doesn't use are
    /// ignored.
    pub fn decode(
        opcode: RawOpCode,
        a: Word,
        b: Word,
    ) -> Result<Self, DecodeError> {
        decode_op!(opcode, a, b;
            Nop as N,
            Hlt as N,
            Ldi as AI,
            Ld as AB,
            St as AB,
            Push as A,
            Pop as A,
            Prn as A,
            Add as AB,
            Sub as AB,
            Mul as AB,
            Div as AB,
            Mod as AB,
            Inc as A,
            Dec as A,
            Cmp as AB,
            And as AB,
            Not as A,
            Or as AB,
            Xor as AB,
            Shl as AB,
            Shr as AB,
            Call as A,
            Ret as N,
            Jmp as A,
            Jeq as A,
            Jne as A,
            Jgt as A,
            Jlt as A,
            Jle as A,
            Jge as A,
        )
    }

    pub const fn opcode(&self) -> RawOpCode {
        self.tag()
    }

    pub fn layout(&self) -> OpcodeLayout {
        OpcodeLayout::of(self.opcode())
    }

    /// Length in bytes of this instruction, derived from the operand count
    /// bits of its opcode.
    pub fn byte_len(&self) -> usize {
        self.layout().instruction_len()
    }

    pub fn operands(&self) -> Operands {
        match *self {
            Self::Nop | Self::Hlt | Self::Ret => Operands::N,
            Self::Ldi(a, i) => Operands::AI(a, i),
            Self::Ld(a, b)
            | Self::St(a, b)
            | Self::Add(a, b)
            | Self::Sub(a, b)
            | Self::Mul(a, b)
            | Self::Div(a, b)
            | Self::Mod(a, b)
            | Self::Cmp(a, b)
            | Self::And(a, b)
            | Self::Or(a, b)
            | Self::Xor(a, b)
            | Self::Shl(a, b)
            | Self::Shr(a, b) => Operands::AB(a, b),
            Self::Push(a)
            | Self::Pop(a)
            | Self::Prn(a)
            | Self::Inc(a)
            | Self::Dec(a)
            | Self::Not(a)
            | Self::Call(a)
            | Self::Jmp(a)
            | Self::Jeq(a)
            | Self::Jne(a)
            | Self::Jgt(a)
            | Self::Jlt(a)
            | Self::Jle(a)
            | Self::Jge(a) => Operands::A(a),
        }
    }

    /// Appends the encoded bytes of this instruction to `stream`.
    pub fn encode_into(&self, stream: &mut Vec<Word>) {
        stream.push(self.opcode());
        match self.operands() {
            Operands::N => {}
            Operands::A(a) => stream.push(a),
            Operands::AB(a, b) => stream.extend([a, b]),
            Operands::AI(a, i) => stream.extend([a, i]),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())?;
        match self.operands() {
            Operands::N => Ok(()),
            Operands::A(a) => write!(f, " R{}", a),
            Operands::AB(a, b) => write!(f, " R{}, R{}", a, b),
            Operands::AI(a, i) => write!(f, " R{}, {}", a, i),
        }
    }
}

fn register(operand: Word) -> Result<Register, DecodeError> {
    if (operand as usize) < REGISTER_COUNT {
        Ok(operand)
    } else {
        Err(DecodeError::InvalidRegister(operand))
    }
}
