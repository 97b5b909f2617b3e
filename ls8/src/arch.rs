// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use static_assertions::const_assert;

/// The width of every register and memory cell.
pub type Word = u8;
/// An index into memory. Wider than [`Word`] so that reads past the end of
/// memory can be reported instead of wrapping.
pub type Address = usize;
/// An index into the register file.
pub type Register = u8;

pub const WORD_BITS: usize = 8;
const_assert!(WORD_BITS <= Word::BITS as usize);

pub const MEMORY_SIZE: usize = 256;
const_assert!(MEMORY_SIZE <= 1usize << WORD_BITS);

pub const REGISTER_COUNT: usize = 8;

/// R7 holds the address of the top of the descending stack.
pub const STACK_POINTER: Register = 7;
const_assert!((STACK_POINTER as usize) < REGISTER_COUNT);

/// Initial stack pointer. Addresses above it are reserved.
pub const STACK_TOP: Word = 0xF4;
const_assert!((STACK_TOP as usize) < MEMORY_SIZE);

/// Every instruction is fetched as the opcode plus this many following
/// bytes, whether or not it uses them.
pub const FETCH_WINDOW: usize = 3;
