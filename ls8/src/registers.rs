// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use crate::arch::{Register, Word, REGISTER_COUNT, STACK_POINTER, STACK_TOP};

/// General-purpose registers R0 through R7. R7 is the stack pointer.
///
/// Register indices are not validated here; the decoder only produces
/// indices below [`REGISTER_COUNT`].
pub struct Registers {
    values: [Word; REGISTER_COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        let mut values = [0; REGISTER_COUNT];
        values[STACK_POINTER as usize] = STACK_TOP;
        Self { values }
    }
}

impl Registers {
    pub fn get(&self, register: Register) -> Word {
        self.values[register as usize]
    }

    pub fn set(&mut self, register: Register, value: Word) {
        self.values[register as usize] = value;
    }

    pub fn stack_pointer(&self) -> Word {
        self.get(STACK_POINTER)
    }

    pub fn set_stack_pointer(&mut self, value: Word) {
        self.set(STACK_POINTER, value);
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.values
    }
}
