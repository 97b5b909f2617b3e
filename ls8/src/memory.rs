// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use crate::{
    arch::{Address, Word, MEMORY_SIZE},
    vm::{VMError, VMResult},
};

/// Flat byte-addressable memory.
pub struct Memory {
    cells: [Word; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            cells: [0; MEMORY_SIZE],
        }
    }
}

impl Memory {
    pub fn read(&self, address: Address) -> Result<Word, VMError> {
        self.peek(address)
            .ok_or(VMError::MemoryOutOfBounds(address))
    }

    pub fn write(&mut self, address: Address, value: Word) -> VMResult {
        let cell = self
            .cells
            .get_mut(address)
            .ok_or(VMError::MemoryOutOfBounds(address))?;
        *cell = value;
        Ok(())
    }

    /// Reads `address` without treating out-of-range addresses as an error.
    pub fn peek(&self, address: Address) -> Option<Word> {
        self.cells.get(address).copied()
    }

    /// Copies `image` to the start of memory.
    pub fn load(&mut self, image: &[Word]) -> VMResult {
        if image.len() > MEMORY_SIZE {
            return Err(VMError::ProgramTooLarge(image.len()));
        }
        self.cells[..image.len()].copy_from_slice(image);
        Ok(())
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use crate::{arch::MEMORY_SIZE, memory::Memory, vm::VMError};

    #[test]
    fn reads_back_writes() {
        let mut memory = Memory::default();
        memory.write(0xF3, 42).expect("address should be in bounds");
        assert_eq!(42, memory.read(0xF3).expect("address should be in bounds"));
        assert_eq!(0, memory.read(0xF4).expect("address should be in bounds"));
    }

    #[test]
    fn rejects_out_of_range_addresses() {
        let mut memory = Memory::default();
        assert!(matches!(
            memory.read(MEMORY_SIZE),
            Err(VMError::MemoryOutOfBounds(MEMORY_SIZE))
        ));
        assert!(matches!(
            memory.write(MEMORY_SIZE + 1, 0),
            Err(VMError::MemoryOutOfBounds(257))
        ));
        assert_eq!(None, memory.peek(MEMORY_SIZE));
    }

    #[test]
    fn loads_image_at_start() {
        let mut memory = Memory::default();
        memory.load(&[1, 2, 3]).expect("image should fit");
        assert_eq!(&[1, 2, 3, 0], &memory.as_slice()[..4]);
    }

    #[test]
    fn rejects_oversized_image() {
        let mut memory = Memory::default();
        assert!(matches!(
            memory.load(&[0; MEMORY_SIZE + 1]),
            Err(VMError::ProgramTooLarge(257))
        ));
    }
}
