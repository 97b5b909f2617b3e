// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use crate::{
    arch::{Address, Word},
    op::{DecodeError, Op},
};

/// Assembles `program` into a memory image starting at address 0.
pub fn encode_program(program: &[Op]) -> Vec<Word> {
    let mut image = vec![];
    for op in program {
        op.encode_into(&mut image);
    }
    image
}

/// Linearly disassembles `image`, pairing every instruction with its
/// address. Operand bytes past the end of `image` read as zero.
pub fn decode_program(
    image: &[Word],
) -> Result<Vec<(Address, Op)>, (Address, DecodeError)> {
    let byte_at = |address: Address| image.get(address).copied().unwrap_or(0);

    let mut program = vec![];
    let mut address = 0;
    while address < image.len() {
        let op = Op::decode(
            byte_at(address),
            byte_at(address + 1),
            byte_at(address + 2),
        )
        .map_err(|error| (address, error))?;
        program.push((address, op));
        address += op.byte_len();
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use crate::{
        op::{DecodeError, Op},
        program::{decode_program, encode_program},
    };

    #[test]
    fn disassembles_with_addresses() {
        let image = encode_program(&[
            Op::Ldi(0, 8),
            Op::Ldi(1, 9),
            Op::Mul(0, 1),
            Op::Prn(0),
            Op::Hlt,
        ]);
        assert_eq!(
            vec![
                0b10000010, 0, 8, 0b10000010, 1, 9, 0b10100010, 0, 1,
                0b01000111, 0, 0b00000001,
            ],
            image
        );
        assert_eq!(
            Ok(vec![
                (0, Op::Ldi(0, 8)),
                (3, Op::Ldi(1, 9)),
                (6, Op::Mul(0, 1)),
                (9, Op::Prn(0)),
                (11, Op::Hlt),
            ]),
            decode_program(&image)
        );
    }

    #[test]
    fn reports_address_of_bad_opcode() {
        assert_eq!(
            Err((1, DecodeError::UnknownOpcode(0b11110000))),
            decode_program(&[0b00000000, 0b11110000])
        );
    }
}
