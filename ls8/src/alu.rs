// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::{cmp::Ordering, fmt, ops::BitOr};

use num_traits::{
    CheckedShl, CheckedShr, PrimInt, WrappingAdd, WrappingMul, WrappingSub,
};
use thiserror::Error;

use crate::arch::Word;

/// The closed set of operations the ALU performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Cmp,
    And,
    Not,
    Or,
    Xor,
    Shl,
    Shr,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AluError {
    #[error("division by zero")]
    DivideByZero,
}

/// The flag register, laid out as `00000LGE`. At most one flag is set at a
/// time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(Word);

impl Flags {
    pub const NONE: Self = Self(0);
    pub const EQUAL: Self = Self(1 << 0);
    pub const GREATER: Self = Self(1 << 1);
    pub const LESS: Self = Self(1 << 2);

    /// The flags `CMP` produces for `a` compared against `b`.
    pub fn comparing<W: Ord>(a: W, b: W) -> Self {
        match a.cmp(&b) {
            Ordering::Less => Self::LESS,
            Ordering::Equal => Self::EQUAL,
            Ordering::Greater => Self::GREATER,
        }
    }

    #[cfg(test)]
    pub(crate) const fn bits(self) -> Word {
        self.0
    }

    /// Whether any flag in `other` is set in `self`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: Flags, c: char| {
            if self.intersects(set) {
                c
            } else {
                '-'
            }
        };
        write!(
            f,
            "{}{}{}",
            flag(Self::LESS, 'L'),
            flag(Self::GREATER, 'G'),
            flag(Self::EQUAL, 'E')
        )
    }
}

/// Where the result of an ALU operation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOutput<W> {
    /// Written back to the first operand's register.
    Store(W),
    /// Written to the flag register.
    Compare(Flags),
}

/// Computes `op` on the register values `a` and `b`. Arithmetic wraps at
/// the width of `W`; shifts by `W`'s width or more produce zero.
pub fn compute<W>(op: AluOp, a: W, b: W) -> Result<AluOutput<W>, AluError>
where
    W: PrimInt
        + WrappingAdd
        + WrappingSub
        + WrappingMul
        + CheckedShl
        + CheckedShr,
{
    let result = match op {
        AluOp::Add => a.wrapping_add(&b),
        AluOp::Sub => a.wrapping_sub(&b),
        AluOp::Mul => a.wrapping_mul(&b),
        AluOp::Div => a.checked_div(&b).ok_or(AluError::DivideByZero)?,
        AluOp::Mod => {
            if b.is_zero() {
                return Err(AluError::DivideByZero);
            }
            a % b
        }
        AluOp::Inc => a.wrapping_add(&W::one()),
        AluOp::Dec => a.wrapping_sub(&W::one()),
        AluOp::Cmp => return Ok(AluOutput::Compare(Flags::comparing(a, b))),
        AluOp::And => a & b,
        AluOp::Not => !a,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Shl => b
            .to_u32()
            .and_then(|amount| a.checked_shl(amount))
            .unwrap_or_else(W::zero),
        AluOp::Shr => b
            .to_u32()
            .and_then(|amount| a.checked_shr(amount))
            .unwrap_or_else(W::zero),
    };
    Ok(AluOutput::Store(result))
}

#[cfg(test)]
mod tests {
    use paste::paste;
    use proptest::prelude::*;

    use crate::{
        alu::{compute, AluError, AluOp, AluOutput, Flags},
        arch::Word,
    };

    macro_rules! matches_formula {
        ($($op:ident: |$a:ident, $b:ident| $formula:expr),* $(,)?) => {
            paste! {
                proptest! {
                    $(
                        #[test]
                        fn [<$op:lower _matches_formula>]($a in any::<Word>(), $b in any::<Word>()) {
                            let expected = ($formula) as Word;
                            prop_assert_eq!(
                                Ok(AluOutput::Store(expected)),
                                compute(AluOp::$op, $a, $b)
                            );
                        }
                    )*
                }
            }
        };
    }

    matches_formula! {
        Add: |a, b| (a as u32 + b as u32) % 256,
        Sub: |a, b| (256 + a as u32 - b as u32) % 256,
        Mul: |a, b| (a as u32 * b as u32) % 256,
        And: |a, b| a & b,
        Or: |a, b| a | b,
        Xor: |a, b| a ^ b,
        Not: |a, b| { let _ = b; !a },
        Inc: |a, b| { let _ = b; (a as u32 + 1) % 256 },
        Dec: |a, b| { let _ = b; (a as u32 + 255) % 256 },
        Shl: |a, b| if b >= 8 { 0 } else { ((a as u32) << b) & 0xFF },
        Shr: |a, b| if b >= 8 { 0 } else { (a as u32) >> b },
    }

    proptest! {
        #[test]
        fn division_by_nonzero(a in any::<Word>(), b in 1..=Word::MAX) {
            prop_assert_eq!(
                Ok(AluOutput::Store(a / b)),
                compute(AluOp::Div, a, b)
            );
            prop_assert_eq!(
                Ok(AluOutput::Store(a % b)),
                compute(AluOp::Mod, a, b)
            );
        }

        #[test]
        fn compare_sets_exactly_one_flag(
            a in any::<Word>(),
            b in any::<Word>(),
        ) {
            let Ok(AluOutput::Compare(flags)) = compute(AluOp::Cmp, a, b) else {
                panic!("CMP should only touch the flags");
            };
            prop_assert_eq!(1, flags.bits().count_ones());
            prop_assert_eq!(a == b, flags == Flags::EQUAL);
            prop_assert_eq!(a < b, flags == Flags::LESS);
            prop_assert_eq!(a > b, flags == Flags::GREATER);
        }
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(
            Err(AluError::DivideByZero),
            compute::<Word>(AluOp::Div, 7, 0)
        );
        assert_eq!(
            Err(AluError::DivideByZero),
            compute::<Word>(AluOp::Mod, 7, 0)
        );
    }

    #[test]
    fn shifts_go_the_named_direction() {
        let shift = |op, a: Word, b: Word| compute(op, a, b);
        assert_eq!(
            Ok(AluOutput::Store(0b0000_0100)),
            shift(AluOp::Shl, 0b0000_0001, 2)
        );
        assert_eq!(
            Ok(AluOutput::Store(0b0010_0000)),
            shift(AluOp::Shr, 0b1000_0000, 2)
        );
        assert_eq!(
            Ok(AluOutput::Store(0b1000_0000)),
            shift(AluOp::Shl, 0b1100_0001, 7)
        );
    }

    #[test]
    fn flags_display() {
        assert_eq!("--E", Flags::EQUAL.to_string());
        assert_eq!("L--", Flags::LESS.to_string());
        assert_eq!("---", Flags::NONE.to_string());
        assert!((Flags::GREATER | Flags::EQUAL).intersects(Flags::EQUAL));
    }
}
