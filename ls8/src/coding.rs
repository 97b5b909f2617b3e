// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use crate::arch::Word;

/// Iteratively constructs a bitset of a given type from bit fields, least
/// significant field first.
#[macro_export]
macro_rules! encode {
    (
        $T:ty;
        $([..$($width:literal)?$($width2:ident)?..] = $int:expr),*
    ) => {
        {
            let mut offset: u32 = 0;
            let mut result: $T = 0;
            $(
                let encoded_int: $T = $int.encode_as_word();
                let width: u32 = $($width)* $($width2)*;
                let mask: $T = (1 as $T).checked_shl(width).unwrap_or(0).wrapping_sub(1);
                result |= ((encoded_int & mask) << offset);
                offset += width;
            )*
            let _ = offset;
            result
        }
    };
}

/// Traits for types that can be packed into a bit field of a [`Word`].
pub trait CodeAsWord {
    /// Encodes `self` into a `Word`. Higher bits are chopped off when the
    /// slot is narrower than the value.
    fn encode_as_word(&self) -> Word;

    /// Decodes `self` from the least significant bits of `encoded`.
    fn decode_from_word(encoded: Word) -> Self;
}

impl CodeAsWord for Word {
    fn encode_as_word(&self) -> Word {
        *self
    }

    fn decode_from_word(encoded: Word) -> Self {
        encoded
    }
}

impl CodeAsWord for bool {
    fn encode_as_word(&self) -> Word {
        *self as Word
    }

    fn decode_from_word(encoded: Word) -> Self {
        encoded != 0
    }
}

/// Deconstructs a bitset of a given type into bitfields of given types,
/// least significant field first.
#[macro_export]
macro_rules! decode {
    (
        $encoded:expr; $TEnc:ty;
        @($($out:ident: $T:ty =
            [..$($width:literal)?$($width2:ident)?..]),*)
        => $block:expr
    ) => {{
        let mut __offset: u32 = 0;
        $(
            let field_width: u32 = $($width)*$($width2)*;
            let mask = (1 as $TEnc).checked_shl(field_width).unwrap_or(0).wrapping_sub(1);
            let unsigned_out = ($encoded >> __offset) & mask;
            let $out = <$T>::decode_from_word(unsigned_out);
            __offset += field_width;
        )*
        let _ = __offset;
        $block
    }};
}
