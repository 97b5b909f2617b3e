// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

//! Reads LS-8 programs written as one binary byte per line.
//!
//! ```text
//! # print 8
//! 10000010 # LDI R0, 8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::{fs, io, path::{Path, PathBuf}};

use thiserror::Error;

use crate::arch::{Word, MEMORY_SIZE};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("invalid number on line {line}: {text}")]
    InvalidNumber { line: usize, text: String },
    #[error("program was empty")]
    Empty,
    #[error("program of {0} bytes does not fit in memory")]
    TooLarge(usize),
}

impl LoadError {
    /// The process exit status reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidNumber { .. } | Self::TooLarge(_) => 1,
            Self::Open { .. } => 2,
            Self::Empty => 3,
        }
    }
}

/// Parses program text into a memory image. Everything after a `#` is a
/// comment and may hold any bytes; blank lines are skipped.
pub fn parse_program(
    source: impl AsRef<[u8]>,
) -> Result<Vec<Word>, LoadError> {
    let lines = source.as_ref().split(|&byte| byte == b'\n');
    let mut image = vec![];
    for (index, line) in lines.enumerate() {
        let code = line.split(|&byte| byte == b'#').next().unwrap_or_default();
        let code = String::from_utf8_lossy(code);
        let text = code.trim();
        if text.is_empty() {
            continue;
        }
        let byte = Word::from_str_radix(text, 2).map_err(|_| {
            LoadError::InvalidNumber {
                line: index + 1,
                text: text.to_owned(),
            }
        })?;
        image.push(byte);
    }

    if image.is_empty() {
        Err(LoadError::Empty)
    } else if image.len() > MEMORY_SIZE {
        Err(LoadError::TooLarge(image.len()))
    } else {
        Ok(image)
    }
}

pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Word>, LoadError> {
    let path = path.as_ref();
    let source = fs::read(path).map_err(|source| LoadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let image = parse_program(source)?;
    log::info!("loaded {} bytes from {}", image.len(), path.display());
    Ok(image)
}
