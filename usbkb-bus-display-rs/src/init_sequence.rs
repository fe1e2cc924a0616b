//! Table-driven controller init sequences.
//!
//! A sequence is a flat byte table where every entry is laid out as
//!
//! ```text
//! [opcode] [arg_count] [arg bytes × arg_count] ([delay_ms] if arg_count & 0x80)
//! ```
//!
//! Per-panel differences (contrast, mux ratio, oscillator divide, charge
//! pump) are therefore pure data: one driver serves every panel that only
//! differs in these bytes.
//!
//! Bit 7 of `arg_count` is the delay flag. When set, the low 7 bits are the
//! argument count and one trailing byte holds the post-command delay in
//! milliseconds (`255` means 500 ms). Entries without the flag are followed
//! by a [`DEFAULT_COMMAND_DELAY_MS`] settle delay.

use crate::error::ConfigError;

/// Flag bit in the length byte marking a trailing delay byte.
pub const DELAY_FLAG: u8 = 0x80;

/// Settle delay after an entry without an explicit delay.
pub const DEFAULT_COMMAND_DELAY_MS: u16 = 10;

/// Delay byte value that stands for the long delay.
const LONG_DELAY_MARKER: u8 = 0xFF;

/// Milliseconds represented by [`LONG_DELAY_MARKER`].
const LONG_DELAY_MS: u16 = 500;

/// One decoded init sequence entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitCommand<'a> {
    /// Controller opcode.
    pub opcode: u8,
    /// Argument bytes, in wire order.
    pub args: &'a [u8],
    /// Delay to wait after the command has been sent.
    pub delay_ms: u16,
}

/// A validated, immutable init sequence.
///
/// Construction walks the whole table once, so iterating a sequence can
/// never read past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitSequence<'a> {
    bytes: &'a [u8],
    len: usize,
}

impl<'a> InitSequence<'a> {
    /// Validate `bytes` as an init sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InitSequenceOverrun`] for the first entry whose
    /// declared arguments (or delay byte) run past the end of the table. An
    /// opcode with no length byte after it is an overrun too.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ConfigError> {
        let mut offset = 0;
        let mut len = 0;

        while offset < bytes.len() {
            let needed = match bytes.get(offset + 1) {
                Some(&count) => entry_size(count),
                None => 2,
            };
            if offset + needed > bytes.len() {
                return Err(ConfigError::InitSequenceOverrun {
                    offset,
                    needed,
                    len: bytes.len(),
                });
            }
            offset += needed;
            len += 1;
        }

        Ok(Self { bytes, len })
    }

    /// Number of commands in the sequence.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the sequence holds no commands.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The raw table.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterate the commands in table order.
    pub fn iter(&self) -> InitCommands<'a> {
        InitCommands {
            bytes: self.bytes,
            offset: 0,
        }
    }
}

impl<'a> IntoIterator for &InitSequence<'a> {
    type Item = InitCommand<'a>;
    type IntoIter = InitCommands<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of an [`InitSequence`].
pub struct InitCommands<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for InitCommands<'a> {
    type Item = InitCommand<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.bytes.get(self.offset..)?;
        let (&opcode, rest) = entry.split_first()?;
        let (&count, rest) = rest.split_first()?;

        let arg_count = (count & !DELAY_FLAG) as usize;
        let args = rest.get(..arg_count)?;
        let delay_ms = if count & DELAY_FLAG != 0 {
            match *rest.get(arg_count)? {
                LONG_DELAY_MARKER => LONG_DELAY_MS,
                ms => ms as u16,
            }
        } else {
            DEFAULT_COMMAND_DELAY_MS
        };

        self.offset += entry_size(count);
        Some(InitCommand {
            opcode,
            args,
            delay_ms,
        })
    }
}

/// Total bytes taken by an entry with length byte `count`.
fn entry_size(count: u8) -> usize {
    let delay_byte = usize::from(count & DELAY_FLAG != 0);
    2 + (count & !DELAY_FLAG) as usize + delay_byte
}
