//! Register bank types: the four typed banks and their fixed-length storage.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Bank ───────────────────────────────────────────────────────────

/// Bank discriminator.
///
/// Numbering inside every bank is zero-based and matches the Modbus
/// address of the corresponding object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Bank {
    /// Discrete inputs (read-only over Modbus).
    BinaryInputs = 0,
    /// Coils.
    BinaryOutputs = 1,
    /// Input registers (read-only over Modbus).
    IntegerInputs = 2,
    /// Holding registers.
    IntegerOutputs = 3,
}

impl Bank {
    /// All banks in lock order.
    pub const ALL: [Bank; 4] = [
        Bank::BinaryInputs,
        Bank::BinaryOutputs,
        Bank::IntegerInputs,
        Bank::IntegerOutputs,
    ];

    /// Value kind stored in this bank.
    pub const fn kind(self) -> PointKind {
        match self {
            Self::BinaryInputs | Self::BinaryOutputs => PointKind::Bit,
            Self::IntegerInputs | Self::IntegerOutputs => PointKind::Word,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinaryInputs => write!(f, "binary_inputs"),
            Self::BinaryOutputs => write!(f, "binary_outputs"),
            Self::IntegerInputs => write!(f, "integer_inputs"),
            Self::IntegerOutputs => write!(f, "integer_outputs"),
        }
    }
}

impl FromStr for Bank {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary_inputs" | "discrete_inputs" => Ok(Self::BinaryInputs),
            "binary_outputs" | "coils" => Ok(Self::BinaryOutputs),
            "integer_inputs" | "input_registers" => Ok(Self::IntegerInputs),
            "integer_outputs" | "holding_registers" => Ok(Self::IntegerOutputs),
            _ => Err(format!("unknown bank: {s:?}")),
        }
    }
}

/// Width of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// Boolean point.
    Bit,
    /// Unsigned 16-bit point.
    Word,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit => write!(f, "bit"),
            Self::Word => write!(f, "word"),
        }
    }
}

/// Value read from or written to a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    /// Boolean value for binary banks.
    Bit(bool),
    /// Integer value for integer banks. Clamped into `[0, 65535]` on write.
    Word(i64),
}

impl PointValue {
    /// Kind this value addresses.
    pub const fn kind(self) -> PointKind {
        match self {
            Self::Bit(_) => PointKind::Bit,
            Self::Word(_) => PointKind::Word,
        }
    }
}

/// Clamp an integer into the 16-bit register range.
#[inline]
pub fn clamp_word(value: i64) -> u16 {
    value.clamp(0, u16::MAX as i64) as u16
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Rejected memory access. Never fatal; surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address (or the end of an address range) lies outside the bank.
    #[error("address {address} (count {count}) out of range for {bank} (len {len})")]
    OutOfRange {
        /// Addressed bank.
        bank: Bank,
        /// First requested address.
        address: usize,
        /// Number of requested addresses.
        count: usize,
        /// Fixed bank length.
        len: usize,
    },

    /// Value kind does not match the bank kind.
    #[error("{bank} holds {expected} points, got {actual}")]
    KindMismatch {
        /// Addressed bank.
        bank: Bank,
        /// Kind stored by the bank.
        expected: PointKind,
        /// Kind supplied by the caller.
        actual: PointKind,
    },

    /// Snapshot shape differs from the image it is loaded into.
    #[error("snapshot {bank} len {actual} does not match image len {expected}")]
    ShapeMismatch {
        /// Mismatching bank.
        bank: Bank,
        /// Length of the image bank.
        expected: usize,
        /// Length of the snapshot bank.
        actual: usize,
    },
}

// ─── RegisterBank ───────────────────────────────────────────────────

/// Fixed-length, zero-indexed bank storage.
///
/// The length is set once in [`RegisterBank::new`]; there is no resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank<T: Copy + Default> {
    bank: Bank,
    values: Vec<T>,
}

impl<T: Copy + Default> RegisterBank<T> {
    /// Create a bank of `len` default-valued points.
    pub fn new(bank: Bank, len: usize) -> Self {
        Self {
            bank,
            values: vec![T::default(); len],
        }
    }

    /// Bank discriminator.
    pub fn bank(&self) -> Bank {
        self.bank
    }

    /// Fixed length.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a zero-length bank.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reject ranges that do not fit in `[0, len)`.
    #[inline]
    pub fn check_range(&self, address: usize, count: usize) -> Result<(), MemoryError> {
        match address.checked_add(count) {
            Some(end) if end <= self.values.len() && count > 0 => Ok(()),
            _ => Err(MemoryError::OutOfRange {
                bank: self.bank,
                address,
                count,
                len: self.values.len(),
            }),
        }
    }

    /// Read one point.
    pub fn get(&self, address: usize) -> Result<T, MemoryError> {
        self.check_range(address, 1)?;
        Ok(self.values[address])
    }

    /// Write one point.
    pub fn set(&mut self, address: usize, value: T) -> Result<(), MemoryError> {
        self.check_range(address, 1)?;
        self.values[address] = value;
        Ok(())
    }

    /// Copy `count` points starting at `address`.
    pub fn read_range(&self, address: usize, count: usize) -> Result<Vec<T>, MemoryError> {
        self.check_range(address, count)?;
        Ok(self.values[address..address + count].to_vec())
    }

    /// Overwrite a contiguous range. All-or-nothing.
    pub fn write_range(&mut self, address: usize, values: &[T]) -> Result<(), MemoryError> {
        self.check_range(address, values.len())?;
        self.values[address..address + values.len()].copy_from_slice(values);
        Ok(())
    }

    /// All values.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Overwrite every value from a slice of the same length.
    pub fn load(&mut self, values: &[T]) -> Result<(), MemoryError> {
        if values.len() != self.values.len() {
            return Err(MemoryError::ShapeMismatch {
                bank: self.bank,
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }
}
