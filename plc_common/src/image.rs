//! Process image: the four register banks shared by the scan engine, the
//! protocol server and the supervisory interface.
//!
//! Each bank sits behind its own `parking_lot::Mutex`; the controller state
//! behind a fifth. Every multi-lock acquisition follows the fixed order
//!
//! ```text
//! BinaryInputs → BinaryOutputs → IntegerInputs → IntegerOutputs → Controller
//! ```
//!
//! Critical sections are short copies or updates; none of them spans I/O or
//! a sleep.

mod bank;
mod snapshot;

pub use bank::{Bank, MemoryError, PointKind, PointValue, RegisterBank, clamp_word};
pub use snapshot::{ControllerState, ImageSnapshot};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BANK_LEN;
use crate::io::IoRole;

/// Fixed bank lengths, chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BankSizes {
    /// Discrete input count.
    pub binary_inputs: usize,
    /// Coil count.
    pub binary_outputs: usize,
    /// Input register count.
    pub integer_inputs: usize,
    /// Holding register count.
    pub integer_outputs: usize,
}

impl BankSizes {
    /// Same length for every bank.
    pub const fn uniform(len: usize) -> Self {
        Self {
            binary_inputs: len,
            binary_outputs: len,
            integer_inputs: len,
            integer_outputs: len,
        }
    }

    /// Length of one bank.
    pub const fn get(&self, bank: Bank) -> usize {
        match bank {
            Bank::BinaryInputs => self.binary_inputs,
            Bank::BinaryOutputs => self.binary_outputs,
            Bank::IntegerInputs => self.integer_inputs,
            Bank::IntegerOutputs => self.integer_outputs,
        }
    }
}

impl Default for BankSizes {
    fn default() -> Self {
        Self::uniform(DEFAULT_BANK_LEN)
    }
}

/// Shared memory model.
pub struct ProcessImage {
    binary_inputs: Mutex<RegisterBank<bool>>,
    binary_outputs: Mutex<RegisterBank<bool>>,
    integer_inputs: Mutex<RegisterBank<u16>>,
    integer_outputs: Mutex<RegisterBank<u16>>,
    controller: Mutex<ControllerState>,
    sizes: BankSizes,
}

impl ProcessImage {
    /// Create a zeroed image with the given bank lengths.
    pub fn new(sizes: BankSizes) -> Self {
        Self {
            binary_inputs: Mutex::new(RegisterBank::new(Bank::BinaryInputs, sizes.binary_inputs)),
            binary_outputs: Mutex::new(RegisterBank::new(
                Bank::BinaryOutputs,
                sizes.binary_outputs,
            )),
            integer_inputs: Mutex::new(RegisterBank::new(
                Bank::IntegerInputs,
                sizes.integer_inputs,
            )),
            integer_outputs: Mutex::new(RegisterBank::new(
                Bank::IntegerOutputs,
                sizes.integer_outputs,
            )),
            controller: Mutex::new(ControllerState::default()),
            sizes,
        }
    }

    /// Fixed lengths of every bank.
    pub fn sizes(&self) -> BankSizes {
        self.sizes
    }

    /// Fixed length of one bank.
    pub fn len(&self, bank: Bank) -> usize {
        self.sizes.get(bank)
    }

    fn bits(&self, bank: Bank) -> Result<&Mutex<RegisterBank<bool>>, MemoryError> {
        match bank {
            Bank::BinaryInputs => Ok(&self.binary_inputs),
            Bank::BinaryOutputs => Ok(&self.binary_outputs),
            _ => Err(MemoryError::KindMismatch {
                bank,
                expected: bank.kind(),
                actual: PointKind::Bit,
            }),
        }
    }

    fn words(&self, bank: Bank) -> Result<&Mutex<RegisterBank<u16>>, MemoryError> {
        match bank {
            Bank::IntegerInputs => Ok(&self.integer_inputs),
            Bank::IntegerOutputs => Ok(&self.integer_outputs),
            _ => Err(MemoryError::KindMismatch {
                bank,
                expected: bank.kind(),
                actual: PointKind::Word,
            }),
        }
    }

    // ── Single-point access ──

    /// Read one point of any bank.
    pub fn read(&self, bank: Bank, address: usize) -> Result<PointValue, MemoryError> {
        match bank.kind() {
            PointKind::Bit => self.read_bit(bank, address).map(PointValue::Bit),
            PointKind::Word => self
                .read_word(bank, address)
                .map(|v| PointValue::Word(v as i64)),
        }
    }

    /// Write one point of any bank and return the value actually stored.
    ///
    /// Integer values are clamped into `[0, 65535]`. Out-of-range addresses
    /// leave the bank unchanged.
    pub fn write(
        &self,
        bank: Bank,
        address: usize,
        value: PointValue,
    ) -> Result<PointValue, MemoryError> {
        match value {
            PointValue::Bit(v) => self.write_bit(bank, address, v).map(|_| PointValue::Bit(v)),
            PointValue::Word(v) => self
                .write_word(bank, address, v)
                .map(|stored| PointValue::Word(stored as i64)),
        }
    }

    /// Read one bit.
    pub fn read_bit(&self, bank: Bank, address: usize) -> Result<bool, MemoryError> {
        self.bits(bank)?.lock().get(address)
    }

    /// Write one bit.
    pub fn write_bit(&self, bank: Bank, address: usize, value: bool) -> Result<(), MemoryError> {
        self.bits(bank)?.lock().set(address, value)
    }

    /// Read one word.
    pub fn read_word(&self, bank: Bank, address: usize) -> Result<u16, MemoryError> {
        self.words(bank)?.lock().get(address)
    }

    /// Write one word, clamping into the register range. Returns the stored value.
    pub fn write_word(&self, bank: Bank, address: usize, value: i64) -> Result<u16, MemoryError> {
        let stored = clamp_word(value);
        self.words(bank)?.lock().set(address, stored)?;
        Ok(stored)
    }

    // ── Range access ──

    /// Read `count` bits starting at `address`.
    pub fn read_bits(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<bool>, MemoryError> {
        self.bits(bank)?.lock().read_range(address, count)
    }

    /// Read `count` words starting at `address`.
    pub fn read_words(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<u16>, MemoryError> {
        self.words(bank)?.lock().read_range(address, count)
    }

    /// Write contiguous bits under one lock.
    pub fn write_bits(
        &self,
        bank: Bank,
        address: usize,
        values: &[bool],
    ) -> Result<(), MemoryError> {
        self.bits(bank)?.lock().write_range(address, values)
    }

    /// Write contiguous words under one lock.
    pub fn write_words(
        &self,
        bank: Bank,
        address: usize,
        values: &[u16],
    ) -> Result<(), MemoryError> {
        self.words(bank)?.lock().write_range(address, values)
    }

    /// Write `values` at `write_address`, then read `read_count` words from
    /// `read_address`, all under one lock.
    ///
    /// Both ranges are checked before the write, so a bad read range leaves
    /// the bank unchanged.
    pub fn read_write_words(
        &self,
        bank: Bank,
        read_address: usize,
        read_count: usize,
        write_address: usize,
        values: &[u16],
    ) -> Result<Vec<u16>, MemoryError> {
        let mut guard = self.words(bank)?.lock();
        guard.check_range(read_address, read_count)?;
        guard.write_range(write_address, values)?;
        guard.read_range(read_address, read_count)
    }

    // ── Read-modify-write ──

    /// Flip one bit and return the new value. The lock is held across the
    /// read and the write.
    pub fn toggle_bit(&self, bank: Bank, address: usize) -> Result<bool, MemoryError> {
        let mut guard = self.bits(bank)?.lock();
        let next = !guard.get(address)?;
        guard.set(address, next)?;
        Ok(next)
    }

    /// Replace one word with `f(current)` under a single lock and return the
    /// new value.
    pub fn update_word<F>(&self, bank: Bank, address: usize, f: F) -> Result<u16, MemoryError>
    where
        F: FnOnce(u16) -> u16,
    {
        let mut guard = self.words(bank)?.lock();
        let next = f(guard.get(address)?);
        guard.set(address, next)?;
        Ok(next)
    }

    // ── Whole-image access ──

    /// Copy of the engine-owned controller state.
    pub fn controller_state(&self) -> ControllerState {
        *self.controller.lock()
    }

    /// Consistent copy of every bank and the controller state.
    pub fn snapshot(&self) -> ImageSnapshot {
        let guard = self.lock_all();
        ImageSnapshot {
            binary_inputs: guard.binary_inputs.as_slice().to_vec(),
            binary_outputs: guard.binary_outputs.as_slice().to_vec(),
            integer_inputs: guard.integer_inputs.as_slice().to_vec(),
            integer_outputs: guard.integer_outputs.as_slice().to_vec(),
            controller: *guard.controller,
        }
    }

    /// Overwrite the whole image from a snapshot of the same shape.
    ///
    /// Shapes are checked for every bank before anything is written.
    pub fn load_snapshot(&self, snapshot: &ImageSnapshot) -> Result<(), MemoryError> {
        for bank in Bank::ALL {
            if snapshot.len(bank) != self.len(bank) {
                return Err(MemoryError::ShapeMismatch {
                    bank,
                    expected: self.len(bank),
                    actual: snapshot.len(bank),
                });
            }
        }
        let mut guard = self.lock_all();
        guard.binary_inputs.load(&snapshot.binary_inputs)?;
        guard.binary_outputs.load(&snapshot.binary_outputs)?;
        guard.integer_inputs.load(&snapshot.integer_inputs)?;
        guard.integer_outputs.load(&snapshot.integer_outputs)?;
        *guard.controller = snapshot.controller;
        Ok(())
    }

    /// Acquire every lock in the fixed order.
    ///
    /// The scan engine holds this guard for the body of one tick, which makes
    /// the tick atomic to every other reader and writer.
    pub fn lock_all(&self) -> ImageGuard<'_> {
        let binary_inputs = self.binary_inputs.lock();
        let binary_outputs = self.binary_outputs.lock();
        let integer_inputs = self.integer_inputs.lock();
        let integer_outputs = self.integer_outputs.lock();
        let controller = self.controller.lock();
        ImageGuard {
            binary_inputs,
            binary_outputs,
            integer_inputs,
            integer_outputs,
            controller,
        }
    }
}

impl Default for ProcessImage {
    fn default() -> Self {
        Self::new(BankSizes::default())
    }
}

impl std::fmt::Debug for ProcessImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessImage").field("sizes", &self.sizes).finish()
    }
}

/// Exclusive access to the whole image for the lifetime of the guard.
pub struct ImageGuard<'a> {
    binary_inputs: MutexGuard<'a, RegisterBank<bool>>,
    binary_outputs: MutexGuard<'a, RegisterBank<bool>>,
    integer_inputs: MutexGuard<'a, RegisterBank<u16>>,
    integer_outputs: MutexGuard<'a, RegisterBank<u16>>,
    controller: MutexGuard<'a, ControllerState>,
}

impl ImageGuard<'_> {
    fn bits_mut(&mut self, bank: Bank) -> Result<&mut RegisterBank<bool>, MemoryError> {
        match bank {
            Bank::BinaryInputs => Ok(&mut *self.binary_inputs),
            Bank::BinaryOutputs => Ok(&mut *self.binary_outputs),
            _ => Err(MemoryError::KindMismatch {
                bank,
                expected: bank.kind(),
                actual: PointKind::Bit,
            }),
        }
    }

    fn words_mut(&mut self, bank: Bank) -> Result<&mut RegisterBank<u16>, MemoryError> {
        match bank {
            Bank::IntegerInputs => Ok(&mut *self.integer_inputs),
            Bank::IntegerOutputs => Ok(&mut *self.integer_outputs),
            _ => Err(MemoryError::KindMismatch {
                bank,
                expected: bank.kind(),
                actual: PointKind::Word,
            }),
        }
    }

    /// Read the bit behind a role.
    pub fn bit(&mut self, role: IoRole) -> Result<bool, MemoryError> {
        self.bits_mut(role.bank())?.get(role.address())
    }

    /// Write the bit behind a role.
    pub fn set_bit(&mut self, role: IoRole, value: bool) -> Result<(), MemoryError> {
        self.bits_mut(role.bank())?.set(role.address(), value)
    }

    /// Read the word behind a role.
    pub fn word(&mut self, role: IoRole) -> Result<u16, MemoryError> {
        self.words_mut(role.bank())?.get(role.address())
    }

    /// Write the word behind a role.
    pub fn set_word(&mut self, role: IoRole, value: u16) -> Result<(), MemoryError> {
        self.words_mut(role.bank())?.set(role.address(), value)
    }

    /// Controller state as of the previous tick.
    pub fn controller(&self) -> ControllerState {
        *self.controller
    }

    /// Replace the controller state. Reserved for the rung-evaluation step.
    pub fn set_controller(&mut self, state: ControllerState) {
        *self.controller = state;
    }
}
