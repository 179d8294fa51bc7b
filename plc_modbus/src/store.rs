//! Register stores: what a Modbus request is served from.
//!
//! - [`DirectStore`]: the live process image.
//! - [`MirroredStore`]: a protocol-side copy refreshed by [`MirroredStore::sync`].
//!   Reads come from the copy; writes go to the live image first, then the copy.

use std::sync::Arc;

use plc_common::config::ModbusBacking;
use plc_common::image::{Bank, MemoryError, ProcessImage};

/// Memory surface the Modbus service talks to.
pub trait RegisterStore: Send + Sync {
    /// Which backing this store implements.
    fn backing(&self) -> ModbusBacking;

    /// Read `count` bits from a binary bank.
    fn read_bits(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<bool>, MemoryError>;

    /// Read `count` words from an integer bank.
    fn read_words(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<u16>, MemoryError>;

    /// Write a contiguous run of bits. All-or-nothing.
    fn write_bits(&self, bank: Bank, address: usize, values: &[bool]) -> Result<(), MemoryError>;

    /// Write a contiguous run of words. All-or-nothing.
    fn write_words(&self, bank: Bank, address: usize, values: &[u16]) -> Result<(), MemoryError>;

    /// Modbus mask write on one holding register:
    /// `(current & and) | (or & !and)`. Returns the stored value.
    fn mask_write(&self, address: usize, and_mask: u16, or_mask: u16) -> Result<u16, MemoryError>;

    /// Modbus read/write multiple on the holding registers: write `values`
    /// at `write_address`, then read back `read_count` words from
    /// `read_address`. One atomic step; a bad range on either side writes
    /// nothing.
    fn read_write_words(
        &self,
        read_address: usize,
        read_count: usize,
        write_address: usize,
        values: &[u16],
    ) -> Result<Vec<u16>, MemoryError>;
}

#[inline]
fn apply_mask(current: u16, and_mask: u16, or_mask: u16) -> u16 {
    (current & and_mask) | (or_mask & !and_mask)
}

// ─── DirectStore ────────────────────────────────────────────────────

/// Serves requests straight from the live image.
#[derive(Debug, Clone)]
pub struct DirectStore {
    image: Arc<ProcessImage>,
}

impl DirectStore {
    pub fn new(image: Arc<ProcessImage>) -> Self {
        Self { image }
    }
}

impl RegisterStore for DirectStore {
    fn backing(&self) -> ModbusBacking {
        ModbusBacking::Direct
    }

    fn read_bits(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<bool>, MemoryError> {
        self.image.read_bits(bank, address, count)
    }

    fn read_words(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<u16>, MemoryError> {
        self.image.read_words(bank, address, count)
    }

    fn write_bits(&self, bank: Bank, address: usize, values: &[bool]) -> Result<(), MemoryError> {
        self.image.write_bits(bank, address, values)
    }

    fn write_words(&self, bank: Bank, address: usize, values: &[u16]) -> Result<(), MemoryError> {
        self.image.write_words(bank, address, values)
    }

    fn mask_write(&self, address: usize, and_mask: u16, or_mask: u16) -> Result<u16, MemoryError> {
        self.image
            .update_word(Bank::IntegerOutputs, address, |v| apply_mask(v, and_mask, or_mask))
    }

    fn read_write_words(
        &self,
        read_address: usize,
        read_count: usize,
        write_address: usize,
        values: &[u16],
    ) -> Result<Vec<u16>, MemoryError> {
        self.image.read_write_words(
            Bank::IntegerOutputs,
            read_address,
            read_count,
            write_address,
            values,
        )
    }
}

// ─── MirroredStore ──────────────────────────────────────────────────

/// Serves reads from a copy of the live image.
///
/// The copy is stale by at most one mirror period. Writes land in the live
/// image first so the next scan tick consumes them.
#[derive(Debug)]
pub struct MirroredStore {
    live: Arc<ProcessImage>,
    mirror: ProcessImage,
}

impl MirroredStore {
    /// Create a mirror with the live image's shape, initially in sync.
    pub fn new(live: Arc<ProcessImage>) -> Self {
        let mirror = ProcessImage::new(live.sizes());
        let store = Self { live, mirror };
        store.sync_or_log();
        store
    }

    /// Copy the whole live image into the mirror.
    pub fn sync(&self) -> Result<(), MemoryError> {
        self.mirror.load_snapshot(&self.live.snapshot())
    }

    fn sync_or_log(&self) {
        if let Err(e) = self.sync() {
            tracing::error!("Modbus mirror sync failed: {e}");
        }
    }
}

impl RegisterStore for MirroredStore {
    fn backing(&self) -> ModbusBacking {
        ModbusBacking::Mirrored
    }

    fn read_bits(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<bool>, MemoryError> {
        self.mirror.read_bits(bank, address, count)
    }

    fn read_words(
        &self,
        bank: Bank,
        address: usize,
        count: usize,
    ) -> Result<Vec<u16>, MemoryError> {
        self.mirror.read_words(bank, address, count)
    }

    fn write_bits(&self, bank: Bank, address: usize, values: &[bool]) -> Result<(), MemoryError> {
        self.live.write_bits(bank, address, values)?;
        self.mirror.write_bits(bank, address, values)
    }

    fn write_words(&self, bank: Bank, address: usize, values: &[u16]) -> Result<(), MemoryError> {
        self.live.write_words(bank, address, values)?;
        self.mirror.write_words(bank, address, values)
    }

    fn mask_write(&self, address: usize, and_mask: u16, or_mask: u16) -> Result<u16, MemoryError> {
        let stored = self
            .live
            .update_word(Bank::IntegerOutputs, address, |v| apply_mask(v, and_mask, or_mask))?;
        self.mirror
            .write_word(Bank::IntegerOutputs, address, i64::from(stored))?;
        Ok(stored)
    }

    /// The read-back comes from the live image, taken under the same lock
    /// as the write.
    fn read_write_words(
        &self,
        read_address: usize,
        read_count: usize,
        write_address: usize,
        values: &[u16],
    ) -> Result<Vec<u16>, MemoryError> {
        let words = self.live.read_write_words(
            Bank::IntegerOutputs,
            read_address,
            read_count,
            write_address,
            values,
        )?;
        self.mirror
            .write_words(Bank::IntegerOutputs, write_address, values)?;
        Ok(words)
    }
}

/// Build the store selected by configuration.
///
/// The mirrored variant is also returned separately so the caller can drive
/// its refresh task.
pub fn build_store(
    backing: ModbusBacking,
    image: Arc<ProcessImage>,
) -> (Arc<dyn RegisterStore>, Option<Arc<MirroredStore>>) {
    match backing {
        ModbusBacking::Direct => {
            let direct: Arc<dyn RegisterStore> = Arc::new(DirectStore::new(image));
            (direct, None)
        }
        ModbusBacking::Mirrored => {
            let mirrored = Arc::new(MirroredStore::new(image));
            let store: Arc<dyn RegisterStore> = mirrored.clone();
            (store, Some(mirrored))
        }
    }
}
