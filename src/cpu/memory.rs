//! Toy memory subsystem.
//!
//! Memory is a flat array of 16-bit halfwords. The default size covers the
//! full 12-bit address space (4096 cells), but a smaller range can be
//! configured. Unlike the program counter, memory addresses never wrap:
//! every access outside the configured range is an error.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of halfwords addressable with a 12-bit address.
pub const MEMORY_SIZE: usize = 4096;

/// Toy memory: a bounds-checked array of halfwords.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u16>,
}

/// One formatted memory cell, as shown by debug views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRow {
    pub address: usize,
    /// 16-digit zero-padded binary.
    pub binary: String,
    pub unsigned: u16,
    /// Two uppercase hex bytes separated by a space, e.g. `"00 7D"`.
    pub hex: String,
    /// Two's-complement interpretation.
    pub signed: i16,
}

impl MemoryRow {
    fn new(address: usize, value: u16) -> Self {
        Self {
            address,
            binary: format!("{:016b}", value),
            unsigned: value,
            hex: format!("{:02X} {:02X}", value >> 8, value & 0xFF),
            signed: value as i16,
        }
    }
}

impl Memory {
    /// Create a full-size memory with all cells zeroed.
    pub fn new() -> Self {
        Self::with_size(MEMORY_SIZE)
    }

    /// Create a memory covering addresses `0..size`.
    pub fn with_size(size: usize) -> Self {
        Self {
            cells: vec![0; size],
        }
    }

    /// Number of addressable halfwords.
    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Read the halfword at `addr`.
    #[inline]
    pub fn read_halfword(&self, addr: usize) -> Result<u16, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange { address: addr as i64, size: self.size() })
    }

    /// Write the halfword at `addr`.
    #[inline]
    pub fn write_halfword(&mut self, addr: usize, value: u16) -> Result<(), MemoryError> {
        let size = self.size();
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange { address: addr as i64, size })?;
        *cell = value;
        Ok(())
    }

    /// Validate a signed address coming from user input.
    pub fn check_address(&self, addr: i64) -> Result<usize, MemoryError> {
        if addr < 0 || addr as u64 >= self.size() as u64 {
            return Err(MemoryError::AddressOutOfRange { address: addr, size: self.size() });
        }
        Ok(addr as usize)
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0);
    }

    /// Dump memory contents (for debugging). Clipped to the configured range.
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u16)> {
        let end = start.saturating_add(count).min(self.size());
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }

    /// Format the requested addresses for display.
    pub fn debug_rows<I>(&self, addresses: I) -> Result<Vec<MemoryRow>, MemoryError>
    where
        I: IntoIterator<Item = usize>,
    {
        addresses
            .into_iter()
            .map(|addr| Ok(MemoryRow::new(addr, self.read_halfword(addr)?)))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.size())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory address {address} out of range (memory size {size})")]
    AddressOutOfRange { address: i64, size: usize },
}
