use bytes::{Bytes, BytesMut};

use crate::data::ChunkResult;
use crate::error::{Error, Result};

/// Per-index result slots, filled in completion order and read in index
/// order.
#[derive(Debug)]
pub struct ChunkSlots {
    slots: Vec<Option<Bytes>>,
    filled: usize,
}

impl ChunkSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
            filled: 0,
        }
    }

    /// Store a result in its slot.
    ///
    /// # Errors
    ///
    /// [`Error::Task`] if the index is outside the plan or the slot was
    /// already written.
    pub fn insert(&mut self, result: ChunkResult) -> Result<()> {
        let slot = self
            .slots
            .get_mut(result.index as usize)
            .ok_or_else(|| Error::Task(format!("chunk index {} is not in the plan", result.index)))?;
        if slot.is_some() {
            return Err(Error::Task(format!("chunk {} reported twice", result.index)));
        }
        *slot = Some(result.data);
        self.filled += 1;
        Ok(())
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Concatenate all slots in index order.
    pub fn assemble(self) -> Result<Bytes> {
        assemble(self.slots)
    }
}

/// Concatenate chunk bodies in index order.
///
/// # Errors
///
/// [`Error::ChunkMissing`] for the first empty slot.
pub fn assemble(slots: Vec<Option<Bytes>>) -> Result<Bytes> {
    let total: usize = slots.iter().flatten().map(Bytes::len).sum();
    let mut out = BytesMut::with_capacity(total);

    for (index, slot) in slots.into_iter().enumerate() {
        let data = slot.ok_or(Error::ChunkMissing {
            index: index as u32,
        })?;
        out.extend_from_slice(&data);
    }

    Ok(out.freeze())
}
