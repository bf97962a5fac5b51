use log::debug;

/// Byte-addressable story memory
///
/// Words are big-endian throughout. All accesses are bounds-checked
/// against the loaded image; out-of-range access is a collaborator
/// fault reported to the engine as an `Err`.
pub trait Memory {
    fn read_byte(&self, addr: u32) -> Result<u8, String>;
    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), String>;

    fn read_word(&self, addr: u32) -> Result<u16, String> {
        let high = self.read_byte(addr)? as u16;
        let low = self.read_byte(addr + 1)? as u16;
        Ok((high << 8) | low)
    }

    fn write_word(&mut self, addr: u32, value: u16) -> Result<(), String> {
        self.write_byte(addr, (value >> 8) as u8)?;
        self.write_byte(addr + 1, (value & 0xFF) as u8)
    }

    /// Size of the loaded image in bytes
    fn size(&self) -> u32;
}

/// A `Vec<u8>`-backed memory image with the dynamic/static split
/// enforced on writes
pub struct StoryMemory {
    bytes: Vec<u8>,
    /// First byte past dynamic memory; writes at or above this fail
    dynamic_limit: u32,
}

impl StoryMemory {
    pub fn new(bytes: Vec<u8>, dynamic_limit: u32) -> Self {
        StoryMemory {
            bytes,
            dynamic_limit,
        }
    }

    /// A memory image with no write protection, for tests and tools
    pub fn unprotected(bytes: Vec<u8>) -> Self {
        let limit = bytes.len() as u32;
        StoryMemory::new(bytes, limit)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy of the dynamic region, for save snapshots
    pub fn dynamic_bytes(&self) -> Vec<u8> {
        let limit = (self.dynamic_limit as usize).min(self.bytes.len());
        self.bytes[..limit].to_vec()
    }

    /// Overwrite the dynamic region from a snapshot
    pub fn restore_dynamic(&mut self, saved: &[u8]) -> Result<(), String> {
        let limit = (self.dynamic_limit as usize).min(self.bytes.len());
        if saved.len() != limit {
            return Err(format!(
                "dynamic memory snapshot is {} bytes, image expects {}",
                saved.len(),
                limit
            ));
        }
        self.bytes[..limit].copy_from_slice(saved);
        Ok(())
    }
}

impl Memory for StoryMemory {
    fn read_byte(&self, addr: u32) -> Result<u8, String> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or_else(|| format!("memory read out of bounds: {addr:#06x}"))
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), String> {
        if addr >= self.dynamic_limit {
            debug!(
                "rejected write of {:#04x} to non-dynamic memory at {:#06x}",
                value, addr
            );
            return Err(format!(
                "attempt to write to non-dynamic memory at {addr:#06x}"
            ));
        }
        match self.bytes.get_mut(addr as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("memory write out of bounds: {addr:#06x}")),
        }
    }

    fn size(&self) -> u32 {
        self.bytes.len() as u32
    }
}
