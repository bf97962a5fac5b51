use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

/// Read a big-endian word from the header area
fn header_word(bytes: &[u8], offset: usize) -> u16 {
    ((bytes[offset] as u16) << 8) | bytes[offset + 1] as u16
}

/// Parsed story-file header
///
/// The header is read once when a story file is loaded; the engine
/// caches the version and never re-reads it.
pub struct Header {
    pub version: u8,
    pub release: u16,
    pub serial: String,
    pub base_high_mem: u16,
    pub base_static_mem: u16,
    pub initial_pc: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
    pub abbrev_table: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    /// Routine offset for V6/V7 packed addresses (stored divided by 8)
    pub routine_offset: u16,
    /// String offset for V6/V7 packed addresses (stored divided by 8)
    pub string_offset: u16,
}

impl Header {
    pub fn new(bytes: &[u8]) -> Result<Header, String> {
        if bytes.len() < 64 {
            return Err(format!(
                "story file too small for header: {} bytes",
                bytes.len()
            ));
        }
        let version = bytes[0];
        if !(1..=8).contains(&version) {
            return Err(format!("unsupported story file version: {version}"));
        }

        let mut serial = String::new();
        for b in &bytes[0x12..0x18] {
            serial.push(*b as char);
        }

        // File length is stored divided by a version-dependent factor
        let len_factor = match version {
            1..=3 => 2,
            4..=5 => 4,
            _ => 8,
        };

        Ok(Header {
            version,
            release: header_word(bytes, 0x02),
            serial,
            base_high_mem: header_word(bytes, 0x04),
            initial_pc: header_word(bytes, 0x06),
            dictionary: header_word(bytes, 0x08),
            object_table_addr: header_word(bytes, 0x0A),
            global_variables: header_word(bytes, 0x0C),
            base_static_mem: header_word(bytes, 0x0E),
            abbrev_table: header_word(bytes, 0x18),
            len_file: header_word(bytes, 0x1A) as usize * len_factor,
            checksum_file: header_word(bytes, 0x1C),
            routine_offset: header_word(bytes, 0x28),
            string_offset: header_word(bytes, 0x2A),
        })
    }

    /// Translate a packed routine address to a byte address
    pub fn unpack_routine_address(&self, packed: u16) -> u32 {
        match self.version {
            1..=3 => packed as u32 * 2,
            4..=5 => packed as u32 * 4,
            6..=7 => packed as u32 * 4 + self.routine_offset as u32 * 8,
            _ => packed as u32 * 8,
        }
    }

    /// Translate a packed string address to a byte address
    pub fn unpack_string_address(&self, packed: u16) -> u32 {
        match self.version {
            1..=3 => packed as u32 * 2,
            4..=5 => packed as u32 * 4,
            6..=7 => packed as u32 * 4 + self.string_offset as u32 * 8,
            _ => packed as u32 * 8,
        }
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "
Z-code version:           {}
Release number:           {}
Serial number:            {}
Start PC:                 {:#06x}
Size of resident memory:  {:#06x}
Size of dynamic memory:   {:#06x}
Dictionary address:       {:#06x}
Object table address:     {:#06x}
Global variables address: {:#06x}
Abbreviations address:    {:#06x}
File size:                {:#06x}
Checksum:                 {:#06x}
",
            self.version,
            self.release,
            self.serial,
            self.initial_pc,
            self.base_high_mem,
            self.base_static_mem,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.abbrev_table,
            self.len_file,
            self.checksum_file,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Vec<u8> {
        let mut bytes = vec![0u8; 0x100];
        bytes[0] = 3;
        bytes[0x02] = 0x00;
        bytes[0x03] = 0x58; // release 88
        bytes[0x06] = 0x4f;
        bytes[0x07] = 0x05; // initial pc 0x4f05
        bytes[0x0C] = 0x22;
        bytes[0x0D] = 0x71; // globals at 0x2271
        bytes[0x0E] = 0x2e;
        bytes[0x0F] = 0x53; // static base 0x2e53
        for (i, b) in b"840726".iter().enumerate() {
            bytes[0x12 + i] = *b;
        }
        bytes
    }

    #[test]
    fn parse_fields() {
        let h = Header::new(&sample_header()).unwrap();
        assert_eq!(h.version, 3);
        assert_eq!(h.release, 88);
        assert_eq!(h.initial_pc, 0x4f05);
        assert_eq!(h.global_variables, 0x2271);
        assert_eq!(h.base_static_mem, 0x2e53);
        assert_eq!(h.serial, "840726");
    }

    #[test]
    fn packed_addresses_by_version() {
        let mut bytes = sample_header();
        let h = Header::new(&bytes).unwrap();
        assert_eq!(h.unpack_routine_address(0x1000), 0x2000);

        bytes[0] = 5;
        let h = Header::new(&bytes).unwrap();
        assert_eq!(h.unpack_routine_address(0x1000), 0x4000);

        bytes[0] = 8;
        let h = Header::new(&bytes).unwrap();
        assert_eq!(h.unpack_routine_address(0x1000), 0x8000);
    }

    #[test]
    fn rejects_short_or_bad_version() {
        assert!(Header::new(&[0u8; 10]).is_err());
        let mut bytes = sample_header();
        bytes[0] = 9;
        assert!(Header::new(&bytes).is_err());
    }
}
