//! A scriptable fake `Machine` for driving the engine in tests
//!
//! Collaborator behavior (object tree, strings, input) is backed by
//! plain maps and queues so tests can set up exactly the state an
//! opcode needs.

use crate::machine::Machine;
use crate::memory::{Memory, StoryMemory};
use crate::snapshot::PortableGameState;
use std::collections::{HashMap, VecDeque};

pub const TEST_MEMORY_SIZE: usize = 0x2000;

pub struct TestMachine {
    pub memory: StoryMemory,
    original_memory: Vec<u8>,
    version: u8,
    pub initial_pc: u32,
    pub globals: HashMap<u8, u16>,
    // Object tree
    pub parents: HashMap<u16, u16>,
    pub children: HashMap<u16, u16>,
    pub siblings: HashMap<u16, u16>,
    pub attributes: HashMap<(u16, u16), bool>,
    pub properties: HashMap<(u16, u16), u16>,
    pub object_names: HashMap<u16, String>,
    // Text
    pub strings: HashMap<u32, String>,
    // I/O capture
    pub output: String,
    pub input_chars: VecDeque<u16>,
    pub line_terminator: u16,
    pub read_line_calls: u32,
    // Persistence
    pub saved: Option<PortableGameState>,
    pub save_succeeds: bool,
    pub verify_result: bool,
}

impl TestMachine {
    pub fn with_version(version: u8) -> Self {
        let mut bytes = vec![0u8; TEST_MEMORY_SIZE];
        bytes[0] = version;
        TestMachine {
            memory: StoryMemory::unprotected(bytes.clone()),
            original_memory: bytes,
            version,
            initial_pc: 0x1000,
            globals: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            siblings: HashMap::new(),
            attributes: HashMap::new(),
            properties: HashMap::new(),
            object_names: HashMap::new(),
            strings: HashMap::new(),
            output: String::new(),
            input_chars: VecDeque::new(),
            line_terminator: 13,
            read_line_calls: 0,
            saved: None,
            save_succeeds: true,
            verify_result: true,
        }
    }

    /// Lay out a routine header at `addr`: the local count followed by
    /// default words in V1-4
    pub fn set_routine(&mut self, addr: u32, local_defaults: &[u16]) {
        self.memory.write_byte(addr, local_defaults.len() as u8).unwrap();
        if self.version <= 4 {
            for (i, &default) in local_defaults.iter().enumerate() {
                self.memory
                    .write_word(addr + 1 + 2 * i as u32, default)
                    .unwrap();
            }
        }
    }

    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.memory.write_byte(addr + i as u32, b).unwrap();
        }
    }
}

impl Memory for TestMachine {
    fn read_byte(&self, addr: u32) -> Result<u8, String> {
        self.memory.read_byte(addr)
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), String> {
        self.memory.write_byte(addr, value)
    }

    fn size(&self) -> u32 {
        self.memory.size()
    }
}

impl Machine for TestMachine {
    fn version(&self) -> u8 {
        self.version
    }

    fn initial_pc(&self) -> u32 {
        self.initial_pc
    }

    fn read_global(&self, var: u8) -> Result<u16, String> {
        if var < 0x10 {
            return Err(format!("invalid global variable number: {var:#04x}"));
        }
        Ok(self.globals.get(&var).copied().unwrap_or(0))
    }

    fn write_global(&mut self, var: u8, value: u16) -> Result<(), String> {
        if var < 0x10 {
            return Err(format!("invalid global variable number: {var:#04x}"));
        }
        self.globals.insert(var, value);
        Ok(())
    }

    fn unpack_routine_address(&self, packed: u16) -> u32 {
        match self.version {
            1..=3 => packed as u32 * 2,
            4..=7 => packed as u32 * 4,
            _ => packed as u32 * 8,
        }
    }

    fn unpack_string_address(&self, packed: u16) -> u32 {
        self.unpack_routine_address(packed)
    }

    fn get_parent(&self, obj: u16) -> Result<u16, String> {
        Ok(self.parents.get(&obj).copied().unwrap_or(0))
    }

    fn get_child(&self, obj: u16) -> Result<u16, String> {
        Ok(self.children.get(&obj).copied().unwrap_or(0))
    }

    fn get_sibling(&self, obj: u16) -> Result<u16, String> {
        Ok(self.siblings.get(&obj).copied().unwrap_or(0))
    }

    fn insert_object(&mut self, obj: u16, dest: u16) -> Result<(), String> {
        let old_child = self.children.get(&dest).copied().unwrap_or(0);
        self.parents.insert(obj, dest);
        self.children.insert(dest, obj);
        self.siblings.insert(obj, old_child);
        Ok(())
    }

    fn remove_object(&mut self, obj: u16) -> Result<(), String> {
        self.parents.remove(&obj);
        Ok(())
    }

    fn test_attribute(&self, obj: u16, attr: u16) -> Result<bool, String> {
        Ok(self.attributes.get(&(obj, attr)).copied().unwrap_or(false))
    }

    fn set_attribute(&mut self, obj: u16, attr: u16) -> Result<(), String> {
        self.attributes.insert((obj, attr), true);
        Ok(())
    }

    fn clear_attribute(&mut self, obj: u16, attr: u16) -> Result<(), String> {
        self.attributes.insert((obj, attr), false);
        Ok(())
    }

    fn get_property(&self, obj: u16, prop: u16) -> Result<u16, String> {
        Ok(self.properties.get(&(obj, prop)).copied().unwrap_or(0))
    }

    fn put_property(&mut self, obj: u16, prop: u16, value: u16) -> Result<(), String> {
        self.properties.insert((obj, prop), value);
        Ok(())
    }

    fn get_property_address(&self, obj: u16, prop: u16) -> Result<u16, String> {
        Ok(if self.properties.contains_key(&(obj, prop)) {
            // Synthetic but stable address for tests
            0x100 + obj * 16 + prop
        } else {
            0
        })
    }

    fn get_property_length(&self, prop_addr: u16) -> Result<u16, String> {
        Ok(if prop_addr == 0 { 0 } else { 2 })
    }

    fn get_next_property(&self, obj: u16, prop: u16) -> Result<u16, String> {
        let mut props: Vec<u16> = self
            .properties
            .keys()
            .filter(|(o, _)| *o == obj)
            .map(|(_, p)| *p)
            .collect();
        props.sort_unstable_by(|a, b| b.cmp(a));
        match prop {
            0 => Ok(props.first().copied().unwrap_or(0)),
            _ => Ok(props.into_iter().find(|&p| p < prop).unwrap_or(0)),
        }
    }

    fn object_name(&self, obj: u16) -> Result<String, String> {
        Ok(self
            .object_names
            .get(&obj)
            .cloned()
            .unwrap_or_else(|| format!("object#{obj}")))
    }

    fn decode_string(&self, addr: u32) -> Result<String, String> {
        Ok(self
            .strings
            .get(&addr)
            .cloned()
            .unwrap_or_else(|| format!("[string at {addr:#x}]")))
    }

    fn encode_text(
        &mut self,
        _text_addr: u32,
        _length: u16,
        _from: u16,
        _dest_addr: u32,
    ) -> Result<(), String> {
        Ok(())
    }

    fn tokenise(
        &mut self,
        _text_buffer: u16,
        _parse_buffer: u16,
        _dictionary: u16,
        _skip_unknown: bool,
    ) -> Result<(), String> {
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<(), String> {
        self.output.push_str(text);
        Ok(())
    }

    fn print_char(&mut self, zscii: u16) -> Result<(), String> {
        if let Some(c) = char::from_u32(zscii as u32) {
            self.output.push(c);
        }
        Ok(())
    }

    fn new_line(&mut self) -> Result<(), String> {
        self.output.push('\n');
        Ok(())
    }

    fn read_line(
        &mut self,
        _text_buffer: u16,
        _parse_buffer: u16,
        _time: u16,
        _routine: u16,
    ) -> Result<u16, String> {
        self.read_line_calls += 1;
        Ok(self.line_terminator)
    }

    fn read_char(&mut self, _time: u16, _routine: u16) -> Result<u16, String> {
        Ok(self.input_chars.pop_front().unwrap_or(13))
    }

    fn dynamic_memory(&self) -> Vec<u8> {
        self.memory.dynamic_bytes()
    }

    fn restore_dynamic(&mut self, saved: &[u8]) -> Result<(), String> {
        self.memory.restore_dynamic(saved)
    }

    fn save(&mut self, state: &PortableGameState) -> bool {
        if self.save_succeeds {
            self.saved = Some(state.clone());
        }
        self.save_succeeds
    }

    fn restore(&mut self) -> Option<PortableGameState> {
        self.saved.clone()
    }

    fn restart(&mut self) -> Result<(), String> {
        self.memory.restore_dynamic(&self.original_memory)
    }

    fn verify(&self) -> bool {
        self.verify_result
    }
}
