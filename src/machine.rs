use crate::memory::Memory;
use crate::snapshot::PortableGameState;
use log::debug;

/// The external-collaborator boundary consumed by instruction
/// semantics
///
/// Everything outside decode, dispatch, and call-stack bookkeeping
/// goes through this trait: global variables, the object tree, the
/// dictionary/tokenizer, text decoding, the screen model, and
/// persistence. The engine is generic over it, so tests drive the
/// opcodes against a fake machine.
///
/// Screen and sound hooks have logging no-op defaults because a
/// minimal host (or a test) legitimately has no display.
pub trait Machine: Memory {
    /// Story-file version from the header, read once at startup
    fn version(&self) -> u8;

    /// Byte address of the first instruction (V6: packed address of
    /// the main routine)
    fn initial_pc(&self) -> u32;

    // ---- global variables ----

    /// Read global variable `var` (0x10-0xFF, header-relative)
    fn read_global(&self, var: u8) -> Result<u16, String>;
    fn write_global(&mut self, var: u8, value: u16) -> Result<(), String>;

    // ---- packed addresses ----

    fn unpack_routine_address(&self, packed: u16) -> u32;
    fn unpack_string_address(&self, packed: u16) -> u32;

    // ---- object tree ----

    fn get_parent(&self, obj: u16) -> Result<u16, String>;
    fn get_child(&self, obj: u16) -> Result<u16, String>;
    fn get_sibling(&self, obj: u16) -> Result<u16, String>;
    fn insert_object(&mut self, obj: u16, dest: u16) -> Result<(), String>;
    fn remove_object(&mut self, obj: u16) -> Result<(), String>;
    fn test_attribute(&self, obj: u16, attr: u16) -> Result<bool, String>;
    fn set_attribute(&mut self, obj: u16, attr: u16) -> Result<(), String>;
    fn clear_attribute(&mut self, obj: u16, attr: u16) -> Result<(), String>;
    fn get_property(&self, obj: u16, prop: u16) -> Result<u16, String>;
    fn put_property(&mut self, obj: u16, prop: u16, value: u16) -> Result<(), String>;
    /// Byte address of the property's data, or 0 if absent
    fn get_property_address(&self, obj: u16, prop: u16) -> Result<u16, String>;
    /// Length of the property whose data starts at `prop_addr`
    fn get_property_length(&self, prop_addr: u16) -> Result<u16, String>;
    fn get_next_property(&self, obj: u16, prop: u16) -> Result<u16, String>;
    fn object_name(&self, obj: u16) -> Result<String, String>;

    // ---- text ----

    /// Decode the ZSCII string at `addr` to printable text
    fn decode_string(&self, addr: u32) -> Result<String, String>;
    fn encode_text(
        &mut self,
        text_addr: u32,
        length: u16,
        from: u16,
        dest_addr: u32,
    ) -> Result<(), String>;
    fn tokenise(
        &mut self,
        text_buffer: u16,
        parse_buffer: u16,
        dictionary: u16,
        skip_unknown: bool,
    ) -> Result<(), String>;

    // ---- output ----

    fn print(&mut self, text: &str) -> Result<(), String>;
    fn print_char(&mut self, zscii: u16) -> Result<(), String>;
    fn new_line(&mut self) -> Result<(), String>;
    /// Select or deselect an output stream; `table` accompanies
    /// stream 3
    fn select_output_stream(&mut self, stream: i16, table: Option<u16>) -> Result<(), String> {
        debug!("output_stream {stream} table {table:?} ignored by host");
        Ok(())
    }
    fn select_input_stream(&mut self, stream: u16) -> Result<(), String> {
        debug!("input_stream {stream} ignored by host");
        Ok(())
    }

    // ---- input ----

    /// Read one input line into the text buffer, tokenise into the
    /// parse buffer (if nonzero), and return the terminating
    /// character. Blocks until the host supplies input.
    fn read_line(
        &mut self,
        text_buffer: u16,
        parse_buffer: u16,
        time: u16,
        routine: u16,
    ) -> Result<u16, String>;
    /// Read a single character. Blocks like `read_line`.
    fn read_char(&mut self, time: u16, routine: u16) -> Result<u16, String>;

    // ---- screen hooks (out-of-scope model, narrow interface) ----

    fn split_window(&mut self, lines: u16) -> Result<(), String> {
        debug!("split_window {lines} ignored by host");
        Ok(())
    }
    fn set_window(&mut self, window: u16) -> Result<(), String> {
        debug!("set_window {window} ignored by host");
        Ok(())
    }
    fn erase_window(&mut self, window: i16) -> Result<(), String> {
        debug!("erase_window {window} ignored by host");
        Ok(())
    }
    fn erase_line(&mut self, value: u16) -> Result<(), String> {
        debug!("erase_line {value} ignored by host");
        Ok(())
    }
    fn set_cursor(&mut self, line: u16, column: u16, window: u16) -> Result<(), String> {
        debug!("set_cursor {line},{column} window {window} ignored by host");
        Ok(())
    }
    /// (line, column) of the cursor in the current window
    fn get_cursor(&self) -> Result<(u16, u16), String> {
        Ok((1, 1))
    }
    fn set_text_style(&mut self, style: u16) -> Result<(), String> {
        debug!("set_text_style {style} ignored by host");
        Ok(())
    }
    fn buffer_mode(&mut self, flag: u16) -> Result<(), String> {
        debug!("buffer_mode {flag} ignored by host");
        Ok(())
    }
    fn set_colour(&mut self, foreground: u16, background: u16, window: u16) -> Result<(), String> {
        debug!("set_colour {foreground}/{background} window {window} ignored by host");
        Ok(())
    }
    /// Returns the previous font, or 0 if the request is unavailable
    fn set_font(&mut self, font: u16) -> Result<u16, String> {
        debug!("set_font {font} unavailable on host");
        Ok(0)
    }
    fn show_status(&mut self) -> Result<(), String> {
        Ok(())
    }
    fn sound_effect(
        &mut self,
        number: u16,
        effect: u16,
        volume: u16,
        routine: u16,
    ) -> Result<(), String> {
        debug!("sound_effect {number} effect {effect} volume {volume} routine {routine} ignored");
        Ok(())
    }

    // ---- persistence ----

    /// Copy of the dynamic region, for snapshots
    fn dynamic_memory(&self) -> Vec<u8>;
    /// Overwrite the dynamic region from a snapshot
    fn restore_dynamic(&mut self, saved: &[u8]) -> Result<(), String>;
    /// Persist a snapshot externally; false reports failure to the
    /// running game, never a fault
    fn save(&mut self, state: &PortableGameState) -> bool;
    /// Load an externally persisted snapshot, if one exists
    fn restore(&mut self) -> Option<PortableGameState>;
    /// Reset dynamic memory to its load-time image
    fn restart(&mut self) -> Result<(), String>;
    /// Checksum the story file for @verify
    fn verify(&self) -> bool {
        true
    }
}
