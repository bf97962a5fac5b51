use crate::instruction::OperandCount;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Static facts about one opcode in one operand-count family
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub name: &'static str,
    /// Instruction is followed by a store-variable byte
    pub stores: bool,
    /// Instruction is followed by branch bytes
    pub branches: bool,
    /// Instruction is followed by an inline encoded string
    pub has_text: bool,
}

struct TableBuilder {
    map: HashMap<(OperandCount, u8, u8), OpcodeInfo>,
}

impl TableBuilder {
    fn new() -> Self {
        TableBuilder {
            map: HashMap::new(),
        }
    }

    fn put(
        &mut self,
        family: OperandCount,
        opcode: u8,
        versions: RangeInclusive<u8>,
        name: &'static str,
        stores: bool,
        branches: bool,
    ) {
        for v in versions {
            self.map.insert(
                (family, opcode, v),
                OpcodeInfo {
                    name,
                    stores,
                    branches,
                    has_text: false,
                },
            );
        }
    }

    fn put_text(
        &mut self,
        family: OperandCount,
        opcode: u8,
        versions: RangeInclusive<u8>,
        name: &'static str,
    ) {
        for v in versions {
            self.map.insert(
                (family, opcode, v),
                OpcodeInfo {
                    name,
                    stores: false,
                    branches: false,
                    has_text: true,
                },
            );
        }
    }
}

fn build_0op(t: &mut TableBuilder) {
    use OperandCount::OP0;
    t.put(OP0, 0x00, 1..=8, "rtrue", false, false);
    t.put(OP0, 0x01, 1..=8, "rfalse", false, false);
    t.put_text(OP0, 0x02, 1..=8, "print");
    t.put_text(OP0, 0x03, 1..=8, "print_ret");
    t.put(OP0, 0x04, 1..=8, "nop", false, false);
    // save/restore are branches through V3, stores in V4, and move to
    // the EXT family in V5
    t.put(OP0, 0x05, 1..=3, "save", false, true);
    t.put(OP0, 0x05, 4..=4, "save", true, false);
    t.put(OP0, 0x06, 1..=3, "restore", false, true);
    t.put(OP0, 0x06, 4..=4, "restore", true, false);
    t.put(OP0, 0x07, 1..=8, "restart", false, false);
    t.put(OP0, 0x08, 1..=8, "ret_popped", false, false);
    t.put(OP0, 0x09, 1..=4, "pop", false, false);
    t.put(OP0, 0x09, 5..=8, "catch", true, false);
    t.put(OP0, 0x0A, 1..=8, "quit", false, false);
    t.put(OP0, 0x0B, 1..=8, "new_line", false, false);
    t.put(OP0, 0x0C, 3..=3, "show_status", false, false);
    t.put(OP0, 0x0D, 3..=8, "verify", false, true);
    // 0x0E is the first byte of the extended-form escape, never a 0OP
    t.put(OP0, 0x0F, 5..=8, "piracy", false, true);
}

fn build_1op(t: &mut TableBuilder) {
    use OperandCount::OP1;
    t.put(OP1, 0x00, 1..=8, "jz", false, true);
    t.put(OP1, 0x01, 1..=8, "get_sibling", true, true);
    t.put(OP1, 0x02, 1..=8, "get_child", true, true);
    t.put(OP1, 0x03, 1..=8, "get_parent", true, false);
    t.put(OP1, 0x04, 1..=8, "get_prop_len", true, false);
    t.put(OP1, 0x05, 1..=8, "inc", false, false);
    t.put(OP1, 0x06, 1..=8, "dec", false, false);
    t.put(OP1, 0x07, 1..=8, "print_addr", false, false);
    t.put(OP1, 0x08, 4..=8, "call_1s", true, false);
    t.put(OP1, 0x09, 1..=8, "remove_obj", false, false);
    t.put(OP1, 0x0A, 1..=8, "print_obj", false, false);
    t.put(OP1, 0x0B, 1..=8, "ret", false, false);
    t.put(OP1, 0x0C, 1..=8, "jump", false, false);
    t.put(OP1, 0x0D, 1..=8, "print_paddr", false, false);
    t.put(OP1, 0x0E, 1..=8, "load", true, false);
    // 1OP:0x0F is bitwise not through V4; V5 reuses it for call_1n,
    // which never stores
    t.put(OP1, 0x0F, 1..=4, "not", true, false);
    t.put(OP1, 0x0F, 5..=8, "call_1n", false, false);
}

fn build_2op(t: &mut TableBuilder) {
    use OperandCount::OP2;
    t.put(OP2, 0x01, 1..=8, "je", false, true);
    t.put(OP2, 0x02, 1..=8, "jl", false, true);
    t.put(OP2, 0x03, 1..=8, "jg", false, true);
    t.put(OP2, 0x04, 1..=8, "dec_chk", false, true);
    t.put(OP2, 0x05, 1..=8, "inc_chk", false, true);
    t.put(OP2, 0x06, 1..=8, "jin", false, true);
    t.put(OP2, 0x07, 1..=8, "test", false, true);
    t.put(OP2, 0x08, 1..=8, "or", true, false);
    t.put(OP2, 0x09, 1..=8, "and", true, false);
    t.put(OP2, 0x0A, 1..=8, "test_attr", false, true);
    t.put(OP2, 0x0B, 1..=8, "set_attr", false, false);
    t.put(OP2, 0x0C, 1..=8, "clear_attr", false, false);
    t.put(OP2, 0x0D, 1..=8, "store", false, false);
    t.put(OP2, 0x0E, 1..=8, "insert_obj", false, false);
    t.put(OP2, 0x0F, 1..=8, "loadw", true, false);
    t.put(OP2, 0x10, 1..=8, "loadb", true, false);
    t.put(OP2, 0x11, 1..=8, "get_prop", true, false);
    t.put(OP2, 0x12, 1..=8, "get_prop_addr", true, false);
    t.put(OP2, 0x13, 1..=8, "get_next_prop", true, false);
    t.put(OP2, 0x14, 1..=8, "add", true, false);
    t.put(OP2, 0x15, 1..=8, "sub", true, false);
    t.put(OP2, 0x16, 1..=8, "mul", true, false);
    t.put(OP2, 0x17, 1..=8, "div", true, false);
    t.put(OP2, 0x18, 1..=8, "mod", true, false);
    t.put(OP2, 0x19, 4..=8, "call_2s", true, false);
    t.put(OP2, 0x1A, 5..=8, "call_2n", false, false);
    t.put(OP2, 0x1B, 5..=8, "set_colour", false, false);
    t.put(OP2, 0x1C, 5..=8, "throw", false, false);
}

fn build_var(t: &mut TableBuilder) {
    use OperandCount::VAR;
    t.put(VAR, 0x00, 1..=8, "call_vs", true, false);
    t.put(VAR, 0x01, 1..=8, "storew", false, false);
    t.put(VAR, 0x02, 1..=8, "storeb", false, false);
    t.put(VAR, 0x03, 1..=8, "put_prop", false, false);
    t.put(VAR, 0x04, 1..=4, "sread", false, false);
    t.put(VAR, 0x04, 5..=8, "aread", true, false);
    t.put(VAR, 0x05, 1..=8, "print_char", false, false);
    t.put(VAR, 0x06, 1..=8, "print_num", false, false);
    t.put(VAR, 0x07, 1..=8, "random", true, false);
    t.put(VAR, 0x08, 1..=8, "push", false, false);
    t.put(VAR, 0x09, 1..=5, "pull", false, false);
    // V6 pull takes an optional user-stack operand and stores
    t.put(VAR, 0x09, 6..=8, "pull", true, false);
    t.put(VAR, 0x0A, 3..=8, "split_window", false, false);
    t.put(VAR, 0x0B, 3..=8, "set_window", false, false);
    t.put(VAR, 0x0C, 4..=8, "call_vs2", true, false);
    t.put(VAR, 0x0D, 4..=8, "erase_window", false, false);
    t.put(VAR, 0x0E, 4..=8, "erase_line", false, false);
    t.put(VAR, 0x0F, 4..=8, "set_cursor", false, false);
    t.put(VAR, 0x10, 4..=8, "get_cursor", false, false);
    t.put(VAR, 0x11, 4..=8, "set_text_style", false, false);
    t.put(VAR, 0x12, 4..=8, "buffer_mode", false, false);
    t.put(VAR, 0x13, 3..=8, "output_stream", false, false);
    t.put(VAR, 0x14, 3..=8, "input_stream", false, false);
    t.put(VAR, 0x15, 3..=8, "sound_effect", false, false);
    t.put(VAR, 0x16, 4..=8, "read_char", true, false);
    t.put(VAR, 0x17, 4..=8, "scan_table", true, true);
    t.put(VAR, 0x18, 5..=8, "not", true, false);
    t.put(VAR, 0x19, 5..=8, "call_vn", false, false);
    t.put(VAR, 0x1A, 5..=8, "call_vn2", false, false);
    t.put(VAR, 0x1B, 5..=8, "tokenise", false, false);
    t.put(VAR, 0x1C, 5..=8, "encode_text", false, false);
    t.put(VAR, 0x1D, 5..=8, "copy_table", false, false);
    t.put(VAR, 0x1E, 5..=8, "print_table", false, false);
    t.put(VAR, 0x1F, 5..=8, "check_arg_count", false, true);
}

fn build_ext(t: &mut TableBuilder) {
    use OperandCount::EXT;
    t.put(EXT, 0x00, 5..=8, "save", true, false);
    t.put(EXT, 0x01, 5..=8, "restore", true, false);
    t.put(EXT, 0x02, 5..=8, "log_shift", true, false);
    t.put(EXT, 0x03, 5..=8, "art_shift", true, false);
    t.put(EXT, 0x04, 5..=8, "set_font", true, false);
    t.put(EXT, 0x05, 6..=6, "draw_picture", false, false);
    t.put(EXT, 0x06, 6..=6, "picture_data", false, true);
    t.put(EXT, 0x07, 6..=6, "erase_picture", false, false);
    t.put(EXT, 0x08, 6..=6, "set_margins", false, false);
    t.put(EXT, 0x09, 5..=8, "save_undo", true, false);
    t.put(EXT, 0x0A, 5..=8, "restore_undo", true, false);
    t.put(EXT, 0x0B, 5..=8, "print_unicode", false, false);
    t.put(EXT, 0x0C, 5..=8, "check_unicode", true, false);
    t.put(EXT, 0x0D, 5..=8, "set_true_colour", false, false);
    t.put(EXT, 0x10, 6..=6, "move_window", false, false);
    t.put(EXT, 0x11, 6..=6, "window_size", false, false);
    t.put(EXT, 0x12, 6..=6, "window_style", false, false);
    t.put(EXT, 0x13, 6..=6, "get_wind_prop", true, false);
    t.put(EXT, 0x14, 6..=6, "scroll_window", false, false);
    t.put(EXT, 0x15, 6..=6, "pop_stack", false, false);
    t.put(EXT, 0x16, 6..=6, "read_mouse", false, false);
    t.put(EXT, 0x17, 6..=6, "mouse_window", false, false);
    t.put(EXT, 0x18, 6..=6, "push_stack", false, true);
    t.put(EXT, 0x19, 6..=6, "put_wind_prop", false, false);
    t.put(EXT, 0x1A, 6..=6, "print_form", false, false);
    t.put(EXT, 0x1B, 6..=6, "make_menu", false, true);
    t.put(EXT, 0x1C, 6..=6, "picture_table", false, false);
}

lazy_static! {
    static ref OPCODES: HashMap<(OperandCount, u8, u8), OpcodeInfo> = {
        let mut t = TableBuilder::new();
        build_0op(&mut t);
        build_1op(&mut t);
        build_2op(&mut t);
        build_var(&mut t);
        build_ext(&mut t);
        t.map
    };
}

/// Look up one opcode in one family for one story-file version
pub fn lookup(family: OperandCount, opcode: u8, version: u8) -> Option<&'static OpcodeInfo> {
    OPCODES.get(&(family, opcode, version))
}

pub fn is_valid(family: OperandCount, opcode: u8, version: u8) -> bool {
    lookup(family, opcode, version).is_some()
}

pub fn stores_result(family: OperandCount, opcode: u8, version: u8) -> bool {
    lookup(family, opcode, version).map_or(false, |i| i.stores)
}

pub fn has_branch(family: OperandCount, opcode: u8, version: u8) -> bool {
    lookup(family, opcode, version).map_or(false, |i| i.branches)
}

pub fn has_text(family: OperandCount, opcode: u8, version: u8) -> bool {
    lookup(family, opcode, version).map_or(false, |i| i.has_text)
}

pub fn name(family: OperandCount, opcode: u8, version: u8) -> &'static str {
    lookup(family, opcode, version).map_or("unknown", |i| i.name)
}

/// Iterate every registered `(family, opcode, version)` entry
pub fn entries() -> impl Iterator<Item = ((OperandCount, u8, u8), &'static OpcodeInfo)> {
    OPCODES.iter().map(|(key, info)| (*key, info))
}

/// The two double-variable call opcodes carry a second operand-type
/// byte, allowing up to eight operands
pub fn reads_second_type_byte(family: OperandCount, opcode: u8) -> bool {
    family == OperandCount::VAR && (opcode == 0x0C || opcode == 0x1A)
}
