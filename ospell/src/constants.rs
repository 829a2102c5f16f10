pub const INDEX_TABLE_SIZE: usize = 6;
pub const TRANS_TABLE_SIZE: usize = 12;
pub const TARGET_TABLE: u32 = 2_147_483_648;

/// Marker for "no symbol" in either table.
pub const NO_SYMBOL: u16 = u16::MAX;
/// Marker for "no target" in either table.
pub const NO_TABLE_INDEX: u32 = u32::MAX;

/// Magic bytes of the HFST3 wrapper header, NUL included.
pub const HFST3_MAGIC: &[u8; 5] = b"HFST\0";

/// Lookup paths may be at most this many times longer than the input, plus one.
pub const DEFAULT_MAX_PATH_FACTOR: usize = 8;
/// Lower bound on the lookup path length for very short inputs.
pub const MIN_PATH_LENGTH: usize = 32;
