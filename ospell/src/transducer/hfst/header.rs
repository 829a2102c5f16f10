use byteorder::{LittleEndian, ReadBytesExt};
use hashbrown::HashMap;
use smol_str::SmolStr;
use std::io::Cursor;

use crate::constants::HFST3_MAGIC;
use crate::transducer::TransducerError;
use crate::types::{HeaderFlag, SymbolNumber, TransitionTableIndex};

#[derive(Debug, Clone)]
pub struct TransducerHeader {
    symbols: SymbolNumber,
    input_symbols: SymbolNumber,
    trans_index_table: TransitionTableIndex,
    trans_target_table: TransitionTableIndex,
    states: TransitionTableIndex,
    transitions: TransitionTableIndex,

    flags: [bool; 9],
    properties: HashMap<SmolStr, SmolStr>,
    header_size: usize,
}

fn truncated(_: std::io::Error) -> TransducerError {
    TransducerError::Header("unexpected end of file".into())
}

fn parse_properties(bytes: &[u8]) -> Result<HashMap<SmolStr, SmolStr>, TransducerError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| TransducerError::Header("HFST3 header is not UTF-8".into()))?;

    let mut parts: Vec<&str> = text.split('\0').collect();
    if parts.last() == Some(&"") {
        parts.pop();
    }

    if parts.len() % 2 != 0 {
        return Err(TransducerError::Header(format!(
            "HFST3 header has a key without a value: `{}`",
            parts.last().copied().unwrap_or_default()
        )));
    }

    Ok(parts
        .chunks(2)
        .map(|kv| (SmolStr::from(kv[0]), SmolStr::from(kv[1])))
        .collect())
}

#[allow(clippy::len_without_is_empty)]
impl TransducerHeader {
    pub fn new(buf: &[u8]) -> Result<TransducerHeader, TransducerError> {
        let mut rdr = Cursor::new(buf);
        let mut properties = HashMap::new();

        if buf.starts_with(HFST3_MAGIC) {
            rdr.set_position(HFST3_MAGIC.len() as u64);

            let header_len = rdr.read_u16::<LittleEndian>().map_err(truncated)?;

            // Skip the NUL after the length
            let start = rdr.position() as usize + 1;
            let end = start + usize::from(header_len);

            if end > buf.len() {
                return Err(TransducerError::Header("HFST3 header is truncated".into()));
            }

            properties = parse_properties(&buf[start..end])?;

            match properties.get("type") {
                Some(ty) if ty == "HFST_OL" || ty == "HFST_OLW" => {}
                Some(ty) => return Err(TransducerError::IncompatibleType(ty.clone())),
                None => {
                    return Err(TransducerError::Header(
                        "HFST3 header does not declare a type".into(),
                    ))
                }
            }

            rdr.set_position(end as u64);
        }

        let input_symbols = SymbolNumber(rdr.read_u16::<LittleEndian>().map_err(truncated)?);
        let symbols = SymbolNumber(rdr.read_u16::<LittleEndian>().map_err(truncated)?);
        let trans_index_table =
            TransitionTableIndex(rdr.read_u32::<LittleEndian>().map_err(truncated)?);
        let trans_target_table =
            TransitionTableIndex(rdr.read_u32::<LittleEndian>().map_err(truncated)?);
        let states = TransitionTableIndex(rdr.read_u32::<LittleEndian>().map_err(truncated)?);
        let transitions = TransitionTableIndex(rdr.read_u32::<LittleEndian>().map_err(truncated)?);

        let mut flags = [false; 9];

        for flag in flags.iter_mut() {
            let v = rdr.read_u32::<LittleEndian>().map_err(truncated)?;
            *flag = v != 0
        }

        if input_symbols > symbols {
            return Err(TransducerError::Header(format!(
                "{} input symbols declared but only {} symbols",
                input_symbols, symbols
            )));
        }

        Ok(TransducerHeader {
            symbols,
            input_symbols,
            trans_index_table,
            trans_target_table,
            states,
            transitions,
            flags,
            properties,
            header_size: rdr.position() as usize,
        })
    }

    pub fn symbol_count(&self) -> SymbolNumber {
        self.symbols
    }

    pub fn input_symbol_count(&self) -> SymbolNumber {
        self.input_symbols
    }

    pub fn index_table_size(&self) -> TransitionTableIndex {
        self.trans_index_table
    }

    pub fn target_table_size(&self) -> TransitionTableIndex {
        self.trans_target_table
    }

    pub fn has_flag(&self, flag: HeaderFlag) -> bool {
        self.flags[flag as usize]
    }

    pub fn states(&self) -> TransitionTableIndex {
        self.states
    }

    pub fn transitions(&self) -> TransitionTableIndex {
        self.transitions
    }

    pub fn flags(&self) -> &[bool; 9] {
        &self.flags
    }

    /// Key/value pairs of the HFST3 header, empty for bare files.
    pub fn properties(&self) -> &HashMap<SmolStr, SmolStr> {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.header_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn main_header(input_symbols: u16, symbols: u16) -> Vec<u8> {
        let mut buf = vec![];
        buf.write_u16::<LittleEndian>(input_symbols).unwrap();
        buf.write_u16::<LittleEndian>(symbols).unwrap();
        for v in &[10u32, 20, 3, 4] {
            buf.write_u32::<LittleEndian>(*v).unwrap();
        }
        for i in 0..9u32 {
            buf.write_u32::<LittleEndian>(if i == 0 { 1 } else { 0 }).unwrap();
        }
        buf
    }

    fn wrapped(text: &[u8], body: &[u8]) -> Vec<u8> {
        let mut buf = HFST3_MAGIC.to_vec();
        buf.write_u16::<LittleEndian>(text.len() as u16).unwrap();
        buf.push(0);
        buf.extend_from_slice(text);
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn bare_header() {
        let buf = main_header(3, 5);
        let header = TransducerHeader::new(&buf).unwrap();

        assert_eq!(header.input_symbol_count(), SymbolNumber(3));
        assert_eq!(header.symbol_count(), SymbolNumber(5));
        assert_eq!(header.index_table_size(), TransitionTableIndex(10));
        assert_eq!(header.target_table_size(), TransitionTableIndex(20));
        assert!(header.has_flag(HeaderFlag::Weighted));
        assert!(!header.has_flag(HeaderFlag::Cyclic));
        assert_eq!(header.len(), 56);
        assert!(header.properties().is_empty());
    }

    #[test]
    fn hfst3_header_properties() {
        let text = b"version\x003.3\x00type\x00HFST_OLW\x00max-weight\x005\x00";
        let buf = wrapped(text, &main_header(3, 5));
        let header = TransducerHeader::new(&buf).unwrap();

        assert_eq!(header.properties().get("type").map(|s| s.as_str()), Some("HFST_OLW"));
        assert_eq!(header.properties().get("max-weight").map(|s| s.as_str()), Some("5"));
        assert_eq!(header.symbol_count(), SymbolNumber(5));
    }

    #[test]
    fn rejects_other_types() {
        let buf = wrapped(b"type\x00FOMA\x00", &main_header(3, 5));

        match TransducerHeader::new(&buf) {
            Err(TransducerError::IncompatibleType(ty)) => assert_eq!(ty, "FOMA"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_truncated_input() {
        let buf = main_header(3, 5);
        assert!(matches!(
            TransducerHeader::new(&buf[..20]),
            Err(TransducerError::Header(_))
        ));
    }
}
