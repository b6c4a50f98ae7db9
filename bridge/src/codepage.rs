//! Codepage translation between managed strings and host bytes.
//!
//! The host keeps strings in a single- or double-byte codepage. A table maps
//! each codepage unit to a UTF-16 unit and back; bytes marked as lead bytes
//! combine with the following byte into one double-byte unit.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::BridgeError;

/// Windows-1252 upper half that differs from Latin-1. `None` is undefined.
#[rustfmt::skip]
const CP1252_HIGH: [Option<u16>; 32] = [
    Some(0x20AC), None, Some(0x201A), Some(0x0192),
    Some(0x201E), Some(0x2026), Some(0x2020), Some(0x2021),
    Some(0x02C6), Some(0x2030), Some(0x0160), Some(0x2039),
    Some(0x0152), None, Some(0x017D), None,
    None, Some(0x2018), Some(0x2019), Some(0x201C),
    Some(0x201D), Some(0x2022), Some(0x2013), Some(0x2014),
    Some(0x02DC), Some(0x2122), Some(0x0161), Some(0x203A),
    Some(0x0153), None, Some(0x017E), Some(0x0178),
];

/// A bidirectional codepage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codepage {
    name: String,
    to_unicode: HashMap<u16, u16>,
    from_unicode: HashMap<u16, u16>,
    lead_bytes: [bool; 256],
}

impl Default for Codepage {
    fn default() -> Self {
        Self::cp1252()
    }
}

impl Codepage {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            to_unicode: HashMap::new(),
            from_unicode: HashMap::new(),
            lead_bytes: [false; 256],
        }
    }

    fn insert(&mut self, unit: u16, unicode: u16) {
        self.to_unicode.insert(unit, unicode);
        self.from_unicode.insert(unicode, unit);
    }

    /// The built-in Windows-1252 table.
    pub fn cp1252() -> Self {
        let mut cp = Self::empty("cp1252");
        for b in 0u16..0x100 {
            let unicode = match b {
                0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
                _ => Some(b),
            };
            if let Some(u) = unicode {
                cp.insert(b, u);
            }
        }
        cp
    }

    /// Parse a codepage table in the `0xCP<TAB>0xUNICODE<TAB>comment` format.
    ///
    /// Lines that do not start with `0x` are ignored. An empty unicode column
    /// (or a `DBCS LEAD BYTE` comment) marks a lead byte.
    pub fn parse(name: &str, text: &str) -> Self {
        let mut cp = Self::empty(name);
        for line in text.lines() {
            if !line.starts_with("0x") {
                continue;
            }
            let mut columns = line.split('\t');
            let Some(unit) = columns.next().and_then(parse_hex) else {
                continue;
            };
            let unicode = columns.next().unwrap_or("");
            let comment = columns.next().unwrap_or("");

            if unicode.is_empty() || comment.contains("LEAD BYTE") {
                if unit < 0x100 {
                    cp.lead_bytes[unit as usize] = true;
                }
                continue;
            }
            if let Some(u) = parse_hex(unicode.trim()) {
                cp.insert(unit, u);
            }
        }
        cp
    }

    /// Load `<dir>/<name>.txt`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, BridgeError> {
        let path = dir.join(format!("{name}.txt"));
        let text = fs::read_to_string(&path).map_err(|source| BridgeError::CodepageNotFound {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;
        let cp = Self::parse(name, &text);
        log::debug!(
            "loaded codepage {} ({} units) from {}",
            name,
            cp.to_unicode.len(),
            path.display()
        );
        Ok(cp)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `byte` starts a double-byte sequence.
    pub fn is_lead_byte(&self, byte: u8) -> bool {
        self.lead_bytes[byte as usize]
    }

    /// Encode a managed string. Characters without a mapping are dropped.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for unit in text.encode_utf16() {
            if unit == 0 {
                break;
            }
            let Some(&v) = self.from_unicode.get(&unit) else {
                continue;
            };
            if v > 0xFF {
                out.push((v >> 8) as u8);
            }
            out.push(v as u8);
        }
        out
    }

    /// Decode host bytes, stopping at the first zero unit.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut units = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let mut unit = bytes[i] as u16;
            if self.is_lead_byte(bytes[i]) && i + 1 < bytes.len() {
                i += 1;
                unit = (unit << 8) | bytes[i] as u16;
            }
            i += 1;
            if unit == 0 {
                break;
            }
            if let Some(&u) = self.to_unicode.get(&unit) {
                units.push(u);
            }
        }
        String::from_utf16_lossy(&units)
    }
}

fn parse_hex(text: &str) -> Option<u16> {
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    u16::from_str_radix(digits, 16).ok()
}
