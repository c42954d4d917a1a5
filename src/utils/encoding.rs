use crate::index::types::PostingItem;
use std::io::{self, Read, Write};

/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length integer from a slice
/// Returns (value, bytes_consumed)
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 32 {
            return None; // Overflow
        }

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None // Incomplete
}

/// Encode a posting as `(doc gap, tf)` varint pairs.
///
/// Items must be strictly ascending by doc id.
pub fn encode_posting(items: &[PostingItem], buf: &mut Vec<u8>) {
    let mut prev = 0u32;
    for item in items {
        debug_assert!(prev == 0 || item.doc_id > prev);
        encode_varint(item.doc_id - prev, buf);
        encode_varint(item.tf, buf);
        prev = item.doc_id;
    }
}

/// Decode one `(gap, tf)` pair relative to `prev`.
/// Returns the item and the number of bytes consumed.
#[inline]
pub fn decode_posting_item(buf: &[u8], prev: u32) -> Option<(PostingItem, usize)> {
    let (gap, n1) = decode_varint(buf)?;
    let (tf, n2) = decode_varint(&buf[n1..])?;
    let doc_id = prev.checked_add(gap)?;
    Some((PostingItem::new(doc_id, tf), n1 + n2))
}

/// Decode a whole posting. Stops at the first malformed pair.
pub fn decode_posting(buf: &[u8]) -> Vec<PostingItem> {
    let mut items = Vec::new();
    let mut prev = 0u32;
    let mut pos = 0;

    while pos < buf.len() {
        match decode_posting_item(&buf[pos..], prev) {
            Some((item, consumed)) => {
                prev = item.doc_id;
                items.push(item);
                pos += consumed;
            }
            None => break,
        }
    }

    items
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a u32 in little-endian format
pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Write a u64 in little-endian format
pub fn write_u64_le<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a u64 in little-endian format
pub fn read_u64_le<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Write a u16 in little-endian format
pub fn write_u16_le<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a u16 in little-endian format
pub fn read_u16_le<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_boundaries() {
        for value in [0, 127, 128, 16384, u32::MAX] {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            assert_eq!(decode_varint(&buf), Some((value, buf.len())));
        }
    }

    #[test]
    fn test_varint_incomplete() {
        assert_eq!(decode_varint(&[0x80, 0x80]), None);
    }

    #[test]
    fn test_posting_gaps_are_small() {
        let items = vec![
            PostingItem::new(1_000_000, 2),
            PostingItem::new(1_000_001, 1),
            PostingItem::new(1_000_003, 7),
        ];
        let mut buf = Vec::new();
        encode_posting(&items, &mut buf);

        // first id takes 3 bytes, later gaps and tfs one byte each
        assert_eq!(buf.len(), 3 + 1 + 4);
        assert_eq!(decode_posting(&buf), items);
    }

    #[test]
    fn test_decode_posting_rejects_overflowing_gap() {
        let mut buf = Vec::new();
        encode_varint(u32::MAX, &mut buf);
        encode_varint(1, &mut buf);
        encode_varint(5, &mut buf);
        encode_varint(1, &mut buf);

        // second gap would wrap past u32::MAX
        let items = decode_posting(&buf);
        assert_eq!(items, vec![PostingItem::new(u32::MAX, 1)]);
    }
}
