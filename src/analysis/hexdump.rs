//! Canonical hex dump rendering.
//!
//! Sixteen bytes per row: offset, hex columns, then the printable-ASCII
//! column with `.` standing in for anything outside `0x20..=0x7E`.

use std::fmt::Write;

/// Bytes per dump row.
pub const ROW_WIDTH: usize = 16;

/// Whether a byte is in the printable-ASCII range.
pub fn is_printable(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

/// Render bytes as upper-case hex pairs separated by spaces.
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a dump of the first `max_bytes` bytes of `data`.
pub fn render(data: &[u8], max_bytes: usize) -> String {
    let shown = data.len().min(max_bytes);
    let mut out = String::with_capacity((shown / ROW_WIDTH + 4) * 80);

    let _ = writeln!(
        out,
        "Hex Dump (showing first {} of {} bytes):",
        shown,
        data.len()
    );
    out.push_str("Offset    00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F    ASCII\n");
    out.push_str("--------  -----------------------------------------------  ----------------\n");

    for (row, chunk) in data[..shown].chunks(ROW_WIDTH).enumerate() {
        let _ = write!(out, "{:08X}  ", row * ROW_WIDTH);

        for b in chunk {
            let _ = write!(out, "{:02X} ", b);
        }
        for _ in chunk.len()..ROW_WIDTH {
            out.push_str("   ");
        }

        out.push(' ');
        out.extend(
            chunk
                .iter()
                .map(|&b| if is_printable(b) { b as char } else { '.' }),
        );
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaced_hex() {
        assert_eq!(spaced_hex(&[0x44, 0x5A, 0x49, 0x50]), "44 5A 49 50");
        assert_eq!(spaced_hex(&[]), "");
    }

    #[test]
    fn test_render_rows() {
        let data: Vec<u8> = (0u8..40).collect();
        let dump = render(&data, 2048);
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines[0], "Hex Dump (showing first 40 of 40 bytes):");
        // three header lines plus three rows (16 + 16 + 8)
        assert_eq!(lines.len(), 6);
        assert!(lines[3].starts_with("00000000  00 01 02"));
        assert!(lines[5].starts_with("00000020  20 21 22"));
        assert!(lines[5].ends_with(" !\"#$%&'"));
    }

    #[test]
    fn test_render_bounded() {
        let data = vec![b'A'; 100];
        let dump = render(&data, 32);
        assert!(dump.starts_with("Hex Dump (showing first 32 of 100 bytes):"));
        assert_eq!(dump.lines().count(), 5);
    }

    #[test]
    fn test_render_ascii_column() {
        let dump = render(b"SAVE\x00\x01game", 2048);
        let row = dump.lines().nth(3).unwrap();
        assert!(row.ends_with("SAVE..game"));
    }
}
