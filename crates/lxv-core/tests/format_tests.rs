use lxv_core::format::{self, Line};
use lxv_core::lookahead::Lookahead;
use lxv_core::text::{TextLines, TextSink};
use std::io::{self, Read};

// ============================================================================
// Line classification
// ============================================================================

#[test]
fn classify_separator_declaration() {
    assert_eq!(format::classify("---sep:∤"), Line::Separator(Some('∤')));
    assert_eq!(format::classify("---sep:,extra"), Line::Separator(Some(',')));
    assert_eq!(format::classify("---sep:"), Line::Separator(None));
}

#[test]
fn classify_sheet_boundary_keeps_name_verbatim() {
    assert_eq!(format::classify("---sheet:Orders"), Line::Sheet("Orders"));
    assert_eq!(format::classify("---sheet:"), Line::Sheet(""));
    assert_eq!(format::classify("---sheet: padded "), Line::Sheet(" padded "));
    assert_eq!(format::classify("---sheet:a:b"), Line::Sheet("a:b"));
}

#[test]
fn classify_unknown_sentinels_and_rows() {
    assert_eq!(format::classify("---meta:x"), Line::Sentinel("---meta:x"));
    assert_eq!(format::classify("---"), Line::Sentinel("---"));
    assert_eq!(format::classify("--not"), Line::Row("--not"));
    assert_eq!(format::classify(""), Line::Row(""));
    assert_eq!(format::classify(" ---sheet:x"), Line::Row(" ---sheet:x"));
}

#[test]
fn is_sentinel_matches_any_metadata_line() {
    assert!(format::is_sentinel("---sheet:A"));
    assert!(format::is_sentinel("---whatever"));
    assert!(!format::is_sentinel("a∤b"));
    assert!(!format::is_sentinel("--"));
}

// ============================================================================
// Field splitting
// ============================================================================

fn split(line: &str, limit: Option<usize>) -> Vec<String> {
    let mut out = Vec::new();
    let count = format::split_fields(line, ',', limit, &mut out);
    assert_eq!(count, out.len());
    out
}

#[test]
fn split_keeps_interior_empty_fields() {
    assert_eq!(split("a,,c", None), ["a", "", "c"]);
    assert_eq!(split(",b", None), ["", "b"]);
}

#[test]
fn split_drops_trailing_empty_fields() {
    assert_eq!(split("a,b,,", None), ["a", "b"]);
    assert_eq!(split(",,,", None), Vec::<String>::new());
    assert_eq!(split("", None), Vec::<String>::new());
}

#[test]
fn split_truncates_to_limit() {
    assert_eq!(split("a,b,c,d", Some(2)), ["a", "b"]);
    assert_eq!(split("a,,c", Some(2)), ["a"]);
    assert_eq!(split("a,b", Some(0)), Vec::<String>::new());
}

#[test]
fn split_reuses_output_buffer() {
    let mut out = vec!["stale".to_string(); 5];
    format::split_fields("x", ',', None, &mut out);
    assert_eq!(out, ["x"]);
}

#[test]
fn split_preserves_whitespace_and_multibyte_separator() {
    let mut out = Vec::new();
    format::split_fields(" a ∤ 日本 ∤", '∤', None, &mut out);
    assert_eq!(out, [" a ", " 日本 "]);
}

// ============================================================================
// Escaping and line builders
// ============================================================================

#[test]
fn escape_field_borrows_when_clean() {
    assert!(matches!(format::escape_field("plain"), std::borrow::Cow::Borrowed(_)));
}

#[test]
fn escape_field_rewrites_control_characters() {
    assert_eq!(format::escape_field("a\r\nb"), "a\\nb");
    assert_eq!(format::escape_field("a\tb"), "a\\tb");
    assert_eq!(format::escape_field("\r"), "");
}

#[test]
fn declaration_and_sheet_lines() {
    assert_eq!(format::declaration_line('∤'), "---sep:∤");
    assert_eq!(format::sheet_line("Q1"), "---sheet:Q1");
    assert_eq!(format::sheet_line("a\nb"), "---sheet:a\\nb");
}

#[test]
fn lxv_path_detection() {
    assert!(format::is_lxv_path("book.lxv"));
    assert!(format::is_lxv_path("/tmp/BOOK.LXV"));
    assert!(!format::is_lxv_path("book.csv"));
    assert!(!format::is_lxv_path("lxv"));
    assert!(!format::is_lxv_path("book.lxv.bak"));
}

// ============================================================================
// Encoded text lines
// ============================================================================

fn lines_of(bytes: &[u8], encoding: &'static encoding_rs::Encoding) -> Vec<String> {
    TextLines::new(bytes, encoding)
        .collect::<io::Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn text_lines_split_lf_and_crlf() {
    let lines = lines_of(b"a\r\nb\nc\r\n", encoding_rs::UTF_8);
    assert_eq!(lines, ["a", "b", "c"]);
}

#[test]
fn text_lines_yield_unterminated_last_line() {
    assert_eq!(lines_of(b"a\nlast", encoding_rs::UTF_8), ["a", "last"]);
    assert_eq!(lines_of(b"", encoding_rs::UTF_8), Vec::<String>::new());
    assert_eq!(lines_of(b"\n", encoding_rs::UTF_8), [""]);
}

#[test]
fn text_lines_strip_utf8_bom() {
    assert_eq!(lines_of(b"\xEF\xBB\xBFfirst\n", encoding_rs::UTF_8), ["first"]);
}

#[test]
fn text_lines_bom_overrides_configured_encoding() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "x∤y\nz\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    assert_eq!(lines_of(&bytes, encoding_rs::WINDOWS_1252), ["x∤y", "z"]);
}

#[test]
fn text_lines_multibyte_characters_across_chunk_boundaries() {
    // long enough to cross several read chunks, with 3-byte characters straddling them
    let row = "∤日本語∤".repeat(700);
    let text = format!("{row}\n{row}\n");
    let lines = lines_of(text.as_bytes(), encoding_rs::UTF_8);
    assert_eq!(lines, [row.clone(), row]);
}

/// Hands out one byte per read call.
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.split_first() {
            Some((first, rest)) if !buf.is_empty() => {
                buf[0] = *first;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[test]
fn text_lines_survive_byte_at_a_time_reads() {
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("売上\n東京,100\n");
    let lines: Vec<String> = TextLines::new(Trickle(&bytes), encoding_rs::SHIFT_JIS)
        .collect::<io::Result<_>>()
        .unwrap();
    assert_eq!(lines, ["売上", "東京,100"]);
}

#[test]
fn text_lines_single_line_spanning_many_chunks() {
    let long = "abcdefgh".repeat(256 * 1024);
    let text = format!("{long}\nshort\n{long}");
    let lines = lines_of(text.as_bytes(), encoding_rs::UTF_8);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].len(), long.len());
    assert!(lines[0] == long && lines[2] == long);
    assert_eq!(lines[1], "short");
}

#[test]
fn text_lines_crlf_split_across_chunks() {
    // the \r ends the first 8 KiB read and the \n starts the second
    let first = "x".repeat(8 * 1024 - 1);
    let text = format!("{first}\r\nnext\r\n");
    let lines = lines_of(text.as_bytes(), encoding_rs::UTF_8);
    assert_eq!(lines, [first, "next".to_string()]);
}

#[test]
fn text_lines_byte_at_a_time_long_line() {
    let long = "0123456789".repeat(2_000);
    let text = format!("{long}\r\n{long}\n");
    let lines: Vec<String> = TextLines::new(Trickle(text.as_bytes()), encoding_rs::UTF_8)
        .collect::<io::Result<_>>()
        .unwrap();
    assert_eq!(lines, [long.clone(), long]);
}

#[test]
fn text_sink_writes_utf16be() {
    let mut out = Vec::new();
    let mut sink = TextSink::new(&mut out, encoding_rs::UTF_16BE);
    sink.write_line("é").unwrap();
    sink.finish().unwrap();
    assert_eq!(out, [0x00u8, 0xE9, 0x00, 0x0A]);
}

#[test]
fn text_sink_substitutes_unmappable_characters() {
    let mut out = Vec::new();
    let mut sink = TextSink::new(&mut out, encoding_rs::WINDOWS_1252);
    sink.write_line("∤").unwrap();
    sink.finish().unwrap();
    assert_eq!(out, b"&#8740;\n");
}

// ============================================================================
// Lookahead
// ============================================================================

fn lookahead(lines: &[&str]) -> Lookahead<impl Iterator<Item = io::Result<String>>> {
    let owned: Vec<io::Result<String>> = lines.iter().map(|l| Ok(l.to_string())).collect();
    Lookahead::new(owned.into_iter())
}

#[test]
fn lookahead_peek_does_not_consume() {
    let mut la = lookahead(&["a", "b"]);
    assert_eq!(la.peek().unwrap(), Some("a"));
    assert_eq!(la.peek().unwrap(), Some("a"));
    assert_eq!(la.line_number(), 0);
    assert_eq!(la.consume().unwrap().as_deref(), Some("a"));
    assert_eq!(la.line_number(), 1);
    assert_eq!(la.consume().unwrap().as_deref(), Some("b"));
    assert_eq!(la.consume().unwrap(), None);
    assert_eq!(la.line_number(), 2);
}

#[test]
fn lookahead_next_if_leaves_rejected_line() {
    let mut la = lookahead(&["row", "---sheet:B", "after"]);
    assert_eq!(la.next_if(|l| !format::is_sentinel(l)).unwrap().as_deref(), Some("row"));
    assert_eq!(la.next_if(|l| !format::is_sentinel(l)).unwrap(), None);
    assert_eq!(la.peek().unwrap(), Some("---sheet:B"));
    assert_eq!(la.line_number(), 1);
}

#[test]
fn lookahead_propagates_source_errors() {
    let source = vec![
        Ok("a".to_string()),
        Err(io::Error::new(io::ErrorKind::InvalidData, "bad bytes")),
    ];
    let mut la = Lookahead::new(source.into_iter());
    assert!(la.consume().unwrap().is_some());
    let err = la.peek().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}
