//! PDF text extraction.
//!
//! Walks every content stream in the file, inflating `FlateDecode` streams,
//! and replays the text-showing operators (`Tj`, `TJ`, `'`, `"`) found
//! between `BT` and `ET`. Each text object ends a line.
//!
//! Only simple and standard-encoded fonts are decoded; text drawn through
//! CID fonts without a usable byte encoding comes out as Latin-1 noise.
//! There is no OCR for scanned pages.

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::ExtractError;

const STREAM: &[u8] = b"stream";
const END_STREAM: &[u8] = b"endstream";

/// TJ adjustments more negative than this (thousandths of an em) are
/// treated as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractError::Pdf("missing %PDF header".to_string()));
    }

    let mut text = String::new();
    let mut streams = 0usize;

    for (dict, data) in raw_streams(bytes) {
        let Some(content) = decode_stream(dict, data) else {
            continue;
        };
        streams += 1;
        text.push_str(&show_text(&content));
    }

    if streams == 0 && !contains(bytes, STREAM) {
        return Err(ExtractError::Pdf("no content streams found".to_string()));
    }

    Ok(text)
}

/// Yield `(dictionary, data)` for every `stream ... endstream` object.
fn raw_streams(bytes: &[u8]) -> Vec<(&[u8], &[u8])> {
    let mut streams = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = find(&bytes[cursor..], STREAM) {
        let keyword = cursor + offset;
        cursor = keyword + STREAM.len();

        // "endstream" also contains "stream"
        if keyword >= 3 && &bytes[keyword - 3..keyword] == b"end" {
            continue;
        }

        let mut data_start = cursor;
        if bytes.get(data_start) == Some(&b'\r') {
            data_start += 1;
        }
        if bytes.get(data_start) == Some(&b'\n') {
            data_start += 1;
        }

        let Some(end_offset) = find(&bytes[data_start..], END_STREAM) else {
            break;
        };
        let data_end = data_start + end_offset;

        let dict_start = rfind(&bytes[..keyword], b"obj").map_or(0, |i| i + 3);
        streams.push((&bytes[dict_start..keyword], &bytes[data_start..data_end]));
        cursor = data_end + END_STREAM.len();
    }

    streams
}

/// Decode a stream's data, or `None` for streams that cannot hold page text.
fn decode_stream(dict: &[u8], data: &[u8]) -> Option<Vec<u8>> {
    const NON_CONTENT: [&[u8]; 5] = [b"/Image", b"/XRef", b"/Metadata", b"/ObjStm", b"/Length1"];
    if NON_CONTENT.iter().any(|marker| contains(dict, marker)) {
        return None;
    }

    if contains(dict, b"/FlateDecode") {
        let mut inflated = Vec::new();
        return match ZlibDecoder::new(data).read_to_end(&mut inflated) {
            Ok(_) => Some(inflated),
            Err(e) => {
                tracing::trace!(error = %e, "Skipping undecodable stream");
                None
            }
        };
    }

    if contains(dict, b"/Filter") {
        return None;
    }

    Some(data.to_vec())
}

#[derive(Debug)]
enum Operand {
    Str(Vec<u8>),
    Num(f64),
    ArrayStart,
    ArrayEnd,
}

/// Replay text operators from a content stream.
fn show_text(content: &[u8]) -> String {
    let mut out = String::new();
    let mut line = String::new();
    let mut operands: Vec<Operand> = Vec::new();
    let mut in_text = false;
    let mut line_y: Option<f64> = None;
    let mut i = 0;

    while i < content.len() {
        let b = content[i];
        match b {
            b'%' => {
                while i < content.len() && content[i] != b'\n' && content[i] != b'\r' {
                    i += 1;
                }
            }
            b'(' => {
                let (s, next) = literal_string(content, i + 1);
                operands.push(Operand::Str(s));
                i = next;
                continue;
            }
            b'<' if content.get(i + 1) == Some(&b'<') => i += 1,
            b'>' if content.get(i + 1) == Some(&b'>') => i += 1,
            b'<' => {
                let (s, next) = hex_string(content, i + 1);
                operands.push(Operand::Str(s));
                i = next;
                continue;
            }
            b'[' => operands.push(Operand::ArrayStart),
            b']' => operands.push(Operand::ArrayEnd),
            b'/' => {
                i += 1;
                while i < content.len() && !is_delimiter(content[i]) {
                    i += 1;
                }
                continue;
            }
            _ if b.is_ascii_whitespace() || is_delimiter(b) => {}
            _ => {
                let start = i;
                while i < content.len() && !is_delimiter(content[i]) {
                    i += 1;
                }
                let word = &content[start..i];
                if let Some(n) = std::str::from_utf8(word).ok().and_then(|w| w.parse().ok()) {
                    operands.push(Operand::Num(n));
                    continue;
                }

                match word {
                    b"BT" => {
                        in_text = true;
                        line_y = None;
                    }
                    b"ET" => {
                        in_text = false;
                        end_line(&mut out, &mut line);
                    }
                    b"Tj" if in_text => append_strings(&mut line, &operands),
                    b"'" | b"\"" if in_text => {
                        end_line(&mut out, &mut line);
                        append_strings(&mut line, &operands);
                    }
                    b"TJ" if in_text => append_array(&mut line, &operands),
                    b"T*" if in_text => end_line(&mut out, &mut line),
                    b"Td" | b"TD" if in_text => {
                        if let [.., Operand::Num(_), Operand::Num(ty)] = operands.as_slice() {
                            if *ty != 0.0 {
                                end_line(&mut out, &mut line);
                                line_y = line_y.map(|y| y + ty);
                            }
                        }
                    }
                    b"Tm" if in_text => {
                        if let Some(Operand::Num(f)) = operands.last().filter(|_| operands.len() >= 6) {
                            // The sixth operand is the absolute baseline.
                            if line_y.is_some_and(|y| y != *f) {
                                end_line(&mut out, &mut line);
                            }
                            line_y = Some(*f);
                        }
                    }
                    b"ID" => i = skip_inline_image(content, i),
                    _ => {}
                }
                operands.clear();
                continue;
            }
        }
        i += 1;
    }

    end_line(&mut out, &mut line);
    out
}

fn end_line(out: &mut String, line: &mut String) {
    if !line.is_empty() {
        out.push_str(line.trim_end());
        out.push('\n');
        line.clear();
    }
}

fn append_strings(line: &mut String, operands: &[Operand]) {
    for operand in operands {
        if let Operand::Str(s) = operand {
            line.push_str(&decode_pdf_string(s));
        }
    }
}

fn append_array(line: &mut String, operands: &[Operand]) {
    for operand in operands {
        match operand {
            Operand::Str(s) => line.push_str(&decode_pdf_string(s)),
            Operand::Num(n) if *n < TJ_SPACE_THRESHOLD && !line.ends_with(' ') => line.push(' '),
            _ => {}
        }
    }
}

/// Parse a literal string starting just after its opening parenthesis.
fn literal_string(content: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut out = Vec::new();
    let mut depth = 1;

    while i < content.len() {
        let b = content[i];
        match b {
            b'\\' => {
                i += 1;
                let Some(&esc) = content.get(i) else { break };
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'\r' => {
                        if content.get(i + 1) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while digits < 3 {
                            match content.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xff) as u8);
                        continue;
                    }
                    other => out.push(other),
                }
            }
            b'(' => {
                depth += 1;
                out.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return (out, i + 1);
                }
                out.push(b);
            }
            _ => out.push(b),
        }
        i += 1;
    }

    (out, i)
}

/// Parse a hex string starting just after its opening angle bracket.
fn hex_string(content: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut nibbles = Vec::new();
    while i < content.len() && content[i] != b'>' {
        if let Some(v) = (content[i] as char).to_digit(16) {
            nibbles.push(v as u8);
        }
        i += 1;
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }
    let bytes = nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect();
    (bytes, (i + 1).min(content.len()))
}

/// Skip inline image data following an `ID` operator.
fn skip_inline_image(content: &[u8], i: usize) -> usize {
    let mut j = i;
    while j + 2 < content.len() {
        if content[j].is_ascii_whitespace()
            && &content[j + 1..j + 3] == b"EI"
            && content.get(j + 3).map_or(true, |b| is_delimiter(*b))
        {
            return j + 3;
        }
        j += 1;
    }
    content.len()
}

/// UTF-16BE when byte-order-marked, otherwise Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b"()<>[]{}/%".contains(&b)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}
