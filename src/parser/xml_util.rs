//! Small quick-xml helpers shared by the linkbase and instance parsers.
//!
//! XBRL documents mix namespace prefixes freely (`xlink:order` vs. a bare
//! `order` on some vendor tools' output), so attribute and element lookups
//! here match on local name rather than a fully qualified name.

use quick_xml::events::BytesStart;
use quick_xml::name::QName;
use quick_xml::Reader;

pub fn local_name(name: QName) -> String {
    let bytes = name.as_ref();
    match bytes.iter().rposition(|b| *b == b':') {
        Some(idx) => String::from_utf8_lossy(&bytes[idx + 1..]).into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Look up an attribute by local name, ignoring whatever namespace prefix
/// it carries (`xlink:order` and `order` both match `"order"`).
pub fn attr(element: &BytesStart, wanted_local_name: &str) -> Option<String> {
    element.attributes().filter_map(|a| a.ok()).find_map(|a| {
        if local_name(a.key) == wanted_local_name {
            Some(String::from_utf8_lossy(&a.value).into_owned())
        } else {
            None
        }
    })
}

/// Read the text content of the current element through to its matching
/// end tag. Assumes the reader is positioned just after the element's
/// start tag.
pub fn read_text(reader: &mut Reader<&[u8]>) -> String {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 0i32;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Text(e)) => {
                if let Ok(decoded) = e.unescape() {
                    text.push_str(&decoded);
                }
            }
            Ok(quick_xml::events::Event::Start(_)) => depth += 1,
            Ok(quick_xml::events::Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    text.trim().to_string()
}

/// Locate the byte offset range of an embedded `<xbrli:xbrl ...> ...
/// </xbrli:xbrl>` (or bare `<xbrl ...>`) region inside a larger document,
/// used for inline-XBRL detection. Returns `None` when no such region is
/// present, which callers treat as "this is not an XBRL-bearing document"
/// rather than an error.
pub fn find_xbrl_root(content: &str) -> Option<&str> {
    // Validate a canonical root element is present before proceeding, so a
    // non-SGML SEC error response (e.g. an S3 `NoSuchKey` HTML page) is
    // never mistaken for an XBRL document.
    let lower = content.to_ascii_lowercase();
    if lower.contains("nosuchkey") || lower.contains("<error>") {
        return None;
    }

    for (open_tag, close_tag) in [
        ("<xbrli:xbrl", "</xbrli:xbrl>"),
        ("<xbrl:xbrl", "</xbrl:xbrl>"),
        ("<xbrl ", "</xbrl>"),
        ("<xbrl>", "</xbrl>"),
    ] {
        if let Some(start) = content.find(open_tag) {
            if let Some(end_rel) = content[start..].find(close_tag) {
                let end = start + end_rel + close_tag.len();
                return Some(&content[start..end]);
            }
        }
    }
    None
}

pub fn is_inline_xbrl(content: &str) -> bool {
    content.contains("xmlns:ix=") || content.contains("<ix:")
}
