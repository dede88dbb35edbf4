//! Just enough markup scanning to read the flight board.
//!
//! Works on the raw page text: finds elements by tag name and class token,
//! matching nested elements of the same tag so a row's closing tag is not
//! confused with a cell's. Comments and `<script>`/`<style>` bodies are
//! blanked out before searching, so markup inside them is never matched.
//! Malformed markup never errors; an unclosed element simply runs to the
//! end of the input.

/// An element located in a document
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    /// The opening tag, including `<` and `>`
    pub open_tag: &'a str,
    /// Everything between the opening and the matching closing tag
    pub inner: &'a str,
}

impl<'a> Element<'a> {
    pub fn has_class(&self, class: &str) -> bool {
        has_class_token(self.open_tag, class)
    }

    /// Text content with tags removed, entities decoded and whitespace collapsed
    pub fn text(&self) -> String {
        text_content(self.inner)
    }

    /// First descendant `tag` element carrying `class`
    pub fn find(&self, tag: &str, class: &str) -> Option<Element<'a>> {
        find_first(self.inner, tag, class)
    }
}

/// All non-overlapping `tag` elements carrying `class`, in document order
pub fn find_all<'a>(doc: &'a str, tag: &str, class: &str) -> Vec<Element<'a>> {
    let lc = mask_ignored(doc).to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();

    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((start, open_end)) = next_open_tag(&lc, &tag, pos) {
        let open_tag = &doc[start..open_end];
        if !has_class_token(open_tag, class) {
            pos = open_end;
            continue;
        }

        let (inner_end, end) = matching_close(&lc, &tag, open_end);
        out.push(Element {
            open_tag,
            inner: &doc[open_end..inner_end],
        });
        pos = end;
    }
    out
}

/// First `tag` element carrying `class`
pub fn find_first<'a>(doc: &'a str, tag: &str, class: &str) -> Option<Element<'a>> {
    let lc = mask_ignored(doc).to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();

    let mut pos = 0usize;
    while let Some((start, open_end)) = next_open_tag(&lc, &tag, pos) {
        let open_tag = &doc[start..open_end];
        if has_class_token(open_tag, class) {
            let (inner_end, _) = matching_close(&lc, &tag, open_end);
            return Some(Element {
                open_tag,
                inner: &doc[open_end..inner_end],
            });
        }
        pos = open_end;
    }
    None
}

/// Strip tags, decode entities and collapse whitespace
pub fn text_content(fragment: &str) -> String {
    let visible = mask_ignored(fragment);
    let mut stripped = String::with_capacity(visible.len());
    let mut in_tag = false;
    for ch in visible.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&stripped))
}

/// Copy of `source` with comments and script/style elements replaced by
/// spaces. Byte offsets are preserved, so indices into the result are valid
/// in `source`.
fn mask_ignored(source: &str) -> String {
    let lc = source.to_ascii_lowercase();
    let mut out = String::with_capacity(source.len());
    let mut pos = 0usize;
    while let Some((start, end)) = next_ignored(&lc, pos) {
        out.push_str(&source[pos..start]);
        out.extend(std::iter::repeat(' ').take(end - start));
        pos = end;
    }
    out.push_str(&source[pos..]);
    out
}

/// Next comment or script/style element at or after `from`.
/// An unterminated one runs to the end of the input.
fn next_ignored(lc: &str, from: usize) -> Option<(usize, usize)> {
    let comment = lc
        .get(from..)?
        .find("<!--")
        .map(|i| (from + i, from + i + 4, "-->"));
    let script = next_open_tag(lc, "script", from).map(|(start, end)| (start, end, "</script"));
    let style = next_open_tag(lc, "style", from).map(|(start, end)| (start, end, "</style"));

    let (start, body, terminator) = [comment, script, style]
        .into_iter()
        .flatten()
        .min_by_key(|(start, _, _)| *start)?;

    let end = match lc.get(body..).and_then(|s| s.find(terminator)) {
        Some(at) => {
            let at = body + at;
            lc[at..].find('>').map(|i| at + i + 1).unwrap_or(lc.len())
        }
        None => lc.len(),
    };
    Some((start, end))
}

fn has_class_token(open_tag: &str, class: &str) -> bool {
    attribute(open_tag, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Start of the next `<tag` opening (not `<tagfoo`) at or after `from`,
/// and the index just past its `>`
fn next_open_tag(lc: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let needle = format!("<{tag}");
    let mut pos = from;
    loop {
        let start = lc.get(pos..)?.find(&needle)? + pos;
        let after = start + needle.len();
        match lc.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {
                let open_end = lc[after..].find('>')? + after + 1;
                return Some((start, open_end));
            }
            Some(_) => pos = after,
            None => return None,
        }
    }
}

/// Returns (start of the matching close tag, index just past it).
/// Unclosed elements run to the end of the input.
fn matching_close(lc: &str, tag: &str, from: usize) -> (usize, usize) {
    let close = format!("</{tag}");
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let Some(close_at) = lc.get(pos..).and_then(|s| s.find(&close)).map(|i| i + pos) else {
            return (lc.len(), lc.len());
        };

        match next_open_tag(lc, tag, pos) {
            Some((open_at, open_end)) if open_at < close_at => {
                if !lc[..open_end].ends_with("/>") {
                    depth += 1;
                }
                pos = open_end;
            }
            _ => {
                depth -= 1;
                let end = lc[close_at..]
                    .find('>')
                    .map(|i| close_at + i + 1)
                    .unwrap_or(lc.len());
                if depth == 0 {
                    return (close_at, end);
                }
                pos = end;
            }
        }
    }
}

/// Value of `name` in an opening tag; handles double, single and no quotes
fn attribute<'a>(open_tag: &'a str, name: &str) -> Option<&'a str> {
    let lc = open_tag.to_ascii_lowercase();
    let bytes = lc.as_bytes();
    let mut pos = 0usize;

    while let Some(rel) = lc[pos..].find(name) {
        let at = pos + rel;
        pos = at + name.len();

        let preceded_by_space = at > 0 && bytes[at - 1].is_ascii_whitespace();
        if !preceded_by_space {
            continue;
        }

        let mut i = at + name.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        return match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let value_start = i + 1;
                let value_end = lc[value_start..]
                    .find(q as char)
                    .map(|e| value_start + e)
                    .unwrap_or(lc.len());
                Some(&open_tag[value_start..value_end])
            }
            Some(_) => {
                let value_end = lc[i..]
                    .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .map(|e| i + e)
                    .unwrap_or(lc.len());
                Some(&open_tag[i..value_end])
            }
            None => None,
        };
    }
    None
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "nbsp" => Some(' '),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
