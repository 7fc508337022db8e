//! Lexer for component markup using logos

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// Comment body without the `<!--` and `-->` delimiters
    #[token("<!--", lex_comment)]
    Comment(String),

    /// `<!DOCTYPE ...>` and other declarations, kept verbatim
    #[regex(r"<![^-][^>]*>", |lex| lex.slice().to_string())]
    Doctype(String),

    /// Closing tag name
    #[regex(r"</[A-Za-z][^>]*>", close_tag_name)]
    CloseTag(String),

    /// Full opening tag including attributes, split by [`parse_open_tag`]
    #[regex(r#"<[A-Za-z]([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice().to_string())]
    OpenTag(String),

    #[regex(r"[^<]+", |lex| lex.slice().to_string())]
    Text(String),
}

fn lex_comment(lex: &mut Lexer<Token>) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find("-->")?;
    let body = rest[..end].to_string();
    lex.bump(end + 3);
    Some(body)
}

fn close_tag_name(lex: &mut Lexer<Token>) -> String {
    let s = lex.slice();
    s[2..s.len() - 1].trim().to_string()
}

/// Pieces of an opening tag
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split the raw text of an opening tag into name and attributes
///
/// Attribute values have their character references decoded, so values
/// written by the serializer read back unchanged.
pub fn parse_open_tag(raw: &str) -> OpenTag {
    let inner = raw
        .strip_prefix('<')
        .unwrap_or(raw)
        .strip_suffix('>')
        .unwrap_or(raw);
    let self_closing = inner.ends_with('/');
    let chars: Vec<char> = inner.chars().collect();
    let mut pos = 0;

    let mut name = String::new();
    while pos < chars.len() && !chars[pos].is_whitespace() && chars[pos] != '/' {
        name.push(chars[pos]);
        pos += 1;
    }

    let mut attrs = Vec::new();
    loop {
        while pos < chars.len() && (chars[pos].is_whitespace() || chars[pos] == '/') {
            pos += 1;
        }
        if pos >= chars.len() {
            break;
        }

        let mut attr_name = String::new();
        while pos < chars.len()
            && !chars[pos].is_whitespace()
            && chars[pos] != '='
            && chars[pos] != '/'
        {
            attr_name.push(chars[pos]);
            pos += 1;
        }
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }

        let mut value = String::new();
        if pos < chars.len() && chars[pos] == '=' {
            pos += 1;
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
            if pos < chars.len() && (chars[pos] == '"' || chars[pos] == '\'') {
                let quote = chars[pos];
                pos += 1;
                while pos < chars.len() && chars[pos] != quote {
                    value.push(chars[pos]);
                    pos += 1;
                }
                pos += 1;
            } else {
                while pos < chars.len() && !chars[pos].is_whitespace() {
                    value.push(chars[pos]);
                    pos += 1;
                }
                // `<img src=a.png/>`
                if self_closing && pos >= chars.len() && value.ends_with('/') {
                    value.pop();
                }
            }
        }

        if !attr_name.is_empty() {
            attrs.push((attr_name, decode_references(&value)));
        }
    }

    OpenTag {
        name,
        attrs,
        self_closing,
    }
}

/// Decode named and numeric character references. Unknown references are
/// kept as written.
fn decode_references(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| reference_char(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn reference_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Lex input string into tokens with spans, dropping unmatched input
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}
