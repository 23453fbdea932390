use std::borrow::Cow;

/// Placeholder style a caller wrote its statement in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Format-style `%s` markers (with `%%` for a literal percent sign).
    Format,
    /// Question-mark markers, bare `?` or numbered `?1`.
    Qmark,
}

/// How to resolve translation for a call relative to the connection default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Follow the connection's default setting.
    ConnectionDefault,
    /// Force translation on, regardless of the connection default.
    ForceOn,
    /// Force translation off, regardless of the connection default.
    ForceOff,
}

impl TranslationMode {
    #[must_use]
    pub fn resolve(self, connection_default: bool) -> bool {
        match self {
            TranslationMode::ConnectionDefault => connection_default,
            TranslationMode::ForceOn => true,
            TranslationMode::ForceOff => false,
        }
    }
}

/// Per-call options for the execute path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub translation: TranslationMode,
    pub style: PlaceholderStyle,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            translation: TranslationMode::ConnectionDefault,
            style: PlaceholderStyle::Format,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_translation(mut self, translation: TranslationMode) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: PlaceholderStyle) -> Self {
        self.style = style;
        self
    }
}

/// Rewrite `%s` or `?` placeholders into N1QL positional `$N` parameters.
///
/// String literals, backtick identifiers and comments are left alone. The
/// number of markers is not compared with any parameter list.
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders<'a>(
    sql: &'a str,
    style: PlaceholderStyle,
    enabled: bool,
) -> Cow<'a, str> {
    if !enabled {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut state = State::Normal;
    let mut next_param = 1usize;
    let mut start = 0;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    // Replacements only ever swap ASCII markers, so every cut lands on a char boundary.
    let replace = |out: &mut Option<String>, from: usize, to: usize, with: &str, start: &mut usize| {
        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
        buf.push_str(&sql[*start..from]);
        buf.push_str(with);
        *start = to;
    };

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::Quoted(b'\''),
                b'"' => state = State::Quoted(b'"'),
                b'`' => state = State::Quoted(b'`'),
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment;
                    idx += 1;
                }
                b'%' if style == PlaceholderStyle::Format => match bytes.get(idx + 1).copied() {
                    Some(b's') => {
                        replace(&mut out, idx, idx + 2, &format!("${next_param}"), &mut start);
                        next_param += 1;
                        idx += 1;
                    }
                    Some(b'%') => {
                        replace(&mut out, idx, idx + 2, "%", &mut start);
                        idx += 1;
                    }
                    _ => {}
                },
                b'?' if style == PlaceholderStyle::Qmark => {
                    if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        replace(&mut out, idx, digits_end, &format!("${digits}"), &mut start);
                        idx = digits_end - 1;
                    } else {
                        replace(&mut out, idx, idx + 1, &format!("${next_param}"), &mut start);
                        next_param += 1;
                    }
                }
                _ => {}
            },
            State::Quoted(quote) => {
                if b == b'\\' && quote != b'`' {
                    idx += 1; // skip escaped char
                } else if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // doubled quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[start..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    Quoted(u8),
    LineComment,
    BlockComment,
}

fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}
