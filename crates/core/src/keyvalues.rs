//! Entity-lump keyvalue blocks
//!
//! The map data parser hands the core brace-delimited blocks of
//! `"key" "value"` pairs, one block per entity. Order matters and keys
//! repeat (multiple connections on the same output are multiple pairs
//! with the same key), so this is an ordered pair list, not a map.
//!
//! The writer exists because template capture stores blocks as text and
//! re-parses them at instantiation time.

use crate::error::KeyValuesError;

/// One parsed entity block: ordered `(key, value)` pairs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyValues {
    pub pairs: Vec<(String, String)>,
}

impl KeyValues {
    /// First value for a key, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn classname(&self) -> Option<&str> {
        self.get("classname")
    }

    pub fn targetname(&self) -> Option<&str> {
        self.get("targetname")
    }

    /// Serialize back to block text; `parse_block` round-trips this
    pub fn to_text(&self) -> String {
        let mut out = String::from("{\n");
        for (k, v) in &self.pairs {
            out.push('"');
            out.push_str(k);
            out.push_str("\" \"");
            out.push_str(v);
            out.push_str("\"\n");
        }
        out.push_str("}\n");
        out
    }
}

/// Parse a single entity block from `text`
pub fn parse_block(text: &str) -> Result<KeyValues, KeyValuesError> {
    let mut blocks = parse_blocks(text)?;
    let first = blocks.drain(..).next().unwrap_or_default();
    Ok(first)
}

/// Parse every entity block in `text`
pub fn parse_blocks(text: &str) -> Result<Vec<KeyValues>, KeyValuesError> {
    let mut blocks = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    loop {
        skip_whitespace(&mut chars, &mut line);
        match chars.next() {
            None => return Ok(blocks),
            Some('{') => {
                let block_line = line;
                blocks.push(parse_block_body(&mut chars, &mut line, block_line)?);
            }
            Some(c) => {
                return Err(KeyValuesError::UnexpectedToken { line, token: c });
            }
        }
    }
}

fn parse_block_body(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: &mut usize,
    block_line: usize,
) -> Result<KeyValues, KeyValuesError> {
    let mut kv = KeyValues::default();
    loop {
        skip_whitespace(chars, line);
        match chars.next() {
            None => return Err(KeyValuesError::UnterminatedBlock(block_line)),
            Some('}') => return Ok(kv),
            Some('"') => {
                let key = read_quoted(chars, line)?;
                skip_whitespace(chars, line);
                match chars.next() {
                    Some('"') => {
                        let value = read_quoted(chars, line)?;
                        kv.pairs.push((key, value));
                    }
                    Some('}') | None => {
                        return Err(KeyValuesError::MissingValue(key, *line));
                    }
                    Some(c) => {
                        return Err(KeyValuesError::UnexpectedToken {
                            line: *line,
                            token: c,
                        });
                    }
                }
            }
            Some(c) => {
                return Err(KeyValuesError::UnexpectedToken {
                    line: *line,
                    token: c,
                });
            }
        }
    }
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: &mut usize,
) -> Result<String, KeyValuesError> {
    let start = *line;
    let mut out = String::new();
    for c in chars.by_ref() {
        match c {
            '"' => return Ok(out),
            '\n' => {
                *line += 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Err(KeyValuesError::UnterminatedString(start))
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, line: &mut usize) {
    while let Some(&c) = chars.peek() {
        if c == '\n' {
            *line += 1;
            chars.next();
        } else if c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
}
