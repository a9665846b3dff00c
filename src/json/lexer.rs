//! Streaming JSON tokenizer.
//!
//! The lexer walks the input slice once and hands the parser structural
//! tokens plus string/number payloads. Escaped string segments are decoded
//! into a scratch buffer in 1..4-byte chunks and concatenated with the
//! surrounding literal spans; unescaped strings borrow the input directly.

use crate::{Error, ErrorCode};

/// One token of the JSON grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lexeme {
    ObjBegin,
    ObjEnd,
    ArrBegin,
    ArrEnd,
    Comma,
    Colon,
    Str,
    Num,
    True,
    False,
    Null,
    Eof,
}

enum Payload {
    None,
    /// Byte range into the input.
    Borrowed(usize, usize),
    /// The scratch buffer holds the decoded payload.
    Scratch,
}

pub(crate) struct Lexer<'de> {
    data: &'de [u8],
    pos: usize,
    peeked: Option<(Lexeme, usize)>,
    payload: Payload,
    payload_off: usize,
    num_float: bool,
    scratch: Vec<u8>,
}

impl<'de> Lexer<'de> {
    pub(crate) const fn new(data: &'de [u8]) -> Self {
        Self {
            data,
            pos: 0,
            peeked: None,
            payload: Payload::None,
            payload_off: 0,
            num_float: false,
            scratch: Vec::new(),
        }
    }

    /// Offset of the next unconsumed byte.
    pub(crate) fn position(&self) -> usize {
        match self.peeked {
            Some((_, off)) => off,
            None => self.pos,
        }
    }

    /// Look at the next token without consuming it.
    ///
    /// The payload accessors refer to the peeked token until it is consumed
    /// and the one after it is lexed.
    pub(crate) fn peek(&mut self) -> Result<Lexeme, Error> {
        if let Some((lx, _)) = self.peeked {
            return Ok(lx);
        }
        let tok = self.lex()?;
        self.peeked = Some(tok);
        Ok(tok.0)
    }

    /// Consume and return the next token and its starting offset.
    pub(crate) fn next(&mut self) -> Result<(Lexeme, usize), Error> {
        if let Some(tok) = self.peeked.take() {
            return Ok(tok);
        }
        self.lex()
    }

    /// The text of the last string token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` when the payload is not valid UTF-8.
    pub(crate) fn take_str(&self) -> Result<&str, Error> {
        let bytes = match self.payload {
            Payload::Borrowed(start, end) => &self.data[start..end],
            Payload::Scratch => self.scratch.as_slice(),
            Payload::None => &[],
        };
        core::str::from_utf8(bytes).map_err(|_| Error::new(ErrorCode::InvalidUtf8, self.payload_off))
    }

    /// The text of the last number token (always ASCII).
    pub(crate) fn take_num(&self) -> Result<&str, Error> {
        self.take_str()
    }

    /// Whether the last number token had a fraction or exponent part.
    pub(crate) const fn num_is_float(&self) -> bool {
        self.num_float
    }

    fn lex(&mut self) -> Result<(Lexeme, usize), Error> {
        self.skip_ws();
        let off = self.pos;
        let Some(&b) = self.data.get(self.pos) else {
            return Ok((Lexeme::Eof, off));
        };
        let lx = match b {
            b'{' => {
                self.pos += 1;
                Lexeme::ObjBegin
            }
            b'}' => {
                self.pos += 1;
                Lexeme::ObjEnd
            }
            b'[' => {
                self.pos += 1;
                Lexeme::ArrBegin
            }
            b']' => {
                self.pos += 1;
                Lexeme::ArrEnd
            }
            b',' => {
                self.pos += 1;
                Lexeme::Comma
            }
            b':' => {
                self.pos += 1;
                Lexeme::Colon
            }
            b'"' => {
                self.pos += 1;
                self.lex_string(off)?;
                Lexeme::Str
            }
            b'-' | b'0'..=b'9' => {
                self.lex_number(off)?;
                Lexeme::Num
            }
            b't' => {
                self.keyword(b"true", off)?;
                Lexeme::True
            }
            b'f' => {
                self.keyword(b"false", off)?;
                Lexeme::False
            }
            b'n' => {
                self.keyword(b"null", off)?;
                Lexeme::Null
            }
            _ => return Err(Error::new(ErrorCode::InvalidType, off)),
        };
        Ok((lx, off))
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.data.get(self.pos) {
            self.pos += 1;
        }
    }

    fn keyword(&mut self, word: &[u8], off: usize) -> Result<(), Error> {
        let end = off + word.len();
        if self.data.len() < end {
            return Err(Error::new(ErrorCode::UnexpectedEof, off));
        }
        if &self.data[off..end] != word {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        self.pos = end;
        Ok(())
    }

    fn lex_string(&mut self, off: usize) -> Result<(), Error> {
        self.payload_off = off;
        let start = self.pos;
        let mut span = start;
        let mut escaped = false;
        loop {
            let b = *self
                .data
                .get(self.pos)
                .ok_or(Error::new(ErrorCode::UnexpectedEof, off))?;
            match b {
                b'"' => {
                    if escaped {
                        self.scratch.extend_from_slice(&self.data[span..self.pos]);
                        self.payload = Payload::Scratch;
                    } else {
                        self.payload = Payload::Borrowed(start, self.pos);
                    }
                    self.pos += 1;
                    return Ok(());
                }
                b'\\' => {
                    if !escaped {
                        self.scratch.clear();
                        escaped = true;
                    }
                    self.scratch.extend_from_slice(&self.data[span..self.pos]);
                    self.pos += 1;
                    self.lex_escape(off)?;
                    span = self.pos;
                }
                0x00..=0x1f => return Err(Error::new(ErrorCode::InvalidType, self.pos)),
                _ => self.pos += 1,
            }
        }
    }

    fn lex_escape(&mut self, off: usize) -> Result<(), Error> {
        let esc_off = self.pos;
        let b = *self
            .data
            .get(self.pos)
            .ok_or(Error::new(ErrorCode::UnexpectedEof, off))?;
        self.pos += 1;
        let decoded = match b {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let c = self.lex_unicode_escape(esc_off)?;
                let mut buf = [0u8; 4];
                self.scratch.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                return Ok(());
            }
            _ => return Err(Error::new(ErrorCode::InvalidType, esc_off)),
        };
        self.scratch.push(decoded);
        Ok(())
    }

    fn lex_unicode_escape(&mut self, esc_off: usize) -> Result<char, Error> {
        let high = self.hex4(esc_off)?;
        let code = match high {
            // High surrogate: must be followed by an escaped low surrogate.
            0xd800..=0xdbff => {
                if self.data.get(self.pos) != Some(&b'\\')
                    || self.data.get(self.pos + 1) != Some(&b'u')
                {
                    return Err(Error::new(ErrorCode::InvalidType, esc_off));
                }
                self.pos += 2;
                let low = self.hex4(esc_off)?;
                if !(0xdc00..=0xdfff).contains(&low) {
                    return Err(Error::new(ErrorCode::InvalidType, esc_off));
                }
                0x10000 + (u32::from(high - 0xd800) << 10) + u32::from(low - 0xdc00)
            }
            0xdc00..=0xdfff => return Err(Error::new(ErrorCode::InvalidType, esc_off)),
            _ => u32::from(high),
        };
        char::from_u32(code).ok_or(Error::new(ErrorCode::InvalidType, esc_off))
    }

    fn hex4(&mut self, esc_off: usize) -> Result<u16, Error> {
        let end = self
            .pos
            .checked_add(4)
            .ok_or(Error::new(ErrorCode::LengthOverflow, esc_off))?;
        if end > self.data.len() {
            return Err(Error::new(ErrorCode::UnexpectedEof, esc_off));
        }
        let mut v: u16 = 0;
        for &b in &self.data[self.pos..end] {
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(Error::new(ErrorCode::InvalidType, esc_off)),
            };
            v = (v << 4) | u16::from(digit);
        }
        self.pos = end;
        Ok(v)
    }

    fn lex_number(&mut self, off: usize) -> Result<(), Error> {
        self.payload_off = off;
        self.num_float = false;
        if self.data.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        // Integer part: a single zero, or a nonzero digit run.
        match self.data.get(self.pos) {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(Error::new(ErrorCode::InvalidType, off)),
        }
        if self.data.get(self.pos) == Some(&b'.') {
            self.num_float = true;
            self.pos += 1;
            if !matches!(self.data.get(self.pos), Some(b'0'..=b'9')) {
                return Err(Error::new(ErrorCode::InvalidType, off));
            }
            self.digits();
        }
        if let Some(b'e' | b'E') = self.data.get(self.pos) {
            self.num_float = true;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.data.get(self.pos) {
                self.pos += 1;
            }
            if !matches!(self.data.get(self.pos), Some(b'0'..=b'9')) {
                return Err(Error::new(ErrorCode::InvalidType, off));
            }
            self.digits();
        }
        self.payload = Payload::Borrowed(off, self.pos);
        Ok(())
    }

    fn digits(&mut self) {
        while matches!(self.data.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexeme, Lexer};
    use crate::ErrorCode;

    fn lex_one_str(input: &str) -> String {
        let mut lex = Lexer::new(input.as_bytes());
        assert_eq!(lex.next().unwrap().0, Lexeme::Str);
        lex.take_str().unwrap().to_owned()
    }

    #[test]
    fn plain_string_borrows() {
        assert_eq!(lex_one_str(r#""hello""#), "hello");
        assert_eq!(lex_one_str(r#""""#), "");
    }

    #[test]
    fn escapes_concatenate_with_literal_spans() {
        assert_eq!(lex_one_str(r#""a\nb""#), "a\nb");
        assert_eq!(lex_one_str(r#""\"x\\y\"""#), "\"x\\y\"");
        assert_eq!(lex_one_str(r#""preépost""#), "pre\u{e9}post");
    }

    #[test]
    fn surrogate_pairs_decode() {
        assert_eq!(lex_one_str(r#""😀""#), "\u{1f600}");
    }

    #[test]
    fn lone_surrogate_is_rejected() {
        let mut lex = Lexer::new(br#""\ud83d""#);
        assert_eq!(lex.next().unwrap_err().code, ErrorCode::InvalidType);
    }

    #[test]
    fn numbers_and_structure() {
        let mut lex = Lexer::new(b"[0,-12,3.5,1e3]");
        assert_eq!(lex.next().unwrap().0, Lexeme::ArrBegin);
        assert_eq!(lex.next().unwrap().0, Lexeme::Num);
        assert_eq!(lex.take_num().unwrap(), "0");
        assert!(!lex.num_is_float());
        assert_eq!(lex.next().unwrap().0, Lexeme::Comma);
        assert_eq!(lex.next().unwrap().0, Lexeme::Num);
        assert_eq!(lex.take_num().unwrap(), "-12");
        assert_eq!(lex.next().unwrap().0, Lexeme::Comma);
        assert_eq!(lex.next().unwrap().0, Lexeme::Num);
        assert!(lex.num_is_float());
        assert_eq!(lex.next().unwrap().0, Lexeme::Comma);
        assert_eq!(lex.next().unwrap().0, Lexeme::Num);
        assert_eq!(lex.take_num().unwrap(), "1e3");
        assert_eq!(lex.next().unwrap().0, Lexeme::ArrEnd);
        assert_eq!(lex.next().unwrap().0, Lexeme::Eof);
    }

    #[test]
    fn leading_zero_run_is_rejected_by_grammar() {
        // "01" lexes as the number 0 followed by a stray 1; the parser turns
        // that into a trailing-data error.
        let mut lex = Lexer::new(b"01");
        assert_eq!(lex.next().unwrap().0, Lexeme::Num);
        assert_eq!(lex.take_num().unwrap(), "0");
    }

    #[test]
    fn peek_is_idempotent() {
        let mut lex = Lexer::new(b"true false");
        assert_eq!(lex.peek().unwrap(), Lexeme::True);
        assert_eq!(lex.peek().unwrap(), Lexeme::True);
        assert_eq!(lex.next().unwrap().0, Lexeme::True);
        assert_eq!(lex.next().unwrap().0, Lexeme::False);
    }
}
