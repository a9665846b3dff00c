use std::rc::Rc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use cid::Cid;

use super::lexer::{Lexeme, Lexer};
use crate::{DecodeOptions, Error, ErrorCode, Value};

/// Decoder over a complete dag-json byte slice, driven by the streaming
/// tokenizer.
///
/// On `{` the decoder peeks the first key: `"/"` selects the link/bytes
/// alternation, anything else opens a plain map. The reserved `"/"` key
/// inside a plain map is rejected.
pub struct Decoder<'de> {
    lex: Lexer<'de>,
    opts: DecodeOptions,
}

impl<'de> Decoder<'de> {
    /// Create a strict decoder over `data`.
    #[must_use]
    pub fn new(data: &'de [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    /// Create a decoder with explicit options.
    #[must_use]
    pub const fn with_options(data: &'de [u8], opts: DecodeOptions) -> Self {
        Self {
            lex: Lexer::new(data),
            opts,
        }
    }

    /// Current byte offset into the input.
    #[must_use]
    pub fn position(&self) -> usize {
        self.lex.position()
    }

    /// Whether the decoder enforces canonical record key order.
    #[must_use]
    pub const fn strict(&self) -> bool {
        self.opts.strict
    }

    /// Require that the document ends here.
    ///
    /// # Errors
    ///
    /// Returns `ExpectedEod` when further tokens follow the value, or
    /// `ExtraneousData` when trailing bytes do not even lex.
    pub fn finish(&mut self) -> Result<(), Error> {
        let off = self.position();
        match self.lex.peek() {
            Ok(Lexeme::Eof) => Ok(()),
            Ok(_) => Err(Error::new(ErrorCode::ExpectedEod, off)),
            Err(_) => Err(Error::new(ErrorCode::ExtraneousData, off)),
        }
    }

    fn expect(&mut self, want: Lexeme) -> Result<usize, Error> {
        let (lx, off) = self.lex.next()?;
        if lx == want {
            Ok(off)
        } else {
            Err(Error::new(ErrorCode::InvalidType, off))
        }
    }

    /// Consume `null`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other token.
    pub fn null(&mut self) -> Result<(), Error> {
        self.expect(Lexeme::Null).map(|_| ())
    }

    /// Returns true (consuming the token) when the next value is `null`.
    ///
    /// # Errors
    ///
    /// Propagates lexer errors.
    pub fn peek_null(&mut self) -> Result<bool, Error> {
        if self.lex.peek()? == Lexeme::Null {
            self.lex.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume a boolean literal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other token.
    pub fn bool(&mut self) -> Result<bool, Error> {
        let (lx, off) = self.lex.next()?;
        match lx {
            Lexeme::True => Ok(true),
            Lexeme::False => Ok(false),
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    /// Consume an integer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for fractional numbers or non-numbers,
    /// `Overflow` outside the i64 range.
    pub fn int(&mut self) -> Result<i64, Error> {
        let off = self.expect(Lexeme::Num)?;
        if self.lex.num_is_float() {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        self.lex
            .take_num()?
            .parse()
            .map_err(|_| Error::new(ErrorCode::Overflow, off))
    }

    /// Consume a float. Integral number text is accepted and widened.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for non-numbers, `Overflow` when the parsed
    /// value is not finite.
    pub fn float(&mut self) -> Result<f64, Error> {
        let off = self.expect(Lexeme::Num)?;
        let v: f64 = self
            .lex
            .take_num()?
            .parse()
            .map_err(|_| Error::new(ErrorCode::InvalidType, off))?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(Error::new(ErrorCode::Overflow, off))
        }
    }

    /// Consume a string.
    ///
    /// The returned text may borrow the decoder's scratch buffer and is only
    /// valid until the next token is read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for non-strings, `InvalidUtf8` for malformed
    /// text.
    pub fn str(&mut self) -> Result<&str, Error> {
        self.expect(Lexeme::Str)?;
        self.lex.take_str()
    }

    /// Consume a byte string in its `{"/":{"bytes":...}}` form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when the reserved-key object is malformed or
    /// the base64url-nopad payload does not decode.
    pub fn bytes(&mut self) -> Result<Vec<u8>, Error> {
        let off = self.expect(Lexeme::ObjBegin)?;
        let key_off = self.expect(Lexeme::Str)?;
        if self.lex.take_str()? != "/" {
            return Err(Error::new(ErrorCode::InvalidType, key_off));
        }
        self.expect(Lexeme::Colon)?;
        self.inner_bytes(off)
    }

    /// Decode the `{"bytes": "<base64>"}` object and the two closing braces.
    fn inner_bytes(&mut self, off: usize) -> Result<Vec<u8>, Error> {
        let (lx, inner_off) = self.lex.next()?;
        if lx != Lexeme::ObjBegin {
            return Err(Error::new(ErrorCode::InvalidValue, inner_off));
        }
        let key_off = match self.lex.next()? {
            (Lexeme::Str, o) => o,
            (_, o) => return Err(Error::new(ErrorCode::InvalidValue, o)),
        };
        if self.lex.take_str()? != "bytes" {
            return Err(Error::new(ErrorCode::InvalidValue, key_off));
        }
        self.expect(Lexeme::Colon)?;
        let (lx, payload_off) = self.lex.next()?;
        if lx != Lexeme::Str {
            return Err(Error::new(ErrorCode::InvalidValue, payload_off));
        }
        let decoded = URL_SAFE_NO_PAD
            .decode(self.lex.take_str()?)
            .map_err(|_| Error::new(ErrorCode::InvalidValue, payload_off))?;
        // The inner object holds exactly "bytes"; the outer exactly "/".
        if self.lex.next()?.0 != Lexeme::ObjEnd || self.lex.next()?.0 != Lexeme::ObjEnd {
            return Err(Error::new(ErrorCode::InvalidValue, off));
        }
        Ok(decoded)
    }

    /// Consume a link in its `{"/": "<cid>"}` form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when the reserved-key object is malformed or
    /// the CID string does not parse.
    pub fn link(&mut self) -> Result<Cid, Error> {
        let off = self.expect(Lexeme::ObjBegin)?;
        let key_off = self.expect(Lexeme::Str)?;
        if self.lex.take_str()? != "/" {
            return Err(Error::new(ErrorCode::InvalidType, key_off));
        }
        self.expect(Lexeme::Colon)?;
        self.inner_link(off)
    }

    fn inner_link(&mut self, off: usize) -> Result<Cid, Error> {
        let (lx, cid_off) = self.lex.next()?;
        if lx != Lexeme::Str {
            return Err(Error::new(ErrorCode::InvalidValue, cid_off));
        }
        let cid = Cid::try_from(self.lex.take_str()?)
            .map_err(|_| Error::new(ErrorCode::InvalidValue, cid_off))?;
        if self.lex.next()?.0 != Lexeme::ObjEnd {
            return Err(Error::new(ErrorCode::InvalidValue, off));
        }
        Ok(cid)
    }

    /// Consume a `[`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other token.
    pub fn array_begin(&mut self) -> Result<(), Error> {
        self.expect(Lexeme::ArrBegin).map(|_| ())
    }

    /// Step to the next array element.
    ///
    /// Returns `false` when the closing `]` was consumed instead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for malformed separators.
    pub fn array_next(&mut self, first: bool) -> Result<bool, Error> {
        if first {
            if self.lex.peek()? == Lexeme::ArrEnd {
                self.lex.next()?;
                return Ok(false);
            }
            return Ok(true);
        }
        let (lx, off) = self.lex.next()?;
        match lx {
            Lexeme::Comma => Ok(true),
            Lexeme::ArrEnd => Ok(false),
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    /// Consume a `{`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other token.
    pub fn object_begin(&mut self) -> Result<(), Error> {
        self.expect(Lexeme::ObjBegin).map(|_| ())
    }

    /// Step to the next object entry and consume its key and `:`.
    ///
    /// Returns `None` when the closing `}` was consumed instead. The key
    /// borrows the decoder and is only valid until the next token is read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for malformed separators or non-string keys.
    pub fn entry_key(&mut self, first: bool) -> Result<Option<&str>, Error> {
        let (lx, off) = self.lex.next()?;
        match lx {
            Lexeme::ObjEnd => return Ok(None),
            Lexeme::Str if first => {}
            Lexeme::Comma if !first => {
                let (lx, off) = self.lex.next()?;
                if lx != Lexeme::Str {
                    return Err(Error::new(ErrorCode::InvalidType, off));
                }
            }
            _ => return Err(Error::new(ErrorCode::InvalidType, off)),
        }
        self.expect(Lexeme::Colon)?;
        self.lex.take_str().map(Some)
    }

    /// Consume the closing `}` of an object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` for any other token.
    pub fn object_end(&mut self) -> Result<(), Error> {
        self.expect(Lexeme::ObjEnd).map(|_| ())
    }

    /// Decode the next document as a dynamic value.
    ///
    /// # Errors
    ///
    /// Returns a typed error for malformed input.
    pub fn value(&mut self) -> Result<Value, Error> {
        self.parse_value(0)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, Error> {
        if depth > self.opts.max_depth {
            return Err(Error::new(ErrorCode::DepthLimitExceeded, self.position()));
        }
        let (lx, off) = self.lex.next()?;
        match lx {
            Lexeme::Null => Ok(Value::Null),
            Lexeme::True => Ok(Value::Bool(true)),
            Lexeme::False => Ok(Value::Bool(false)),
            Lexeme::Num => {
                if self.lex.num_is_float() {
                    let v: f64 = self
                        .lex
                        .take_num()?
                        .parse()
                        .map_err(|_| Error::new(ErrorCode::InvalidType, off))?;
                    if v.is_finite() {
                        Ok(Value::Float(v))
                    } else {
                        Err(Error::new(ErrorCode::Overflow, off))
                    }
                } else {
                    let v: i64 = self
                        .lex
                        .take_num()?
                        .parse()
                        .map_err(|_| Error::new(ErrorCode::Overflow, off))?;
                    Ok(Value::Integer(v))
                }
            }
            Lexeme::Str => Ok(Value::string(self.lex.take_str()?)),
            Lexeme::ArrBegin => self.parse_array(depth),
            Lexeme::ObjBegin => self.parse_object(depth, off),
            _ => Err(Error::new(ErrorCode::InvalidType, off)),
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, Error> {
        let mut items = Vec::new();
        let mut first = true;
        while self.array_next(first)? {
            items.push(self.parse_value(depth + 1)?);
            first = false;
        }
        Ok(Value::List(crate::List::from_values(items)))
    }

    fn parse_object(&mut self, depth: usize, off: usize) -> Result<Value, Error> {
        // Peek the first key: "/" switches to the link/bytes alternation.
        let (lx, key_off) = self.lex.next()?;
        match lx {
            Lexeme::ObjEnd => return Ok(Value::Map(crate::Map::new())),
            Lexeme::Str => {}
            _ => return Err(Error::new(ErrorCode::InvalidType, key_off)),
        }
        if self.lex.take_str()? == "/" {
            self.expect(Lexeme::Colon)?;
            return match self.lex.peek()? {
                Lexeme::Str => self.inner_link(off).map(Value::link),
                Lexeme::ObjBegin => self.inner_bytes(off).map(Value::bytes),
                _ => Err(Error::new(ErrorCode::InvalidValue, self.position())),
            };
        }

        let mut entries: Vec<(Rc<str>, Value)> = Vec::new();
        let mut key: Rc<str> = Rc::from(self.lex.take_str()?);
        loop {
            self.expect(Lexeme::Colon)?;
            let val = self.parse_value(depth + 1)?;
            entries.push((key, val));

            let (lx, next_off) = self.lex.next()?;
            match lx {
                Lexeme::ObjEnd => break,
                Lexeme::Comma => {}
                _ => return Err(Error::new(ErrorCode::InvalidType, next_off)),
            }
            let (lx, next_key_off) = self.lex.next()?;
            if lx != Lexeme::Str {
                return Err(Error::new(ErrorCode::InvalidType, next_key_off));
            }
            let next_key = self.lex.take_str()?;
            if next_key == "/" {
                return Err(Error::new(ErrorCode::InvalidValue, next_key_off));
            }
            if entries.iter().any(|(k, _)| k.as_ref() == next_key) {
                return Err(Error::new(ErrorCode::InvalidValue, next_key_off));
            }
            key = Rc::from(next_key);
        }
        Ok(Value::Map(crate::Map::from_raw_entries(entries)))
    }
}
