use cid::Cid;

use super::{Decoder, Encoder};
use crate::repr::ListElem;
use crate::{Error, ErrorCode, Value};

/// Encode a statically-typed value as canonical dag-json.
///
/// Implementations must emit exactly the bytes the dynamic encoder would
/// produce for the corresponding [`Value`].
pub trait Encode {
    /// Encode `self` into the provided encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error>;
}

/// Decode a statically-typed value from dag-json without building a dynamic
/// [`Value`].
pub trait Decode: Sized {
    /// Decode `Self` from the decoder's current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not match the expected shape.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        (**self).encode(enc)
    }
}

impl Encode for () {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.null()
    }
}

impl Decode for () {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.null()
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bool(*self)
    }
}

impl Decode for bool {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.bool()
    }
}

macro_rules! int_impls {
    ($($ty:ty),+) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
                    enc.int(i64::from(*self))
                }
            }

            impl Decode for $ty {
                fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
                    let off = dec.position();
                    let v = dec.int()?;
                    Self::try_from(v).map_err(|_| Error::new(ErrorCode::Overflow, off))
                }
            }
        )+
    };
}

int_impls!(i8, i16, i32, u8, u16, u32);

impl Encode for i64 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.int(*self)
    }
}

impl Decode for i64 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.int()
    }
}

impl Encode for u64 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        let v = i64::try_from(*self)
            .map_err(|_| Error::new(ErrorCode::Overflow, enc.position()))?;
        enc.int(v)
    }
}

impl Decode for u64 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        let off = dec.position();
        let v = dec.int()?;
        Self::try_from(v).map_err(|_| Error::new(ErrorCode::Overflow, off))
    }
}

impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.float(*self)
    }
}

impl Decode for f64 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.float()
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.float(f64::from(*self))
    }
}

impl Decode for f32 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        let off = dec.position();
        let wide = dec.float()?;
        let narrow = wide as Self;
        if f64::from(narrow).to_bits() == wide.to_bits() {
            Ok(narrow)
        } else {
            Err(Error::new(ErrorCode::Overflow, off))
        }
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.str(self)
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.str(self)
    }
}

impl Decode for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.str().map(str::to_owned)
    }
}

impl Encode for [u8] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self)
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self)
    }
}

impl Decode for Vec<u8> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.bytes()
    }
}

impl Encode for Cid {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.link(self)
    }
}

impl Decode for Cid {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.link()
    }
}

impl Encode for Value {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.value(self)
    }
}

impl Decode for Value {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.value()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        match self {
            Some(v) => v.encode(enc),
            None => enc.null(),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        if dec.peek_null()? {
            Ok(None)
        } else {
            T::decode(dec).map(Some)
        }
    }
}

impl<T: Encode + ListElem> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.list_begin()?;
        for (i, item) in self.iter().enumerate() {
            enc.elem(i == 0)?;
            item.encode(enc)?;
        }
        enc.list_end()
    }
}

impl<T: Decode + ListElem> Decode for Vec<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.array_begin()?;
        let mut out = Self::new();
        let mut first = true;
        while dec.array_next(first)? {
            out.push(T::decode(dec)?);
            first = false;
        }
        Ok(out)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.list_begin()?;
        for (i, item) in self.iter().enumerate() {
            enc.elem(i == 0)?;
            item.encode(enc)?;
        }
        enc.list_end()
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        let off = dec.position();
        dec.array_begin()?;
        let mut items = Vec::with_capacity(N);
        for i in 0..N {
            if !dec.array_next(i == 0)? {
                return Err(Error::new(ErrorCode::InvalidType, off));
            }
            items.push(T::decode(dec)?);
        }
        if dec.array_next(N == 0)? {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        items
            .try_into()
            .map_err(|_| Error::new(ErrorCode::InvalidType, off))
    }
}

macro_rules! tuple_impls {
    ($( ( $($name:ident),+ ) ),+ $(,)?) => {
        $(
            impl<$($name: Encode),+> Encode for ($($name,)+) {
                fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
                    #[allow(non_snake_case)]
                    let ($($name,)+) = self;
                    enc.list_begin()?;
                    let mut first = true;
                    $(
                        enc.elem(first)?;
                        $name.encode(enc)?;
                        first = false;
                    )+
                    let _ = first;
                    enc.list_end()
                }
            }

            impl<$($name: Decode),+> Decode for ($($name,)+) {
                fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
                    let off = dec.position();
                    dec.array_begin()?;
                    let mut first = true;
                    let out = ( $(
                        {
                            if !dec.array_next(first)? {
                                return Err(Error::new(ErrorCode::InvalidType, off));
                            }
                            first = false;
                            <$name as Decode>::decode(dec)?
                        },
                    )+ );
                    let _ = first;
                    if dec.array_next(false)? {
                        return Err(Error::new(ErrorCode::InvalidType, off));
                    }
                    Ok(out)
                }
            }
        )+
    };
}

tuple_impls! {
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
    (A, B, C, D, E, F, G),
    (A, B, C, D, E, F, G, H),
}
