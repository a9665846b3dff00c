use cid::Cid;

use super::{Decoder, Encoder};
use crate::repr::ListElem;
use crate::{Error, ErrorCode, Kind, Value};

/// Encode a statically-typed value as canonical dag-cbor.
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

/// Decode a statically-typed value from dag-cbor without building a dynamic
/// [`Value`].
///
/// Borrowing implementations (`&str`, `&[u8]`) reference the input slice
/// directly.
pub trait Decode<'de>: Sized {
    /// Decode `Self` from the decoder's current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not match the expected shape.
    fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error>;
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

impl Decode<'_> for () {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.null()
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bool(*self)
    }
}

impl Decode<'_> for bool {
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

            impl Decode<'_> for $ty {
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

impl Decode<'_> for i64 {
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

impl Decode<'_> for u64 {
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

impl Decode<'_> for f64 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.float()
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.float(f64::from(*self))
    }
}

impl Decode<'_> for f32 {
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
        enc.text(self)
    }
}

impl<'de> Decode<'de> for &'de str {
    fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error> {
        dec.text()
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.text(self)
    }
}

impl Decode<'_> for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.text().map(str::to_owned)
    }
}

impl Encode for [u8] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self)
    }
}

impl<'de> Decode<'de> for &'de [u8] {
    fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error> {
        dec.bytes()
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self)
    }
}

impl Decode<'_> for Vec<u8> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.bytes().map(<[u8]>::to_vec)
    }
}

impl Encode for Cid {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.link(self)
    }
}

impl Decode<'_> for Cid {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, Error> {
        dec.link()
    }
}

impl Encode for Value {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.value(self)
    }
}

impl Decode<'_> for Value {
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

impl<'de, T: Decode<'de>> Decode<'de> for Option<T> {
    fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error> {
        if dec.peek_kind()? == Kind::Null {
            dec.null()?;
            Ok(None)
        } else {
            T::decode(dec).map(Some)
        }
    }
}

impl<T: Encode + ListElem> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.list_begin(self.len())?;
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }
}

impl<'de, T: Decode<'de> + ListElem> Decode<'de> for Vec<T> {
    fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error> {
        let off = dec.position();
        let len = dec.list_begin()?;
        let mut out = Self::new();
        out.try_reserve_exact(len)
            .map_err(|_| Error::new(ErrorCode::AllocationFailed, off))?;
        for _ in 0..len {
            out.push(T::decode(dec)?);
        }
        Ok(out)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.list_begin(N)?;
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }
}

impl<'de, T: Decode<'de>, const N: usize> Decode<'de> for [T; N] {
    fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error> {
        let off = dec.position();
        let len = dec.list_begin()?;
        if len != N {
            return Err(Error::new(ErrorCode::InvalidType, off));
        }
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(dec)?);
        }
        items
            .try_into()
            .map_err(|_| Error::new(ErrorCode::InvalidType, off))
    }
}

macro_rules! tuple_impls {
    ($( $len:literal => ( $($name:ident),+ ) ),+ $(,)?) => {
        $(
            impl<$($name: Encode),+> Encode for ($($name,)+) {
                fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
                    #[allow(non_snake_case)]
                    let ($($name,)+) = self;
                    enc.list_begin($len)?;
                    $( $name.encode(enc)?; )+
                    Ok(())
                }
            }

            impl<'de, $($name: Decode<'de>),+> Decode<'de> for ($($name,)+) {
                fn decode(dec: &mut Decoder<'de>) -> Result<Self, Error> {
                    let off = dec.position();
                    let len = dec.list_begin()?;
                    if len != $len {
                        return Err(Error::new(ErrorCode::InvalidType, off));
                    }
                    #[allow(non_snake_case)]
                    let out = ( $( <$name as Decode>::decode(dec)?, )+ );
                    Ok(out)
                }
            }
        )+
    };
}

tuple_impls! {
    1 => (A),
    2 => (A, B),
    3 => (A, B, C),
    4 => (A, B, C, D),
    5 => (A, B, C, D, E),
    6 => (A, B, C, D, E, F),
    7 => (A, B, C, D, E, F, G),
    8 => (A, B, C, D, E, F, G, H),
}
