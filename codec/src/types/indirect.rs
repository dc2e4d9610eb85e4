//! Encode and Decode through indirection: references, `Box`, `Arc` and `Option`.
//!
//! `Option<T>` is the nullable pointer of the wire model: `None` travels as [Kind::Nil] and a
//! nil decodes to `None`. The one exception is a `T` that implements [Decode] by hand (its
//! [Decode::shape] is [Shape::Custom]): such a destination is always allocated and handed the
//! value, nil included, so it can interpret nil itself.

use crate::{Decode, Decoder, Encode, Encoder, Error, Kind, Shape, SortKey};
use std::sync::Arc;

macro_rules! impl_delegate {
    ($($pointer:ty),*) => {
        $(
            impl<T: Encode + ?Sized> Encode for $pointer {
                #[inline]
                fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
                    (**self).encode(enc)
                }

                fn is_empty_value(&self) -> bool {
                    (**self).is_empty_value()
                }

                fn is_zero_value(&self) -> bool {
                    (**self).is_zero_value()
                }

                fn sort_key(&self) -> Option<SortKey<'_>> {
                    (**self).sort_key()
                }
            }
        )*
    };
}

impl_delegate!(&T, Box<T>, Arc<T>);

impl<T: Decode> Decode for Box<T> {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        (**self).decode(dec)
    }

    fn shape() -> Shape {
        match T::shape() {
            Shape::Custom => Shape::Custom,
            _ => Shape::Indirect,
        }
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        match self {
            Some(value) => value.encode(enc),
            None => enc.emit_nil(),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }

    fn is_zero_value(&self) -> bool {
        self.is_none()
    }

    fn sort_key(&self) -> Option<SortKey<'_>> {
        self.as_ref().and_then(|value| value.sort_key())
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        if T::shape() != Shape::Custom && dec.kind()? == Kind::Nil {
            dec.nil()?;
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode(dec)
    }

    fn shape() -> Shape {
        Shape::Indirect
    }
}
