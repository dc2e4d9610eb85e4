//! Encode and Decode for [Bytes] and [BytesMut], which travel as [crate::Kind::Bytes].

use crate::{Decode, Decoder, Encode, Encoder, Error, Shape};
use bytes::{Bytes, BytesMut};

impl Encode for Bytes {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_bytes(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl Decode for Bytes {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        *self = dec.decode_bytes()?;
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Bytes
    }
}

impl Encode for BytesMut {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_bytes(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl Decode for BytesMut {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        let bytes = dec.decode_bytes()?;
        self.clear();
        self.extend_from_slice(&bytes);
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        value::{from_value, to_value, Value},
        Kind,
    };

    #[test]
    fn test_bytes() {
        let values = [
            Bytes::new(),
            Bytes::from_static(&[1, 2, 3]),
            Bytes::from(vec![0; 300]),
        ];
        for value in values {
            let encoded = to_value(&value).unwrap();
            assert_eq!(encoded, Value::Bytes(value.clone()));
            assert_eq!(from_value::<Bytes>(&encoded), Ok(value));
        }
        assert_eq!(from_value::<Bytes>(&Value::Nil), Ok(Bytes::new()));
        assert_eq!(
            from_value::<Bytes>(&Value::Bool(true)),
            Err(Error::conversion(Kind::Bool, Kind::Bytes))
        );
    }

    #[test]
    fn test_bytes_mut() {
        let mut value = BytesMut::with_capacity(4);
        value.extend_from_slice(b"wire");
        let encoded = to_value(&value).unwrap();
        assert_eq!(from_value::<BytesMut>(&encoded), Ok(value));
        assert_eq!(
            from_value::<BytesMut>(&Value::from("text")).map(BytesMut::freeze),
            Ok(Bytes::from_static(b"text"))
        );
    }
}
