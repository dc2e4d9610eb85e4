//! Encode and Decode for tuples, which travel as known-length arrays.

use crate::{sequence::Indexed, Decode, Decoder, Encode, Encoder, Error, Kind, Shape};
use paste::paste;

macro_rules! impl_codec_for_tuple {
    ($($index:literal),*) => {
        paste! {
            impl<$( [<T $index>]: Encode ),*> Encode for ( $( [<T $index>], )* ) {
                fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
                    let items: &[&dyn Encode] = &[ $( &self.$index ),* ];
                    enc.encode_sequence(&mut Indexed::new(items))
                }

                fn is_zero_value(&self) -> bool {
                    true $( && self.$index.is_zero_value() )*
                }
            }

            impl<$( [<T $index>]: Decode + Default ),*> Decode for ( $( [<T $index>], )* ) {
                fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
                    *self = Default::default();
                    if !dec.present(Kind::Array)? {
                        return Ok(());
                    }
                    let len = [$( $index ),*].len();
                    dec.decode_positional(len, |dec, index| match index {
                        $( $index => self.$index.decode(dec), )*
                        _ => dec.skip(),
                    })
                }

                fn shape() -> Shape {
                    Shape::FixedArray
                }
            }
        }
    };
}

// Generate implementations for tuple sizes 1 through 12
impl_codec_for_tuple!(0);
impl_codec_for_tuple!(0, 1);
impl_codec_for_tuple!(0, 1, 2);
impl_codec_for_tuple!(0, 1, 2, 3);
impl_codec_for_tuple!(0, 1, 2, 3, 4);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10);
impl_codec_for_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11);

#[cfg(test)]
mod tests {
    use crate::{
        value::{from_value, to_value, Value},
        Encode, Error,
    };

    #[test]
    fn test_tuple() {
        let tuple_values = [(1u16, None), (1u16, Some(2u32))];
        for value in tuple_values {
            let encoded = to_value(&value).unwrap();
            let decoded = from_value::<(u16, Option<u32>)>(&encoded).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_tuple_shape() {
        let encoded = to_value(&("a".to_string(), -1i8, true)).unwrap();
        assert_eq!(
            encoded,
            Value::Array(vec![Value::from("a"), Value::Int(-1), Value::Bool(true)])
        );
        assert_eq!(
            from_value::<(String, i8)>(&encoded),
            Err(Error::ArrayLength {
                expected: 2,
                found: 3
            })
        );
        assert!((0u8, String::new()).is_zero_value());
        assert!(!(0u8, String::new()).is_empty_value());
    }
}
