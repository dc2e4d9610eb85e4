//! Encode and Decode for sequences and associative collections.

use crate::{
    sequence::{Lazy, LazyPairs},
    Decode, Decoder, Encode, Encoder, Error, Shape,
};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    hash::{BuildHasher, Hash},
};

impl<T: Encode> Encode for [T] {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        T::encode_slice(self, enc)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode> Encode for Vec<T> {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        T::encode_slice(self, enc)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        T::decode_vec(self, dec)
    }

    fn shape() -> Shape {
        Shape::Array
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        match self.as_slices() {
            (front, []) => T::encode_slice(front, enc),
            _ => enc.encode_sequence(&mut Lazy::with_len(self.iter(), self.len())),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode + Default> Decode for VecDeque<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        let mut items = Vec::new();
        T::decode_vec(&mut items, dec)?;
        *self = items.into();
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Array
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        T::encode_slice(self, enc)
    }

    fn is_empty_value(&self) -> bool {
        N == 0
    }

    fn is_zero_value(&self) -> bool {
        self.iter().all(Encode::is_zero_value)
    }
}

impl<T: Decode + Default, const N: usize> Decode for [T; N] {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        T::decode_fixed(self, dec)
    }

    fn shape() -> Shape {
        Shape::FixedArray
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.encode_mapping(&mut LazyPairs::with_len(self.iter(), self.len()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Default + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        self.clear();
        dec.decode_entries(|key, value| {
            self.insert(key, value);
        })
    }

    fn shape() -> Shape {
        Shape::Map
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.encode_mapping(&mut LazyPairs::with_len(self.iter(), self.len()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: Decode + Default + Ord,
    V: Decode + Default,
{
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        self.clear();
        dec.decode_entries(|key, value| {
            self.insert(key, value);
        })
    }

    fn shape() -> Shape {
        Shape::Map
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
    fn test_vec() {
        let values = vec![-1i32, 0, 7];
        let encoded = to_value(&values).unwrap();
        assert_eq!(
            encoded,
            Value::Array(vec![Value::Int(-1), Value::Int(0), Value::Int(7)])
        );
        assert_eq!(from_value::<Vec<i32>>(&encoded), Ok(values));
        assert_eq!(from_value::<Vec<i32>>(&Value::Nil), Ok(vec![]));
        assert_eq!(
            from_value::<Vec<i32>>(&Value::Int(1)),
            Err(Error::conversion(Kind::Int, Kind::Array))
        );
    }

    #[test]
    fn test_nested_vec() {
        let values = vec![vec!["a".to_string()], vec![], vec!["b".into(), "c".into()]];
        let encoded = to_value(&values).unwrap();
        assert_eq!(from_value::<Vec<Vec<String>>>(&encoded), Ok(values));
    }

    #[test]
    fn test_vec_deque() {
        let mut values: VecDeque<u16> = VecDeque::with_capacity(4);
        values.push_back(2);
        values.push_back(3);
        values.push_front(1);
        let encoded = to_value(&values).unwrap();
        assert_eq!(
            encoded,
            Value::Array(vec![Value::Uint(1), Value::Uint(2), Value::Uint(3)])
        );
        assert_eq!(from_value::<VecDeque<u16>>(&encoded), Ok(values));
    }

    #[test]
    fn test_fixed_array() {
        let values = [1.5f64, -2.0];
        let encoded = to_value(&values).unwrap();
        assert_eq!(from_value::<[f64; 2]>(&encoded), Ok(values));
        assert_eq!(from_value::<[f64; 2]>(&Value::Nil), Ok([0.0, 0.0]));
        assert!([0u32; 3].is_zero_value());
        assert!(![0u32; 3].is_empty_value());
        assert!([0u32; 0].is_empty_value());
        assert!(![0u32, 1].is_zero_value());
    }

    #[test]
    fn test_maps() {
        let map: HashMap<String, u32> = [("x".to_string(), 1), ("y".to_string(), 2)].into();
        let encoded = to_value(&map).unwrap();
        assert_eq!(from_value::<HashMap<String, u32>>(&encoded), Ok(map));

        let tree: BTreeMap<i8, bool> = [(-1, true), (1, false)].into();
        let encoded = to_value(&tree).unwrap();
        assert_eq!(
            encoded,
            Value::Map(vec![
                (Value::Int(-1), Value::Bool(true)),
                (Value::Int(1), Value::Bool(false)),
            ])
        );
        assert_eq!(from_value::<BTreeMap<i8, bool>>(&encoded), Ok(tree));
        assert_eq!(from_value::<BTreeMap<i8, bool>>(&Value::Nil), Ok(BTreeMap::new()));
    }

    #[test]
    fn test_map_cleared_before_decode() {
        let mut dst: BTreeMap<String, i64> = [("stale".to_string(), 9)].into();
        let encoded = Value::Map(vec![(Value::from("fresh"), Value::Int(1))]);
        crate::value::decode_into(&encoded, &mut dst).unwrap();
        assert_eq!(dst, [("fresh".to_string(), 1)].into());
    }
}
