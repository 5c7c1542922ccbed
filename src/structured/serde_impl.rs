//! Serde support for [`Structured<T>`].
//!
//! A structured collection serializes as a map in key order. Deserialization
//! keeps the order found in the input and rejects repeated keys, so trace
//! files written by one run read back co-indexed with the live batch.
use crate::structured::container::Structured;
use serde::{
    de::{Error as DeError, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{fmt, marker::PhantomData};

impl<T: Serialize> Serialize for Structured<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct StructuredVisitor<T> {
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for StructuredVisitor<T> {
    type Value = Structured<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of uniquely named values")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut out = Structured::new();
        while let Some((name, value)) = access.next_entry::<String, T>()? {
            out.insert(name, value).map_err(M::Error::custom)?;
        }
        Ok(out)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Structured<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StructuredVisitor { marker: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::StructuredValue;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // JSON keeps the key order of the collection, not an alphabetical one.
    fn json_preserves_key_order() {
        let value: StructuredValue = Structured::from_pairs([
            ("zeta", array![1.0, 2.0].into_dyn()),
            ("alpha", array![[3.0]].into_dyn()),
        ])
        .expect("unique");

        let text = serde_json::to_string(&value).expect("serializable");
        let back: StructuredValue = serde_json::from_str(&text).expect("deserializable");

        assert!(text.find("zeta") < text.find("alpha"));
        assert_eq!(back, value);
    }

    #[test]
    // Purpose
    // -------
    // A repeated key in the input is a format error, not a silent overwrite.
    fn json_rejects_duplicate_keys() {
        let text = r#"{"a": 1, "a": 2}"#;

        let result: Result<Structured<i32>, _> = serde_json::from_str(text);

        assert!(result.is_err());
    }
}
