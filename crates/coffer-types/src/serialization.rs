//! Serialization implementations for coffer-types.
//!
//! Serde uses the text forms so persisted JSON stays readable;
//! borsh uses the raw bytes.

use crate::*;

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    impl Serialize for Amount {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_string().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            Amount::from_str(&s).map_err(serde::de::Error::custom)
        }
    }

    impl Serialize for Address {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_string().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            Address::from_str(&s).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(feature = "borsh")]
mod borsh_impls {
    use super::*;
    use borsh::{BorshDeserialize, BorshSerialize};
    use std::io::{Read, Result, Write};

    impl BorshSerialize for Amount {
        fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
            writer.write_all(&self.get().to_le_bytes())
        }
    }

    impl BorshDeserialize for Amount {
        fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
            let mut bytes = [0u8; 16];
            reader.read_exact(&mut bytes)?;
            Ok(Amount::new(u128::from_le_bytes(bytes)))
        }
    }

    impl BorshSerialize for Address {
        fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
            writer.write_all(self.as_bytes())
        }
    }

    impl BorshDeserialize for Address {
        fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
            let mut bytes = [0u8; 20];
            reader.read_exact(&mut bytes)?;
            Ok(Address::from_bytes(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_uses_text_forms() {
        let addr = Address::from_seed("treasury");
        let json = serde_json::to_string(&addr).unwrap();
        assert!(json.contains("cof1"));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), addr);

        let amount = Amount::from_whole(7);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"7000000000000000000\"");
    }

    #[cfg(feature = "borsh")]
    #[test]
    fn test_borsh_widths() {
        let bytes = borsh::to_vec(&Amount::from(1u64)).unwrap();
        assert_eq!(bytes.len(), 16);
        let bytes = borsh::to_vec(&Address::ZERO).unwrap();
        assert_eq!(bytes.len(), 20);
    }
}
