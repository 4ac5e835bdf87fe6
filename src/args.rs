//! Generic `{"args": ...}` envelope

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const ARGS_KEY: &str = "args";

/// Wraps a payload under the `"args"` key.
///
/// The serialized form is always a JSON object whose only recognized key is
/// `args`. Sibling keys are ignored when decoding, which makes the envelope a
/// good fit for echo endpoints that return the query arguments next to other
/// fields.
///
/// ```rust
/// use requestable::Args;
/// use serde_json::json;
///
/// let envelope = Args::new(vec![1, 2, 3]);
/// assert_eq!(envelope.to_json(), Some(json!({"args": [1, 2, 3]})));
///
/// let decoded: Option<Args<Vec<i32>>> = Args::from_json(&json!({"args": [1, 2, 3], "url": "x"}));
/// assert_eq!(decoded, Some(envelope));
///
/// assert_eq!(Args::<i64>::from_json(&json!({"args": "hello"})), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Args<T> {
    /// The wrapped payload
    pub args: T,
}

impl<T> Args<T> {
    /// Wrap a payload
    pub fn new(args: T) -> Self {
        Self { args }
    }

    /// Unwrap the payload
    pub fn into_inner(self) -> T {
        self.args
    }
}

impl<T: DeserializeOwned> Args<T> {
    /// Decode an envelope from a JSON object.
    ///
    /// Returns `None` when `json` is not an object, has no `"args"` key, or the
    /// value under it does not decode as `T`.
    pub fn from_json(json: &Value) -> Option<Self> {
        let args = json.as_object()?.get(ARGS_KEY)?;
        T::deserialize(args).ok().map(Self::new)
    }

    /// Decode an envelope from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

impl<T: Serialize> Args<T> {
    /// Encode the envelope as `{"args": <payload>}`.
    ///
    /// Returns `None` when the payload's own serializer fails.
    pub fn to_json(&self) -> Option<Value> {
        let args = serde_json::to_value(&self.args).ok()?;
        let mut object = serde_json::Map::with_capacity(1);
        object.insert(ARGS_KEY.to_string(), args);
        Some(Value::Object(object))
    }
}

impl<T> From<T> for Args<T> {
    fn from(args: T) -> Self {
        Self::new(args)
    }
}

impl<T: Serialize> Serialize for Args<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Args", 1)?;
        state.serialize_field(ARGS_KEY, &self.args)?;
        state.end()
    }
}

// Only the map form is accepted so that `{"args": ...}` is the sole wire shape.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Args<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArgsVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ArgsVisitor<T> {
            type Value = Args<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with an \"args\" key")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut args = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == ARGS_KEY {
                        if args.is_some() {
                            return Err(de::Error::duplicate_field(ARGS_KEY));
                        }
                        args = Some(map.next_value()?);
                    } else {
                        map.next_value::<de::IgnoredAny>()?;
                    }
                }
                args.map(Args::new)
                    .ok_or_else(|| de::Error::missing_field(ARGS_KEY))
            }
        }

        deserializer.deserialize_map(ArgsVisitor(PhantomData))
    }
}
