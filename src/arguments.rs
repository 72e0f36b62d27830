//! Job arguments and their canonical string form.
//!
//! Arguments travel to workers as a flat JSON object of string values, so
//! every argument is rendered to a locale independent string before the job
//! is recorded.

mod ser;

use self::ser::RecordSerializer;
use crate::errors::{BoxError, ConversionError};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;
use uuid::Uuid;

/// Arguments of a job: field names mapped to canonical string values.
///
/// A field whose value is absent is kept with a `None` value. Fields are
/// ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, Option<String>>);

impl Arguments {
    /// Create an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, rendering `value` to its canonical form.
    ///
    /// # Example
    ///
    /// ```
    /// use workers_client::Arguments;
    ///
    /// let args = Arguments::new()
    ///     .push("Name", "a")?
    ///     .push("Count", &5)?;
    ///
    /// assert_eq!(args.get("Count"), Some(Some("5")));
    /// # Ok::<(), workers_client::ConversionError>(())
    /// ```
    pub fn push<V: ArgumentValue + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &V,
    ) -> Result<Self, ConversionError> {
        let field = name.into();
        match value.to_argument() {
            Ok(value) => {
                self.0.insert(field, value);
                Ok(self)
            }
            Err(source) => Err(ConversionError::Field {
                field,
                type_name: std::any::type_name::<V>().to_string(),
                source,
            }),
        }
    }

    /// Insert an already canonical value.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.insert(name.into(), value);
    }

    /// Look up a field. The outer option is the field's presence, the inner
    /// one its value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.0.get(name).map(Option::as_deref)
    }

    /// Whether the field is present, even with an absent value.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the fields in order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Option<String>> {
        self.0.iter()
    }

    /// Compact JSON encoding stored in the job record.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode arguments written by [`Self::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build arguments from the top level fields of a serializable record.
    ///
    /// Each field is rendered with the same rules as [`Self::push`] and `None`
    /// is kept as an absent value. Nested records, maps and sequences have no
    /// canonical string form and fail the conversion, as do non-finite floats.
    /// A value serializing to unit or `None` yields an empty map.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ConversionError> {
        value.serialize(RecordSerializer {
            type_name: std::any::type_name::<T>(),
        })
    }
}

impl FromIterator<(String, Option<String>)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = (&'a String, &'a Option<String>);
    type IntoIter = btree_map::Iter<'a, String, Option<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A value with a canonical, locale independent string form.
pub trait ArgumentValue {
    /// Render the value. `Ok(None)` records the field with an absent value.
    fn to_argument(&self) -> Result<Option<String>, BoxError>;
}

macro_rules! display_argument {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ArgumentValue for $ty {
                fn to_argument(&self) -> Result<Option<String>, BoxError> {
                    Ok(Some(self.to_string()))
                }
            }
        )*
    };
}

display_argument!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, str, String, Uuid
);

macro_rules! float_argument {
    ($($ty:ty),*) => {
        $(
            impl ArgumentValue for $ty {
                fn to_argument(&self) -> Result<Option<String>, BoxError> {
                    if !self.is_finite() {
                        return Err(format!("{self} has no portable string form").into());
                    }
                    Ok(Some(self.to_string()))
                }
            }
        )*
    };
}

float_argument!(f32, f64);

impl ArgumentValue for DateTime<Utc> {
    fn to_argument(&self) -> Result<Option<String>, BoxError> {
        Ok(Some(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }
}

impl ArgumentValue for NaiveDate {
    fn to_argument(&self) -> Result<Option<String>, BoxError> {
        Ok(Some(self.format("%Y-%m-%d").to_string()))
    }
}

impl<T: ArgumentValue> ArgumentValue for Option<T> {
    fn to_argument(&self) -> Result<Option<String>, BoxError> {
        match self {
            Some(value) => value.to_argument(),
            None => Ok(None),
        }
    }
}

impl<T: ArgumentValue + ?Sized> ArgumentValue for &T {
    fn to_argument(&self) -> Result<Option<String>, BoxError> {
        (**self).to_argument()
    }
}

/// Types that can be turned into job [`Arguments`].
///
/// Implement it by pushing fields one by one, or delegate to
/// [`Arguments::from_serialize`] for serde records.
pub trait ToArguments {
    /// Convert `self` into arguments.
    fn to_arguments(&self) -> Result<Arguments, ConversionError>;
}

impl ToArguments for Arguments {
    fn to_arguments(&self) -> Result<Arguments, ConversionError> {
        Ok(self.clone())
    }
}

impl ToArguments for Value {
    fn to_arguments(&self) -> Result<Arguments, ConversionError> {
        Arguments::from_serialize(self)
    }
}

/// Convert an optional record into arguments. A missing record yields an
/// empty map.
pub fn marshal(value: Option<&dyn ToArguments>) -> Result<Arguments, ConversionError> {
    match value {
        Some(value) => value.to_arguments(),
        None => Ok(Arguments::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use claims::{assert_err, assert_matches, assert_ok, assert_some};
    use serde_json::json;
    use std::error::Error as _;

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Greeting {
        name: &'static str,
        count: u32,
        ratio: f64,
        nickname: Option<String>,
    }

    impl ToArguments for Greeting {
        fn to_arguments(&self) -> Result<Arguments, ConversionError> {
            Arguments::from_serialize(self)
        }
    }

    #[test]
    fn record_fields_become_canonical_strings() {
        let greeting = Greeting {
            name: "a",
            count: 5,
            ratio: 2.5,
            nickname: None,
        };

        let args = assert_ok!(marshal(Some(&greeting)));

        assert_eq!(args.get("Name"), Some(Some("a")));
        assert_eq!(args.get("Count"), Some(Some("5")));
        assert_eq!(args.get("Ratio"), Some(Some("2.5")));
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn absent_values_keep_their_field() {
        let greeting = Greeting {
            name: "a",
            count: 5,
            ratio: 0.0,
            nickname: None,
        };

        let args = assert_ok!(greeting.to_arguments());

        assert!(args.contains("Nickname"));
        assert_eq!(args.get("Nickname"), Some(None));
        assert_eq!(args.get("Missing"), None);
    }

    #[test]
    fn missing_record_is_empty() {
        let args = assert_ok!(marshal(None));
        assert!(args.is_empty());
    }

    #[test]
    fn unit_records_are_empty() {
        #[derive(Serialize)]
        struct Tick;

        assert!(assert_ok!(Arguments::from_serialize(&Tick)).is_empty());
    }

    #[test]
    fn nested_values_name_the_failing_field() {
        let value = json!({ "Id": 1, "Tags": ["a", "b"] });

        let error = assert_err!(value.to_arguments());

        assert_matches!(&error, ConversionError::Field { field, .. } if field == "Tags");
        let source = assert_some!(error.source());
        assert_eq!(source.to_string(), "a nested sequence has no canonical string form");
    }

    #[test]
    fn non_finite_floats_in_records_fail() {
        #[derive(Serialize)]
        struct Ratio {
            ratio: f64,
        }

        let error = assert_err!(Arguments::from_serialize(&Ratio { ratio: f64::NAN }));

        assert_matches!(&error, ConversionError::Field { field, type_name, .. } if field == "ratio" && type_name == "f64");
        assert_eq!(
            assert_some!(error.source()).to_string(),
            "NaN has no portable string form"
        );
    }

    #[test]
    fn wide_integers_keep_every_digit() {
        #[derive(Serialize)]
        struct Wide {
            big: u128,
        }

        let args = assert_ok!(Arguments::from_serialize(&Wide { big: u128::MAX }));
        assert_eq!(
            args.get("big"),
            Some(Some("340282366920938463463374607431768211455"))
        );
    }

    #[test]
    fn records_and_pushed_values_render_floats_alike() {
        #[derive(Serialize)]
        struct Amount {
            value: f64,
        }

        for value in [5.0, 1e21, 0.1, -2.5] {
            let serialized = assert_ok!(Arguments::from_serialize(&Amount { value }));
            let pushed = assert_ok!(Arguments::new().push("value", &value));
            assert_eq!(serialized, pushed);
        }

        let args = assert_ok!(Arguments::from_serialize(&Amount { value: 1e21 }));
        assert_eq!(args.get("value"), Some(Some("1000000000000000000000")));
        let args = assert_ok!(Arguments::from_serialize(&Amount { value: 5.0 }));
        assert_eq!(args.get("value"), Some(Some("5")));
    }

    #[test]
    fn unit_variants_render_as_their_name() {
        #[derive(Serialize)]
        enum Priority {
            High,
        }

        #[derive(Serialize)]
        struct Task {
            priority: Priority,
        }

        let args = assert_ok!(Arguments::from_serialize(&Task {
            priority: Priority::High
        }));
        assert_eq!(args.get("priority"), Some(Some("High")));
    }

    #[test]
    fn scalars_are_not_records() {
        let error = assert_err!(Arguments::from_serialize(&42));
        assert_matches!(error, ConversionError::NotARecord { type_name: "i32" });
    }

    #[test]
    fn pushed_values_use_locale_independent_formats() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 5).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        let args = Arguments::new()
            .push("Price", &1234.5_f64)
            .and_then(|args| args.push("At", &at))
            .and_then(|args| args.push("Day", &day))
            .and_then(|args| args.push("Flag", &true))
            .and_then(|args| args.push("Note", &None::<String>))
            .unwrap();

        assert_eq!(args.get("Price"), Some(Some("1234.5")));
        assert_eq!(args.get("At"), Some(Some("2024-01-31T08:00:05Z")));
        assert_eq!(args.get("Day"), Some(Some("2024-02-29")));
        assert_eq!(args.get("Flag"), Some(Some("true")));
        assert_eq!(args.get("Note"), Some(None));
    }

    #[test]
    fn non_finite_floats_fail_with_field_and_type() {
        let error = assert_err!(Arguments::new().push("Ratio", &f64::NAN));

        assert_eq!(
            error.to_string(),
            "could not convert field 'Ratio' of type 'f64' to a string"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn json_encoding_round_trips() {
        let mut args = Arguments::new();
        args.insert("Name", Some("a".into()));
        args.insert("Empty", None);

        let json = assert_ok!(args.to_json());
        assert_eq!(json, r#"{"Empty":null,"Name":"a"}"#);
        assert_eq!(assert_ok!(Arguments::from_json(&json)), args);
    }
}
