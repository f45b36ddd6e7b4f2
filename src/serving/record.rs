//! Request-side feature records.

use crate::dataset::FeatureValue;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Sparse mapping from feature name to value.
///
/// Serializes as a plain JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord(HashMap<String, FeatureValue>);

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn insert<V: Into<FeatureValue>>(&mut self, name: &str, value: V) -> Option<FeatureValue> {
        self.0.insert(name.to_string(), value.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.0.iter()
    }

    /// Copy every entry of `other` over this record. Keys this record does
    /// not know are added, not rejected.
    pub fn overlay(&mut self, other: &FeatureRecord) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Values in the given order. Names this record lacks become `Null`.
    pub fn project(&self, order: &[String]) -> Vec<FeatureValue> {
        order
            .iter()
            .map(|name| self.0.get(name).cloned().unwrap_or(FeatureValue::Null))
            .collect()
    }
}

impl From<HashMap<String, FeatureValue>> for FeatureRecord {
    fn from(map: HashMap<String, FeatureValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, FeatureValue)> for FeatureRecord {
    fn from_iter<I: IntoIterator<Item = (K, FeatureValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn default_total_bsmt_sf() -> Option<f64> {
    Some(1000.0)
}

fn default_garage_cars() -> Option<f64> {
    Some(2.0)
}

fn default_full_bath() -> i64 {
    2
}

fn default_neighborhood() -> String {
    "NAmes".to_string()
}

/// Integer field that also takes integral floats (`2.0`) and numeric strings
/// (`"1500"`). Fractional values are rejected.
fn lax_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct LaxInt;

    impl<'de> Visitor<'de> for LaxInt {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an integer")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let trimmed = v.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(n);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => self.visit_f64(f),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(LaxInt)
}

/// The user-facing subset of house attributes accepted by `POST /predict`.
///
/// The three size and quality fields are required. An optional numeric field
/// sent as `null` stays `None` and reaches the pipeline as a missing value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedRecord {
    #[serde(rename = "GrLivArea", deserialize_with = "lax_int")]
    pub gr_liv_area: i64,
    #[serde(rename = "OverallQual", deserialize_with = "lax_int")]
    pub overall_qual: i64,
    #[serde(rename = "YearBuilt", deserialize_with = "lax_int")]
    pub year_built: i64,
    #[serde(rename = "TotalBsmtSF", default = "default_total_bsmt_sf")]
    pub total_bsmt_sf: Option<f64>,
    #[serde(rename = "GarageCars", default = "default_garage_cars")]
    pub garage_cars: Option<f64>,
    #[serde(rename = "FullBath", default = "default_full_bath", deserialize_with = "lax_int")]
    pub full_bath: i64,
    #[serde(rename = "Neighborhood", default = "default_neighborhood")]
    pub neighborhood: String,
}

impl SimplifiedRecord {
    /// A record with the required fields set and defaults elsewhere.
    pub fn new(gr_liv_area: i64, overall_qual: i64, year_built: i64) -> Self {
        Self {
            gr_liv_area,
            overall_qual,
            year_built,
            total_bsmt_sf: default_total_bsmt_sf(),
            garage_cars: default_garage_cars(),
            full_bath: default_full_bath(),
            neighborhood: default_neighborhood(),
        }
    }
}

impl From<SimplifiedRecord> for FeatureRecord {
    fn from(r: SimplifiedRecord) -> Self {
        let mut record = FeatureRecord::new();
        record.insert("GrLivArea", r.gr_liv_area);
        record.insert("OverallQual", r.overall_qual);
        record.insert("YearBuilt", r.year_built);
        record.insert("TotalBsmtSF", r.total_bsmt_sf);
        record.insert("GarageCars", r.garage_cars);
        record.insert("FullBath", r.full_bath);
        record.insert("Neighborhood", r.neighborhood);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplified_defaults() {
        let r: SimplifiedRecord =
            serde_json::from_str(r#"{"GrLivArea":1500,"OverallQual":7,"YearBuilt":2005}"#).unwrap();
        assert_eq!(r, SimplifiedRecord::new(1500, 7, 2005));
        assert_eq!(r.total_bsmt_sf, Some(1000.0));
        assert_eq!(r.neighborhood, "NAmes");
    }

    #[test]
    fn test_simplified_explicit_null_and_unknown_keys() {
        let r: SimplifiedRecord = serde_json::from_str(
            r#"{"GrLivArea":1500,"OverallQual":7,"YearBuilt":2005,"GarageCars":null,"Pool":true}"#,
        )
        .unwrap();
        assert_eq!(r.garage_cars, None);

        let record = FeatureRecord::from(r);
        assert_eq!(record.get("GarageCars"), Some(&FeatureValue::Null));
        assert!(!record.contains("Pool"));
    }

    #[test]
    fn test_simplified_accepts_integral_floats_and_numeric_strings() {
        let r: SimplifiedRecord = serde_json::from_str(
            r#"{"GrLivArea":"1500","OverallQual":7.0,"YearBuilt":" 2005 ","FullBath":2.0}"#,
        )
        .unwrap();
        assert_eq!(r, SimplifiedRecord::new(1500, 7, 2005));
    }

    #[test]
    fn test_simplified_rejects_fractional_and_text_integers() {
        for body in [
            r#"{"GrLivArea":1500,"OverallQual":7,"YearBuilt":2005,"FullBath":2.5}"#,
            r#"{"GrLivArea":"big","OverallQual":7,"YearBuilt":2005}"#,
            r#"{"GrLivArea":1500,"OverallQual":true,"YearBuilt":2005}"#,
        ] {
            assert!(serde_json::from_str::<SimplifiedRecord>(body).is_err(), "{}", body);
        }
    }

    #[test]
    fn test_simplified_requires_core_fields() {
        let r: Result<SimplifiedRecord, _> = serde_json::from_str(r#"{"GrLivArea":1500}"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_simplified_to_record_has_seven_keys() {
        let record = FeatureRecord::from(SimplifiedRecord::new(1500, 7, 2005));
        assert_eq!(record.len(), 7);
        assert_eq!(record.get("GrLivArea"), Some(&FeatureValue::Int(1500)));
        assert_eq!(record.get("TotalBsmtSF"), Some(&FeatureValue::Float(1000.0)));
        assert_eq!(record.get("Neighborhood"), Some(&"NAmes".into()));
    }

    #[test]
    fn test_overlay_and_project() {
        let mut base: FeatureRecord = [("a", FeatureValue::Int(1)), ("b", FeatureValue::Int(2))]
            .into_iter()
            .collect();
        let top: FeatureRecord = [("b", FeatureValue::Int(20)), ("zzz", FeatureValue::Null)]
            .into_iter()
            .collect();
        base.overlay(&top);

        assert_eq!(base.len(), 3);
        let order = vec!["b".to_string(), "c".to_string(), "a".to_string()];
        assert_eq!(
            base.project(&order),
            vec![FeatureValue::Int(20), FeatureValue::Null, FeatureValue::Int(1)]
        );
    }

    #[test]
    fn test_record_json_is_untagged() {
        let record: FeatureRecord =
            serde_json::from_str(r#"{"Alley":null,"LotArea":9500,"Street":"Pave","LotFrontage":65.0}"#)
                .unwrap();
        assert_eq!(record.get("Alley"), Some(&FeatureValue::Null));
        assert_eq!(record.get("LotArea"), Some(&FeatureValue::Int(9500)));
        assert_eq!(record.get("LotFrontage"), Some(&FeatureValue::Float(65.0)));
    }
}
