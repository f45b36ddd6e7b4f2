//! Canonical default values for every Ames feature.

use crate::dataset::FeatureValue;
use crate::serving::record::FeatureRecord;
use std::collections::HashMap;

/// Immutable fallback values used to complete sparse requests.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultTable {
    entries: HashMap<String, FeatureValue>,
}

impl DefaultTable {
    /// Build a table from `(name, value)` pairs. A later duplicate wins.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FeatureValue)>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Defaults for a typical two-story Ames house.
    ///
    /// `SaleType` keeps the trailing space the raw data uses.
    pub fn ames() -> Self {
        Self::from_entries(ames_entries())
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A fresh full record holding every default.
    pub fn to_record(&self) -> FeatureRecord {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for DefaultTable {
    fn default() -> Self {
        Self::ames()
    }
}

fn ames_entries() -> Vec<(&'static str, FeatureValue)> {
    vec![
        ("Order", FeatureValue::Int(1)),
        ("PID", FeatureValue::Int(526301100)),
        ("MSSubClass", FeatureValue::Int(60)),
        ("MSZoning", FeatureValue::Str("RL".to_string())),
        ("LotFrontage", FeatureValue::Float(65.0)),
        ("LotArea", FeatureValue::Int(9500)),
        ("Street", FeatureValue::Str("Pave".to_string())),
        ("Alley", FeatureValue::Null),
        ("LotShape", FeatureValue::Str("Reg".to_string())),
        ("LandContour", FeatureValue::Str("Lvl".to_string())),
        ("Utilities", FeatureValue::Str("AllPub".to_string())),
        ("LotConfig", FeatureValue::Str("Inside".to_string())),
        ("LandSlope", FeatureValue::Str("Gtl".to_string())),
        ("Neighborhood", FeatureValue::Str("NAmes".to_string())),
        ("Condition1", FeatureValue::Str("Norm".to_string())),
        ("Condition2", FeatureValue::Str("Norm".to_string())),
        ("BldgType", FeatureValue::Str("1Fam".to_string())),
        ("HouseStyle", FeatureValue::Str("2Story".to_string())),
        ("OverallQual", FeatureValue::Int(7)),
        ("OverallCond", FeatureValue::Int(5)),
        ("YearBuilt", FeatureValue::Int(2005)),
        ("YearRemodAdd", FeatureValue::Int(2006)),
        ("RoofStyle", FeatureValue::Str("Gable".to_string())),
        ("RoofMatl", FeatureValue::Str("CompShg".to_string())),
        ("Exterior1st", FeatureValue::Str("VinylSd".to_string())),
        ("Exterior2nd", FeatureValue::Str("VinylSd".to_string())),
        ("MasVnrType", FeatureValue::Str("None".to_string())),
        ("MasVnrArea", FeatureValue::Float(0.0)),
        ("ExterQual", FeatureValue::Str("Gd".to_string())),
        ("ExterCond", FeatureValue::Str("TA".to_string())),
        ("Foundation", FeatureValue::Str("PConc".to_string())),
        ("BsmtQual", FeatureValue::Str("Gd".to_string())),
        ("BsmtCond", FeatureValue::Str("TA".to_string())),
        ("BsmtExposure", FeatureValue::Str("No".to_string())),
        ("BsmtFinType1", FeatureValue::Str("GLQ".to_string())),
        ("BsmtFinSF1", FeatureValue::Float(0.0)),
        ("BsmtFinType2", FeatureValue::Str("Unf".to_string())),
        ("BsmtFinSF2", FeatureValue::Float(0.0)),
        ("BsmtUnfSF", FeatureValue::Float(0.0)),
        ("TotalBsmtSF", FeatureValue::Float(1000.0)),
        ("Heating", FeatureValue::Str("GasA".to_string())),
        ("HeatingQC", FeatureValue::Str("Ex".to_string())),
        ("CentralAir", FeatureValue::Str("Y".to_string())),
        ("Electrical", FeatureValue::Str("SBrkr".to_string())),
        ("1st Flr SF", FeatureValue::Int(1200)),
        ("2nd Flr SF", FeatureValue::Int(0)),
        ("LowQualFinSF", FeatureValue::Int(0)),
        ("GrLivArea", FeatureValue::Int(1500)),
        ("BsmtFullBath", FeatureValue::Float(0.0)),
        ("BsmtHalfBath", FeatureValue::Float(0.0)),
        ("FullBath", FeatureValue::Int(2)),
        ("HalfBath", FeatureValue::Int(1)),
        ("BedroomAbvGr", FeatureValue::Int(3)),
        ("KitchenAbvGr", FeatureValue::Int(1)),
        ("KitchenQual", FeatureValue::Str("Gd".to_string())),
        ("TotRmsAbvGrd", FeatureValue::Int(6)),
        ("Functional", FeatureValue::Str("Typ".to_string())),
        ("Fireplaces", FeatureValue::Int(1)),
        ("FireplaceQu", FeatureValue::Str("Gd".to_string())),
        ("GarageType", FeatureValue::Str("Attchd".to_string())),
        ("GarageYrBlt", FeatureValue::Float(2005.0)),
        ("GarageFinish", FeatureValue::Str("RFn".to_string())),
        ("GarageCars", FeatureValue::Float(2.0)),
        ("GarageArea", FeatureValue::Float(500.0)),
        ("GarageQual", FeatureValue::Str("TA".to_string())),
        ("GarageCond", FeatureValue::Str("TA".to_string())),
        ("PavedDrive", FeatureValue::Str("Y".to_string())),
        ("WoodDeckSF", FeatureValue::Int(0)),
        ("OpenPorchSF", FeatureValue::Int(40)),
        ("EnclosedPorch", FeatureValue::Int(0)),
        ("3Ssn Porch", FeatureValue::Int(0)),
        ("ScreenPorch", FeatureValue::Int(0)),
        ("PoolArea", FeatureValue::Int(0)),
        ("PoolQC", FeatureValue::Null),
        ("Fence", FeatureValue::Null),
        ("MiscFeature", FeatureValue::Null),
        ("MiscVal", FeatureValue::Int(0)),
        ("MoSold", FeatureValue::Int(6)),
        ("YrSold", FeatureValue::Int(2008)),
        ("SaleType", FeatureValue::Str("WD ".to_string())),
        ("SaleCondition", FeatureValue::Str("Normal".to_string())),
    ]
}
