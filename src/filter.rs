use crate::error::CollectorError;
use crate::model::RecipeRecord;
use crate::nutrition::{parse_nutrition_value, Unparsable};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Nutrient properties of schema.org `NutritionInformation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutrientField {
    Calories,
    FatContent,
    SaturatedFatContent,
    TransFatContent,
    UnsaturatedFatContent,
    CholesterolContent,
    SodiumContent,
    CarbohydrateContent,
    FiberContent,
    SugarContent,
    ProteinContent,
}

impl NutrientField {
    pub const ALL: [NutrientField; 11] = [
        NutrientField::Calories,
        NutrientField::FatContent,
        NutrientField::SaturatedFatContent,
        NutrientField::TransFatContent,
        NutrientField::UnsaturatedFatContent,
        NutrientField::CholesterolContent,
        NutrientField::SodiumContent,
        NutrientField::CarbohydrateContent,
        NutrientField::FiberContent,
        NutrientField::SugarContent,
        NutrientField::ProteinContent,
    ];

    /// Key used in the `nutrition` mapping of a recipe
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientField::Calories => "calories",
            NutrientField::FatContent => "fatContent",
            NutrientField::SaturatedFatContent => "saturatedFatContent",
            NutrientField::TransFatContent => "transFatContent",
            NutrientField::UnsaturatedFatContent => "unsaturatedFatContent",
            NutrientField::CholesterolContent => "cholesterolContent",
            NutrientField::SodiumContent => "sodiumContent",
            NutrientField::CarbohydrateContent => "carbohydrateContent",
            NutrientField::FiberContent => "fiberContent",
            NutrientField::SugarContent => "sugarContent",
            NutrientField::ProteinContent => "proteinContent",
        }
    }
}

impl fmt::Display for NutrientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NutrientField {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        // Short names used on the command line
        let alias = match name.to_ascii_lowercase().as_str() {
            "fat" => Some(NutrientField::FatContent),
            "protein" => Some(NutrientField::ProteinContent),
            "carbs" | "carbohydrates" => Some(NutrientField::CarbohydrateContent),
            "fiber" => Some(NutrientField::FiberContent),
            "sugar" => Some(NutrientField::SugarContent),
            "sodium" => Some(NutrientField::SodiumContent),
            _ => None,
        };

        alias
            .or_else(|| {
                NutrientField::ALL
                    .into_iter()
                    .find(|field| field.as_str().eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| CollectorError::InvalidFilter(format!("unknown nutrient '{name}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
        }
    }
}

/// A numeric constraint on one nutrient, e.g. `proteinContent >= 20`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutritionPredicate {
    pub field: NutrientField,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl NutritionPredicate {
    pub fn new(field: NutrientField, comparator: Comparator, threshold: f64) -> Self {
        Self {
            field,
            comparator,
            threshold,
        }
    }

    pub fn at_least(field: NutrientField, threshold: f64) -> Self {
        Self::new(field, Comparator::Ge, threshold)
    }

    pub fn at_most(field: NutrientField, threshold: f64) -> Self {
        Self::new(field, Comparator::Le, threshold)
    }

    pub fn test(&self, value: f64) -> bool {
        self.comparator.compare(value, self.threshold)
    }
}

impl fmt::Display for NutritionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.field,
            self.comparator.as_str(),
            self.threshold
        )
    }
}

impl FromStr for NutritionPredicate {
    type Err = CollectorError;

    /// Parse `<field><op><number>`, e.g. `proteinContent>=20` or `fat < 15`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CollectorError::InvalidFilter(format!("expected '<field><op><number>', got '{s}'"));

        let op_start = s.find(['<', '>']).ok_or_else(invalid)?;
        let (field, rest) = s.split_at(op_start);
        let (comparator, threshold) = if let Some(t) = rest.strip_prefix("<=") {
            (Comparator::Le, t)
        } else if let Some(t) = rest.strip_prefix(">=") {
            (Comparator::Ge, t)
        } else if let Some(t) = rest.strip_prefix('<') {
            (Comparator::Lt, t)
        } else if let Some(t) = rest.strip_prefix('>') {
            (Comparator::Gt, t)
        } else {
            return Err(invalid());
        };

        let threshold: f64 = threshold.trim().parse().map_err(|_| invalid())?;
        if !threshold.is_finite() {
            return Err(invalid());
        }

        Ok(Self::new(field.parse()?, comparator, threshold))
    }
}

/// Matching criteria for one collection run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    banned_ingredients: Vec<String>,
    nutrition_predicates: Vec<NutritionPredicate>,
}

impl FilterSpec {
    /// Banned ingredients are trimmed and lowercased; blank entries are dropped
    pub fn new<I, S>(banned_ingredients: I, nutrition_predicates: Vec<NutritionPredicate>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned_ingredients = banned_ingredients
            .into_iter()
            .map(|b| b.as_ref().trim().to_lowercase())
            .filter(|b| !b.is_empty())
            .collect();

        Self {
            banned_ingredients,
            nutrition_predicates,
        }
    }

    pub fn banned_ingredients(&self) -> &[String] {
        &self.banned_ingredients
    }

    pub fn nutrition_predicates(&self) -> &[NutritionPredicate] {
        &self.nutrition_predicates
    }
}

/// Why a recipe did not pass a [`FilterSpec`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("contains banned ingredient '{0}'")]
    BannedIngredient(String),

    #[error("{field}: {source}")]
    Unparsable {
        field: NutrientField,
        source: Unparsable,
    },

    #[error("{predicate} not satisfied by {value}")]
    OutOfRange {
        predicate: NutritionPredicate,
        value: f64,
    },
}

/// Check a recipe against the banned ingredients, then the nutrition predicates.
pub fn evaluate(record: &RecipeRecord, spec: &FilterSpec) -> Result<(), Rejection> {
    evaluate_with(record, spec, parse_nutrition_value)
}

pub fn matches(record: &RecipeRecord, spec: &FilterSpec) -> bool {
    evaluate(record, spec).is_ok()
}

/// Same as [`evaluate`] with a caller-supplied nutrition parser.
pub fn evaluate_with<P>(record: &RecipeRecord, spec: &FilterSpec, mut parse: P) -> Result<(), Rejection>
where
    P: FnMut(Option<&str>) -> Result<f64, Unparsable>,
{
    let ingredients = record
        .ingredients
        .iter()
        .map(|line| line.to_lowercase())
        .collect::<Vec<String>>()
        .join(" ");

    if let Some(banned) = spec
        .banned_ingredients
        .iter()
        .find(|banned| ingredients.contains(banned.as_str()))
    {
        return Err(Rejection::BannedIngredient(banned.clone()));
    }

    for predicate in &spec.nutrition_predicates {
        let raw = record.nutrition.get(predicate.field.as_str()).map(String::as_str);
        let value = parse(raw).map_err(|source| Rejection::Unparsable {
            field: predicate.field,
            source,
        })?;
        if !predicate.test(value) {
            return Err(Rejection::OutOfRange {
                predicate: *predicate,
                value,
            });
        }
    }

    Ok(())
}
