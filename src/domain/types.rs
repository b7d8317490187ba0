//! Shared domain types: the canonical schema and run configuration.
//!
//! The canonical schema is *typed*: every numeric field is a [`Field`], the
//! product of a [`MetricFamily`] (cases / deaths / tests), a [`Measure`]
//! (cumulative total or incremental new) and a [`Scale`] (absolute or
//! per-capita). Field names match the column names used by the upstream
//! data sources (`total_cases_per_million`, `new_tests_per_thousand`, ...).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::metric::MetricRequest;
use crate::error::EngineError;

/// Which epidemiological quantity a field counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricFamily {
    Cases,
    Deaths,
    Tests,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 3] = [MetricFamily::Cases, MetricFamily::Deaths, MetricFamily::Tests];

    pub fn name(self) -> &'static str {
        match self {
            MetricFamily::Cases => "cases",
            MetricFamily::Deaths => "deaths",
            MetricFamily::Tests => "tests",
        }
    }

    /// Population unit used by the per-capita variant.
    ///
    /// Cases and deaths are reported per million people, tests per thousand.
    pub fn per_capita_unit(self) -> PerCapitaUnit {
        match self {
            MetricFamily::Cases | MetricFamily::Deaths => PerCapitaUnit::Million,
            MetricFamily::Tests => PerCapitaUnit::Thousand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerCapitaUnit {
    Thousand,
    Million,
}

impl PerCapitaUnit {
    pub fn label(self) -> &'static str {
        match self {
            PerCapitaUnit::Thousand => "thousand",
            PerCapitaUnit::Million => "million",
        }
    }

    /// Number of people per unit.
    pub fn people(self) -> f64 {
        match self {
            PerCapitaUnit::Thousand => 1_000.0,
            PerCapitaUnit::Million => 1_000_000.0,
        }
    }
}

/// Cumulative running total or first difference of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Measure {
    Total,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scale {
    Absolute,
    PerCapita,
}

/// A numeric field of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Field {
    pub family: MetricFamily,
    pub measure: Measure,
    pub scale: Scale,
}

impl Field {
    pub const TOTAL_CASES: Field = Field::new(MetricFamily::Cases, Measure::Total, Scale::Absolute);
    pub const TOTAL_CASES_PER_MILLION: Field = Field::new(MetricFamily::Cases, Measure::Total, Scale::PerCapita);
    pub const NEW_CASES: Field = Field::new(MetricFamily::Cases, Measure::New, Scale::Absolute);
    pub const TOTAL_DEATHS: Field = Field::new(MetricFamily::Deaths, Measure::Total, Scale::Absolute);
    pub const NEW_DEATHS: Field = Field::new(MetricFamily::Deaths, Measure::New, Scale::Absolute);
    pub const TOTAL_TESTS: Field = Field::new(MetricFamily::Tests, Measure::Total, Scale::Absolute);
    pub const NEW_TESTS: Field = Field::new(MetricFamily::Tests, Measure::New, Scale::Absolute);

    pub const fn new(family: MetricFamily, measure: Measure, scale: Scale) -> Self {
        Self { family, measure, scale }
    }

    pub const fn total(family: MetricFamily, scale: Scale) -> Self {
        Self::new(family, Measure::Total, scale)
    }

    pub const fn incremental(family: MetricFamily, scale: Scale) -> Self {
        Self::new(family, Measure::New, scale)
    }

    /// Same family and scale, other measure.
    pub const fn with_measure(self, measure: Measure) -> Self {
        Self::new(self.family, measure, self.scale)
    }

    /// Every field of the canonical schema, in a stable order.
    pub fn all() -> impl Iterator<Item = Field> {
        MetricFamily::ALL.into_iter().flat_map(|family| {
            [Measure::Total, Measure::New].into_iter().flat_map(move |measure| {
                [Scale::Absolute, Scale::PerCapita]
                    .into_iter()
                    .map(move |scale| Field::new(family, measure, scale))
            })
        })
    }

    pub fn name(self) -> String {
        let measure = match self.measure {
            Measure::Total => "total",
            Measure::New => "new",
        };
        match self.scale {
            Scale::Absolute => format!("{measure}_{}", self.family.name()),
            Scale::PerCapita => format!(
                "{measure}_{}_per_{}",
                self.family.name(),
                self.family.per_capita_unit().label()
            ),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Field {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Field::all()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| EngineError::UnknownVariable(s.to_string()))
    }
}

/// How a source counts tests (the categorical `tests_units` column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestUnits {
    Tests,
    Persons,
    Other(String),
}

impl TestUnits {
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let lower = label.to_ascii_lowercase();
        Some(match lower.as_str() {
            "tests" | "tests performed" => TestUnits::Tests,
            "persons" | "people tested" => TestUnits::Persons,
            _ => TestUnits::Other(label.to_string()),
        })
    }

    pub fn label(&self) -> &str {
        match self {
            TestUnits::Tests => "tests",
            TestUnits::Persons => "persons",
            TestUnits::Other(label) => label,
        }
    }
}

/// Settings for `epi metric`.
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub input: PathBuf,
    pub population: Option<PathBuf>,
    pub request: MetricRequest,
    pub locations: Vec<String>,
    pub tail: usize,
    pub export: Option<PathBuf>,
}

/// Settings for `epi fit`.
#[derive(Debug, Clone)]
pub struct FitRunConfig {
    pub input: PathBuf,
    pub population: Option<PathBuf>,
    pub field: Field,
    pub window: usize,
    pub locations: Vec<String>,
    pub tail: usize,
    pub export: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}

/// Settings for the synthetic sample generator.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub locations: Vec<String>,
    pub start: chrono::NaiveDate,
    pub days: usize,
    pub seed: u64,
    /// Daily log-normal noise on new cases.
    pub noise_sigma: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_source_columns() {
        let names: Vec<String> = Field::all().map(Field::name).collect();
        assert_eq!(names.len(), 12);
        assert!(names.contains(&"total_cases".to_string()));
        assert!(names.contains(&"new_deaths_per_million".to_string()));
        assert!(names.contains(&"total_tests_per_thousand".to_string()));
        assert!(!names.contains(&"total_tests_per_million".to_string()));
    }

    #[test]
    fn field_parse_round_trips_and_rejects_unknown() {
        for field in Field::all() {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert_eq!(
            "cum_pos_test_rate".parse::<Field>(),
            Err(EngineError::UnknownVariable("cum_pos_test_rate".to_string()))
        );
    }

    #[test]
    fn test_units_parse() {
        assert_eq!(TestUnits::parse("persons"), Some(TestUnits::Persons));
        assert_eq!(TestUnits::parse(" Tests "), Some(TestUnits::Tests));
        assert_eq!(TestUnits::parse(""), None);
        assert_eq!(TestUnits::parse("samples").unwrap().label(), "samples");
    }
}
