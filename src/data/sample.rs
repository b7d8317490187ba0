//! Synthetic epidemic sample generation.
//!
//! Each location follows a noisy geometric process:
//!
//! ```text
//! new_cases(t)  = c0 · r · (1 + r)^t · exp(σ·z - σ²/2),   z ~ N(0, 1)
//! total_cases   = round(c0) + running sum of rounded new cases
//! total_deaths  = 2% of total cases seven days earlier
//! total_tests   = 25 tests per case plus a daily baseline
//! ```
//!
//! The multiplicative noise has mean one, so the expected daily growth stays
//! `r`. Every other location skips Sunday reports to exercise gap handling.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{CanonicalRecord, CanonicalTable, Field, SampleConfig, TestUnits};
use crate::error::AppError;

/// Deaths per confirmed case.
const CASE_FATALITY: f64 = 0.02;
/// Reporting lag between a case and its death.
const DEATH_LAG_DAYS: usize = 7;
const TESTS_PER_CASE: f64 = 25.0;
const BASELINE_TESTS_PER_DAY: f64 = 100.0;

/// Parameters drawn for one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationProcess {
    pub initial_cases: f64,
    pub daily_growth: f64,
}

pub fn generate_sample(config: &SampleConfig) -> Result<CanonicalTable, AppError> {
    if config.locations.is_empty() {
        return Err(AppError::new(2, "At least one location is required."));
    }
    if config.days == 0 {
        return Err(AppError::new(2, "Sample length must be > 0 days."));
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(AppError::new(2, "Noise sigma must be finite and >= 0."));
    }

    let normal = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let correction = 0.5 * config.noise_sigma * config.noise_sigma;
    let dates: Vec<_> = config.start.iter_days().take(config.days).collect();

    let mut records = Vec::with_capacity(config.locations.len() * config.days);
    for (idx, location) in config.locations.iter().enumerate() {
        let mut rng = StdRng::seed_from_u64(location_seed(config.seed, location));
        let process = draw_process(&mut rng);
        let skips_sundays = idx % 2 == 1;

        let mut totals = Vec::with_capacity(config.days);
        let mut total = process.initial_cases.round();
        for (t, date) in dates.iter().enumerate() {
            let expected = process.initial_cases * process.daily_growth * (1.0 + process.daily_growth).powi(t as i32);
            let noise = (normal.sample(&mut rng) - correction).exp();
            total += (expected * noise).round();
            totals.push(total);

            if skips_sundays && date.weekday() == Weekday::Sun {
                continue;
            }
            let deaths = t
                .checked_sub(DEATH_LAG_DAYS)
                .map_or(0.0, |lagged| (totals[lagged] * CASE_FATALITY).floor());
            let tests = total * TESTS_PER_CASE + BASELINE_TESTS_PER_DAY * (t + 1) as f64;

            let mut record = CanonicalRecord::new(*date, location.clone())
                .with(Field::TOTAL_CASES, total)
                .with(Field::TOTAL_DEATHS, deaths)
                .with(Field::TOTAL_TESTS, tests);
            record.tests_units = Some(TestUnits::Tests);
            records.push(record);
        }
    }

    let table = CanonicalTable::new(records);
    info!(
        locations = config.locations.len(),
        days = config.days,
        records = table.len(),
        seed = config.seed,
        "generated synthetic sample"
    );
    Ok(table)
}

/// Parameters `generate_sample` draws for a location under `seed`.
pub fn location_process(seed: u64, location: &str) -> LocationProcess {
    draw_process(&mut StdRng::seed_from_u64(location_seed(seed, location)))
}

fn draw_process(rng: &mut StdRng) -> LocationProcess {
    LocationProcess {
        initial_cases: rng.gen_range(5.0..50.0),
        daily_growth: rng.gen_range(0.02..0.15),
    }
}

fn location_seed(seed: u64, location: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    location.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> SampleConfig {
        SampleConfig {
            locations: vec!["Alpha".to_string(), "Beta".to_string()],
            // A Wednesday.
            start: NaiveDate::from_ymd_opt(2020, 3, 4).unwrap(),
            days: 40,
            seed: 7,
            noise_sigma: 0.2,
        }
    }

    #[test]
    fn same_seed_same_sample() {
        assert_eq!(generate_sample(&config()).unwrap(), generate_sample(&config()).unwrap());

        let mut other = config();
        other.seed = 8;
        assert_ne!(generate_sample(&config()).unwrap(), generate_sample(&other).unwrap());
    }

    #[test]
    fn totals_never_decrease() {
        let table = generate_sample(&config()).unwrap();
        for location in table.locations() {
            let series: Vec<_> = table
                .records()
                .iter()
                .filter(|r| r.location == location)
                .collect();
            for pair in series.windows(2) {
                for field in [Field::TOTAL_CASES, Field::TOTAL_DEATHS, Field::TOTAL_TESTS] {
                    assert!(pair[1].get(field).unwrap() >= pair[0].get(field).unwrap());
                }
            }
        }
    }

    #[test]
    fn every_other_location_skips_sundays() {
        let table = generate_sample(&config()).unwrap();
        let count = |loc: &str| table.records().iter().filter(|r| r.location == loc).count();
        assert_eq!(count("Alpha"), 40);
        // 40 days from a Wednesday contain 6 Sundays.
        assert_eq!(count("Beta"), 34);
    }

    #[test]
    fn drawn_process_matches_generator() {
        let p = location_process(7, "Alpha");
        assert!((5.0..50.0).contains(&p.initial_cases));
        assert!((0.02..0.15).contains(&p.daily_growth));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut c = config();
        c.days = 0;
        assert_eq!(generate_sample(&c).unwrap_err().exit_code(), 2);

        let mut c = config();
        c.locations.clear();
        assert_eq!(generate_sample(&c).unwrap_err().exit_code(), 2);

        let mut c = config();
        c.noise_sigma = f64::NAN;
        assert_eq!(generate_sample(&c).unwrap_err().exit_code(), 2);
    }
}
