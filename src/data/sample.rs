//! Synthetic race-stint generation.
//!
//! Produces a plausible one-driver record set without any external data source:
//! a stint split by a single pit stop, slowly drifting weather, and lap times
//! built from known effects plus Gaussian noise. Because the effects are known,
//! the generated laps double as a sanity check for the solvers.

use chrono::Duration;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ColumnData, Feature, RecordSet, TARGET_COLUMN};
use crate::error::{AppError, EXIT_INPUT, EXIT_NUMERIC};

/// Lap time on fresh tyres, full tank, reference track temperature (s).
pub const BASE_LAP_SECONDS: f64 = 91.5;
/// Tyre degradation per lap of tyre life (s).
pub const TYRE_DEG_PER_LAP: f64 = 0.06;
/// Fuel burn gain per lap (s, negative: the car gets faster).
pub const FUEL_EFFECT_PER_LAP: f64 = -0.055;
/// Lap-time sensitivity to track temperature (s / °C).
pub const TRACK_TEMP_EFFECT: f64 = 0.04;

const REFERENCE_TRACK_TEMP: f64 = 38.0;
const LAP_NOISE_SD: f64 = 0.15;

/// Generate a synthetic stint of `laps` laps.
///
/// The pit-in lap has no recorded time, like a real timing feed.
pub fn generate_stint(laps: usize, seed: u64) -> Result<RecordSet, AppError> {
    if laps < 2 {
        return Err(AppError::new(EXIT_INPUT, "Synthetic stint needs at least 2 laps."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let lap_noise = Normal::new(0.0, LAP_NOISE_SD)
        .map_err(|e| AppError::new(EXIT_NUMERIC, format!("Noise distribution error: {e}")))?;
    let weather_noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(EXIT_NUMERIC, format!("Noise distribution error: {e}")))?;

    let pit_lap = rng.gen_range(laps / 3..=(2 * laps / 3).max(laps / 3));

    let mut lap_time = Vec::with_capacity(laps);
    let mut tyre_life = Vec::with_capacity(laps);
    let mut track_temp = Vec::with_capacity(laps);
    let mut air_temp = Vec::with_capacity(laps);
    let mut wind_speed = Vec::with_capacity(laps);
    let mut lap_number = Vec::with_capacity(laps);

    let mut track = REFERENCE_TRACK_TEMP + weather_noise.sample(&mut rng);
    let mut air = 24.0 + 0.5 * weather_noise.sample(&mut rng);
    let mut tyre = 1.0;

    for i in 0..laps {
        let lap = (i + 1) as f64;

        // Slow random walk around a gentle afternoon warming trend.
        track += 0.05 + 0.2 * weather_noise.sample(&mut rng);
        air += 0.02 + 0.05 * weather_noise.sample(&mut rng);
        let wind = (2.5 + 0.6 * weather_noise.sample(&mut rng)).max(0.0);

        let seconds = BASE_LAP_SECONDS
            + TYRE_DEG_PER_LAP * tyre
            + FUEL_EFFECT_PER_LAP * lap
            + TRACK_TEMP_EFFECT * (track - REFERENCE_TRACK_TEMP)
            + lap_noise.sample(&mut rng);

        lap_time.push(if i == pit_lap {
            None
        } else {
            Some(Duration::microseconds((seconds * 1_000_000.0).round() as i64))
        });
        tyre_life.push(Some(tyre));
        track_temp.push(Some(round_to(track, 1)));
        air_temp.push(Some(round_to(air, 1)));
        wind_speed.push(Some(round_to(wind, 1)));
        lap_number.push(Some(lap));

        tyre = if i == pit_lap { 1.0 } else { tyre + 1.0 };
    }

    log::debug!("synthetic stint: {laps} laps, pit on lap {}", pit_lap + 1);

    Ok(RecordSet::new()
        .with_column(TARGET_COLUMN, ColumnData::Duration(lap_time))
        .with_column(Feature::TyreLife.column_name(), ColumnData::Numeric(tyre_life))
        .with_column(Feature::TrackTemp.column_name(), ColumnData::Numeric(track_temp))
        .with_column(Feature::WindSpeed.column_name(), ColumnData::Numeric(wind_speed))
        .with_column(Feature::AirTemp.column_name(), ColumnData::Numeric(air_temp))
        .with_column(Feature::LapNumber.column_name(), ColumnData::Numeric(lap_number)))
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}
