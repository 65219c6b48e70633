//! Pure unit conversions shared by the value model and the provider adapters.

const KPH_PER_MPH: f64 = 1.609_344;
const MPS_PER_MPH: f64 = 0.447_04;
const KNOTS_PER_MPH: f64 = 0.868_976;
const METERS_PER_MILE: f64 = 1_609.344;
const KM_PER_MILE: f64 = 1.609_344;
const INHG_PER_HPA: f64 = 0.02953;

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    celsius_to_fahrenheit(kelvin - 273.15)
}

pub fn kph_to_mph(kph: f64) -> f64 {
    kph / KPH_PER_MPH
}

pub fn mph_to_kph(mph: f64) -> f64 {
    mph * KPH_PER_MPH
}

pub fn mps_to_mph(mps: f64) -> f64 {
    mps / MPS_PER_MPH
}

pub fn mph_to_mps(mph: f64) -> f64 {
    mph * MPS_PER_MPH
}

pub fn knots_to_mph(knots: f64) -> f64 {
    knots / KNOTS_PER_MPH
}

pub fn mph_to_knots(mph: f64) -> f64 {
    mph * KNOTS_PER_MPH
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

/// Barometric pressure, hectopascals (millibars) to inches of mercury.
pub fn hpa_to_inhg(hpa: f64) -> f64 {
    hpa * INHG_PER_HPA
}
