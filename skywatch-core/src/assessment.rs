//! Interchangeable assessment strategies and the coordinator that holds the
//! process default.

use std::{convert::TryFrom, fmt::Debug};

use parking_lot::RwLock;

use crate::{
    error::WeatherError,
    assessment::{
        health::HealthImpactStrategy, outdoor::OutdoorActivityStrategy, standard::StandardStrategy,
        travel::TravelSafetyStrategy,
    },
    record::WeatherRecord,
};

pub mod health;
pub mod outdoor;
pub mod standard;
pub mod travel;

/// One way of judging an observation.
pub trait AssessmentStrategy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn is_dangerous(&self, record: &WeatherRecord) -> bool;

    fn is_good_for_outdoor(&self, record: &WeatherRecord) -> bool;

    /// 1 (worst) to 10 (best), in the strategy's own reading.
    fn comfort_rating(&self, record: &WeatherRecord) -> u8;

    fn weather_description(&self, record: &WeatherRecord) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrategyKind {
    #[default]
    Standard,
    OutdoorActivity,
    TravelSafety,
    HealthImpact,
}

static STANDARD: StandardStrategy = StandardStrategy;
static OUTDOOR_ACTIVITY: OutdoorActivityStrategy = OutdoorActivityStrategy;
static TRAVEL_SAFETY: TravelSafetyStrategy = TravelSafetyStrategy;
static HEALTH_IMPACT: HealthImpactStrategy = HealthImpactStrategy;

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Standard => "standard",
            StrategyKind::OutdoorActivity => "outdoor_activity",
            StrategyKind::TravelSafety => "travel_safety",
            StrategyKind::HealthImpact => "health_impact",
        }
    }

    pub const fn all() -> &'static [StrategyKind] {
        &[
            StrategyKind::Standard,
            StrategyKind::OutdoorActivity,
            StrategyKind::TravelSafety,
            StrategyKind::HealthImpact,
        ]
    }

    /// Strategies are stateless, so one shared instance per kind suffices.
    pub fn strategy(&self) -> &'static dyn AssessmentStrategy {
        match self {
            StrategyKind::Standard => &STANDARD,
            StrategyKind::OutdoorActivity => &OUTDOOR_ACTIVITY,
            StrategyKind::TravelSafety => &TRAVEL_SAFETY,
            StrategyKind::HealthImpact => &HEALTH_IMPACT,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StrategyKind {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");

        match normalized.as_str() {
            "standard" => Ok(StrategyKind::Standard),
            "outdoor_activity" => Ok(StrategyKind::OutdoorActivity),
            "travel_safety" => Ok(StrategyKind::TravelSafety),
            "health_impact" => Ok(StrategyKind::HealthImpact),
            _ => Err(WeatherError::UnknownStrategy(value.to_string())),
        }
    }
}

/// Factory: resolve a strategy by its name.
pub fn strategy_by_name(name: &str) -> Result<&'static dyn AssessmentStrategy, WeatherError> {
    StrategyKind::try_from(name).map(|kind| kind.strategy())
}

pub(crate) fn clamp_rating(score: i32) -> u8 {
    score.clamp(1, 10) as u8
}

/// Rating for a record with nothing to judge: neither safe nor unsafe.
pub(crate) const UNKNOWN_RATING: u8 = 5;

/// Fallback records, or observations carrying neither temperature nor wind.
pub(crate) fn lacks_measurements(record: &WeatherRecord) -> bool {
    record.is_degraded() || (record.temperature().is_none() && record.wind().is_none())
}

pub(crate) fn unavailable_description(record: &WeatherRecord) -> String {
    format!(
        "Weather data is currently unavailable for {} (source: {}).",
        record.location(),
        record.data_source()
    )
}

/// Holds the default strategy; every query can override it per call.
#[derive(Debug, Default)]
pub struct WeatherAssessor {
    default: RwLock<StrategyKind>,
}

impl WeatherAssessor {
    pub fn new(default: StrategyKind) -> Self {
        Self { default: RwLock::new(default) }
    }

    pub fn default_strategy(&self) -> StrategyKind {
        *self.default.read()
    }

    pub fn set_default_strategy(&self, kind: StrategyKind) {
        let previous = std::mem::replace(&mut *self.default.write(), kind);
        tracing::info!(from = %previous, to = %kind, "default assessment strategy changed");
    }

    fn current(&self) -> &'static dyn AssessmentStrategy {
        self.default_strategy().strategy()
    }

    pub fn is_dangerous(&self, record: &WeatherRecord) -> bool {
        self.current().is_dangerous(record)
    }

    pub fn is_dangerous_with(&self, kind: StrategyKind, record: &WeatherRecord) -> bool {
        kind.strategy().is_dangerous(record)
    }

    pub fn is_good_for_outdoor(&self, record: &WeatherRecord) -> bool {
        self.current().is_good_for_outdoor(record)
    }

    pub fn is_good_for_outdoor_with(&self, kind: StrategyKind, record: &WeatherRecord) -> bool {
        kind.strategy().is_good_for_outdoor(record)
    }

    pub fn comfort_rating(&self, record: &WeatherRecord) -> u8 {
        self.current().comfort_rating(record)
    }

    pub fn comfort_rating_with(&self, kind: StrategyKind, record: &WeatherRecord) -> u8 {
        kind.strategy().comfort_rating(record)
    }

    pub fn weather_description(&self, record: &WeatherRecord) -> String {
        self.current().weather_description(record)
    }

    pub fn weather_description_with(&self, kind: StrategyKind, record: &WeatherRecord) -> String {
        kind.strategy().weather_description(record)
    }

    /// Evaluate `record` under every strategy. Reads nothing mutable.
    pub fn compare(&self, record: &WeatherRecord) -> StrategyComparison {
        StrategyComparison::evaluate(record)
    }

    /// Rendered form of [`WeatherAssessor::compare`].
    pub fn compare_strategies(&self, record: &WeatherRecord) -> String {
        self.compare(record).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyVerdict {
    pub kind: StrategyKind,
    pub name: &'static str,
    pub comfort_rating: u8,
    pub dangerous: bool,
    pub good_for_outdoor: bool,
}

/// Side-by-side verdicts of all strategies for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyComparison {
    pub verdicts: Vec<StrategyVerdict>,
    /// False when the record has no measurements to judge.
    pub data_available: bool,
}

impl StrategyComparison {
    pub fn evaluate(record: &WeatherRecord) -> Self {
        let verdicts = StrategyKind::all()
            .iter()
            .map(|&kind| {
                let strategy = kind.strategy();
                StrategyVerdict {
                    kind,
                    name: strategy.name(),
                    comfort_rating: strategy.comfort_rating(record),
                    dangerous: strategy.is_dangerous(record),
                    good_for_outdoor: strategy.is_good_for_outdoor(record),
                }
            })
            .collect();
        Self { verdicts, data_available: !lacks_measurements(record) }
    }

    pub fn all_agree_on_danger(&self) -> bool {
        self.verdicts.windows(2).all(|w| w[0].dangerous == w[1].dangerous)
    }

    pub fn dangerous_voters(&self) -> Vec<StrategyKind> {
        self.verdicts.iter().filter(|v| v.dangerous).map(|v| v.kind).collect()
    }

    pub fn outdoor_favorable_voters(&self) -> Vec<StrategyKind> {
        self.verdicts.iter().filter(|v| v.good_for_outdoor).map(|v| v.kind).collect()
    }

    /// Most lenient verdict: a non-dangerous vote beats a dangerous one, then
    /// the higher rating wins; ties go to the earlier strategy.
    pub fn most_favorable(&self) -> Option<&StrategyVerdict> {
        self.verdicts.iter().fold(None, |best: Option<&StrategyVerdict>, v| match best {
            Some(b) if (!b.dangerous, b.comfort_rating) >= (!v.dangerous, v.comfort_rating) => Some(b),
            _ => Some(v),
        })
    }

    fn names(&self, kinds: &[StrategyKind]) -> String {
        kinds.iter().map(|k| k.strategy().name()).collect::<Vec<_>>().join(", ")
    }
}

impl std::fmt::Display for StrategyComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };

        writeln!(f, "{:<18}  {:>7}  {:<9}  {:<7}", "Strategy", "Comfort", "Dangerous", "Outdoor")?;
        writeln!(f, "{:-<18}  {:->7}  {:-<9}  {:-<7}", "", "", "", "")?;
        for v in &self.verdicts {
            writeln!(
                f,
                "{:<18}  {:>7}  {:<9}  {:<7}",
                v.name,
                format!("{}/10", v.comfort_rating),
                yes_no(v.dangerous),
                yes_no(v.good_for_outdoor),
            )?;
        }
        writeln!(f)?;

        if !self.data_available {
            return write!(
                f,
                "Weather data is unavailable; no strategy can judge current conditions."
            );
        }

        let dangerous = self.dangerous_voters();
        if self.all_agree_on_danger() {
            let verdict = if dangerous.is_empty() { "not dangerous" } else { "dangerous" };
            writeln!(f, "All strategies agree: conditions are {verdict}.")?;
        } else {
            writeln!(
                f,
                "Strategies disagree on danger. Dangerous according to: {}.",
                self.names(&dangerous)
            )?;
        }

        if let Some(best) = self.most_favorable() {
            writeln!(
                f,
                "Most favorable view: {} ({}/10).",
                best.name, best.comfort_rating
            )?;
        }

        let outdoor = self.outdoor_favorable_voters();
        if outdoor.is_empty() {
            write!(f, "No strategy finds conditions favorable for outdoor activity.")
        } else {
            write!(f, "Favorable for outdoor activity according to: {}.", self.names(&outdoor))
        }
    }
}
