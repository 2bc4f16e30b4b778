use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One raw line of `cases.csv`, exactly as the file spells it. Everything is
/// optional text here; typing happens in the loader.
#[derive(Debug, Deserialize)]
pub struct RawCaseRow {
    pub case_id: Option<String>,
    pub clinician: Option<String>,
    pub date: Option<String>,
    pub value: Option<String>,
    pub case_type: Option<String>,
    pub patient_satisfaction: Option<String>,
    pub zone: Option<String>,
    pub shift_category: Option<String>,
}

/// One raw line of `rotas.csv`.
#[derive(Debug, Deserialize)]
pub struct RawRotaRow {
    pub case_id: Option<String>,
    pub clinician: Option<String>,
    pub role: Option<String>,
    pub shift_start: Option<String>,
    pub shift_end: Option<String>,
    pub duration: Option<String>,
    pub timeslot: Option<String>,
}

/// A typed case row. `case_id` stays a string until `clean_and_join` has
/// filtered the `"none"` sentinel and coerced the survivors to integers.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    pub case_id: String,
    pub clinician: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub case_type: String,
    pub patient_satisfaction: String,
    pub zone: String,
    pub shift_category: String,
}

/// A typed rota (shift roster) row.
#[derive(Debug, Clone)]
pub struct RotaEntry {
    pub case_id: i64,
    pub clinician: String,
    pub role: String,
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
    pub duration: Option<Duration>,
    pub timeslot: String,
}

/// The inner join of one case and one rota entry on
/// `(case_id, clinician)`. Read-only after the join; every metric is a pure
/// function over a slice of these.
#[derive(Debug, Clone)]
pub struct JoinedRecord {
    pub case_id: i64,
    pub clinician: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub case_type: String,
    pub patient_satisfaction: String,
    pub zone: String,
    pub shift_category: String,
    pub role: String,
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
    pub duration: Option<Duration>,
    pub timeslot: String,
}

impl JoinedRecord {
    /// Scheduled-vs-actual consulting span of this row, `shift_end -
    /// shift_start`, in seconds. Missing if either endpoint failed to parse.
    /// Negative spans pass through untouched.
    pub fn consult_seconds(&self) -> Option<i64> {
        let start = self.shift_start?;
        let end = self.shift_end?;
        Some((end - start).num_seconds())
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ValuePerCaseRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "NumberOfCases")]
    #[tabled(rename = "NumberOfCases")]
    pub number_of_cases: usize,
    #[serde(rename = "ValuePerCase")]
    #[tabled(rename = "ValuePerCase")]
    pub value_per_case: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CasesPerShiftRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "NumberOfCases")]
    #[tabled(rename = "NumberOfCases")]
    pub number_of_cases: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ConsultTimeRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "AvgConsultMinutes")]
    #[tabled(rename = "AvgConsultMinutes")]
    pub avg_consult_minutes: String,
}

/// One `(timeslot, date)` shift instance with its idle/consult split.
/// Raw magnitudes stay in seconds; only the percentages are formatted.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ShiftLoadRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Timeslot")]
    #[tabled(rename = "Timeslot")]
    pub timeslot: String,
    #[serde(rename = "ConsultSumSec")]
    #[tabled(rename = "ConsultSumSec")]
    pub consult_sum_sec: i64,
    #[serde(rename = "MeanDurationSec")]
    #[tabled(rename = "MeanDurationSec")]
    pub mean_duration_sec: String,
    #[serde(rename = "IdleSec")]
    #[tabled(rename = "IdleSec")]
    pub idle_sec: String,
    #[serde(rename = "ConsultPct")]
    #[tabled(rename = "ConsultPct")]
    pub consult_pct: String,
    #[serde(rename = "IdlePct")]
    #[tabled(rename = "IdlePct")]
    pub idle_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ScoreboardRow {
    #[serde(rename = "Clinician")]
    #[tabled(rename = "Clinician")]
    pub clinician: String,
    #[serde(rename = "Role")]
    #[tabled(rename = "Role")]
    pub role: String,
    #[serde(rename = "TotalCases")]
    #[tabled(rename = "TotalCases")]
    pub total_cases: usize,
    #[serde(rename = "AvgRating")]
    #[tabled(rename = "AvgRating")]
    pub avg_rating: String,
    #[serde(rename = "TotalShifts")]
    #[tabled(rename = "TotalShifts")]
    pub total_shifts: usize,
    #[serde(rename = "AvgCasesPerShift")]
    #[tabled(rename = "AvgCasesPerShift")]
    pub avg_cases_per_shift: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DailyRoleCostRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Role")]
    #[tabled(rename = "Role")]
    pub role: String,
    #[serde(rename = "TotalHours")]
    #[tabled(rename = "TotalHours")]
    pub total_hours: String,
    #[serde(rename = "TotalCost")]
    #[tabled(rename = "TotalCost")]
    pub total_cost: String,
}

/// A category/count/share row, shared by the shift-category, zone and
/// case-type distributions.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DistributionRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Pct")]
    #[tabled(rename = "Pct")]
    pub pct: String,
}

/// Scalar summary metrics for the current selection, exported as JSON.
#[derive(Debug, Serialize)]
pub struct ShiftSummary {
    pub avg_cases_per_shift: f64,
    pub total_cases: usize,
    pub total_shifts: usize,
}
