use crate::error::ReportError;
use crate::types::{
    CasesPerShiftRow, ConsultTimeRow, DailyRoleCostRow, DistributionRow, JoinedRecord,
    ScoreboardRow, ShiftLoadRow, ShiftSummary, ValuePerCaseRow,
};
use crate::util::{average, format_number};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Role-filter sentinel meaning "do not filter".
pub const ALL_ROLES: &str = "(All)";

/// Distinct roles in first-seen order, for the selection prompt.
pub fn distinct_roles(data: &[JoinedRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut roles = Vec::new();
    for r in data {
        if seen.insert(r.role.as_str()) {
            roles.push(r.role.clone());
        }
    }
    roles
}

/// Distinct clinician codes in first-seen order.
pub fn distinct_clinicians(data: &[JoinedRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut clinicians = Vec::new();
    for r in data {
        if seen.insert(r.clinician.as_str()) {
            clinicians.push(r.clinician.clone());
        }
    }
    clinicians
}

/// Restrict the joined table to one role, or pass it through unchanged for
/// the `"(All)"` sentinel. An empty result is an `EmptySelection` error so
/// the caller can render the no-data notice instead of empty charts.
pub fn filter_by_role(
    data: &[JoinedRecord],
    role: &str,
) -> Result<Vec<JoinedRecord>, ReportError> {
    let rows: Vec<JoinedRecord> = if role == ALL_ROLES {
        data.to_vec()
    } else {
        data.iter().filter(|r| r.role == role).cloned().collect()
    };
    if rows.is_empty() {
        return Err(ReportError::EmptySelection {
            role: role.to_string(),
            clinician: "(any)".to_string(),
        });
    }
    Ok(rows)
}

/// Restrict a role-filtered table to one clinician.
pub fn filter_by_clinician(
    data: &[JoinedRecord],
    role: &str,
    clinician: &str,
) -> Result<Vec<JoinedRecord>, ReportError> {
    let rows: Vec<JoinedRecord> = data
        .iter()
        .filter(|r| r.clinician == clinician)
        .cloned()
        .collect();
    if rows.is_empty() {
        return Err(ReportError::EmptySelection {
            role: role.to_string(),
            clinician: clinician.to_string(),
        });
    }
    Ok(rows)
}

/// Value-per-case over time.
///
/// Groups by `(date, value)`: each distinct fee value is its own bucket per
/// date. Rows with a missing value have no group key and are excluded.
/// Output sorted by date, then value, for charting.
pub fn value_per_case(data: &[JoinedRecord]) -> Vec<ValuePerCaseRow> {
    let mut map: HashMap<(NaiveDate, u64), (usize, f64)> = HashMap::new();
    for r in data {
        let Some(value) = r.value else { continue };
        // Bucket by bit pattern, but fold -0.0 into 0.0 first so the two
        // representations of zero land in the same group.
        let value = if value == 0.0 { 0.0 } else { value };
        let e = map.entry((r.date, value.to_bits())).or_insert((0, 0.0));
        e.0 += 1;
        e.1 += value;
    }
    let mut rows: Vec<(NaiveDate, f64, ValuePerCaseRow)> = map
        .into_iter()
        .map(|((date, bits), (count, sum))| {
            let mean_value = sum / count as f64;
            let per_case = mean_value / count as f64;
            let row = ValuePerCaseRow {
                date,
                value: format_number(f64::from_bits(bits), 2),
                number_of_cases: count,
                value_per_case: format_number(per_case, 2),
            };
            (date, f64::from_bits(bits), row)
        })
        .collect();
    rows.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    });
    rows.into_iter().map(|(_, _, row)| row).collect()
}

/// Everything the shift-load view renders: per-date case counts, the
/// idle/consult decomposition per shift instance, the two category
/// distributions, and the scalar summary.
#[derive(Debug)]
pub struct ShiftLoadReport {
    pub cases_per_shift: Vec<CasesPerShiftRow>,
    pub consult_time_per_date: Vec<ConsultTimeRow>,
    pub decomposition: Vec<ShiftLoadRow>,
    pub shift_category_dist: Vec<DistributionRow>,
    pub zone_dist: Vec<DistributionRow>,
    pub summary: ShiftSummary,
}

pub fn shift_load(data: &[JoinedRecord]) -> ShiftLoadReport {
    // Cases per date.
    let mut per_date: HashMap<NaiveDate, usize> = HashMap::new();
    for r in data {
        *per_date.entry(r.date).or_insert(0) += 1;
    }
    let mut cases_per_shift: Vec<CasesPerShiftRow> = per_date
        .iter()
        .map(|(date, count)| CasesPerShiftRow {
            date: *date,
            number_of_cases: *count,
        })
        .collect();
    cases_per_shift.sort_by_key(|row| row.date);

    // Mean consulting span per date, in minutes.
    let mut consult_by_date: HashMap<NaiveDate, Vec<f64>> = HashMap::new();
    for r in data {
        if let Some(sec) = r.consult_seconds() {
            consult_by_date.entry(r.date).or_default().push(sec as f64);
        }
    }
    let mut consult_time_per_date: Vec<ConsultTimeRow> = consult_by_date
        .into_iter()
        .map(|(date, secs)| ConsultTimeRow {
            date,
            avg_consult_minutes: format_number(average(&secs) / 60.0, 2),
        })
        .collect();
    consult_time_per_date.sort_by_key(|row| row.date);

    // Idle/consult decomposition per (timeslot, date) shift instance.
    #[derive(Default)]
    struct Acc {
        consult_sum_sec: i64,
        duration_secs: Vec<f64>,
    }
    let mut groups: HashMap<(String, NaiveDate), Acc> = HashMap::new();
    for r in data {
        let e = groups.entry((r.timeslot.clone(), r.date)).or_default();
        if let Some(sec) = r.consult_seconds() {
            e.consult_sum_sec += sec;
        }
        if let Some(d) = r.duration {
            e.duration_secs.push(d.num_seconds() as f64);
        }
    }
    let mut decomposition: Vec<ShiftLoadRow> = groups
        .into_iter()
        .map(|((timeslot, date), acc)| {
            let mean_duration = average(&acc.duration_secs);
            let consult = acc.consult_sum_sec as f64;
            // Idle time is whatever the scheduled duration leaves over once
            // consulting time is taken out. Negative values pass through.
            let idle = mean_duration - consult;
            let total = consult + idle;
            let (consult_pct, idle_pct) = if total > 0.0 {
                (consult / total * 100.0, idle / total * 100.0)
            } else {
                (0.0, 0.0)
            };
            ShiftLoadRow {
                date,
                timeslot,
                consult_sum_sec: acc.consult_sum_sec,
                mean_duration_sec: format_number(mean_duration, 2),
                idle_sec: format_number(idle, 2),
                consult_pct: format_number(consult_pct, 2),
                idle_pct: format_number(idle_pct, 2),
            }
        })
        .collect();
    decomposition.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.timeslot.cmp(&b.timeslot)));

    let counts: Vec<f64> = cases_per_shift
        .iter()
        .map(|row| row.number_of_cases as f64)
        .collect();
    let summary = ShiftSummary {
        avg_cases_per_shift: average(&counts),
        total_cases: data.len(),
        total_shifts: cases_per_shift.len(),
    };

    ShiftLoadReport {
        cases_per_shift,
        consult_time_per_date,
        decomposition,
        shift_category_dist: distribution(data.iter().map(|r| r.shift_category.as_str())),
        zone_dist: distribution(data.iter().map(|r| r.zone.as_str())),
        summary,
    }
}

/// Fixed ordinal scale for the satisfaction categories. Anything else is
/// missing and stays out of the rating mean.
pub fn satisfaction_rating(category: &str) -> Option<f64> {
    match category {
        "Extremely Satisfied" => Some(5.0),
        "Satisfied" => Some(4.0),
        "Neither Satisfied nor Dissatisfied" => Some(3.0),
        "Dissatisfied" => Some(2.0),
        "Extremely Dissatisfied" => Some(1.0),
        _ => None,
    }
}

/// Clinician scoreboard: cases, rating and cases-per-shift per
/// `(clinician, role)`, ranked by cases per shift.
///
/// Ties sort by clinician name then role; the ranking metric alone is not a
/// total order.
pub fn scoreboard(data: &[JoinedRecord]) -> Vec<ScoreboardRow> {
    #[derive(Default)]
    struct Acc {
        cases: usize,
        ratings: Vec<f64>,
        shifts: HashSet<(NaiveDate, String)>,
    }
    let mut map: HashMap<(String, String), Acc> = HashMap::new();
    for r in data {
        let e = map
            .entry((r.clinician.clone(), r.role.clone()))
            .or_default();
        e.cases += 1;
        if let Some(rating) = satisfaction_rating(&r.patient_satisfaction) {
            e.ratings.push(rating);
        }
        e.shifts.insert((r.date, r.timeslot.clone()));
    }
    let mut scored: Vec<(f64, ScoreboardRow)> = map
        .into_iter()
        .filter(|(_, acc)| !acc.shifts.is_empty())
        .map(|((clinician, role), acc)| {
            let total_shifts = acc.shifts.len();
            let per_shift = acc.cases as f64 / total_shifts as f64;
            let avg_rating = if acc.ratings.is_empty() {
                "n/a".to_string()
            } else {
                format_number(average(&acc.ratings), 2)
            };
            let row = ScoreboardRow {
                clinician,
                role,
                total_cases: acc.cases,
                avg_rating,
                total_shifts,
                avg_cases_per_shift: format_number(per_shift, 2),
            };
            (per_shift, row)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.clinician.cmp(&b.1.clinician))
            .then_with(|| a.1.role.cmp(&b.1.role))
    });
    scored.into_iter().map(|(_, row)| row).collect()
}

/// Hours worked and money earned per `(date, role)`.
pub fn daily_role_cost(data: &[JoinedRecord]) -> Vec<DailyRoleCostRow> {
    #[derive(Default)]
    struct Acc {
        hours: f64,
        cost: f64,
    }
    let mut map: HashMap<(NaiveDate, String), Acc> = HashMap::new();
    for r in data {
        let e = map.entry((r.date, r.role.clone())).or_default();
        if let Some(d) = r.duration {
            e.hours += d.num_seconds() as f64 / 3600.0;
        }
        if let Some(v) = r.value {
            e.cost += v;
        }
    }
    let mut rows: Vec<DailyRoleCostRow> = map
        .into_iter()
        .map(|((date, role), acc)| DailyRoleCostRow {
            date,
            role,
            total_hours: format_number(acc.hours, 2),
            total_cost: format_number(acc.cost, 2),
        })
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.role.cmp(&b.role)));
    rows
}

/// Overall case count per case type.
pub fn case_type_distribution(data: &[JoinedRecord]) -> Vec<DistributionRow> {
    distribution(data.iter().map(|r| r.case_type.as_str()))
}

/// Count per category with its share of the total, sorted by count
/// descending then category name.
fn distribution<'a>(categories: impl Iterator<Item = &'a str>) -> Vec<DistributionRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for c in categories {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    let mut rows: Vec<DistributionRow> = counts
        .into_iter()
        .map(|(category, count)| DistributionRow {
            category: category.to_string(),
            count,
            pct: format_number(count as f64 / total as f64 * 100.0, 2),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::clean_and_join;
    use crate::types::{CaseRecord, RotaEntry};
    use crate::util::{parse_duration_safe, parse_time_safe};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn rec(clinician: &str, d: u32, value: f64) -> JoinedRecord {
        JoinedRecord {
            case_id: 1,
            clinician: clinician.to_string(),
            date: day(d),
            value: Some(value),
            case_type: "Home Visit".to_string(),
            patient_satisfaction: "Satisfied".to_string(),
            zone: "North".to_string(),
            shift_category: "Day".to_string(),
            role: "Dr".to_string(),
            shift_start: parse_time_safe(Some("09:00")),
            shift_end: parse_time_safe(Some("10:00")),
            duration: parse_duration_safe(Some("4:00")),
            timeslot: "09:00".to_string(),
        }
    }

    #[test]
    fn rating_scale_boundaries_and_unknowns() {
        assert_eq!(satisfaction_rating("Extremely Satisfied"), Some(5.0));
        assert_eq!(satisfaction_rating("Extremely Dissatisfied"), Some(1.0));
        assert_eq!(satisfaction_rating("No Opinion"), None);
        assert_eq!(satisfaction_rating(""), None);
    }

    #[test]
    fn value_per_case_buckets_by_date_and_value() {
        let mut a = rec("abc", 1, 10.0);
        let b = rec("xyz", 1, 10.0);
        let c = rec("abc", 1, 25.0);
        a.case_id = 2;
        let rows = value_per_case(&[a, b, c]);
        // Two clinicians share the (date, 10.0) bucket; 25.0 is its own.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number_of_cases, 2);
        assert_eq!(rows[0].value_per_case, "5.00");
        assert_eq!(rows[1].number_of_cases, 1);
        assert_eq!(rows[1].value_per_case, "25.00");
    }

    #[test]
    fn value_per_case_merges_signed_zero() {
        let mut a = rec("abc", 1, 0.0);
        let mut b = rec("xyz", 1, -0.0);
        a.case_id = 2;
        b.case_id = 3;
        let rows = value_per_case(&[a, b]);
        // 0.0 and -0.0 compare equal and share one bucket.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number_of_cases, 2);
    }

    #[test]
    fn value_per_case_skips_missing_values() {
        let mut a = rec("abc", 1, 10.0);
        a.value = None;
        let rows = value_per_case(&[a, rec("abc", 2, 10.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, day(2));
    }

    #[test]
    fn idle_and_consult_percentages_sum_to_hundred() {
        // Two one-hour consults inside a 4h scheduled shift: 2h consult,
        // 2h idle, a clean 50/50 split.
        let mut b = rec("abc", 1, 10.0);
        b.case_id = 2;
        let report = shift_load(&[rec("abc", 1, 10.0), b]);
        assert_eq!(report.decomposition.len(), 1);
        let row = &report.decomposition[0];
        assert_eq!(row.consult_sum_sec, 7200);
        assert_eq!(row.consult_pct, "50.00");
        assert_eq!(row.idle_pct, "50.00");
        let split: f64 =
            row.consult_pct.parse::<f64>().unwrap() + row.idle_pct.parse::<f64>().unwrap();
        assert!((split - 100.0).abs() < 1e-6);
    }

    #[test]
    fn negative_idle_time_is_not_clamped() {
        // Consulting longer than the scheduled duration drives idle below
        // zero; the split still reconstructs the mean duration.
        let mut a = rec("abc", 1, 10.0);
        a.duration = parse_duration_safe(Some("0:30"));
        let report = shift_load(&[a]);
        let row = &report.decomposition[0];
        assert_eq!(row.consult_sum_sec, 3600);
        assert_eq!(row.idle_sec, "-1,800.00");
    }

    #[test]
    fn shift_summary_counts() {
        let mut b = rec("abc", 2, 10.0);
        b.case_id = 2;
        let mut c = rec("abc", 2, 10.0);
        c.case_id = 3;
        let report = shift_load(&[rec("abc", 1, 10.0), b, c]);
        assert_eq!(report.summary.total_cases, 3);
        assert_eq!(report.summary.total_shifts, 2);
        assert!((report.summary.avg_cases_per_shift - 1.5).abs() < 1e-9);
    }

    #[test]
    fn scoreboard_cases_per_shift_and_order() {
        // "abc": 3 cases over 1 distinct shift; "xyz": 1 case over 1 shift.
        let mut a2 = rec("abc", 1, 10.0);
        a2.case_id = 2;
        let mut a3 = rec("abc", 1, 10.0);
        a3.case_id = 3;
        let x = rec("xyz", 1, 10.0);
        let rows = scoreboard(&[rec("abc", 1, 10.0), a2, a3, x]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].clinician, "abc");
        assert_eq!(rows[0].total_cases, 3);
        assert_eq!(rows[0].total_shifts, 1);
        assert_eq!(rows[0].avg_cases_per_shift, "3.00");
        assert_eq!(rows[1].clinician, "xyz");
        assert_eq!(rows[1].avg_cases_per_shift, "1.00");
    }

    #[test]
    fn scoreboard_ties_break_by_clinician_name() {
        let rows = scoreboard(&[rec("zed", 1, 10.0), rec("ann", 1, 10.0)]);
        assert_eq!(rows[0].clinician, "ann");
        assert_eq!(rows[1].clinician, "zed");
    }

    #[test]
    fn scoreboard_rating_excludes_unmapped_categories() {
        let mut a = rec("abc", 1, 10.0);
        a.patient_satisfaction = "No Opinion".to_string();
        let mut b = rec("abc", 1, 10.0);
        b.case_id = 2;
        b.patient_satisfaction = "Extremely Satisfied".to_string();
        let rows = scoreboard(&[a, b]);
        // The unmapped row is excluded from the mean, not counted as zero.
        assert_eq!(rows[0].avg_rating, "5.00");

        let mut c = rec("xyz", 1, 10.0);
        c.patient_satisfaction = "No Opinion".to_string();
        let rows = scoreboard(&[c]);
        assert_eq!(rows[0].avg_rating, "n/a");
    }

    #[test]
    fn daily_role_cost_sums_hours_and_value() {
        let mut b = rec("abc", 1, 30.0);
        b.case_id = 2;
        b.duration = parse_duration_safe(Some("2:30"));
        let rows = daily_role_cost(&[rec("abc", 1, 10.0), b]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "Dr");
        assert_eq!(rows[0].total_hours, "6.50");
        assert_eq!(rows[0].total_cost, "40.00");
    }

    #[test]
    fn case_type_distribution_counts_and_shares() {
        let mut b = rec("abc", 1, 10.0);
        b.case_id = 2;
        b.case_type = "Phone".to_string();
        let mut c = rec("abc", 1, 10.0);
        c.case_id = 3;
        let rows = case_type_distribution(&[rec("abc", 1, 10.0), b, c]);
        assert_eq!(rows[0].category, "Home Visit");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].pct, "66.67");
        assert_eq!(rows[1].category, "Phone");
        assert_eq!(rows[1].pct, "33.33");
    }

    #[test]
    fn role_and_clinician_filters() {
        let mut b = rec("xyz", 1, 10.0);
        b.role = "Nurse".to_string();
        let data = vec![rec("abc", 1, 10.0), b];

        let all = filter_by_role(&data, ALL_ROLES).unwrap();
        assert_eq!(all.len(), 2);
        let drs = filter_by_role(&data, "Dr").unwrap();
        assert_eq!(drs.len(), 1);
        assert!(matches!(
            filter_by_role(&data, "Surgeon"),
            Err(ReportError::EmptySelection { .. })
        ));

        let abc = filter_by_clinician(&drs, "Dr", "abc").unwrap();
        assert_eq!(abc.len(), 1);
        assert!(matches!(
            filter_by_clinician(&drs, "Dr", "nobody"),
            Err(ReportError::EmptySelection { .. })
        ));
    }

    #[test]
    fn end_to_end_single_case() {
        let cases = vec![CaseRecord {
            case_id: "1".to_string(),
            clinician: "abc".to_string(),
            date: day(1),
            value: Some(10.0),
            case_type: "Home Visit".to_string(),
            patient_satisfaction: "Satisfied".to_string(),
            zone: "North".to_string(),
            shift_category: "Day".to_string(),
        }];
        let rotas = vec![RotaEntry {
            case_id: 1,
            clinician: "abc".to_string(),
            role: "Dr".to_string(),
            shift_start: parse_time_safe(Some("09:00")),
            shift_end: parse_time_safe(Some("10:00")),
            duration: parse_duration_safe(Some("1:00")),
            timeslot: "09:00".to_string(),
        }];
        let joined = clean_and_join(&cases, &rotas).unwrap();
        assert_eq!(joined.len(), 1);

        let vpc = value_per_case(&joined);
        assert_eq!(vpc.len(), 1);
        assert_eq!(vpc[0].number_of_cases, 1);
        assert_eq!(vpc[0].value_per_case, "10.00");

        let load = shift_load(&joined);
        let row = &load.decomposition[0];
        // One hour consulted out of a one-hour shift: zero idle time.
        assert_eq!(row.consult_sum_sec, 3600);
        assert_eq!(row.idle_sec, "0.00");
        assert_eq!(row.consult_pct, "100.00");
        assert_eq!(row.idle_pct, "0.00");
    }
}
