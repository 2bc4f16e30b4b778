use crate::error::ReportError;
use crate::types::{CaseRecord, RawCaseRow, RawRotaRow, RotaEntry};
use crate::util::{
    parse_date_safe, parse_duration_safe, parse_f64_safe, parse_i64_safe, parse_time_safe,
};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

pub const CASE_COLUMNS: &[&str] = &[
    "case_id",
    "clinician",
    "date",
    "value",
    "case_type",
    "patient_satisfaction",
    "zone",
    "shift_category",
];

pub const ROTA_COLUMNS: &[&str] = &[
    "case_id",
    "clinician",
    "role",
    "shift_start",
    "shift_end",
    "duration",
    "timeslot",
];

/// Row and skip counts from one load, reported back to the user after
/// option [1].
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub case_rows: usize,
    pub case_errors: usize,
    pub rota_rows: usize,
    pub rota_errors: usize,
}

/// Open a CSV file, check that every required column is present in the
/// header, and deserialize the rows. A missing column is a fatal
/// `MissingColumn` error; a row that fails to deserialize is returned as
/// `None` so the caller can count and skip it.
fn read_rows<T: DeserializeOwned>(
    path: &str,
    required: &[&str],
) -> Result<Vec<Option<T>>, ReportError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(ReportError::MissingColumn {
                file: path.to_string(),
                column: column.to_string(),
            });
        }
    }
    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        rows.push(result.ok());
    }
    Ok(rows)
}

fn clean_string(s: Option<String>) -> String {
    s.unwrap_or_else(|| "Unknown".to_string())
        .trim()
        .to_string()
}

/// Load and type `cases.csv`. Rows missing a join key or a parseable date
/// are skipped and counted; every other malformed field coerces to missing.
pub fn load_cases(path: &str) -> Result<(Vec<CaseRecord>, usize), ReportError> {
    let mut errors = 0usize;
    let mut records = Vec::new();
    for (idx, row) in read_rows::<RawCaseRow>(path, CASE_COLUMNS)?
        .into_iter()
        .enumerate()
    {
        let Some(row) = row else {
            debug!(row = idx + 1, "skipping malformed case row");
            errors += 1;
            continue;
        };
        let case_id = match row.case_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                debug!(row = idx + 1, "case row has no case id");
                errors += 1;
                continue;
            }
        };
        let clinician = match row.clinician {
            Some(c) if !c.trim().is_empty() => c.trim().to_string(),
            _ => {
                debug!(row = idx + 1, "case row has no clinician");
                errors += 1;
                continue;
            }
        };
        // Every metric groups by date, so a row with an unparseable date
        // could not contribute to any aggregate. Skip it here and count it.
        let Some(date) = parse_date_safe(row.date.as_deref()) else {
            debug!(row = idx + 1, "case row has no parseable date");
            errors += 1;
            continue;
        };
        records.push(CaseRecord {
            case_id,
            clinician,
            date,
            value: parse_f64_safe(row.value.as_deref()),
            case_type: clean_string(row.case_type),
            patient_satisfaction: clean_string(row.patient_satisfaction),
            zone: clean_string(row.zone),
            shift_category: clean_string(row.shift_category),
        });
    }
    Ok((records, errors))
}

/// Load and type `rotas.csv`. The join keys (integer case id, clinician)
/// are required; times and durations coerce to missing when malformed.
pub fn load_rotas(path: &str) -> Result<(Vec<RotaEntry>, usize), ReportError> {
    let mut errors = 0usize;
    let mut entries = Vec::new();
    for (idx, row) in read_rows::<RawRotaRow>(path, ROTA_COLUMNS)?
        .into_iter()
        .enumerate()
    {
        let Some(row) = row else {
            debug!(row = idx + 1, "skipping malformed rota row");
            errors += 1;
            continue;
        };
        let Some(case_id) = parse_i64_safe(row.case_id.as_deref()) else {
            debug!(row = idx + 1, "rota row has no numeric case id");
            errors += 1;
            continue;
        };
        let clinician = match row.clinician {
            Some(c) if !c.trim().is_empty() => c.trim().to_string(),
            _ => {
                debug!(row = idx + 1, "rota row has no clinician");
                errors += 1;
                continue;
            }
        };
        entries.push(RotaEntry {
            case_id,
            clinician,
            role: clean_string(row.role),
            shift_start: parse_time_safe(row.shift_start.as_deref()),
            shift_end: parse_time_safe(row.shift_end.as_deref()),
            duration: parse_duration_safe(row.duration.as_deref()),
            timeslot: clean_string(row.timeslot),
        });
    }
    Ok((entries, errors))
}

/// Load both input files.
pub fn load(
    cases_path: &str,
    rotas_path: &str,
) -> Result<(Vec<CaseRecord>, Vec<RotaEntry>, LoadReport), ReportError> {
    let (cases, case_errors) = load_cases(cases_path)?;
    let (rotas, rota_errors) = load_rotas(rotas_path)?;
    let report = LoadReport {
        case_rows: cases.len(),
        case_errors,
        rota_rows: rotas.len(),
        rota_errors,
    };
    Ok((cases, rotas, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const CASE_HEADER: &str =
        "case_id,clinician,date,value,case_type,patient_satisfaction,zone,shift_category\n";
    const ROTA_HEADER: &str = "case_id,clinician,role,shift_start,shift_end,duration,timeslot\n";

    fn fixture(name: &str, content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("clinician-report-{}-{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let path = fixture(
            "cases-no-zone.csv",
            "case_id,clinician,date,value,case_type,patient_satisfaction,shift_category\n\
             1,abc,2024-01-01,10,Home Visit,Satisfied,Day\n",
        );
        let err = load_cases(path.to_str().unwrap()).unwrap_err();
        assert!(
            matches!(err, ReportError::MissingColumn { ref column, .. } if column == "zone")
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unparseable_date_row_is_skipped_and_counted() {
        let content = format!(
            "{}1,abc,2024-01-01,10,Home Visit,Satisfied,North,Day\n\
             2,abc,not-a-date,10,Home Visit,Satisfied,North,Day\n",
            CASE_HEADER
        );
        let path = fixture("cases-bad-date.csv", &content);
        let (records, errors) = load_cases(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(errors, 1);
        assert_eq!(records[0].case_id, "1");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_value_coerces_to_missing_without_dropping_the_row() {
        let content = format!(
            "{}1,abc,2024-01-01,ten,Home Visit,Satisfied,North,Day\n",
            CASE_HEADER
        );
        let path = fixture("cases-bad-value.csv", &content);
        let (records, errors) = load_cases(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(errors, 0);
        assert_eq!(records[0].value, None);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rota_join_keys_required_but_other_fields_tolerant() {
        let content = format!(
            "{}1,abc,Dr,09:00,10:00,abc,09:00\n\
             xx,abc,Dr,09:00,10:00,1:00,09:00\n",
            ROTA_HEADER
        );
        let path = fixture("rotas-mixed.csv", &content);
        let (entries, errors) = load_rotas(path.to_str().unwrap()).unwrap();
        // The non-numeric case id can never join, so that row is skipped;
        // the bad duration only loses the one field.
        assert_eq!(entries.len(), 1);
        assert_eq!(errors, 1);
        assert_eq!(entries[0].case_id, 1);
        assert_eq!(entries[0].duration, None);
        assert!(entries[0].shift_start.is_some());
        let _ = fs::remove_file(path);
    }
}
