use crate::error::ReportError;
use crate::types::{CaseRecord, JoinedRecord, RotaEntry};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Case ids equal to this marker are placeholder rows, not real cases.
/// The comparison is exact and case-sensitive.
const CASE_ID_SENTINEL: &str = "none";

type DedupKey = (
    i64,
    String,
    chrono::NaiveDate,
    Option<u64>,
    String,
    String,
    String,
    String,
    String,
    // Nested so the tuple stays within the 12 elements std implements
    // Eq/Hash for.
    (
        Option<chrono::NaiveTime>,
        Option<chrono::NaiveTime>,
        Option<i64>,
        String,
    ),
);

fn dedup_key(r: &JoinedRecord) -> DedupKey {
    (
        r.case_id,
        r.clinician.clone(),
        r.date,
        // f64 is not Eq/Hash; compare exact bit patterns, which is what
        // "exact-duplicate row" means here.
        r.value.map(f64::to_bits),
        r.case_type.clone(),
        r.patient_satisfaction.clone(),
        r.zone.clone(),
        r.shift_category.clone(),
        r.role.clone(),
        (
            r.shift_start,
            r.shift_end,
            r.duration.map(|d| d.num_seconds()),
            r.timeslot.clone(),
        ),
    )
}

/// Clean the case table and inner-join it to the rota table.
///
/// 1. Case rows whose id equals the `"none"` sentinel are dropped before any
///    coercion.
/// 2. Surviving case ids are coerced to integers; a non-numeric survivor is
///    a `DataFormat` error (the file is structurally broken at that point).
/// 3. Inner equi-join on `(case_id, clinician)`. Cases with no matching rota
///    entry silently drop; that is join semantics, not an error.
/// 4. Exact-duplicate joined rows are removed, keeping first occurrence
///    order.
///
/// Pure function of its inputs.
pub fn clean_and_join(
    cases: &[CaseRecord],
    rotas: &[RotaEntry],
) -> Result<Vec<JoinedRecord>, ReportError> {
    let mut by_key: HashMap<(i64, &str), Vec<&RotaEntry>> = HashMap::new();
    for rota in rotas {
        by_key
            .entry((rota.case_id, rota.clinician.as_str()))
            .or_default()
            .push(rota);
    }

    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut joined = Vec::new();
    let mut dropped = 0usize;
    for case in cases {
        if case.case_id == CASE_ID_SENTINEL {
            continue;
        }
        let case_id: i64 =
            case.case_id
                .parse()
                .map_err(|_| ReportError::DataFormat {
                    field: "case_id",
                    value: case.case_id.clone(),
                })?;
        let Some(matches) = by_key.get(&(case_id, case.clinician.as_str())) else {
            dropped += 1;
            continue;
        };
        for rota in matches {
            let record = JoinedRecord {
                case_id,
                clinician: case.clinician.clone(),
                date: case.date,
                value: case.value,
                case_type: case.case_type.clone(),
                patient_satisfaction: case.patient_satisfaction.clone(),
                zone: case.zone.clone(),
                shift_category: case.shift_category.clone(),
                role: rota.role.clone(),
                shift_start: rota.shift_start,
                shift_end: rota.shift_end,
                duration: rota.duration,
                timeslot: rota.timeslot.clone(),
            };
            if seen.insert(dedup_key(&record)) {
                joined.push(record);
            }
        }
    }
    if dropped > 0 {
        debug!(dropped, "cases without a matching rota entry");
    }
    Ok(joined)
}
