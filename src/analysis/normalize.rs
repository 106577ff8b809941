//! Normalization of every method against a baseline method.
//!
//! Each field of a treatment record becomes the relative improvement over the
//! baseline run of the same scenario, `(baseline - treatment) / baseline`.
//! Positive values mean the treatment did better (lower is better for every
//! metric in the schema).

use serde::Serialize;

use super::config_key::ConfigKey;
use super::metrics::MetricsRecord;
use super::table::MetricsTable;

/// Relative improvement of `baseline` over `treatment`; 0 when the baseline is 0
pub fn relative_improvement(baseline: f64, treatment: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (baseline - treatment) / baseline
}

/// Field-wise relative improvement of two records
pub fn normalize_record(baseline: &MetricsRecord, treatment: &MetricsRecord) -> MetricsRecord {
    let mut normalized = *treatment;
    for (field, base) in normalized.fields_mut().into_iter().zip(baseline.values()) {
        *field = relative_improvement(base, *field);
    }
    normalized
}

/// What a normalization pass touched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationSummary {
    pub baseline_records: usize,
    pub normalized_records: usize,
    /// Treatment keys dropped from the table because the baseline run is missing
    pub missing_baseline: Vec<String>,
}

/// Normalize every non-baseline record in place, then zero the baseline records
///
/// Treatments are computed from a snapshot of the original baseline values, so
/// the zeroing pass cannot leak into them. A treatment whose scenario has no
/// baseline run is removed, leaving only normalized values in the table.
pub fn normalize_against_baseline(table: &mut MetricsTable, baseline: &str) -> NormalizationSummary {
    let mut summary = NormalizationSummary::default();

    let treatments: Vec<(ConfigKey, Option<MetricsRecord>)> = table
        .iter()
        .filter(|(key, _)| key.method != baseline)
        .map(|(key, record)| {
            let reference = table.get(&key.with_method(baseline)).copied();
            (key.clone(), reference.map(|b| normalize_record(&b, record)))
        })
        .collect();

    for (key, normalized) in treatments {
        match normalized {
            Some(normalized) => {
                if let Some(record) = table.get_mut(&key) {
                    *record = normalized;
                    summary.normalized_records += 1;
                }
            }
            None => {
                log::warn!("No {} run for {}, dropping it", baseline, key);
                table.remove(&key);
                summary.missing_baseline.push(key.to_string());
            }
        }
    }

    let baseline_keys: Vec<ConfigKey> = table
        .keys()
        .filter(|key| key.method == baseline)
        .cloned()
        .collect();
    for key in baseline_keys {
        if let Some(record) = table.get_mut(&key) {
            record.clear();
            summary.baseline_records += 1;
        }
    }

    log::info!(
        "Normalized {} records against {} ({} baseline runs, {} without baseline)",
        summary.normalized_records,
        baseline,
        summary.baseline_records,
        summary.missing_baseline.len()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "DCTCP-0.20-0.3-200.0-4194304-2";

    fn key(method: &str, scenario: &str) -> ConfigKey {
        format!("{}~{}", method, scenario).parse().unwrap()
    }

    #[test]
    fn test_relative_improvement() {
        assert_eq!(relative_improvement(4.0, 3.0), 0.25);
        assert_eq!(relative_improvement(4.0, 5.0), -0.25);
        assert_eq!(relative_improvement(0.0, 7.0), 0.0);
        assert_eq!(relative_improvement(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_normalize_uses_original_baseline_then_zeroes_it() {
        let mut table = MetricsTable::new();
        let mut base = MetricsRecord::default();
        base.query_qct_ave = 10.0;
        base.web_fct_99th = 8.0;
        base.web_pkt_loss_rate = 0.0;
        let mut abm = MetricsRecord::default();
        abm.query_qct_ave = 6.0;
        abm.web_fct_99th = 10.0;
        abm.web_pkt_loss_rate = 0.5;
        let mut pushout = MetricsRecord::default();
        pushout.query_qct_ave = 9.0;

        table.insert(key("DT-1.0", SCENARIO), base).unwrap();
        table.insert(key("ABM-2.0", SCENARIO), abm).unwrap();
        table.insert(key("PUSHOUT-1.0", SCENARIO), pushout).unwrap();

        let summary = normalize_against_baseline(&mut table, "DT-1.0");
        assert_eq!(summary.normalized_records, 2);
        assert_eq!(summary.baseline_records, 1);
        assert!(summary.missing_baseline.is_empty());

        let abm = table.get(&key("ABM-2.0", SCENARIO)).unwrap();
        assert_eq!(abm.query_qct_ave, 0.4);
        assert_eq!(abm.web_fct_99th, -0.25);
        assert_eq!(abm.web_pkt_loss_rate, 0.0);

        let pushout = table.get(&key("PUSHOUT-1.0", SCENARIO)).unwrap();
        assert_eq!(pushout.query_qct_ave, 0.1);

        let base = table.get(&key("DT-1.0", SCENARIO)).unwrap();
        assert!(base.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_scenarios_do_not_mix() {
        let other = "DCTCP-0.40-0.3-200.0-4194304-2";
        let mut table = MetricsTable::new();
        let mut low = MetricsRecord::default();
        low.web_fct_ave = 2.0;
        let mut high = MetricsRecord::default();
        high.web_fct_ave = 4.0;
        let mut treatment = MetricsRecord::default();
        treatment.web_fct_ave = 3.0;

        table.insert(key("DT-1.0", SCENARIO), low).unwrap();
        table.insert(key("DT-1.0", other), high).unwrap();
        table.insert(key("ABM-2.0", other), treatment).unwrap();

        normalize_against_baseline(&mut table, "DT-1.0");
        assert_eq!(table.get(&key("ABM-2.0", other)).unwrap().web_fct_ave, 0.25);
    }

    #[test]
    fn test_missing_baseline_is_reported() {
        let mut table = MetricsTable::new();
        let mut treatment = MetricsRecord::default();
        treatment.web_fct_ave = 3.0;
        table.insert(key("ABM-2.0", SCENARIO), treatment).unwrap();

        let summary = normalize_against_baseline(&mut table, "DT-1.0");
        assert_eq!(summary.normalized_records, 0);
        assert_eq!(summary.missing_baseline, vec![key("ABM-2.0", SCENARIO).to_string()]);
        assert!(table.get(&key("ABM-2.0", SCENARIO)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_unbaselined_treatment_is_dropped_beside_normalized_ones() {
        let high = "DCTCP-0.90-0.3-200.0-4194304-2";
        let mut table = MetricsTable::new();
        let mut base = MetricsRecord::default();
        base.web_fct_ave = 4.0;
        let mut abm_low = MetricsRecord::default();
        abm_low.web_fct_ave = 3.0;
        let mut abm_high = MetricsRecord::default();
        abm_high.web_fct_ave = 900_000.0;

        table.insert(key("DT-1.0", SCENARIO), base).unwrap();
        table.insert(key("ABM-2.0", SCENARIO), abm_low).unwrap();
        table.insert(key("ABM-2.0", high), abm_high).unwrap();

        let summary = normalize_against_baseline(&mut table, "DT-1.0");
        assert_eq!(summary.normalized_records, 1);
        assert_eq!(summary.baseline_records, 1);
        assert_eq!(summary.missing_baseline, vec![key("ABM-2.0", high).to_string()]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&key("ABM-2.0", SCENARIO)).unwrap().web_fct_ave, 0.25);
        assert!(table.get(&key("ABM-2.0", high)).is_none());
        // every value left is either zeroed baseline or a relative improvement
        assert!(table.iter().all(|(_, r)| r.values().iter().all(|v| v.abs() <= 1.0)));
    }
}
