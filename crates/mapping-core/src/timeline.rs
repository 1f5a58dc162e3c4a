//! Metadata derived from yyyymmdd date columns

use crate::convert::yyyymmdd_to_days;
use crate::error::{Error, Result};
use crate::table::{MappingTable, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An event written `column:state`, e.g. `HealthState:Diseased`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub column: String,
    pub state: String,
}

impl FromStr for Event {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((column, state)) if !column.trim().is_empty() && !state.trim().is_empty() => {
                Ok(Self {
                    column: column.trim().to_string(),
                    state: state.trim().to_string(),
                })
            }
            _ => Err(Error::InvalidArgument(format!(
                "event '{}' must be written column:state",
                s
            ))),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.state)
    }
}

/// Suffixes appended to the treatment value outside the treatment window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSuffixes {
    pub pre: String,
    pub post: String,
    /// Written when a date the label depends on is missing
    pub unknown: String,
}

impl Default for PhaseSuffixes {
    fn default() -> Self {
        Self {
            pre: "_pretreatment".to_string(),
            post: "_posttreatment".to_string(),
            unknown: "Unknown".to_string(),
        }
    }
}

impl MappingTable {
    /// Days and rounded weeks from each sample to the first `event` of its individual.
    ///
    /// The result has the row-id column, `DaysAfter<state>` and
    /// `WeeksAfter<state>`. Individuals that never reach the event are left
    /// out, as are rows whose date is not a valid yyyymmdd value.
    pub fn time_to_event(
        &self,
        time_column: &str,
        event: &Event,
        individual_column: &str,
    ) -> Result<MappingTable> {
        let time_idx = self.column_index(time_column)?;
        let event_idx = self.column_index(&event.column)?;
        let individual_idx = self.column_index(individual_column)?;

        let mut first_event: HashMap<&str, i64> = HashMap::new();
        for (id, row) in self.row_ids.iter().zip(&self.rows) {
            if row[event_idx] != event.state {
                continue;
            }
            let Some(day) = yyyymmdd_to_days(&row[time_idx]) else {
                log::warn!("skipping event at '{}': '{}' is not a yyyymmdd date", id, row[time_idx]);
                continue;
            };
            first_event
                .entry(row[individual_idx].as_str())
                .and_modify(|first| *first = (*first).min(day))
                .or_insert(day);
        }

        let mut rows: Vec<Row> = Vec::new();
        for (id, row) in self.row_ids.iter().zip(&self.rows) {
            let Some(&start) = first_event.get(row[individual_idx].as_str()) else {
                continue;
            };
            let Some(day) = yyyymmdd_to_days(&row[time_idx]) else {
                log::warn!("skipping '{}': '{}' is not a yyyymmdd date", id, row[time_idx]);
                continue;
            };
            let days = day - start;
            let weeks = (days as f64 / 7.0).round() as i64;
            rows.push(vec![id.clone(), days.to_string(), weeks.to_string()]);
        }

        log::debug!(
            "{} individuals reach {}; {} samples dated",
            first_event.len(),
            event,
            rows.len()
        );

        let header = vec![
            self.id_column().to_string(),
            format!("DaysAfter{}", event.state),
            format!("WeeksAfter{}", event.state),
        ];
        Ok(MappingTable::from_parts(self.options.clone(), header, Vec::new(), rows))
    }

    /// Label each sample's treatment by where its date falls in the treatment window.
    ///
    /// Samples before the start date get `pre` appended to their treatment,
    /// samples after the end date get `post`, and samples inside the window
    /// (bounds included) keep it unchanged. The result has the row-id column
    /// and `new_column`.
    pub fn treatment_phases(
        &self,
        treatment_column: &str,
        sample_time_column: &str,
        start_time_column: &str,
        end_time_column: &str,
        new_column: &str,
        suffixes: &PhaseSuffixes,
    ) -> Result<MappingTable> {
        let treatment_idx = self.column_index(treatment_column)?;
        let sample_idx = self.column_index(sample_time_column)?;
        let start_idx = self.column_index(start_time_column)?;
        let end_idx = self.column_index(end_time_column)?;

        let rows: Vec<Row> = self
            .row_ids
            .iter()
            .zip(&self.rows)
            .map(|(id, row)| {
                let dates = (
                    yyyymmdd_to_days(&row[sample_idx]),
                    yyyymmdd_to_days(&row[start_idx]),
                    yyyymmdd_to_days(&row[end_idx]),
                );
                let treatment = &row[treatment_idx];
                let label = match dates {
                    (Some(sample), Some(start), _) if sample < start => {
                        format!("{}{}", treatment, suffixes.pre)
                    }
                    (Some(sample), Some(_), Some(end)) if sample > end => {
                        format!("{}{}", treatment, suffixes.post)
                    }
                    (Some(_), Some(_), Some(_)) => treatment.clone(),
                    _ => suffixes.unknown.clone(),
                };
                vec![id.clone(), label]
            })
            .collect();

        let header = vec![self.id_column().to_string(), new_column.to_string()];
        Ok(MappingTable::from_parts(self.options.clone(), header, Vec::new(), rows))
    }

    fn id_column(&self) -> &str {
        self.header_fields.first().map_or("SampleID", String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::table::LoadOptions;

    const CORALS: &str = "#SampleID\tIndividual\tDate\tHealthState\n\
        C1.a\tC1\t20120801\tHealthy\n\
        C1.b\tC1\t20120815\tDiseased\n\
        C1.c\tC1\t20120829\tDiseased\n\
        C1.d\tC1\t20120808\tDiseased\n\
        C2.a\tC2\t20120801\tHealthy\n\
        C2.b\tC2\t20120815\tHealthy\n\
        C3.a\tC3\t20120901\tDiseased\n\
        C3.b\tC3\tUnknown\tHealthy\n";

    const TREATMENTS: &str = "#SampleID\tTreatment\tdate\tstart_date\tend_date\n\
        S.1\tAntibiotic\t20130101\t20130110\t20130120\n\
        S.2\tAntibiotic\t20130110\t20130110\t20130120\n\
        S.3\tAntibiotic\t20130115\t20130110\t20130120\n\
        S.4\tAntibiotic\t20130125\t20130110\t20130120\n\
        S.5\tAntibiotic\tUnknown\t20130110\t20130120\n";

    fn load(text: &str) -> MappingTable {
        parse_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_event_from_str() {
        let event: Event = "HealthState:DarkSpotSyndrome".parse().unwrap();
        assert_eq!(event.column, "HealthState");
        assert_eq!(event.state, "DarkSpotSyndrome");
        assert_eq!(event.to_string(), "HealthState:DarkSpotSyndrome");
        assert!("HealthState".parse::<Event>().is_err());
        assert!(":Diseased".parse::<Event>().is_err());
    }

    #[test]
    fn test_time_to_event_counts_from_first_event() {
        let event: Event = "HealthState:Diseased".parse().unwrap();
        let offsets = load(CORALS).time_to_event("Date", &event, "Individual").unwrap();

        assert_eq!(
            offsets.header_fields(),
            &["SampleID", "DaysAfterDiseased", "WeeksAfterDiseased"]
        );
        // C1 first falls ill on 20120808
        assert_eq!(offsets.row("C1.a").unwrap(), &["C1.a", "-7", "-1"]);
        assert_eq!(offsets.row("C1.b").unwrap(), &["C1.b", "7", "1"]);
        assert_eq!(offsets.row("C1.c").unwrap(), &["C1.c", "21", "3"]);
        assert_eq!(offsets.row("C1.d").unwrap(), &["C1.d", "0", "0"]);
        assert_eq!(offsets.row("C3.a").unwrap(), &["C3.a", "0", "0"]);
        // C2 never reaches the event; C3.b has no usable date
        assert!(offsets.row("C2.a").is_none());
        assert!(offsets.row("C3.b").is_none());
        assert_eq!(offsets.row_count(), 5);
    }

    #[test]
    fn test_weeks_round_to_nearest() {
        let text = "#SampleID\tIndividual\tDate\tState\n\
            A.1\tA\t20120101\tSick\n\
            A.2\tA\t20120111\tWell\n\
            A.3\tA\t20120105\tWell\n\
            A.4\tA\t20111228\tWell\n";
        let event: Event = "State:Sick".parse().unwrap();
        let offsets = load(text).time_to_event("Date", &event, "Individual").unwrap();

        assert_eq!(offsets.cell("A.2", "WeeksAfterSick").unwrap(), Some("1"));
        assert_eq!(offsets.cell("A.3", "WeeksAfterSick").unwrap(), Some("1"));
        assert_eq!(offsets.cell("A.4", "DaysAfterSick").unwrap(), Some("-4"));
        assert_eq!(offsets.cell("A.4", "WeeksAfterSick").unwrap(), Some("-1"));
    }

    #[test]
    fn test_time_to_event_unknown_column() {
        let event: Event = "Health:Diseased".parse().unwrap();
        let err = load(CORALS).time_to_event("Date", &event, "Individual").unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref name, .. } if name == "Health"));
    }

    #[test]
    fn test_treatment_phases() {
        let phases = load(TREATMENTS)
            .treatment_phases(
                "Treatment",
                "date",
                "start_date",
                "end_date",
                "TreatmentPhase",
                &PhaseSuffixes::default(),
            )
            .unwrap();

        assert_eq!(phases.header_fields(), &["SampleID", "TreatmentPhase"]);
        let labels: Vec<&str> = phases
            .iter_column_data(Some(&["TreatmentPhase"]), None)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(
            labels,
            vec![
                "Antibiotic_pretreatment",
                "Antibiotic",
                "Antibiotic",
                "Antibiotic_posttreatment",
                "Unknown",
            ]
        );
    }

    #[test]
    fn test_phases_join_back_onto_mapping() {
        let mapping = load(TREATMENTS);
        let phases = mapping
            .treatment_phases(
                "Treatment",
                "date",
                "start_date",
                "end_date",
                "TreatmentPhase",
                &PhaseSuffixes::default(),
            )
            .unwrap();
        let joined = mapping
            .supplement(&phases, "SampleID", &crate::metadata::SupplementOptions::default())
            .unwrap();

        assert_eq!(joined.cell("S.1", "TreatmentPhase").unwrap(), Some("Antibiotic_pretreatment"));
        assert_eq!(joined.cell("S.1", "Treatment").unwrap(), Some("Antibiotic"));
    }
}
