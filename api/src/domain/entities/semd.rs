//! SEMD domain entities
//!
//! A SEMD is a structured electronic medical document produced from a
//! finished Action or Event. The monitoring job asks Vista3 whether each one
//! was registered and stores the answer in the status log table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A SEMD candidate as collected from the medical database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemdInfo {
    pub event_id: i64,
    pub client_id: i64,
    /// OID of the document type in the federal registry
    pub doc_oid: i64,
    pub template_id: i64,
    pub semd_name: String,
    pub semd_code: String,
    /// Start timestamp as the database renders it (`YYYY-MM-DD HH:MM:SS`)
    pub date_start: String,
    #[serde(default)]
    pub person_id: Option<i64>,
    #[serde(default)]
    pub action_id: Option<i64>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl SemdInfo {
    /// Cache key under which the stored status of this document is kept
    pub fn status_key(&self) -> String {
        format!("semd:{}:{}", self.event_id, self.template_id)
    }
}

/// Request for disability examination (MSE) info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MseInfoRequest {
    pub id: i64,
}

impl MseInfoRequest {
    pub fn cache_key(&self) -> String {
        format!("mse:{}", self.id)
    }
}

/// Row written to the SEMD status log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemdStatusRecord {
    pub event_id: i64,
    pub action_id: Option<i64>,
    pub client_id: i64,
    pub person_id: Option<i64>,
    pub template_id: i64,
    pub semd_name: String,
    pub semd_code: String,
    pub doc_oid: String,
    pub date_start: Option<NaiveDate>,
    pub error_description: Option<String>,
    pub status_semd: i8,
    pub sign: i8,
    pub sign_mo: i8,
}

impl From<SemdInfo> for SemdStatusRecord {
    fn from(info: SemdInfo) -> Self {
        let date_start = info
            .date_start
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());

        SemdStatusRecord {
            event_id: info.event_id,
            action_id: info.action_id,
            client_id: info.client_id,
            person_id: info.person_id,
            template_id: info.template_id,
            semd_name: info.semd_name,
            semd_code: info.semd_code,
            doc_oid: info.doc_oid.to_string(),
            date_start,
            error_description: info.error_description,
            status_semd: 0,
            sign: 0,
            sign_mo: 0,
        }
    }
}

/// Outcome of one monitoring run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub collected: usize,
    pub inserted: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SemdInfo {
        SemdInfo {
            event_id: 10,
            client_id: 20,
            doc_oid: 37,
            template_id: 5,
            semd_name: "Protocol".to_string(),
            semd_code: "PROT".to_string(),
            date_start: "2024-03-15 09:30:00".to_string(),
            person_id: Some(7),
            action_id: None,
            error_description: None,
        }
    }

    #[test]
    fn status_record_from_semd() {
        let record = SemdStatusRecord::from(sample());
        assert_eq!(record.event_id, 10);
        assert_eq!(record.doc_oid, "37");
        assert_eq!(
            record.date_start,
            Some(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        assert_eq!(record.status_semd, 0);
        assert_eq!(record.sign, 0);
        assert_eq!(record.sign_mo, 0);
    }

    #[test]
    fn status_record_tolerates_bad_date() {
        let mut info = sample();
        info.date_start = "garbage".to_string();
        assert_eq!(SemdStatusRecord::from(info).date_start, None);

        let mut info = sample();
        info.date_start = String::new();
        assert_eq!(SemdStatusRecord::from(info).date_start, None);
    }

    #[test]
    fn deserialize_without_optional_fields() {
        let json = r#"{
            "event_id": 1, "client_id": 2, "doc_oid": 3, "template_id": 4,
            "semd_name": "n", "semd_code": "c", "date_start": "2024-01-01 00:00:00"
        }"#;
        let info: SemdInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.person_id, None);
        assert_eq!(info.action_id, None);
        assert_eq!(info.error_description, None);
    }

    #[test]
    fn cache_keys() {
        assert_eq!(sample().status_key(), "semd:10:5");
        assert_eq!(MseInfoRequest { id: 42 }.cache_key(), "mse:42");
    }
}
