//! CSV export of flat records

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::domain::entities::SemdInfo;

/// A record that can be written as one CSV line
pub trait CsvRecord {
    fn headers() -> Vec<&'static str>;

    /// Values in header order; `None` is written as an empty field
    fn values(&self) -> Vec<Option<String>>;
}

impl CsvRecord for SemdInfo {
    fn headers() -> Vec<&'static str> {
        vec![
            "event_id",
            "client_id",
            "doc_oid",
            "template_id",
            "semd_name",
            "semd_code",
            "date_start",
            "person_id",
            "action_id",
            "error_description",
        ]
    }

    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.event_id.to_string()),
            Some(self.client_id.to_string()),
            Some(self.doc_oid.to_string()),
            Some(self.template_id.to_string()),
            Some(self.semd_name.clone()),
            Some(self.semd_code.clone()),
            Some(self.date_start.clone()),
            self.person_id.map(|v| v.to_string()),
            self.action_id.map(|v| v.to_string()),
            self.error_description.clone(),
        ]
    }
}

pub struct CsvExporter {
    separator: char,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self { separator: ',' }
    }
}

impl CsvExporter {
    #[cfg(test)]
    pub fn with_separator(separator: char) -> Self {
        Self { separator }
    }

    /// Header line followed by one line per record, no trailing newline
    pub fn to_csv<R: CsvRecord>(&self, records: &[R]) -> String {
        let sep = self.separator.to_string();
        let mut lines = Vec::with_capacity(records.len() + 1);

        lines.push(R::headers().join(&sep));
        for record in records {
            let fields: Vec<String> = record
                .values()
                .into_iter()
                .map(|value| self.escape(value.unwrap_or_default()))
                .collect();
            lines.push(fields.join(&sep));
        }

        lines.join("\n")
    }

    /// `text/csv` attachment; `.csv` is appended to `filename` when missing
    pub fn into_response<R: CsvRecord>(&self, records: &[R], filename: &str) -> Response {
        let filename = if filename.contains(".csv") {
            filename.to_string()
        } else {
            format!("{}.csv", filename)
        };

        (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", urlencoding::encode(&filename)),
                ),
            ],
            self.to_csv(records),
        )
            .into_response()
    }

    /// Quote fields that would otherwise break the line structure
    fn escape(&self, value: String) -> String {
        if value.contains(self.separator) || value.contains(['"', '\n', '\r']) {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::test_utils::test_semd;

    #[test]
    fn empty_export_is_only_headers() {
        let csv = CsvExporter::default().to_csv::<SemdInfo>(&[]);
        assert_eq!(
            csv,
            "event_id,client_id,doc_oid,template_id,semd_name,semd_code,date_start,person_id,action_id,error_description"
        );
    }

    #[test]
    fn rows_follow_header_without_trailing_newline() {
        let csv = CsvExporter::default().to_csv(&[test_semd(1, Some(9)), test_semd(2, None)]);
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,100,37,5,Protocol,PROT,2024-03-15 09:30:00,,9,");
        assert_eq!(lines[2], "2,100,37,5,Protocol,PROT,2024-03-15 09:30:00,,,");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn custom_separator_and_quoting() {
        let mut semd = test_semd(1, None);
        semd.semd_name = "Protocol; part \"A\"".to_string();

        let csv = CsvExporter::with_separator(';').to_csv(&[semd]);
        let row = csv.lines().nth(1).unwrap();

        assert!(row.starts_with("1;100;37;5;\"Protocol; part \"\"A\"\"\";PROT"));
    }

    #[test]
    fn carriage_return_is_quoted() {
        let mut semd = test_semd(1, None);
        semd.semd_name = "a\rb".to_string();

        let csv = CsvExporter::default().to_csv(&[semd]);
        let row = csv.split('\n').nth(1).unwrap();

        assert!(row.starts_with("1,100,37,5,\"a\rb\",PROT"));
    }

    #[tokio::test]
    async fn response_is_a_csv_attachment() {
        let response = CsvExporter::default().into_response(&[test_semd(1, None)], "semds");

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=semds.csv"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().starts_with("event_id,"));
    }

    #[test]
    fn existing_extension_is_kept() {
        let response = CsvExporter::default().into_response::<SemdInfo>(&[], "report.csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=report.csv"
        );
    }
}
