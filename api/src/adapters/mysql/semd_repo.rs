//! MySQL adapter for SemdRepository

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveValue::Set, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, Statement,
};

use crate::adapters::mysql::connection::with_retry;
use crate::domain::entities::{SemdInfo, SemdStatusRecord};
use crate::domain::ports::SemdRepository;
use crate::entity::get_status_table;
use crate::error::DomainError;

/// Finished (status 2) Actions whose print template yields an XML SEMD
const ACTION_SEMDS_SQL: &str = r#"
SELECT
    a.id AS action_id,
    CAST(a.begDate AS CHAR) AS date_start,
    a.event_id AS event_id,
    a.person_id AS person_id,
    e.client_id AS client_id,
    doc.EGISZ_code AS doc_oid,
    tpl.id AS template_id,
    doc.name AS semd_name,
    doc.code AS semd_code
FROM Action a
LEFT JOIN ActionType at ON at.id = a.actionType_id
LEFT JOIN rbPrintTemplate tpl ON tpl.context = at.context
LEFT JOIN rbIEMKDocument doc ON doc.id = tpl.documentType_id
LEFT JOIN Event e ON e.id = a.event_id
LEFT JOIN Client c ON c.id = e.client_id
WHERE a.deleted = 0
  AND a.begDate >= ?
  AND a.begDate <= ?
  AND a.status = 2
  AND e.deleted = 0
  AND at.deleted = 0
  AND c.deleted = 0
  AND tpl.deleted = 0
  AND doc.type = 'xml'
  AND doc.code NOT LIKE '%SMS%'
"#;

/// Executed Events whose print template yields an XML SEMD
const EVENT_SEMDS_SQL: &str = r#"
SELECT
    NULL AS action_id,
    CAST(e.execDate AS CHAR) AS date_start,
    e.id AS event_id,
    e.execPerson_id AS person_id,
    e.client_id AS client_id,
    doc.EGISZ_code AS doc_oid,
    tpl.id AS template_id,
    doc.name AS semd_name,
    doc.code AS semd_code
FROM rbIEMKDocument doc
LEFT JOIN rbPrintTemplate tpl ON tpl.documentType_id = doc.id
LEFT JOIN EventType et ON et.context = tpl.context
LEFT JOIN Event e ON e.eventType_id = et.id
LEFT JOIN Client c ON c.id = e.client_id
WHERE e.execDate >= ?
  AND e.execDate <= ?
  AND e.execDate IS NOT NULL
  AND et.deleted = 0
  AND e.deleted = 0
  AND c.deleted = 0
  AND tpl.deleted = 0
  AND doc.type = 'xml'
  AND doc.code NOT LIKE '%SMS%'
"#;

/// Row shape shared by both collection queries
#[derive(Debug, Clone, FromQueryResult)]
struct SemdRow {
    action_id: Option<i64>,
    date_start: Option<String>,
    event_id: Option<i64>,
    person_id: Option<i64>,
    client_id: Option<i64>,
    doc_oid: Option<i64>,
    template_id: Option<i64>,
    semd_name: Option<String>,
    semd_code: Option<String>,
}

impl TryFrom<SemdRow> for SemdInfo {
    type Error = DomainError;

    fn try_from(row: SemdRow) -> Result<Self, Self::Error> {
        fn required<T>(value: Option<T>, field: &str) -> Result<T, DomainError> {
            value.ok_or_else(|| DomainError::Validation(format!("SEMD row without {}", field)))
        }

        Ok(SemdInfo {
            event_id: required(row.event_id, "event_id")?,
            client_id: required(row.client_id, "client_id")?,
            doc_oid: required(row.doc_oid, "doc_oid")?,
            template_id: required(row.template_id, "template_id")?,
            semd_name: required(row.semd_name, "semd_name")?,
            semd_code: required(row.semd_code, "semd_code")?,
            date_start: required(row.date_start, "date_start")?,
            person_id: row.person_id,
            action_id: row.action_id,
            error_description: None,
        })
    }
}

/// MySQL implementation of SemdRepository
pub struct MySqlSemdRepository {
    db: DatabaseConnection,
}

impl MySqlSemdRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn collect(
        &self,
        sql: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError> {
        let rows = with_retry(|| {
            SemdRow::find_by_statement(Statement::from_sql_and_values(
                DbBackend::MySql,
                sql,
                [start.into(), end.into()],
            ))
            .all(&self.db)
        })
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match SemdInfo::try_from(row) {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping incomplete SEMD row");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl SemdRepository for MySqlSemdRepository {
    async fn collect_action_semds(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError> {
        self.collect(ACTION_SEMDS_SQL, start, end).await
    }

    async fn collect_event_semds(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError> {
        self.collect(EVENT_SEMDS_SQL, start, end).await
    }

    async fn insert_status(&self, record: &SemdStatusRecord) -> Result<(), DomainError> {
        with_retry(|| {
            get_status_table::Entity::insert(get_status_table::ActiveModel::from(record))
                .exec(&self.db)
        })
        .await?;

        Ok(())
    }
}

/// Convert a domain status record to a SeaORM active model
impl From<&SemdStatusRecord> for get_status_table::ActiveModel {
    fn from(record: &SemdStatusRecord) -> Self {
        get_status_table::ActiveModel {
            event_id: Set(record.event_id),
            action_id: Set(record.action_id),
            status_semd: Set(record.status_semd),
            client_id: Set(record.client_id),
            person_id: Set(record.person_id),
            semd_name: Set(Some(record.semd_name.clone())),
            error_description: Set(record.error_description.clone()),
            template_id: Set(Some(record.template_id)),
            sign: Set(Some(record.sign)),
            sign_mo: Set(Some(record.sign_mo)),
            doc_oid: Set(Some(record.doc_oid.clone())),
            semd_code: Set(Some(record.semd_code.clone())),
            iemk_doc: Set(0),
            iemk_status: Set(0),
            sign_iemk: Set(0),
            sign_iemk_mo: Set(0),
            date_start: Set(record.date_start),
            ..Default::default()
        }
    }
}
