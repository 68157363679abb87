//! SeaORM entity for the SEMD status log (`GetStatusTable2`)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "GetStatusTable2")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i64,
    pub action_id: Option<i64>,
    pub status_semd: i8,
    pub client_id: i64,
    pub person_id: Option<i64>,
    pub semd_name: Option<String>,
    pub error_description: Option<String>,
    pub template_id: Option<i64>,
    pub remd_id: Option<String>,
    pub result_remd: Option<String>,
    pub remd_status: Option<i8>,
    pub date_create: Option<String>,
    pub date_accept: Option<String>,
    pub sign: Option<i8>,
    pub sign_mo: Option<i8>,
    pub doc_oid: Option<String>,
    pub semd_code: Option<String>,
    pub iemk_doc: i8,
    pub iemk_status: i8,
    pub iemk_error: Option<String>,
    pub sign_iemk: i8,
    pub sign_iemk_mo: i8,
    pub date_start: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
