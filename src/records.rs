//! Output record shapes. One record per scraped case, serialized exactly as
//! the downstream frontend expects: camelCase keys, `null` for anything the
//! page did not yield.

use serde::Serialize;

/// Record produced by the OpenRoom (Ontario) provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRoomRecord {
    pub provider: String,
    /// Profile URLs the record was assembled from.
    pub links: Vec<String>,
    pub tenant_name: Option<String>,
    pub landlord: Option<String>,
    pub case_id: Option<String>,
    pub address: Option<String>,
    pub topic: Option<String>,
    pub amount_owed: Option<String>,
    /// Hosted copies of the court-order images (or their source URLs when
    /// uploading is disabled).
    pub court_order_images: Vec<String>,
}

/// Record produced by the CanLII providers (Quebec, Alberta, BC).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanliiRecord {
    pub provider: String,
    pub case_name: Option<String>,
    pub citation: Option<String>,
    pub tribunal: Option<String>,
    pub date: Option<String>,
    pub keywords: Option<String>,
    pub case_url: Option<String>,
    pub full_text_snippet: Option<String>,
}

/// Either record shape; untagged so the JSON carries no wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaseRecord {
    OpenRoom(OpenRoomRecord),
    Canlii(CanliiRecord),
}

impl From<OpenRoomRecord> for CaseRecord {
    fn from(record: OpenRoomRecord) -> Self {
        CaseRecord::OpenRoom(record)
    }
}

impl From<CanliiRecord> for CaseRecord {
    fn from(record: CanliiRecord) -> Self {
        CaseRecord::Canlii(record)
    }
}
