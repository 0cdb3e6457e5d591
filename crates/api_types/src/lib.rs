//! Wire types of the billing back-office REST API.
//!
//! Every payload is camelCase JSON. Entity read models are lenient: optional
//! columns are `Option` and counters default to zero so that older backend
//! builds that omit a field still decode.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod page {
    use super::*;

    /// Envelope returned by every list endpoint.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageResponse<T> {
        #[serde(default = "Vec::new")]
        pub data: Vec<T>,
        #[serde(default)]
        pub total_count: u64,
        #[serde(default)]
        pub current_page: u32,
        #[serde(default)]
        pub total_pages: u32,
        #[serde(default)]
        pub has_next: bool,
        #[serde(default)]
        pub has_previous: bool,
    }
}

pub mod mutation {
    use super::*;

    /// Envelope returned by create/update/delete endpoints.
    ///
    /// A `200 OK` with `isSuccess: false` is a business rejection; `message`
    /// then carries the text shown to the operator.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MutationResponse<T> {
        pub is_success: bool,
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default = "Option::default")]
        pub data: Option<T>,
    }

    /// Error body sent with non-2xx statuses.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ErrorBody {
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default)]
        pub error: Option<String>,
    }

    impl ErrorBody {
        pub fn into_message(self) -> Option<String> {
            self.message.or(self.error)
        }
    }
}

pub mod file {
    use super::*;

    /// What a bulk file feeds once processed server-side.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BulkPurpose {
        #[default]
        BillAdjustments,
        Customers,
        Outages,
        Payments,
    }

    impl BulkPurpose {
        pub const ALL: [BulkPurpose; 4] = [
            Self::BillAdjustments,
            Self::Customers,
            Self::Outages,
            Self::Payments,
        ];

        pub fn label(self) -> &'static str {
            match self {
                Self::BillAdjustments => "Bill adjustments",
                Self::Customers => "Customers",
                Self::Outages => "Outages",
                Self::Payments => "Payments",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FileIntentRequest {
        pub file_name: String,
        pub content_type: String,
        pub size: u64,
        /// Hex encoded SHA-256 of the file bytes.
        pub checksum: String,
        pub columns: Vec<String>,
        pub purpose: BulkPurpose,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FileIntentResponse {
        pub upload_url: String,
        pub file_id: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FinalizeFileRequest {
        pub file_id: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FinalizeFileResponse {
        pub status: String,
        pub object_key: String,
        #[serde(default)]
        pub public_url: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProcessBulkUploadRequest {
        pub file_id: String,
        /// `false` asks for a dry-run preview, `true` queues the job.
        pub confirm: bool,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProcessBulkUploadResponse {
        #[serde(default)]
        pub queued: bool,
        /// Backend specific preview of the parsed rows.
        #[serde(default)]
        pub preview: Option<serde_json::Value>,
        #[serde(default)]
        pub job: Option<super::csv_job::CsvJob>,
    }
}

pub mod reference {
    use super::*;

    /// Reference data used as dropdown and filter options.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum ReferenceKind {
        AreaOffices,
        ServiceStations,
        Feeders,
        PaymentTypes,
        Roles,
    }

    impl ReferenceKind {
        pub fn path(self) -> &'static str {
            match self {
                Self::AreaOffices => "area-offices",
                Self::ServiceStations => "service-stations",
                Self::Feeders => "feeders",
                Self::PaymentTypes => "payment-types",
                Self::Roles => "roles",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ReferenceOption {
        pub id: i64,
        pub name: String,
    }
}

pub mod agent {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Agent {
        pub id: i64,
        pub name: String,
        pub email: String,
        #[serde(default)]
        pub phone: Option<String>,
        #[serde(default)]
        pub area_office: Option<String>,
        pub status: String,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
    }
}

pub mod vendor {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Vendor {
        pub id: i64,
        pub name: String,
        pub email: String,
        #[serde(default)]
        pub phone: Option<String>,
        /// Percentage kept by the vendor on each vend.
        #[serde(default)]
        pub commission_rate: Option<f64>,
        pub status: String,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
    }
}

pub mod payment_type {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentType {
        pub id: i64,
        pub name: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub is_active: bool,
    }
}

pub mod csv_job {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum JobStatus {
        Pending,
        Processing,
        Completed,
        Failed,
        PartiallyCompleted,
    }

    impl JobStatus {
        pub fn label(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::Processing => "processing",
                Self::Completed => "completed",
                Self::Failed => "failed",
                Self::PartiallyCompleted => "partial",
            }
        }

        /// Whether the server will still update the job.
        pub fn is_running(self) -> bool {
            matches!(self, Self::Pending | Self::Processing)
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CsvJob {
        pub id: String,
        pub file_name: String,
        #[serde(default)]
        pub purpose: Option<String>,
        pub status: JobStatus,
        #[serde(default)]
        pub total_rows: u64,
        #[serde(default)]
        pub processed_rows: u64,
        #[serde(default)]
        pub failed_rows: u64,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub completed_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub error_message: Option<String>,
    }
}

pub mod adjustment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AdjustmentKind {
        Credit,
        Debit,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Adjustment {
        pub id: i64,
        pub account_number: String,
        #[serde(default)]
        pub customer_name: Option<String>,
        pub amount: f64,
        pub adjustment_type: AdjustmentKind,
        #[serde(default)]
        pub reason: Option<String>,
        pub status: String,
        #[serde(default)]
        pub area_office: Option<String>,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
    }
}

pub mod crypto {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CryptoFee {
        pub id: i64,
        pub currency: String,
        #[serde(default)]
        pub network: Option<String>,
        pub fee_percentage: f64,
        #[serde(default)]
        pub flat_fee: f64,
        #[serde(default)]
        pub is_active: bool,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CryptoTransaction {
        pub id: String,
        pub reference: String,
        pub currency: String,
        pub amount: f64,
        #[serde(default)]
        pub fiat_amount: Option<f64>,
        pub status: String,
        #[serde(default)]
        pub customer_account: Option<String>,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
    }
}

pub mod customer {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Customer {
        pub id: i64,
        pub account_number: String,
        pub name: String,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub phone: Option<String>,
        #[serde(default)]
        pub address: Option<String>,
        #[serde(default)]
        pub service_station: Option<String>,
        #[serde(default)]
        pub feeder: Option<String>,
        #[serde(default)]
        pub tariff: Option<String>,
        pub status: String,
    }
}

pub mod station {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ServiceStation {
        pub id: i64,
        pub name: String,
        pub code: String,
        #[serde(default)]
        pub area_office: Option<String>,
        #[serde(default)]
        pub latitude: Option<f64>,
        #[serde(default)]
        pub longitude: Option<f64>,
    }
}

pub mod outage {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Outage {
        pub id: i64,
        #[serde(default)]
        pub feeder: Option<String>,
        #[serde(default)]
        pub area_office: Option<String>,
        pub reason: String,
        pub starts_on: NaiveDate,
        #[serde(default)]
        pub ends_on: Option<NaiveDate>,
        pub status: String,
    }
}

pub mod role {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Role {
        pub id: i64,
        pub name: String,
        #[serde(default)]
        pub permissions: Vec<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Admin {
        pub id: i64,
        pub full_name: String,
        pub email: String,
        pub role: String,
        #[serde(default)]
        pub is_active: bool,
    }
}
