//! List endpoints of the back-office and the filters each one accepts.
use api_types::reference::ReferenceKind;

use crate::query::{FilterField, FilterKind, FilterManifest};

/// One paged list endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListResource {
    pub title: &'static str,
    /// Path relative to the API base URL.
    pub path: &'static str,
    pub manifest: FilterManifest,
}

const ACCOUNT_STATUSES: &[&str] = &["active", "inactive", "suspended"];
const ADJUSTMENT_STATUSES: &[&str] = &["pending", "approved", "rejected"];
const ADJUSTMENT_KINDS: &[&str] = &["credit", "debit"];
const JOB_STATUSES: &[&str] = &[
    "pending",
    "processing",
    "completed",
    "failed",
    "partially_completed",
];
const CRYPTO_STATUSES: &[&str] = &["pending", "confirmed", "failed"];
const OUTAGE_STATUSES: &[&str] = &["scheduled", "ongoing", "resolved"];

const SEARCH: FilterField = FilterField::new("search", "Search", FilterKind::Text);
const FROM_DATE: FilterField = FilterField::new("fromDate", "From", FilterKind::Date);
const TO_DATE: FilterField = FilterField::new("toDate", "To", FilterKind::Date);
const AREA_OFFICE: FilterField = FilterField::new(
    "areaOfficeId",
    "Area office",
    FilterKind::Reference(ReferenceKind::AreaOffices),
);

pub const AGENTS: ListResource = ListResource {
    title: "Agents",
    path: "agents",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(ACCOUNT_STATUSES)),
        AREA_OFFICE,
        SEARCH,
    ]),
};

pub const VENDORS: ListResource = ListResource {
    title: "Vendors",
    path: "vendors",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(ACCOUNT_STATUSES)),
        SEARCH,
    ]),
};

pub const PAYMENT_TYPES: ListResource = ListResource {
    title: "Payment types",
    path: "payment-types",
    manifest: FilterManifest::new(&[
        FilterField::new("isActive", "Active", FilterKind::Boolean),
        SEARCH,
    ]),
};

pub const CSV_JOBS: ListResource = ListResource {
    title: "CSV jobs",
    path: "csv-jobs",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(JOB_STATUSES)),
        FROM_DATE,
        TO_DATE,
    ]),
};

pub const ADJUSTMENTS: ListResource = ListResource {
    title: "Bill adjustments",
    path: "billing/adjustments",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(ADJUSTMENT_STATUSES)),
        FilterField::new("adjustmentType", "Type", FilterKind::Choice(ADJUSTMENT_KINDS)),
        AREA_OFFICE,
        FROM_DATE,
        TO_DATE,
        FilterField::new("accountNumber", "Account", FilterKind::Text),
    ]),
};

pub const CRYPTO_FEES: ListResource = ListResource {
    title: "Crypto fees",
    path: "crypto/fees",
    manifest: FilterManifest::new(&[
        FilterField::new("currency", "Currency", FilterKind::Text),
        FilterField::new("isActive", "Active", FilterKind::Boolean),
    ]),
};

pub const CRYPTO_TRANSACTIONS: ListResource = ListResource {
    title: "Crypto transactions",
    path: "crypto/transactions",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(CRYPTO_STATUSES)),
        FilterField::new("currency", "Currency", FilterKind::Text),
        FROM_DATE,
        TO_DATE,
        SEARCH,
    ]),
};

pub const CUSTOMERS: ListResource = ListResource {
    title: "Customers",
    path: "customers",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(ACCOUNT_STATUSES)),
        FilterField::new(
            "serviceStationId",
            "Service station",
            FilterKind::Reference(ReferenceKind::ServiceStations),
        ),
        FilterField::new(
            "feederId",
            "Feeder",
            FilterKind::Reference(ReferenceKind::Feeders),
        ),
        SEARCH,
    ]),
};

pub const SERVICE_STATIONS: ListResource = ListResource {
    title: "Service stations",
    path: "service-stations",
    manifest: FilterManifest::new(&[AREA_OFFICE, SEARCH]),
};

pub const OUTAGES: ListResource = ListResource {
    title: "Outages",
    path: "outages",
    manifest: FilterManifest::new(&[
        FilterField::new("status", "Status", FilterKind::Choice(OUTAGE_STATUSES)),
        FilterField::new(
            "feederId",
            "Feeder",
            FilterKind::Reference(ReferenceKind::Feeders),
        ),
        AREA_OFFICE,
        FROM_DATE,
        TO_DATE,
    ]),
};

pub const ADMINS: ListResource = ListResource {
    title: "Admins",
    path: "admins",
    manifest: FilterManifest::new(&[
        FilterField::new("roleId", "Role", FilterKind::Reference(ReferenceKind::Roles)),
        FilterField::new("isActive", "Active", FilterKind::Boolean),
        SEARCH,
    ]),
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterValue, Query};

    #[test]
    fn adjustments_params_follow_manifest_order() {
        let mut query = Query::new(10);
        query.set_filter("accountNumber", Some("0101".into()));
        query.set_filter("status", Some("pending".into()));
        query.set_filter("unknown", Some("x".into()));

        let params = ADJUSTMENTS.manifest.build_params(&query);
        let keys: Vec<&str> = params.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["pageNumber", "pageSize", "status", "accountNumber"]);
    }

    #[test]
    fn job_status_choice_is_checked() {
        assert_eq!(
            CSV_JOBS.manifest.parse("status", "Completed").unwrap(),
            Some(FilterValue::Text("completed".to_string()))
        );
        assert!(CSV_JOBS.manifest.parse("status", "done").is_err());
    }
}
