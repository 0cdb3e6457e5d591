//! Table columns of every list screen.
use api_types::{
    adjustment::{Adjustment, AdjustmentKind},
    agent::Agent,
    crypto::{CryptoFee, CryptoTransaction},
    csv_job::CsvJob,
    customer::Customer,
    outage::Outage,
    payment_type::PaymentType,
    role::Admin,
    station::ServiceStation,
    vendor::Vendor,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use engine::{EditSource, FormInputs};

use crate::ui::components::money::format_amount;

/// A row that knows how to lay itself out in a table.
pub trait TableRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self, tz: &Tz) -> Vec<String>;

    /// Id and edit inputs, for rows that can be edited or deleted.
    fn record(&self) -> Option<RowRecord> {
        None
    }
}

/// The selected row as the edit form and delete action see it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub id: i64,
    pub inputs: FormInputs,
}

impl RowRecord {
    pub fn of<R: EditSource>(row: &R) -> Self {
        Self {
            id: row.id(),
            inputs: row.form_inputs(),
        }
    }
}

const NONE: &str = "-";

fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(NONE)
        .to_string()
}

/// Timestamp in the operator's timezone.
pub fn local_time(at: Option<DateTime<Utc>>, tz: &Tz) -> String {
    at.map(|at| at.with_timezone(tz).format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| NONE.to_string())
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

impl TableRow for Adjustment {
    const HEADERS: &'static [&'static str] = &[
        "Account", "Customer", "Type", "Amount", "Status", "Office", "Created",
    ];

    fn cells(&self, tz: &Tz) -> Vec<String> {
        let signed = match self.adjustment_type {
            AdjustmentKind::Credit => self.amount,
            AdjustmentKind::Debit => -self.amount,
        };
        vec![
            self.account_number.clone(),
            or_dash(self.customer_name.as_deref()),
            match self.adjustment_type {
                AdjustmentKind::Credit => "credit".to_string(),
                AdjustmentKind::Debit => "debit".to_string(),
            },
            format_amount(signed),
            self.status.clone(),
            or_dash(self.area_office.as_deref()),
            local_time(self.created_at, tz),
        ]
    }
}

impl TableRow for Agent {
    const HEADERS: &'static [&'static str] =
        &["Name", "Email", "Phone", "Office", "Status", "Created"];

    fn cells(&self, tz: &Tz) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            or_dash(self.phone.as_deref()),
            or_dash(self.area_office.as_deref()),
            self.status.clone(),
            local_time(self.created_at, tz),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for Vendor {
    const HEADERS: &'static [&'static str] =
        &["Name", "Email", "Phone", "Commission", "Status", "Created"];

    fn cells(&self, tz: &Tz) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            or_dash(self.phone.as_deref()),
            self.commission_rate
                .map(|rate| format!("{rate:.2}%"))
                .unwrap_or_else(|| NONE.to_string()),
            self.status.clone(),
            local_time(self.created_at, tz),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for PaymentType {
    const HEADERS: &'static [&'static str] = &["Name", "Description", "Active"];

    fn cells(&self, _tz: &Tz) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(self.description.as_deref()),
            yes_no(self.is_active),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for CsvJob {
    const HEADERS: &'static [&'static str] = &[
        "File", "Purpose", "Status", "Rows", "Failed", "Started", "Finished",
    ];

    fn cells(&self, tz: &Tz) -> Vec<String> {
        let status = match &self.error_message {
            Some(message) if !message.is_empty() => {
                format!("{}: {message}", self.status.label())
            }
            _ => self.status.label().to_string(),
        };
        vec![
            self.file_name.clone(),
            or_dash(self.purpose.as_deref()),
            status,
            format!("{}/{}", self.processed_rows, self.total_rows),
            self.failed_rows.to_string(),
            local_time(self.created_at, tz),
            local_time(self.completed_at, tz),
        ]
    }
}

impl TableRow for CryptoFee {
    const HEADERS: &'static [&'static str] = &["Currency", "Network", "Fee %", "Flat fee", "Active"];

    fn cells(&self, _tz: &Tz) -> Vec<String> {
        vec![
            self.currency.clone(),
            or_dash(self.network.as_deref()),
            format!("{:.2}", self.fee_percentage),
            format_amount(self.flat_fee),
            yes_no(self.is_active),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for CryptoTransaction {
    const HEADERS: &'static [&'static str] = &[
        "Reference", "Currency", "Amount", "Fiat", "Status", "Account", "Created",
    ];

    fn cells(&self, tz: &Tz) -> Vec<String> {
        vec![
            self.reference.clone(),
            self.currency.clone(),
            self.amount.to_string(),
            self.fiat_amount
                .map(format_amount)
                .unwrap_or_else(|| NONE.to_string()),
            self.status.clone(),
            or_dash(self.customer_account.as_deref()),
            local_time(self.created_at, tz),
        ]
    }
}

impl TableRow for Customer {
    const HEADERS: &'static [&'static str] = &[
        "Account", "Name", "Phone", "Station", "Feeder", "Tariff", "Status",
    ];

    fn cells(&self, _tz: &Tz) -> Vec<String> {
        vec![
            self.account_number.clone(),
            self.name.clone(),
            or_dash(self.phone.as_deref()),
            or_dash(self.service_station.as_deref()),
            or_dash(self.feeder.as_deref()),
            or_dash(self.tariff.as_deref()),
            self.status.clone(),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for ServiceStation {
    const HEADERS: &'static [&'static str] = &["Code", "Name", "Office", "Coordinates"];

    fn cells(&self, _tz: &Tz) -> Vec<String> {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => format!("{lat:.5}, {lon:.5}"),
            _ => NONE.to_string(),
        };
        vec![
            self.code.clone(),
            self.name.clone(),
            or_dash(self.area_office.as_deref()),
            coordinates,
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for Outage {
    const HEADERS: &'static [&'static str] =
        &["Feeder", "Office", "Reason", "Starts", "Ends", "Status"];

    fn cells(&self, _tz: &Tz) -> Vec<String> {
        vec![
            or_dash(self.feeder.as_deref()),
            or_dash(self.area_office.as_deref()),
            self.reason.clone(),
            self.starts_on.format("%d %b %Y").to_string(),
            self.ends_on
                .map(|day| day.format("%d %b %Y").to_string())
                .unwrap_or_else(|| "open".to_string()),
            self.status.clone(),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

impl TableRow for Admin {
    const HEADERS: &'static [&'static str] = &["Name", "Email", "Role", "Active"];

    fn cells(&self, _tz: &Tz) -> Vec<String> {
        vec![
            self.full_name.clone(),
            self.email.clone(),
            self.role.clone(),
            yes_no(self.is_active),
        ]
    }

    fn record(&self) -> Option<RowRecord> {
        Some(RowRecord::of(self))
    }
}

#[cfg(test)]
mod tests {
    use api_types::csv_job::JobStatus;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_use_the_configured_zone() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(local_time(Some(at), &chrono_tz::Africa::Lagos), "02 Mar 2024 00:30");
        assert_eq!(local_time(Some(at), &chrono_tz::UTC), "01 Mar 2024 23:30");
        assert_eq!(local_time(None, &chrono_tz::UTC), "-");
    }

    #[test]
    fn debit_adjustments_show_negative() {
        let row = Adjustment {
            id: 7,
            account_number: "0101234567".to_string(),
            customer_name: None,
            amount: 1500.0,
            adjustment_type: AdjustmentKind::Debit,
            reason: Some("estimated bill".to_string()),
            status: "pending".to_string(),
            area_office: Some(" ".to_string()),
            created_at: None,
        };
        let cells = row.cells(&chrono_tz::UTC);
        assert_eq!(cells.len(), Adjustment::HEADERS.len());
        assert_eq!(cells[1], "-");
        assert_eq!(cells[3], "-1,500.00");
        assert_eq!(cells[5], "-");
    }

    #[test]
    fn job_rows_carry_progress_and_error() {
        let job = CsvJob {
            id: "job-1".to_string(),
            file_name: "march.csv".to_string(),
            purpose: Some("bill_adjustments".to_string()),
            status: JobStatus::PartiallyCompleted,
            total_rows: 120,
            processed_rows: 118,
            failed_rows: 2,
            created_at: None,
            completed_at: None,
            error_message: Some("2 rows rejected".to_string()),
        };
        let cells = job.cells(&chrono_tz::UTC);
        assert_eq!(cells[2], "partial: 2 rows rejected");
        assert_eq!(cells[3], "118/120");
        assert_eq!(cells[4], "2");
    }

    #[test]
    fn editable_rows_expose_a_record() {
        let admin = Admin {
            id: 4,
            full_name: "Bola Ade".to_string(),
            email: "bola@example.com".to_string(),
            role: "Auditor".to_string(),
            is_active: true,
        };
        let record = admin.record().unwrap();
        assert_eq!(record.id, 4);
        assert_eq!(record.inputs.get("full_name"), "Bola Ade");
        assert_eq!(record.inputs.get("role_id"), "");

        let adjustment = Adjustment {
            id: 7,
            account_number: "0101234567".to_string(),
            customer_name: None,
            amount: 10.0,
            adjustment_type: AdjustmentKind::Credit,
            reason: None,
            status: "approved".to_string(),
            area_office: None,
            created_at: None,
        };
        assert!(adjustment.record().is_none());
    }
}
