use api_types::{
    adjustment::AdjustmentKind, agent::Agent, crypto::CryptoFee, customer::Customer,
    outage::Outage, payment_type::PaymentType, reference::ReferenceKind, role::Admin,
    station::ServiceStation, vendor::Vendor,
};
use chrono::NaiveDate;
use serde::Serialize;
use validator::{Validate, ValidationError};

use super::{
    EditSource, EntityForm, FieldKind, FormField, FormInputs, InputParser, ValidationIssues,
};

const ADJUSTMENT_KINDS: &[&str] = &["credit", "debit"];

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    #[validate(length(min = 6, max = 20, message = "must be 6 to 20 characters"))]
    pub account_number: String,
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 15, message = "must be 7 to 15 digits"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub address: Option<String>,
    #[validate(range(min = 1, message = "select a service station"))]
    pub service_station_id: i64,
    pub tariff: Option<String>,
}

impl EntityForm for CustomerForm {
    const TITLE: &'static str = "Customer";
    const ENDPOINT: &'static str = "customers";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("account_number", "Account number", FieldKind::Text),
            FormField::required("name", "Name", FieldKind::Text),
            FormField::optional("email", "Email", FieldKind::Email),
            FormField::optional("phone", "Phone", FieldKind::Text),
            FormField::optional("address", "Address", FieldKind::Text),
            FormField::required(
                "service_station_id",
                "Service station",
                FieldKind::Reference(ReferenceKind::ServiceStations),
            ),
            FormField::optional("tariff", "Tariff", FieldKind::Text),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            account_number: p.text("account_number"),
            name: p.text("name"),
            email: p.optional_text("email"),
            phone: p.optional_text("phone"),
            address: p.optional_text("address"),
            service_station_id: p.number("service_station_id"),
            tariff: p.optional_text("tariff"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStationForm {
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 20, message = "must be 2 to 20 characters"))]
    pub code: String,
    #[validate(range(min = 1, message = "select an area office"))]
    pub area_office_id: i64,
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: f64,
}

impl EntityForm for ServiceStationForm {
    const TITLE: &'static str = "Service station";
    const ENDPOINT: &'static str = "service-stations";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("name", "Name", FieldKind::Text),
            FormField::required("code", "Code", FieldKind::Text),
            FormField::required(
                "area_office_id",
                "Area office",
                FieldKind::Reference(ReferenceKind::AreaOffices),
            ),
            FormField::required("latitude", "Latitude", FieldKind::Number),
            FormField::required("longitude", "Longitude", FieldKind::Number),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            name: p.text("name"),
            code: p.text("code"),
            area_office_id: p.number("area_office_id"),
            latitude: p.decimal("latitude"),
            longitude: p.decimal("longitude"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentForm {
    #[validate(length(min = 6, max = 20, message = "must be 6 to 20 characters"))]
    pub account_number: String,
    #[validate(range(min = 0.01, message = "must be greater than zero"))]
    pub amount: f64,
    pub adjustment_type: AdjustmentKind,
    #[validate(length(min = 5, max = 500, message = "must be 5 to 500 characters"))]
    pub reason: String,
}

impl EntityForm for AdjustmentForm {
    const TITLE: &'static str = "Adjustment";
    const ENDPOINT: &'static str = "billing/adjustments";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("account_number", "Account number", FieldKind::Text),
            FormField::required("amount", "Amount", FieldKind::Number),
            FormField::required(
                "adjustment_type",
                "Type",
                FieldKind::Choice(ADJUSTMENT_KINDS),
            ),
            FormField::required("reason", "Reason", FieldKind::Text),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let account_number = p.text("account_number");
        let amount = p.decimal("amount");
        let adjustment_type = p.choice("adjustment_type", |raw| match raw {
            "credit" => Some(AdjustmentKind::Credit),
            "debit" => Some(AdjustmentKind::Debit),
            _ => None,
        });
        let reason = p.text("reason");
        p.finish(adjustment_type.map(|adjustment_type| Self {
            account_number,
            amount,
            adjustment_type,
            reason,
        }))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AgentForm {
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 7, max = 15, message = "must be 7 to 15 digits"))]
    pub phone: String,
    #[validate(range(min = 1, message = "select an area office"))]
    pub area_office_id: i64,
}

impl EntityForm for AgentForm {
    const TITLE: &'static str = "Agent";
    const ENDPOINT: &'static str = "agents";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("name", "Name", FieldKind::Text),
            FormField::required("email", "Email", FieldKind::Email),
            FormField::required("phone", "Phone", FieldKind::Text),
            FormField::required(
                "area_office_id",
                "Area office",
                FieldKind::Reference(ReferenceKind::AreaOffices),
            ),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            name: p.text("name"),
            email: p.text("email"),
            phone: p.text("phone"),
            area_office_id: p.number("area_office_id"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VendorForm {
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 7, max = 15, message = "must be 7 to 15 digits"))]
    pub phone: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub commission_rate: f64,
}

impl EntityForm for VendorForm {
    const TITLE: &'static str = "Vendor";
    const ENDPOINT: &'static str = "vendors";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("name", "Name", FieldKind::Text),
            FormField::required("email", "Email", FieldKind::Email),
            FormField::optional("phone", "Phone", FieldKind::Text),
            FormField::required("commission_rate", "Commission %", FieldKind::Number),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            name: p.text("name"),
            email: p.text("email"),
            phone: p.optional_text("phone"),
            commission_rate: p.decimal("commission_rate"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTypeForm {
    #[validate(length(min = 2, max = 50, message = "must be 2 to 50 characters"))]
    pub name: String,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub description: Option<String>,
}

impl EntityForm for PaymentTypeForm {
    const TITLE: &'static str = "Payment type";
    const ENDPOINT: &'static str = "payment-types";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("name", "Name", FieldKind::Text),
            FormField::optional("description", "Description", FieldKind::Text),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            name: p.text("name"),
            description: p.optional_text("description"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CryptoFeeForm {
    #[validate(length(min = 2, max = 10, message = "must be 2 to 10 characters"))]
    pub currency: String,
    pub network: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub fee_percentage: f64,
    #[validate(range(min = 0.0, message = "cannot be negative"))]
    pub flat_fee: f64,
}

impl EntityForm for CryptoFeeForm {
    const TITLE: &'static str = "Crypto fee";
    const ENDPOINT: &'static str = "crypto/fees";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("currency", "Currency", FieldKind::Text),
            FormField::optional("network", "Network", FieldKind::Text),
            FormField::required("fee_percentage", "Fee %", FieldKind::Number),
            FormField::optional("flat_fee", "Flat fee", FieldKind::Number),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            currency: p.text("currency").to_ascii_uppercase(),
            network: p.optional_text("network"),
            fee_percentage: p.decimal("fee_percentage"),
            flat_fee: p.optional_decimal("flat_fee").unwrap_or_default(),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_outage_window"))]
pub struct OutageForm {
    #[validate(range(min = 1, message = "select a feeder"))]
    pub feeder_id: i64,
    #[validate(length(min = 5, max = 500, message = "must be 5 to 500 characters"))]
    pub reason: String,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
}

fn validate_outage_window(form: &OutageForm) -> Result<(), ValidationError> {
    match form.ends_on {
        Some(ends_on) if ends_on < form.starts_on => Err(ValidationError::new("window")
            .with_message("the outage cannot end before it starts".into())),
        _ => Ok(()),
    }
}

impl EntityForm for OutageForm {
    const TITLE: &'static str = "Outage";
    const ENDPOINT: &'static str = "outages";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required(
                "feeder_id",
                "Feeder",
                FieldKind::Reference(ReferenceKind::Feeders),
            ),
            FormField::required("reason", "Reason", FieldKind::Text),
            FormField::required("starts_on", "Starts on", FieldKind::Date),
            FormField::optional("ends_on", "Ends on", FieldKind::Date),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            feeder_id: p.number("feeder_id"),
            reason: p.text("reason"),
            starts_on: p.date("starts_on"),
            ends_on: p.optional_date("ends_on"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminForm {
    #[validate(length(min = 2, max = 100, message = "must be 2 to 100 characters"))]
    pub full_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(range(min = 1, message = "select a role"))]
    pub role_id: i64,
}

impl EntityForm for AdminForm {
    const TITLE: &'static str = "Admin";
    const ENDPOINT: &'static str = "admins";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("full_name", "Full name", FieldKind::Text),
            FormField::required("email", "Email", FieldKind::Email),
            FormField::required(
                "role_id",
                "Role",
                FieldKind::Reference(ReferenceKind::Roles),
            ),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            full_name: p.text("full_name"),
            email: p.text("email"),
            role_id: p.number("role_id"),
        };
        p.finish(Some(form))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleForm {
    #[validate(length(min = 2, max = 50, message = "must be 2 to 50 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "grant at least one permission"))]
    pub permissions: Vec<String>,
}

impl EntityForm for RoleForm {
    const TITLE: &'static str = "Role";
    const ENDPOINT: &'static str = "roles";

    fn fields() -> &'static [FormField] {
        const FIELDS: &[FormField] = &[
            FormField::required("name", "Name", FieldKind::Text),
            FormField::required("permissions", "Permissions (comma separated)", FieldKind::Text),
        ];
        FIELDS
    }

    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues> {
        let mut p = InputParser::new(inputs);
        let form = Self {
            name: p.text("name"),
            permissions: p.list("permissions"),
        };
        p.finish(Some(form))
    }
}

/// Inputs from `(key, value)` pairs; missing values stay blank.
fn seeded<'a>(pairs: impl IntoIterator<Item = (&'a str, Option<String>)>) -> FormInputs {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
}

fn date_input(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl EditSource for Customer {
    type Form = CustomerForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("account_number", Some(self.account_number.clone())),
            ("name", Some(self.name.clone())),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("address", self.address.clone()),
            ("tariff", self.tariff.clone()),
        ])
    }
}

impl EditSource for ServiceStation {
    type Form = ServiceStationForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("name", Some(self.name.clone())),
            ("code", Some(self.code.clone())),
            ("latitude", self.latitude.map(|lat| lat.to_string())),
            ("longitude", self.longitude.map(|lon| lon.to_string())),
        ])
    }
}

impl EditSource for Agent {
    type Form = AgentForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("name", Some(self.name.clone())),
            ("email", Some(self.email.clone())),
            ("phone", self.phone.clone()),
        ])
    }
}

impl EditSource for Vendor {
    type Form = VendorForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("name", Some(self.name.clone())),
            ("email", Some(self.email.clone())),
            ("phone", self.phone.clone()),
            ("commission_rate", self.commission_rate.map(|rate| rate.to_string())),
        ])
    }
}

impl EditSource for PaymentType {
    type Form = PaymentTypeForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("name", Some(self.name.clone())),
            ("description", self.description.clone()),
        ])
    }
}

impl EditSource for CryptoFee {
    type Form = CryptoFeeForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("currency", Some(self.currency.clone())),
            ("network", self.network.clone()),
            ("fee_percentage", Some(self.fee_percentage.to_string())),
            ("flat_fee", Some(self.flat_fee.to_string())),
        ])
    }
}

impl EditSource for Outage {
    type Form = OutageForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("reason", Some(self.reason.clone())),
            ("starts_on", Some(date_input(self.starts_on))),
            ("ends_on", self.ends_on.map(date_input)),
        ])
    }
}

impl EditSource for Admin {
    type Form = AdminForm;

    fn id(&self) -> i64 {
        self.id
    }

    fn form_inputs(&self) -> FormInputs {
        seeded([
            ("full_name", Some(self.full_name.clone())),
            ("email", Some(self.email.clone())),
        ])
    }
}

#[cfg(test)]
mod tests {
    use api_types::mutation::MutationResponse;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        error::RemoteError,
        forms::{FormError, FormMode, FormState, MutationSink, delete_record},
    };

    /// `(verb, path, body)` of every mutation.
    type Call = (&'static str, String, Value);

    struct RecordingSink {
        calls: Mutex<Vec<Call>>,
        reply: Result<MutationResponse<Value>, RemoteError>,
    }

    impl RecordingSink {
        fn replying(reply: Result<MutationResponse<Value>, RemoteError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn accepting() -> Self {
            Self::replying(Ok(MutationResponse {
                is_success: true,
                message: Some("Adjustment created".to_string()),
                data: Some(json!({ "id": 7 })),
            }))
        }
    }

    #[async_trait]
    impl MutationSink for RecordingSink {
        async fn create(
            &self,
            endpoint: &str,
            body: Value,
        ) -> Result<MutationResponse<Value>, RemoteError> {
            self.calls.lock().push(("POST", endpoint.to_string(), body));
            self.reply.clone()
        }

        async fn update(
            &self,
            endpoint: &str,
            id: i64,
            body: Value,
        ) -> Result<MutationResponse<Value>, RemoteError> {
            self.calls.lock().push(("PUT", format!("{endpoint}/{id}"), body));
            self.reply.clone()
        }

        async fn delete(
            &self,
            endpoint: &str,
            id: i64,
        ) -> Result<MutationResponse<Value>, RemoteError> {
            self.calls
                .lock()
                .push(("DELETE", format!("{endpoint}/{id}"), Value::Null));
            self.reply.clone()
        }
    }

    fn adjustment_inputs() -> FormInputs {
        [
            ("account_number", "0101234567"),
            ("amount", "1500.50"),
            ("adjustment_type", "Credit"),
            ("reason", "Estimated reading reversed"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn blank_form_cannot_submit() {
        let state = FormState::<AdjustmentForm>::default();
        assert!(!state.can_submit());
        assert_eq!(state.issues().for_field("reason"), ["is required"]);
        // Untouched fields stay quiet.
        assert!(state.field_issues("reason").is_empty());
    }

    #[test]
    fn editing_a_field_surfaces_its_issues() {
        let mut state = FormState::<AdjustmentForm>::new(adjustment_inputs());
        assert!(state.can_submit());

        state.set("amount", "0");
        assert!(!state.can_submit());
        assert_eq!(state.field_issues("amount"), ["must be greater than zero"]);

        state.set("amount", "abc");
        assert_eq!(state.field_issues("amount"), ["must be a number"]);
    }

    #[test]
    fn unknown_choice_is_reported() {
        let mut inputs = adjustment_inputs();
        inputs.set("adjustment_type", "refund");
        let issues = FormState::<AdjustmentForm>::new(inputs).validate().unwrap_err();
        assert_eq!(
            issues.for_field("adjustment_type"),
            ["\"refund\" is not a valid option"]
        );
    }

    #[test]
    fn station_coordinates_are_range_checked() {
        let inputs: FormInputs = [
            ("name", "Ikeja West"),
            ("code", "IKW"),
            ("area_office_id", "3"),
            ("latitude", "91"),
            ("longitude", "3.35"),
        ]
        .into_iter()
        .collect();
        let issues = FormState::<ServiceStationForm>::new(inputs)
            .validate()
            .unwrap_err();
        assert_eq!(issues.for_field("latitude"), ["must be between -90 and 90"]);
        assert!(issues.for_field("longitude").is_empty());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let inputs: FormInputs = [
            ("name", "Ikeja West"),
            ("code", "IKW"),
            ("area_office_id", "3"),
            ("latitude", "NaN"),
            ("longitude", "inf"),
        ]
        .into_iter()
        .collect();
        let state = FormState::<ServiceStationForm>::new(inputs);
        assert!(!state.can_submit());
        let issues = state.validate().unwrap_err();
        assert_eq!(issues.for_field("latitude"), ["must be a number"]);
        assert_eq!(issues.for_field("longitude"), ["must be a number"]);

        let fee: FormInputs = [("currency", "usdt"), ("fee_percentage", "-infinity")]
            .into_iter()
            .collect();
        let issues = FormState::<CryptoFeeForm>::new(fee).validate().unwrap_err();
        assert_eq!(issues.for_field("fee_percentage"), ["must be a number"]);

        let mut adjustment = adjustment_inputs();
        adjustment.set("amount", "nan");
        let issues = FormState::<AdjustmentForm>::new(adjustment)
            .validate()
            .unwrap_err();
        assert_eq!(issues.for_field("amount"), ["must be a number"]);
    }

    #[test]
    fn outage_cannot_end_before_it_starts() {
        let inputs: FormInputs = [
            ("feeder_id", "12"),
            ("reason", "Transformer upgrade"),
            ("starts_on", "2025-03-10"),
            ("ends_on", "2025-03-09"),
        ]
        .into_iter()
        .collect();
        let issues = FormState::<OutageForm>::new(inputs).validate().unwrap_err();
        assert_eq!(issues.form_level(), ["the outage cannot end before it starts"]);

        let summary = issues.summary(OutageForm::fields());
        assert_eq!(summary, vec!["the outage cannot end before it starts"]);
    }

    #[test]
    fn role_needs_a_permission() {
        let inputs: FormInputs = [("name", "Auditor"), ("permissions", " , ")]
            .into_iter()
            .collect();
        let issues = FormState::<RoleForm>::new(inputs).validate().unwrap_err();
        assert_eq!(issues.for_field("permissions"), ["grant at least one permission"]);
    }

    #[test]
    fn customer_email_is_optional_but_checked() {
        let mut inputs: FormInputs = [
            ("account_number", "0101234567"),
            ("name", "Ada Obi"),
            ("service_station_id", "4"),
        ]
        .into_iter()
        .collect();
        assert!(FormState::<CustomerForm>::new(inputs.clone()).can_submit());

        inputs.set("email", "not-an-email");
        let issues = FormState::<CustomerForm>::new(inputs).validate().unwrap_err();
        assert_eq!(issues.for_field("email"), ["must be a valid email address"]);
    }

    #[test]
    fn crypto_fee_currency_is_uppercased() {
        let inputs: FormInputs = [("currency", "usdt"), ("fee_percentage", "1.5")]
            .into_iter()
            .collect();
        let form = FormState::<CryptoFeeForm>::new(inputs).validate().unwrap();
        assert_eq!(form.currency, "USDT");
        assert_eq!(form.flat_fee, 0.0);
    }

    #[tokio::test]
    async fn valid_submit_sends_one_camel_case_mutation() {
        let sink = RecordingSink::accepting();
        let mut state = FormState::<AdjustmentForm>::new(adjustment_inputs());

        let submitted = state.submit(&sink).await.unwrap();
        assert_eq!(submitted.message, "Adjustment created");
        assert_eq!(submitted.data, Some(json!({ "id": 7 })));
        assert!(!state.is_submitting());

        let calls = sink.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "POST");
        assert_eq!(calls[0].1, "billing/adjustments");
        assert_eq!(
            calls[0].2,
            json!({
                "accountNumber": "0101234567",
                "amount": 1500.5,
                "adjustmentType": "credit",
                "reason": "Estimated reading reversed",
            })
        );
    }

    #[tokio::test]
    async fn invalid_submit_sends_nothing() {
        let sink = RecordingSink::accepting();
        let mut state = FormState::<AdjustmentForm>::default();

        let err = state.submit(&sink).await.unwrap_err();
        assert!(matches!(err, FormError::Validation(_)));
        assert!(sink.calls.lock().is_empty());
        // Every field is now flagged inline.
        assert_eq!(state.field_issues("account_number"), ["is required"]);
    }

    #[tokio::test]
    async fn rejection_message_is_verbatim() {
        let sink = RecordingSink::replying(Ok(MutationResponse {
            is_success: false,
            message: Some("Account 0101234567 is closed".to_string()),
            data: None,
        }));
        let mut state = FormState::<AdjustmentForm>::new(adjustment_inputs());

        let err = state.submit(&sink).await.unwrap_err();
        assert_eq!(err, FormError::Rejected("Account 0101234567 is closed".to_string()));
        assert_eq!(err.user_message(), "Account 0101234567 is closed");
    }

    #[tokio::test]
    async fn remote_failure_is_not_retried() {
        let sink = RecordingSink::replying(Err(RemoteError::Conflict(
            "Email already in use".to_string(),
        )));
        let inputs: FormInputs = [
            ("full_name", "Bola Ade"),
            ("email", "bola@example.com"),
            ("role_id", "2"),
        ]
        .into_iter()
        .collect();
        let mut state = FormState::<AdminForm>::new(inputs);

        let err = state.submit(&sink).await.unwrap_err();
        assert_eq!(err.user_message(), "Email already in use");
        assert_eq!(sink.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn edit_form_updates_the_seeded_record() {
        let station = ServiceStation {
            id: 42,
            name: "Ikeja West".to_string(),
            code: "IKW".to_string(),
            area_office: Some("Ikeja".to_string()),
            latitude: Some(6.6018),
            longitude: Some(3.3515),
        };
        let mut state = FormState::edit_from(&station);
        assert_eq!(state.mode(), FormMode::Edit(42));
        assert_eq!(state.inputs().get("code"), "IKW");
        assert_eq!(state.inputs().get("latitude"), "6.6018");
        // The area office is a display name on the row; it has to be picked again.
        assert!(!state.can_submit());
        assert_eq!(state.issues().for_field("area_office_id"), ["is required"]);

        state.set("area_office_id", "3");
        state.set("name", "Ikeja West II");
        let sink = RecordingSink::accepting();
        state.submit(&sink).await.unwrap();

        let calls = sink.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "PUT");
        assert_eq!(calls[0].1, "service-stations/42");
        assert_eq!(calls[0].2["name"], json!("Ikeja West II"));
        assert_eq!(calls[0].2["areaOfficeId"], json!(3));
    }

    #[test]
    fn outage_row_seeds_iso_dates() {
        let outage = Outage {
            id: 9,
            feeder: Some("Feeder 11kV Ikeja".to_string()),
            area_office: None,
            reason: "Transformer upgrade".to_string(),
            starts_on: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            ends_on: None,
            status: "planned".to_string(),
        };
        let inputs = outage.form_inputs();
        assert_eq!(inputs.get("starts_on"), "2025-03-10");
        assert_eq!(inputs.get("ends_on"), "");
        assert_eq!(inputs.get("feeder_id"), "");
    }

    #[tokio::test]
    async fn begin_submit_locks_until_finished() {
        let mut state = FormState::<AdjustmentForm>::new(adjustment_inputs());
        let submission = state.begin_submit().unwrap();
        assert_eq!(submission.mode, FormMode::Create);
        assert!(state.is_submitting());
        assert!(!state.can_submit());
        assert_eq!(state.begin_submit().unwrap_err(), FormError::Busy);

        let err = state
            .finish_submit(Err(RemoteError::Transport("connection reset".to_string())))
            .unwrap_err();
        assert!(matches!(err, FormError::Remote(_)));
        assert!(!state.is_submitting());
        assert!(state.can_submit());
    }

    #[tokio::test]
    async fn delete_reads_the_envelope() {
        let sink = RecordingSink::replying(Ok(MutationResponse {
            is_success: false,
            message: Some("Agent has open collections".to_string()),
            data: None,
        }));
        let err = delete_record(&sink, "agents", 5).await.unwrap_err();
        assert_eq!(err, FormError::Rejected("Agent has open collections".to_string()));
        assert_eq!(sink.calls.lock()[0].1, "agents/5");

        let sink = RecordingSink::replying(Ok(MutationResponse {
            is_success: true,
            message: Some("Agent removed".to_string()),
            data: None,
        }));
        let deleted = delete_record(&sink, "agents", 5).await.unwrap();
        assert_eq!(deleted.message, "Agent removed");
        assert_eq!(sink.calls.lock()[0].0, "DELETE");
    }
}
