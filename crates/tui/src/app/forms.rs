//! Create and edit form screens.
use std::{collections::HashMap, sync::Arc};

use api_types::{
    mutation::MutationResponse,
    reference::{ReferenceKind, ReferenceOption},
};
use engine::{
    EntityForm, FormError, FormInputs, FormMode, FormState, MutationSink, RemoteError, Submission,
    forms::{
        AdjustmentForm, AdminForm, AgentForm, CryptoFeeForm, CustomerForm, FieldKind, FormField,
        OutageForm, PaymentTypeForm, RoleForm, ServiceStationForm, Submitted, VendorForm,
    },
};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::app::{
    disclosure::{Disclosure, DropdownOption},
    route::FormKind,
    rows::RowRecord,
};

type Reply = Result<MutationResponse<Value>, RemoteError>;

/// A [`FormState`] seen without its form type.
pub trait FormView: Send + Sync {
    fn title(&self) -> &'static str;
    fn mode(&self) -> FormMode;
    fn fields(&self) -> &'static [FormField];
    fn value(&self, key: &str) -> &str;
    fn set(&mut self, key: &str, value: String);
    fn field_issues(&self, key: &str) -> &[String];
    fn summary(&self) -> Vec<String>;
    fn can_submit(&self) -> bool;
    fn is_submitting(&self) -> bool;
    fn begin_submit(&mut self) -> Result<Submission, FormError>;
    fn finish_submit(&mut self, reply: Reply) -> Result<Submitted, FormError>;
}

impl<F> FormView for FormState<F>
where
    F: EntityForm + Send + Sync + 'static,
{
    fn title(&self) -> &'static str {
        F::TITLE
    }

    fn mode(&self) -> FormMode {
        FormState::mode(self)
    }

    fn fields(&self) -> &'static [FormField] {
        FormState::fields(self)
    }

    fn value(&self, key: &str) -> &str {
        self.inputs().raw(key)
    }

    fn set(&mut self, key: &str, value: String) {
        FormState::set(self, key, value);
    }

    fn field_issues(&self, key: &str) -> &[String] {
        FormState::field_issues(self, key)
    }

    fn summary(&self) -> Vec<String> {
        self.issues().summary(F::fields())
    }

    fn can_submit(&self) -> bool {
        FormState::can_submit(self)
    }

    fn is_submitting(&self) -> bool {
        FormState::is_submitting(self)
    }

    fn begin_submit(&mut self) -> Result<Submission, FormError> {
        FormState::begin_submit(self)
    }

    fn finish_submit(&mut self, reply: Reply) -> Result<Submitted, FormError> {
        FormState::finish_submit(self, reply)
    }
}

fn state<F>(mode: FormMode, inputs: FormInputs) -> Box<dyn FormView>
where
    F: EntityForm + Send + Sync + 'static,
{
    Box::new(match mode {
        FormMode::Create => FormState::<F>::new(inputs),
        FormMode::Edit(id) => FormState::<F>::edit(id, inputs),
    })
}

fn view_for(kind: FormKind, mode: FormMode, inputs: FormInputs) -> Box<dyn FormView> {
    match kind {
        FormKind::Adjustment => state::<AdjustmentForm>(mode, inputs),
        FormKind::Agent => state::<AgentForm>(mode, inputs),
        FormKind::Vendor => state::<VendorForm>(mode, inputs),
        FormKind::PaymentType => state::<PaymentTypeForm>(mode, inputs),
        FormKind::CryptoFee => state::<CryptoFeeForm>(mode, inputs),
        FormKind::Customer => state::<CustomerForm>(mode, inputs),
        FormKind::ServiceStation => state::<ServiceStationForm>(mode, inputs),
        FormKind::Outage => state::<OutageForm>(mode, inputs),
        FormKind::Role => state::<RoleForm>(mode, inputs),
        FormKind::Admin => state::<AdminForm>(mode, inputs),
    }
}

/// Reference data that goes stale once a form of `kind` is saved.
pub fn invalidates(kind: FormKind) -> Option<ReferenceKind> {
    match kind {
        FormKind::ServiceStation => Some(ReferenceKind::ServiceStations),
        FormKind::PaymentType => Some(ReferenceKind::PaymentTypes),
        FormKind::Role => Some(ReferenceKind::Roles),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    None,
    LoadOptions(ReferenceKind),
    Submit,
}

pub struct FormScreen {
    pub kind: FormKind,
    view: Box<dyn FormView>,
    focus: usize,
    dropdown: Disclosure<DropdownOption>,
    /// Names of picked reference options, by field.
    labels: HashMap<&'static str, String>,
    failure: Option<String>,
    sending: Option<JoinHandle<Reply>>,
}

impl FormScreen {
    pub fn new(kind: FormKind) -> Self {
        Self::with_view(kind, view_for(kind, FormMode::Create, FormInputs::default()))
    }

    /// Edit form prefilled from the selected row.
    pub fn edit(kind: FormKind, record: RowRecord) -> Self {
        Self::with_view(kind, view_for(kind, FormMode::Edit(record.id), record.inputs))
    }

    fn with_view(kind: FormKind, view: Box<dyn FormView>) -> Self {
        Self {
            kind,
            view,
            focus: 0,
            dropdown: Disclosure::default(),
            labels: HashMap::new(),
            failure: None,
            sending: None,
        }
    }

    pub fn view(&self) -> &dyn FormView {
        self.view.as_ref()
    }

    /// Location for the info bar.
    pub fn path(&self) -> String {
        match self.view.mode() {
            FormMode::Create => self.kind.route(),
            FormMode::Edit(id) => self.kind.edit_route(id),
        }
    }

    pub fn heading(&self) -> String {
        match self.view.mode() {
            FormMode::Create => format!("New {}", self.view.title()),
            FormMode::Edit(id) => format!("Edit {} #{id}", self.view.title()),
        }
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> Option<&'static FormField> {
        self.view.fields().get(self.focus)
    }

    pub fn dropdown(&self) -> &Disclosure<DropdownOption> {
        &self.dropdown
    }

    /// Display text of a field: option name for references, raw input otherwise.
    pub fn display(&self, field: &FormField) -> String {
        let raw = self.view.value(field.key);
        match field.kind {
            FieldKind::Reference(_) if !raw.is_empty() => self
                .labels
                .get(field.key)
                .cloned()
                .unwrap_or_else(|| format!("#{raw}")),
            _ => raw.to_string(),
        }
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.view.is_submitting()
    }

    pub fn focus_next(&mut self) {
        let len = self.view.fields().len();
        if len > 0 {
            self.dropdown.focus_lost();
            self.focus = (self.focus + 1) % len;
        }
    }

    pub fn focus_previous(&mut self) {
        let len = self.view.fields().len();
        if len > 0 {
            self.dropdown.focus_lost();
            self.focus = (self.focus + len - 1) % len;
        }
    }

    pub fn up(&mut self) {
        if self.dropdown.is_open() {
            self.dropdown.highlight_previous();
        } else {
            self.focus_previous();
        }
    }

    pub fn down(&mut self) {
        if self.dropdown.is_open() {
            self.dropdown.highlight_next();
        } else {
            self.focus_next();
        }
    }

    /// Esc: closes an open popover; returns `false` when there was none.
    pub fn cancel(&mut self) -> bool {
        if self.dropdown.is_open() {
            self.dropdown.close();
            true
        } else {
            false
        }
    }

    pub fn type_char(&mut self, ch: char) {
        let Some(field) = self.typed_field() else {
            return;
        };
        let mut value = self.view.value(field.key).to_string();
        value.push(ch);
        self.view.set(field.key, value);
    }

    pub fn backspace(&mut self) {
        let Some(field) = self.typed_field() else {
            return;
        };
        let mut value = self.view.value(field.key).to_string();
        value.pop();
        self.view.set(field.key, value);
    }

    /// Enter: picks from an open popover, opens one, or asks to submit.
    pub fn enter(&mut self) -> FormEvent {
        let Some(field) = self.focused() else {
            return FormEvent::None;
        };
        if self.is_submitting() {
            return FormEvent::None;
        }

        if self.dropdown.is_open() {
            if let Some(option) = self.dropdown.choose() {
                if matches!(field.kind, FieldKind::Reference(_)) {
                    self.labels.insert(field.key, option.label.clone());
                }
                self.view.set(field.key, option.value);
            }
            return FormEvent::None;
        }

        match field.kind {
            FieldKind::Choice(values) => {
                self.dropdown.open(
                    values
                        .iter()
                        .map(|value| DropdownOption::new(*value, *value))
                        .collect(),
                );
                FormEvent::None
            }
            FieldKind::Reference(kind) => FormEvent::LoadOptions(kind),
            _ => FormEvent::Submit,
        }
    }

    pub fn show_options(&mut self, kind: ReferenceKind, options: &[ReferenceOption]) {
        if !matches!(self.focused().map(|f| f.kind), Some(FieldKind::Reference(k)) if k == kind) {
            return;
        }
        self.dropdown.open(
            options
                .iter()
                .map(|option| DropdownOption::new(option.id.to_string(), option.name.clone()))
                .collect(),
        );
    }

    /// Validates and sends the form from a background task; the outcome is
    /// collected by [`poll`](Self::poll). Inputs stay locked meanwhile.
    pub fn start_submit(&mut self, sink: Arc<dyn MutationSink>) -> Result<(), FormError> {
        self.dropdown.close();
        let submission = match self.view.begin_submit() {
            Ok(submission) => submission,
            Err(err) => {
                self.failure = None;
                return Err(err);
            }
        };
        tracing::debug!(endpoint = submission.endpoint, mode = ?submission.mode, "sending form");
        self.sending = Some(tokio::spawn(async move {
            submission.send(sink.as_ref()).await
        }));
        Ok(())
    }

    /// Outcome of a finished submission; `None` while it is in flight or
    /// when nothing was sent. A rejection stays on screen.
    pub async fn poll(&mut self) -> Option<Result<Submitted, FormError>> {
        if !self.sending.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        let reply = match self.sending.take()?.await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!("form submission task ended abnormally: {err}");
                Err(RemoteError::Transport("submission stopped unexpectedly".to_string()))
            }
        };
        let result = self.view.finish_submit(reply);
        self.failure = result.as_ref().err().map(FormError::user_message);
        Some(result)
    }

    fn typed_field(&self) -> Option<&'static FormField> {
        if self.dropdown.is_open() || self.view.is_submitting() {
            return None;
        }
        self.focused()
            .filter(|field| !matches!(field.kind, FieldKind::Choice(_) | FieldKind::Reference(_)))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use super::*;

    /// Records mutations; holds every reply until `release` is notified
    /// when `gated` is set.
    #[derive(Default)]
    struct Recorder {
        bodies: Mutex<Vec<(String, Value)>>,
        reject: Option<String>,
        gated: bool,
        release: Notify,
    }

    impl Recorder {
        async fn reply(&self, path: String, body: Value) -> Reply {
            self.bodies.lock().push((path, body));
            if self.gated {
                self.release.notified().await;
            }
            Ok(MutationResponse {
                is_success: self.reject.is_none(),
                message: self.reject.clone(),
                data: None,
            })
        }
    }

    #[async_trait]
    impl MutationSink for Recorder {
        async fn create(&self, endpoint: &str, body: Value) -> Reply {
            self.reply(endpoint.to_string(), body).await
        }

        async fn update(&self, endpoint: &str, id: i64, body: Value) -> Reply {
            self.reply(format!("{endpoint}/{id}"), body).await
        }

        async fn delete(&self, endpoint: &str, id: i64) -> Reply {
            self.reply(format!("{endpoint}/{id}"), Value::Null).await
        }
    }

    fn type_text(screen: &mut FormScreen, text: &str) {
        for ch in text.chars() {
            screen.type_char(ch);
        }
    }

    async fn outcome(screen: &mut FormScreen) -> Result<Submitted, FormError> {
        loop {
            if let Some(result) = screen.poll().await {
                return result;
            }
            tokio::task::yield_now().await;
        }
    }

    fn role_screen() -> FormScreen {
        let mut screen = FormScreen::new(FormKind::Role);
        type_text(&mut screen, "Auditor");
        screen.focus_next();
        type_text(&mut screen, "billing.read, billing.export");
        screen
    }

    #[test]
    fn reference_fields_take_options_not_text() {
        let mut screen = FormScreen::new(FormKind::Admin);
        screen.focus_next();
        screen.focus_next();
        assert_eq!(screen.focused().map(|f| f.key), Some("role_id"));

        screen.type_char('9');
        assert_eq!(screen.view().value("role_id"), "");

        assert_eq!(screen.enter(), FormEvent::LoadOptions(ReferenceKind::Roles));
        screen.show_options(
            ReferenceKind::Roles,
            &[
                ReferenceOption {
                    id: 1,
                    name: "Super admin".to_string(),
                },
                ReferenceOption {
                    id: 3,
                    name: "Auditor".to_string(),
                },
            ],
        );
        screen.down();
        assert_eq!(screen.enter(), FormEvent::None);
        assert_eq!(screen.view().value("role_id"), "3");
        let role = screen.focused().copied().unwrap();
        assert_eq!(screen.display(&role), "Auditor");
    }

    #[test]
    fn tab_away_closes_the_popover() {
        let mut screen = FormScreen::new(FormKind::Adjustment);
        let choice = screen
            .view()
            .fields()
            .iter()
            .position(|field| matches!(field.kind, FieldKind::Choice(_)))
            .unwrap();
        for _ in 0..choice {
            screen.focus_next();
        }
        screen.enter();
        assert!(screen.dropdown().is_open());
        screen.focus_next();
        assert!(!screen.dropdown().is_open());
    }

    #[tokio::test]
    async fn invalid_form_sends_nothing() {
        let sink = Arc::new(Recorder::default());
        let mut screen = FormScreen::new(FormKind::ServiceStation);
        assert!(!screen.view().can_submit());

        let err = screen.start_submit(sink.clone()).unwrap_err();
        assert!(matches!(err, FormError::Validation(_)));
        assert!(screen.poll().await.is_none());
        assert!(sink.bodies.lock().is_empty());
        assert!(!screen.view().summary().is_empty());
        assert!(screen.failure().is_none());
    }

    #[tokio::test]
    async fn rejection_stays_on_screen() {
        let sink = Arc::new(Recorder {
            reject: Some("Role name already exists".to_string()),
            ..Recorder::default()
        });
        let mut screen = role_screen();
        assert!(screen.view().can_submit());
        assert_eq!(screen.enter(), FormEvent::Submit);

        screen.start_submit(sink.clone()).unwrap();
        let err = outcome(&mut screen).await.unwrap_err();
        assert_eq!(err, FormError::Rejected("Role name already exists".to_string()));
        assert_eq!(screen.failure(), Some("Role name already exists"));
        assert!(!screen.is_submitting());

        let bodies = sink.bodies.lock();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].0, "roles");
        assert_eq!(
            bodies[0].1["permissions"],
            serde_json::json!(["billing.read", "billing.export"])
        );
    }

    #[tokio::test]
    async fn inputs_stay_locked_while_sending() {
        let sink = Arc::new(Recorder {
            gated: true,
            ..Recorder::default()
        });
        let mut screen = role_screen();
        screen.start_submit(sink.clone()).unwrap();

        // The reply is held back: the screen keeps answering without blocking.
        tokio::task::yield_now().await;
        assert!(screen.poll().await.is_none());
        assert!(screen.is_submitting());
        assert!(!screen.view().can_submit());
        assert_eq!(screen.enter(), FormEvent::None);
        screen.type_char('x');
        assert_eq!(screen.view().value("permissions"), "billing.read, billing.export");
        assert!(matches!(
            screen.start_submit(sink.clone()),
            Err(FormError::Busy)
        ));

        sink.release.notify_one();
        let submitted = outcome(&mut screen).await.unwrap();
        assert_eq!(submitted.message, "Role saved");
        assert!(!screen.is_submitting());
        assert_eq!(sink.bodies.lock().len(), 1);
    }

    #[tokio::test]
    async fn edit_screen_updates_the_selected_record() {
        let record = RowRecord {
            id: 12,
            inputs: [("name", "Cash"), ("description", "Counter payments")]
                .into_iter()
                .collect(),
        };
        let mut screen = FormScreen::edit(FormKind::PaymentType, record);
        assert_eq!(screen.heading(), "Edit Payment type #12");
        assert_eq!(screen.path(), "/payment-types/12/edit");
        assert!(screen.view().can_submit());

        let sink = Arc::new(Recorder::default());
        screen.start_submit(sink.clone()).unwrap();
        outcome(&mut screen).await.unwrap();

        let bodies = sink.bodies.lock();
        assert_eq!(bodies[0].0, "payment-types/12");
        assert_eq!(bodies[0].1["description"], "Counter payments");
    }

    #[test]
    fn saved_reference_data_is_invalidated() {
        assert_eq!(
            invalidates(FormKind::ServiceStation),
            Some(ReferenceKind::ServiceStations)
        );
        assert_eq!(invalidates(FormKind::Outage), None);
    }
}
