pub mod disclosure;
pub mod files;
pub mod filters;
pub mod forms;
pub mod list;
pub mod route;
pub mod rows;

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use api_types::reference::{ReferenceKind, ReferenceOption};
use chrono_tz::Tz;
use client::ApiClient;
use crossterm::event::{self, Event, KeyEvent};
use engine::{
    FormError, MutationSink, ReferenceCache, RemoteError,
    forms::{Submitted, delete_record},
};
use tokio::task::JoinHandle;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

pub use files::{FileFocus, FileOutcome, FileScreen};
pub use filters::FilterEvent;
pub use forms::{FormEvent, FormScreen};
pub use list::{ListIntent, ListScreen};
pub use route::{FormKind, Route, Section};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

pub struct AppState {
    pub route: Route,
    pub lists: HashMap<Section, ListScreen>,
    pub files: FileScreen,
    pub form: Option<FormScreen>,
    pub toast: Option<ToastState>,
    pub timezone: Tz,
    pub base_url: String,
    /// Last fetch error already announced, so a failing screen toasts once.
    last_error: Option<String>,
}

impl AppState {
    pub fn section(&self) -> Section {
        self.route.section()
    }

    /// List screen on display, if the route shows one.
    pub fn active_list(&self) -> Option<&ListScreen> {
        match self.route {
            Route::Section(section) => self.lists.get(&section),
            Route::Form(_) => None,
        }
    }

    fn active_list_mut(&mut self) -> Option<&mut ListScreen> {
        match self.route {
            Route::Section(section) => self.lists.get_mut(&section),
            Route::Form(_) => None,
        }
    }

    /// Whether letters are text for the focused input.
    pub fn typing(&self) -> bool {
        match self.route {
            Route::Form(_) => true,
            Route::Section(Section::Files) => self.files.focus == FileFocus::Path,
            Route::Section(_) => self
                .active_list()
                .is_some_and(|screen| screen.filters.is_active()),
        }
    }

    /// Location for the info bar; an edit form names its record.
    pub fn location(&self) -> String {
        match (&self.route, &self.form) {
            (Route::Form(_), Some(form)) => form.path(),
            (route, _) => route.path(),
        }
    }

    pub fn notify(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(ToastState {
            message: message.into(),
            level,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// Reloads `section` after a save, toasting an intent the list refuses.
    fn refresh_list(&mut self, section: Section) {
        let Some(screen) = self.lists.get_mut(&section) else {
            return;
        };
        if let Err(err) = screen.apply(ListIntent::Refresh) {
            tracing::warn!(section = section.route(), "refresh after save refused: {err}");
            self.notify(ToastLevel::Error, format!("Could not refresh the list: {err}"));
        }
    }
}

/// Where loaded reference options go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionTarget {
    Filter(Section),
    Form,
}

struct OptionLoad {
    target: OptionTarget,
    kind: ReferenceKind,
    task: JoinHandle<std::result::Result<Arc<Vec<ReferenceOption>>, RemoteError>>,
}

struct PendingDelete {
    section: Section,
    task: JoinHandle<std::result::Result<Submitted, FormError>>,
}

pub struct App {
    client: ApiClient,
    cache: ReferenceCache,
    poll_every: Duration,
    initial: Route,
    pub state: AppState,
    option_loads: Vec<OptionLoad>,
    /// Row a first `d` press marked for deletion.
    delete_armed: Option<(Section, i64)>,
    deleting: Option<PendingDelete>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = ApiClient::new(&config.base_url, config.token.clone())?;
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| AppError::Timezone(config.timezone.clone()))?;
        let initial = match config.route.as_deref() {
            Some(path) => Route::parse(path).ok_or_else(|| AppError::Route(path.to_string()))?,
            None => Route::default(),
        };

        let lists = Section::ALL
            .into_iter()
            .filter_map(|section| {
                let resource = section.resource()?;
                let list = list::controller_for(section, &client, config.page_size)?;
                Some((section, ListScreen::new(section, resource, list)))
            })
            .collect();

        let state = AppState {
            route: initial,
            lists,
            files: FileScreen::new(Arc::new(client.clone())),
            form: None,
            toast: None,
            timezone,
            base_url: client.base_url().to_string(),
            last_error: None,
        };

        Ok(Self {
            client,
            cache: ReferenceCache::new(),
            poll_every: Duration::from_secs(config.poll_interval_secs),
            initial,
            state,
            option_loads: Vec::new(),
            delete_armed: None,
            deleting: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        self.navigate(self.initial);
        let result = self.event_loop(&mut terminal).await;
        for screen in self.state.lists.values_mut() {
            screen.close();
        }
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            self.tick().await;
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Housekeeping between frames: toast expiry, finished background work,
    /// and fetch errors of the visible list. Only finished tasks are awaited.
    async fn tick(&mut self) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= Instant::now())
        {
            self.state.toast = None;
        }

        self.collect_options().await;

        if let Some(form) = self.state.form.as_mut() {
            let kind = form.kind;
            if let Some(result) = form.poll().await {
                self.after_submit(kind, result);
            }
        }

        self.collect_delete().await;

        if let Some(outcome) = self.state.files.poll().await {
            match outcome {
                FileOutcome::Queued => self
                    .state
                    .notify(ToastLevel::Success, "File queued for processing"),
                FileOutcome::Previewed => self
                    .state
                    .notify(ToastLevel::Info, "Preview ready; nothing was queued"),
                FileOutcome::Failed(message) => self.state.notify(ToastLevel::Error, message),
            }
        }

        let error = self.state.active_list().and_then(ListScreen::error);
        if error != self.state.last_error {
            if let Some(message) = &error {
                self.state.notify(ToastLevel::Error, message.clone());
            }
            self.state.last_error = error;
        }
    }

    fn navigate(&mut self, route: Route) {
        if let Some(screen) = self.state.active_list_mut() {
            screen.deactivate();
        }
        tracing::debug!(route = %route.path(), "navigate");
        self.state.route = route;
        self.state.last_error = None;
        self.delete_armed = None;

        match route {
            Route::Form(kind) => self.state.form = Some(FormScreen::new(kind)),
            Route::Section(_) => {
                self.state.form = None;
                let poll_every = self.poll_every;
                let activated = self
                    .state
                    .active_list_mut()
                    .map(|screen| screen.activate(poll_every));
                if let Some(Err(err)) = activated {
                    self.state.notify(ToastLevel::Error, err.to_string());
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key, self.state.typing());
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        match self.state.route {
            Route::Form(_) => self.handle_form_key(action),
            Route::Section(Section::Files) => self.handle_files_key(action),
            Route::Section(section) => self.handle_list_key(section, action),
        }
    }

    fn handle_list_key(&mut self, section: Section, action: AppAction) {
        let armed = self.delete_armed.take();
        let Some(screen) = self.state.lists.get_mut(&section) else {
            return;
        };

        if screen.filters.is_active() {
            let query = screen.query();
            let event = match action {
                AppAction::Cancel => {
                    screen.filters.cancel();
                    FilterEvent::None
                }
                AppAction::NextField => {
                    screen.filters.focus_next(&query);
                    FilterEvent::None
                }
                AppAction::PreviousField => {
                    screen.filters.focus_previous(&query);
                    FilterEvent::None
                }
                AppAction::Up => {
                    screen.filters.up(&query);
                    FilterEvent::None
                }
                AppAction::Down => {
                    screen.filters.down(&query);
                    FilterEvent::None
                }
                AppAction::Input(ch) => {
                    screen.filters.type_char(ch);
                    FilterEvent::None
                }
                AppAction::Backspace => {
                    screen.filters.backspace();
                    FilterEvent::None
                }
                AppAction::Submit => screen.filters.submit(),
                _ => FilterEvent::None,
            };
            self.handle_filter_event(section, event);
            return;
        }

        let intent = match action {
            AppAction::Left => return self.navigate(Route::Section(section.previous())),
            AppAction::Right => return self.navigate(Route::Section(section.next())),
            AppAction::Up | AppAction::Input('k') => return screen.select_previous(),
            AppAction::Down | AppAction::Input('j') => return screen.select_next(),
            AppAction::Input('/') => {
                let query = screen.query();
                if !screen.filters.open(&query) {
                    self.state
                        .notify(ToastLevel::Info, "This list has no filters");
                }
                return;
            }
            AppAction::Input('a') => return self.open_form(section, 0),
            AppAction::Input('A') => return self.open_form(section, 1),
            AppAction::Input('e') => return self.open_editor(section),
            AppAction::Input('d') => return self.delete_selected(section, armed),
            AppAction::Input('[') | AppAction::Input(']') => {
                let forward = action == AppAction::Input(']');
                if let Err(err) = screen.cycle_page_size(forward) {
                    self.state.notify(ToastLevel::Error, err.to_string());
                }
                return;
            }
            AppAction::Input('n') => ListIntent::Next,
            AppAction::Input('p') => ListIntent::Previous,
            AppAction::Input('r') => ListIntent::Refresh,
            AppAction::Input('x') => ListIntent::Reset,
            _ => return,
        };
        if let Err(err) = screen.apply(intent) {
            self.state.notify(ToastLevel::Error, err.to_string());
        }
    }

    fn handle_filter_event(&mut self, section: Section, event: FilterEvent) {
        match event {
            FilterEvent::None => {}
            FilterEvent::Apply { key, value } => {
                let Some(screen) = self.state.lists.get_mut(&section) else {
                    return;
                };
                if let Err(err) = screen.apply(ListIntent::Filter(key, value)) {
                    self.state.notify(ToastLevel::Error, err.to_string());
                }
            }
            FilterEvent::LoadOptions(kind) => {
                self.load_options(OptionTarget::Filter(section), kind);
            }
        }
    }

    /// Shows cached options at once; otherwise fetches them in the
    /// background for [`collect_options`](Self::collect_options).
    fn load_options(&mut self, target: OptionTarget, kind: ReferenceKind) {
        if let Some(options) = self.cache.get(kind) {
            self.show_options(target, kind, Ok(options));
            return;
        }
        if self
            .option_loads
            .iter()
            .any(|load| load.target == target && load.kind == kind)
        {
            return;
        }
        let cache = self.cache.clone();
        let client = self.client.clone();
        let task = tokio::spawn(async move { cache.get_or_fetch(kind, &client).await });
        self.option_loads.push(OptionLoad { target, kind, task });
    }

    async fn collect_options(&mut self) {
        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.option_loads)
            .into_iter()
            .partition(|load| load.task.is_finished());
        self.option_loads = pending;

        for load in done {
            let loaded = load.task.await.unwrap_or_else(|err| {
                tracing::error!(kind = ?load.kind, "option load ended abnormally: {err}");
                Err(RemoteError::Transport("loading options stopped unexpectedly".to_string()))
            });
            self.show_options(load.target, load.kind, loaded);
        }
    }

    fn show_options(
        &mut self,
        target: OptionTarget,
        kind: ReferenceKind,
        loaded: std::result::Result<Arc<Vec<ReferenceOption>>, RemoteError>,
    ) {
        match target {
            OptionTarget::Filter(section) => {
                let Some(screen) = self.state.lists.get_mut(&section) else {
                    return;
                };
                match loaded {
                    Ok(options) => screen.filters.show_options(kind, &options),
                    Err(err) => screen.filters.show_error(err.user_message()),
                }
            }
            OptionTarget::Form => match loaded {
                Ok(options) => {
                    if let Some(form) = self.state.form.as_mut() {
                        form.show_options(kind, &options);
                    }
                }
                Err(err) => self.state.notify(ToastLevel::Error, err.user_message()),
            },
        }
    }

    fn handle_files_key(&mut self, action: AppAction) {
        let files = &mut self.state.files;
        match action {
            AppAction::NextField | AppAction::Down => files.focus_next(),
            AppAction::PreviousField | AppAction::Up => files.focus_previous(),
            AppAction::Cancel => files.focus = FileFocus::Purpose,
            AppAction::Left | AppAction::Right if files.focus == FileFocus::Path => {
                let section = Section::Files;
                let next = if action == AppAction::Left {
                    section.previous()
                } else {
                    section.next()
                };
                self.navigate(Route::Section(next));
            }
            AppAction::Left => files.cycle(false),
            AppAction::Right | AppAction::Input(' ') if files.focus != FileFocus::Path => {
                files.cycle(true)
            }
            AppAction::Input('x') if files.focus != FileFocus::Path => {
                if files.reset() {
                    self.state.notify(ToastLevel::Info, "Upload reset");
                }
            }
            AppAction::Input(ch) => files.type_char(ch),
            AppAction::Backspace => files.backspace(),
            AppAction::Submit => match files.start() {
                Ok(()) => self.state.notify(ToastLevel::Info, "Upload started"),
                Err(err) => self.state.notify(ToastLevel::Error, err.to_string()),
            },
            _ => {}
        }
    }

    fn open_form(&mut self, section: Section, index: usize) {
        match section.forms().get(index) {
            Some(kind) => self.navigate(Route::Form(*kind)),
            None => self
                .state
                .notify(ToastLevel::Info, "Nothing to create on this screen"),
        }
    }

    /// Opens the highlighted row in its edit form.
    fn open_editor(&mut self, section: Section) {
        let Some(kind) = section.edit_form() else {
            self.state
                .notify(ToastLevel::Info, "Rows on this screen cannot be edited");
            return;
        };
        let Some(record) = self
            .state
            .lists
            .get(&section)
            .and_then(ListScreen::selected_record)
        else {
            self.state.notify(ToastLevel::Info, "No row selected");
            return;
        };
        tracing::debug!(id = record.id, ?kind, "editing record");
        self.navigate(Route::Form(kind));
        self.state.form = Some(FormScreen::edit(kind, record));
    }

    /// First press marks the highlighted row; a second press on the same
    /// row deletes it in the background.
    fn delete_selected(&mut self, section: Section, armed: Option<(Section, i64)>) {
        let Some(screen) = self.state.lists.get(&section) else {
            return;
        };
        let Some(record) = screen.selected_record() else {
            self.state
                .notify(ToastLevel::Info, "Nothing to delete on this screen");
            return;
        };
        if self.deleting.is_some() {
            self.state
                .notify(ToastLevel::Info, "A delete is already running");
            return;
        }
        let id = record.id;
        if armed != Some((section, id)) {
            self.delete_armed = Some((section, id));
            self.state.notify(
                ToastLevel::Info,
                format!("Press d again to delete record #{id}"),
            );
            return;
        }

        let endpoint = screen.resource.path;
        let sink: Arc<dyn MutationSink> = Arc::new(self.client.clone());
        tracing::info!(endpoint, id, "deleting record");
        let task = tokio::spawn(async move { delete_record(sink.as_ref(), endpoint, id).await });
        self.deleting = Some(PendingDelete { section, task });
        self.state
            .notify(ToastLevel::Info, format!("Deleting record #{id}"));
    }

    async fn collect_delete(&mut self) {
        if !self
            .deleting
            .as_ref()
            .is_some_and(|pending| pending.task.is_finished())
        {
            return;
        }
        let Some(pending) = self.deleting.take() else {
            return;
        };
        let result = pending.task.await.unwrap_or_else(|err| {
            tracing::error!("delete task ended abnormally: {err}");
            Err(FormError::Remote(RemoteError::Transport(
                "delete stopped unexpectedly".to_string(),
            )))
        });
        match result {
            Ok(deleted) => {
                if let Some(stale) = pending.section.edit_form().and_then(forms::invalidates) {
                    self.cache.clear(stale);
                }
                self.state.notify(ToastLevel::Success, deleted.message);
                self.state.refresh_list(pending.section);
            }
            Err(err) => self.state.notify(ToastLevel::Error, err.user_message()),
        }
    }

    fn handle_form_key(&mut self, action: AppAction) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        let event = match action {
            AppAction::Cancel => {
                if form.cancel() {
                    return;
                }
                if form.is_submitting() {
                    self.state.notify(ToastLevel::Info, "Still saving");
                    return;
                }
                let back = form.kind.section();
                self.navigate(Route::Section(back));
                return;
            }
            AppAction::NextField => {
                form.focus_next();
                return;
            }
            AppAction::PreviousField => {
                form.focus_previous();
                return;
            }
            AppAction::Up => {
                form.up();
                return;
            }
            AppAction::Down => {
                form.down();
                return;
            }
            AppAction::Input(ch) => {
                form.type_char(ch);
                return;
            }
            AppAction::Backspace => {
                form.backspace();
                return;
            }
            AppAction::Submit => form.enter(),
            _ => return,
        };

        match event {
            FormEvent::None => {}
            FormEvent::LoadOptions(kind) => self.load_options(OptionTarget::Form, kind),
            FormEvent::Submit => self.submit_form(),
        }
    }

    fn submit_form(&mut self) {
        let sink: Arc<dyn MutationSink> = Arc::new(self.client.clone());
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        if let Err(err) = form.start_submit(sink) {
            report_form_error(&mut self.state, err);
        }
    }

    fn after_submit(&mut self, kind: FormKind, result: std::result::Result<Submitted, FormError>) {
        match result {
            Ok(submitted) => {
                if let Some(stale) = forms::invalidates(kind) {
                    self.cache.clear(stale);
                }
                self.state.notify(ToastLevel::Success, submitted.message);
                let section = kind.section();
                self.navigate(Route::Section(section));
                self.state.refresh_list(section);
            }
            Err(err) => report_form_error(&mut self.state, err),
        }
    }
}

fn report_form_error(state: &mut AppState, err: FormError) {
    match err {
        FormError::Validation(issues) => {
            state.notify(ToastLevel::Error, format!("Fix {issues} before saving"));
        }
        err => state.notify(ToastLevel::Error, err.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_agents() -> AppState {
        let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        let section = Section::Agents;
        let list = list::controller_for(section, &client, 10).unwrap();
        let screen = ListScreen::new(section, engine::resources::AGENTS, list);
        AppState {
            route: Route::Section(section),
            lists: HashMap::from([(section, screen)]),
            files: FileScreen::new(Arc::new(client.clone())),
            form: None,
            toast: None,
            timezone: chrono_tz::UTC,
            base_url: client.base_url().to_string(),
            last_error: None,
        }
    }

    #[tokio::test]
    async fn refused_refresh_is_toasted() {
        let mut state = state_with_agents();
        if let Some(screen) = state.lists.get_mut(&Section::Agents) {
            screen.close();
        }

        state.refresh_list(Section::Agents);

        let toast = state.toast.unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(
            toast.message,
            "Could not refresh the list: list controller is closed"
        );
    }

    #[tokio::test]
    async fn edit_forms_show_their_record_in_the_info_bar() {
        let mut state = state_with_agents();
        assert_eq!(state.location(), "/agents");

        let record = rows::RowRecord {
            id: 7,
            inputs: engine::FormInputs::default(),
        };
        state.route = Route::Form(FormKind::Agent);
        state.form = Some(FormScreen::edit(FormKind::Agent, record));
        assert_eq!(state.location(), "/agents/7/edit");
    }
}
