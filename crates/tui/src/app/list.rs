//! List screens: one type-erased [`ListController`] per section.
use std::{sync::Arc, time::Duration};

use chrono_tz::Tz;
use client::{ApiClient, RemoteList};
use engine::{
    FilterValue, ListController, ListError, ListResource, LoadStatus, Poller, Query,
};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::app::{
    filters::FilterBar,
    route::Section,
    rows::{RowRecord, TableRow},
};

pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

#[derive(Debug, Clone, PartialEq)]
pub enum ListIntent {
    Next,
    Previous,
    Page(u32),
    PageSize(u32),
    Refresh,
    Reset,
    Filter(&'static str, Option<FilterValue>),
}

/// Everything a frame needs to draw one list.
#[derive(Debug, Clone, Default)]
pub struct TableSnapshot {
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
    pub idle: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub window: Vec<Option<u32>>,
    pub page_size: u32,
    pub filters: Vec<(String, String)>,
}

/// A [`ListController`] with its row type hidden, so screens can be kept in
/// one collection.
pub trait ErasedList: Send + Sync {
    fn snapshot(&self, tz: &Tz) -> TableSnapshot;
    fn query(&self) -> Query;
    fn is_idle(&self) -> bool;
    fn rows(&self) -> usize;
    /// Record of row `index` on the last fetched page.
    fn record(&self, index: usize) -> Option<RowRecord>;
    fn error(&self) -> Option<String>;
    /// Returns `Ok(false)` when the intent had nothing to do.
    fn apply(&self, intent: ListIntent) -> Result<bool, ListError>;
    fn start_poller(&self, every: Duration) -> Poller;
    fn close(&self);
}

impl<T> ErasedList for ListController<T>
where
    T: TableRow + Send + Sync + 'static,
{
    fn snapshot(&self, tz: &Tz) -> TableSnapshot {
        let status = self.status();
        let query = self.query();
        let mut snapshot = TableSnapshot {
            headers: T::HEADERS,
            idle: matches!(status, LoadStatus::Idle),
            loading: status.is_loading(),
            error: status.error().map(str::to_string),
            page_size: query.page_size(),
            filters: query
                .filters()
                .iter()
                .map(|(key, value)| (key.clone(), value.to_param()))
                .collect(),
            current_page: query.page_number(),
            ..TableSnapshot::default()
        };
        if let Some(page) = self.result() {
            snapshot.rows = page.items.iter().map(|row| row.cells(tz)).collect();
            snapshot.current_page = page.current_page;
            snapshot.total_pages = page.total_pages;
            snapshot.total_count = page.total_count;
            snapshot.window = page.window();
        }
        snapshot
    }

    fn query(&self) -> Query {
        ListController::query(self)
    }

    fn is_idle(&self) -> bool {
        matches!(self.status(), LoadStatus::Idle)
    }

    fn rows(&self) -> usize {
        self.result().map_or(0, |page| page.items.len())
    }

    fn record(&self, index: usize) -> Option<RowRecord> {
        self.result()?.items.get(index)?.record()
    }

    fn error(&self) -> Option<String> {
        ListController::error(self)
    }

    fn apply(&self, intent: ListIntent) -> Result<bool, ListError> {
        let issued: Option<Result<JoinHandle<()>, ListError>> = match intent {
            ListIntent::Next => self.next_page(),
            ListIntent::Previous => self.previous_page(),
            ListIntent::Page(page) => Some(self.set_page(page)),
            ListIntent::PageSize(size) => Some(self.set_page_size(size)),
            ListIntent::Refresh => Some(self.refresh()),
            ListIntent::Reset => Some(self.reset()),
            ListIntent::Filter(key, value) => Some(self.set_filter(key, value)),
        };
        // The fetch runs detached; its outcome arrives through the controller.
        issued.transpose().map(|handle| handle.is_some())
    }

    fn start_poller(&self, every: Duration) -> Poller {
        Poller::start(self.clone(), every)
    }

    fn close(&self) {
        ListController::close(self);
    }
}

fn remote<T>(client: &ApiClient, resource: ListResource, page_size: u32) -> Box<dyn ErasedList>
where
    T: TableRow + DeserializeOwned + Send + Sync + 'static,
{
    let source = Arc::new(RemoteList::<T>::new(client.clone(), resource));
    Box::new(ListController::new(source, page_size))
}

/// Controller for the section's endpoint, `None` when it has no list.
pub fn controller_for(
    section: Section,
    client: &ApiClient,
    page_size: u32,
) -> Option<Box<dyn ErasedList>> {
    use api_types::{
        adjustment::Adjustment, agent::Agent, crypto::CryptoFee, crypto::CryptoTransaction,
        csv_job::CsvJob, customer::Customer, outage::Outage, payment_type::PaymentType,
        role::Admin, station::ServiceStation, vendor::Vendor,
    };

    let resource = section.resource()?;
    let list = match section {
        Section::Adjustments => remote::<Adjustment>(client, resource, page_size),
        Section::Agents => remote::<Agent>(client, resource, page_size),
        Section::Vendors => remote::<Vendor>(client, resource, page_size),
        Section::PaymentTypes => remote::<PaymentType>(client, resource, page_size),
        Section::CsvJobs => remote::<CsvJob>(client, resource, page_size),
        Section::CryptoFees => remote::<CryptoFee>(client, resource, page_size),
        Section::CryptoTransactions => remote::<CryptoTransaction>(client, resource, page_size),
        Section::Customers => remote::<Customer>(client, resource, page_size),
        Section::ServiceStations => remote::<ServiceStation>(client, resource, page_size),
        Section::Outages => remote::<Outage>(client, resource, page_size),
        Section::Roles => remote::<Admin>(client, resource, page_size),
        Section::Files => return None,
    };
    Some(list)
}

pub struct ListScreen {
    pub section: Section,
    pub resource: ListResource,
    pub selected: usize,
    pub filters: FilterBar,
    list: Box<dyn ErasedList>,
    poller: Option<Poller>,
}

impl ListScreen {
    pub fn new(section: Section, resource: ListResource, list: Box<dyn ErasedList>) -> Self {
        Self {
            section,
            resource,
            selected: 0,
            filters: FilterBar::new(resource.manifest),
            list,
            poller: None,
        }
    }

    /// Screen came into view: first load, and the timer for polling screens.
    pub fn activate(&mut self, poll_every: Duration) -> Result<(), ListError> {
        if self.list.is_idle() {
            self.list.apply(ListIntent::Refresh)?;
        }
        if self.section.polls() && self.poller.is_none() {
            tracing::debug!(section = self.section.route(), "starting poller");
            self.poller = Some(self.list.start_poller(poll_every));
        }
        Ok(())
    }

    /// Screen left view; a poller stops with it.
    pub fn deactivate(&mut self) {
        self.poller = None;
        self.filters.close();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    pub fn apply(&mut self, intent: ListIntent) -> Result<bool, ListError> {
        let moves_rows = !matches!(intent, ListIntent::Refresh);
        let issued = self.list.apply(intent)?;
        if issued && moves_rows {
            self.selected = 0;
        }
        Ok(issued)
    }

    pub fn query(&self) -> Query {
        self.list.query()
    }

    pub fn snapshot(&self, tz: &Tz) -> TableSnapshot {
        self.list.snapshot(tz)
    }

    /// Next preset after the current page size, wrapping.
    pub fn cycle_page_size(&mut self, forward: bool) -> Result<u32, ListError> {
        let current = self.list.query().page_size();
        let index = PAGE_SIZES.iter().position(|size| *size == current);
        let next = match (index, forward) {
            (Some(i), true) => PAGE_SIZES[(i + 1) % PAGE_SIZES.len()],
            (Some(i), false) => PAGE_SIZES[(i + PAGE_SIZES.len() - 1) % PAGE_SIZES.len()],
            (None, _) => PAGE_SIZES[0],
        };
        self.apply(ListIntent::PageSize(next))?;
        Ok(next)
    }

    pub fn error(&self) -> Option<String> {
        self.list.error()
    }

    /// Record behind the highlighted row, when the section edits rows.
    pub fn selected_record(&self) -> Option<RowRecord> {
        self.section.edit_form()?;
        self.list.record(self.selected)
    }

    pub fn select_next(&mut self) {
        let rows = self.list.rows();
        if rows > 0 {
            self.selected = (self.selected + 1).min(rows - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn close(&mut self) {
        self.poller = None;
        self.list.close();
    }
}
