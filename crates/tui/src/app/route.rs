use engine::{ListResource, resources};

/// Top-level screens of the console, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Adjustments,
    Agents,
    Vendors,
    PaymentTypes,
    CsvJobs,
    CryptoFees,
    CryptoTransactions,
    Customers,
    ServiceStations,
    Outages,
    Roles,
    Files,
}

impl Section {
    pub const ALL: [Section; 12] = [
        Self::Adjustments,
        Self::Agents,
        Self::Vendors,
        Self::PaymentTypes,
        Self::CsvJobs,
        Self::CryptoFees,
        Self::CryptoTransactions,
        Self::Customers,
        Self::ServiceStations,
        Self::Outages,
        Self::Roles,
        Self::Files,
    ];

    pub fn route(self) -> &'static str {
        match self {
            Self::Adjustments => "/billing/adjustments",
            Self::Agents => "/agents",
            Self::Vendors => "/vendors",
            Self::PaymentTypes => "/payment-types",
            Self::CsvJobs => "/csv-jobs",
            Self::CryptoFees => "/crypto/fees",
            Self::CryptoTransactions => "/crypto/transactions",
            Self::Customers => "/customers",
            Self::ServiceStations => "/service-stations",
            Self::Outages => "/outages",
            Self::Roles => "/role-management",
            Self::Files => "/file-management",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Adjustments => "Adjustments",
            Self::Agents => "Agents",
            Self::Vendors => "Vendors",
            Self::PaymentTypes => "Payment types",
            Self::CsvJobs => "CSV jobs",
            Self::CryptoFees => "Crypto fees",
            Self::CryptoTransactions => "Crypto txns",
            Self::Customers => "Customers",
            Self::ServiceStations => "Stations",
            Self::Outages => "Outages",
            Self::Roles => "Roles",
            Self::Files => "Files",
        }
    }

    /// List endpoint behind the section; `None` for the file screen.
    pub fn resource(self) -> Option<ListResource> {
        Some(match self {
            Self::Adjustments => resources::ADJUSTMENTS,
            Self::Agents => resources::AGENTS,
            Self::Vendors => resources::VENDORS,
            Self::PaymentTypes => resources::PAYMENT_TYPES,
            Self::CsvJobs => resources::CSV_JOBS,
            Self::CryptoFees => resources::CRYPTO_FEES,
            Self::CryptoTransactions => resources::CRYPTO_TRANSACTIONS,
            Self::Customers => resources::CUSTOMERS,
            Self::ServiceStations => resources::SERVICE_STATIONS,
            Self::Outages => resources::OUTAGES,
            Self::Roles => resources::ADMINS,
            Self::Files => return None,
        })
    }

    /// Create forms reachable from the section; `a` opens the first, `A` the second.
    pub fn forms(self) -> &'static [FormKind] {
        match self {
            Self::Adjustments => &[FormKind::Adjustment],
            Self::Agents => &[FormKind::Agent],
            Self::Vendors => &[FormKind::Vendor],
            Self::PaymentTypes => &[FormKind::PaymentType],
            Self::CryptoFees => &[FormKind::CryptoFee],
            Self::Customers => &[FormKind::Customer],
            Self::ServiceStations => &[FormKind::ServiceStation],
            Self::Outages => &[FormKind::Outage],
            Self::Roles => &[FormKind::Role, FormKind::Admin],
            Self::CsvJobs | Self::CryptoTransactions | Self::Files => &[],
        }
    }

    /// Form that edits a selected row; sections without one are read-only
    /// and offer no delete either.
    pub fn edit_form(self) -> Option<FormKind> {
        Some(match self {
            Self::Agents => FormKind::Agent,
            Self::Vendors => FormKind::Vendor,
            Self::PaymentTypes => FormKind::PaymentType,
            Self::CryptoFees => FormKind::CryptoFee,
            Self::Customers => FormKind::Customer,
            Self::ServiceStations => FormKind::ServiceStation,
            Self::Outages => FormKind::Outage,
            Self::Roles => FormKind::Admin,
            Self::Adjustments | Self::CsvJobs | Self::CryptoTransactions | Self::Files => {
                return None;
            }
        })
    }

    /// Whether the list keeps refreshing while it is on screen.
    pub fn polls(self) -> bool {
        matches!(self, Self::CsvJobs)
    }

    pub fn next(self) -> Self {
        let index = self.index();
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let index = self.index();
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|section| *section == self)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Adjustment,
    Agent,
    Vendor,
    PaymentType,
    CryptoFee,
    Customer,
    ServiceStation,
    Outage,
    Role,
    Admin,
}

impl FormKind {
    pub const ALL: [FormKind; 10] = [
        Self::Adjustment,
        Self::Agent,
        Self::Vendor,
        Self::PaymentType,
        Self::CryptoFee,
        Self::Customer,
        Self::ServiceStation,
        Self::Outage,
        Self::Role,
        Self::Admin,
    ];

    /// Section the form returns to once it is saved or cancelled.
    pub fn section(self) -> Section {
        match self {
            Self::Adjustment => Section::Adjustments,
            Self::Agent => Section::Agents,
            Self::Vendor => Section::Vendors,
            Self::PaymentType => Section::PaymentTypes,
            Self::CryptoFee => Section::CryptoFees,
            Self::Customer => Section::Customers,
            Self::ServiceStation => Section::ServiceStations,
            Self::Outage => Section::Outages,
            Self::Role | Self::Admin => Section::Roles,
        }
    }

    pub fn route(self) -> String {
        format!("{}/add", self.base())
    }

    /// Location shown while record `id` is edited.
    pub fn edit_route(self, id: i64) -> String {
        format!("{}/{id}/edit", self.base())
    }

    fn base(self) -> String {
        match self {
            Self::Admin => "/role-management/admins".to_string(),
            other => other.section().route().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Section(Section),
    Form(FormKind),
}

impl Route {
    /// Accepts paths with or without leading, trailing or doubled slashes.
    pub fn parse(path: &str) -> Option<Route> {
        let normalized = normalize(path);
        if let Some(section) = Section::ALL
            .into_iter()
            .find(|section| section.route() == normalized)
        {
            return Some(Route::Section(section));
        }
        FormKind::ALL
            .into_iter()
            .find(|form| form.route() == normalized)
            .map(Route::Form)
    }

    pub fn path(self) -> String {
        match self {
            Route::Section(section) => section.route().to_string(),
            Route::Form(form) => form.route(),
        }
    }

    pub fn section(self) -> Section {
        match self {
            Route::Section(section) => section,
            Route::Form(form) => form.section(),
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Route::Section(Section::Adjustments)
    }
}

fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/")).to_lowercase()
}
