//! Application state management for the orderdesk terminal client.
//!
//! This module contains the core `App` struct that manages UI state, screen
//! data, the navigation guard and background fetch coordination. Every
//! resource call runs in a spawned task and reports back through an MPSC
//! channel as a `FetchResult`.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use orderdesk_core::api::{ApiClient, ApiError, LoginCredentials};
use orderdesk_core::auth::{NavigationGuard, Route, SessionStore, View};
use orderdesk_core::config::Config;
use orderdesk_core::models::{
    Customer, CustomerCreate, CustomerRevenueReport, DashboardReport, Order, OrderCreate,
    OrderFilter, PaymentCreate, Product, ProductCreate, ProductUpdate, StockMovement,
    StockMovementCreate, StockReport, User, UserCreate, UserUpdate,
};
use orderdesk_core::utils::{cmp_ignore_case, contains_ignore_case};

use crate::forms;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for prompt input
const MAX_PROMPT_LENGTH: usize = 200;

/// Number of items to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    Prompting,
    ConfirmingQuit,
    ConfirmingLogout,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Which mutation an open prompt will submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    CancelOrder(i64),
    AddPayment(i64),
    AddOrderNote(i64),
    CreateOrder,
    CreateCustomer,
    AddCustomerStatus(i64),
    AddCustomerNote(i64),
    CreateProduct,
    RecordMovement,
    CreateUser,
    ChangeFullName(i64),
}

impl PromptKind {
    pub fn title(&self) -> String {
        match self {
            PromptKind::CancelOrder(id) => format!("Cancel order #{}", id),
            PromptKind::AddPayment(id) => format!("Payment for order #{}", id),
            PromptKind::AddOrderNote(id) => format!("Note on order #{}", id),
            PromptKind::CreateOrder => "New order".to_string(),
            PromptKind::CreateCustomer => "New customer".to_string(),
            PromptKind::AddCustomerStatus(_) => "Assign status".to_string(),
            PromptKind::AddCustomerNote(_) => "Customer note".to_string(),
            PromptKind::CreateProduct => "New product".to_string(),
            PromptKind::RecordMovement => "Record stock movement".to_string(),
            PromptKind::CreateUser => "New user".to_string(),
            PromptKind::ChangeFullName(_) => "Change full name".to_string(),
        }
    }

    /// Input format shown under the prompt
    pub fn hint(&self) -> &'static str {
        match self {
            PromptKind::CancelOrder(_) => "reason",
            PromptKind::AddPayment(_) => "amount [cash|transfer]",
            PromptKind::AddOrderNote(_) | PromptKind::AddCustomerNote(_) => "note text",
            PromptKind::CreateOrder => "customer_id product_id:qty:price ...",
            PromptKind::CreateCustomer => "name; phone[; other phones]",
            PromptKind::AddCustomerStatus(_) => "status, e.g. regular",
            PromptKind::CreateProduct => "name; category[; cost notes]",
            PromptKind::RecordMovement => "product_id type qty [total_cost][; description]",
            PromptKind::CreateUser => "username; full name; password",
            PromptKind::ChangeFullName(_) => "full name",
        }
    }

    /// Build the mutation from the prompt text
    pub fn parse(&self, input: &str) -> forms::ParseResult<Mutation> {
        Ok(match *self {
            PromptKind::CancelOrder(id) => Mutation::CancelOrder(id, forms::parse_text(input, "Reason")?),
            PromptKind::AddPayment(id) => Mutation::AddPayment(id, forms::parse_payment(input)?),
            PromptKind::AddOrderNote(id) => Mutation::AddOrderNote(id, forms::parse_text(input, "Note")?),
            PromptKind::CreateOrder => Mutation::CreateOrder(forms::parse_order(input)?),
            PromptKind::CreateCustomer => Mutation::CreateCustomer(forms::parse_customer(input)?),
            PromptKind::AddCustomerStatus(id) => {
                Mutation::AddCustomerStatus(id, forms::parse_text(input, "Status")?)
            }
            PromptKind::AddCustomerNote(id) => {
                Mutation::AddCustomerNote(id, forms::parse_text(input, "Note")?)
            }
            PromptKind::CreateProduct => Mutation::CreateProduct(forms::parse_product(input)?),
            PromptKind::RecordMovement => Mutation::RecordMovement(forms::parse_stock_movement(input)?),
            PromptKind::CreateUser => Mutation::CreateUser(forms::parse_user(input)?),
            PromptKind::ChangeFullName(id) => {
                Mutation::ChangeFullName(id, forms::parse_text(input, "Full name")?)
            }
        })
    }
}

/// An open modal prompt
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    pub error: Option<String>,
}

// ============================================================================
// Background Requests
// ============================================================================

/// A write against the backend. Each is followed by a re-fetch.
#[derive(Debug, Clone)]
pub enum Mutation {
    DeliverOrder(i64),
    CancelOrder(i64, String),
    AddPayment(i64, PaymentCreate),
    AddOrderNote(i64, String),
    CreateOrder(OrderCreate),
    CreateCustomer(CustomerCreate),
    AddCustomerStatus(i64, String),
    AddCustomerNote(i64, String),
    CreateProduct(ProductCreate),
    SetProductActive(i64, bool),
    RecordMovement(StockMovementCreate),
    CreateUser(UserCreate),
    SetUserActive(i64, bool),
    ChangeFullName(i64, String),
}

#[derive(Debug, Clone)]
pub enum Request {
    Load(Route),
    Mutate(Mutation),
}

/// Data fetched for one screen
#[derive(Debug)]
pub enum Payload {
    Dashboard(DashboardReport, Vec<StockReport>),
    Orders(Vec<Order>, Vec<Customer>),
    Order(Order, Customer),
    OrderForm(Vec<Customer>, Vec<Product>),
    Customers(Vec<Customer>),
    Customer(Customer, Vec<Order>),
    Products(Vec<Product>),
    Stock(Vec<StockMovement>, Vec<Product>),
    Revenue(Vec<CustomerRevenueReport>),
    Users(Vec<User>),
    Profile(User),
}

/// Result types from background tasks
#[derive(Debug)]
pub enum FetchResult {
    /// Screen data for a route
    Loaded(Route, Payload),
    /// A mutation succeeded; the message goes to the status bar
    Mutated(String),
    OrderCreated(Order),
    /// The access token was rejected and could not be refreshed
    SessionExpired,
    Error(String),
}

/// Everything the protected screens display
#[derive(Debug, Default)]
pub struct ScreenData {
    pub dashboard: Option<DashboardReport>,
    pub stock_levels: Vec<StockReport>,
    pub orders: Vec<Order>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub movements: Vec<StockMovement>,
    pub revenue: Vec<CustomerRevenueReport>,
    pub users: Vec<User>,
    pub order: Option<Order>,
    pub customer: Option<Customer>,
    pub profile: Option<User>,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionStore,
    pub guard: NavigationGuard,

    // UI State
    pub state: AppState,
    pub search_query: String,
    pub selection: usize,
    pub order_filter: OrderFilter,
    pub prompt: Option<Prompt>,
    pub status_message: Option<String>,
    pub loading: bool,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    pub data: ScreenData,

    /// View the current screen data belongs to
    shown_view: View,

    fetch_tx: mpsc::Sender<FetchResult>,
    fetch_rx: mpsc::Receiver<FetchResult>,
}

impl App {
    pub fn new(config: Config, session: SessionStore, initial: Route) -> Self {
        let guard = NavigationGuard::new(session.subscribe(), initial);
        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let login_username = config.initial_username().unwrap_or_default();

        let mut app = Self {
            config,
            session,
            guard,

            state: AppState::Normal,
            search_query: String::new(),
            selection: 0,
            order_filter: OrderFilter::default(),
            prompt: None,
            status_message: None,
            loading: false,

            login_focus: if login_username.is_empty() {
                LoginFocus::Username
            } else {
                LoginFocus::Password
            },
            login_username,
            login_password: String::new(),
            login_error: None,

            data: ScreenData::default(),
            shown_view: View::Loading,

            fetch_tx,
            fetch_rx,
        };
        app.on_view_changed();
        app
    }

    pub fn view(&self) -> View {
        self.guard.view()
    }

    /// The protected route being shown, if any
    pub fn current_route(&self) -> Option<Route> {
        match self.guard.view() {
            View::Render(route) if !route.is_public() => Some(route),
            _ => None,
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Pick up session changes. Call once per frame.
    pub fn sync_session(&mut self) {
        if self.guard.sync() {
            self.on_view_changed();
        }
    }

    pub fn navigate(&mut self, route: Route) {
        self.guard.navigate(route);
        self.on_view_changed();
    }

    pub fn go_back(&mut self) {
        self.guard.back();
        self.on_view_changed();
    }

    fn on_view_changed(&mut self) {
        let view = self.guard.view();
        if view == self.shown_view {
            return;
        }
        debug!(?view, "View changed");
        self.shown_view = view;
        self.selection = 0;
        self.search_query.clear();
        self.prompt = None;
        if matches!(self.state, AppState::Searching | AppState::Prompting | AppState::ConfirmingLogout) {
            self.state = AppState::Normal;
        }

        match view {
            View::Loading => {}
            View::Render(Route::Login) => {
                self.data = ScreenData::default();
                self.loading = false;
                self.login_password.clear();
                self.login_focus = if self.login_username.is_empty() {
                    LoginFocus::Username
                } else {
                    LoginFocus::Password
                };
            }
            View::Render(route) => self.load(route),
        }
    }

    /// Re-fetch the current screen
    pub fn reload(&mut self) {
        if let Some(route) = self.current_route() {
            self.load(route);
        }
    }

    fn load(&mut self, route: Route) {
        if route == Route::Root {
            return;
        }
        self.loading = true;
        self.spawn_request(Request::Load(route));
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let username = self.login_username.trim().to_string();
        if username.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        self.login_error = None;
        let credentials = LoginCredentials::new(username.clone(), self.login_password.clone());

        match self.session.login(&credentials).await {
            Ok(user) => {
                self.login_password.clear();
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.status_message = Some(format!("Welcome, {}", user.display_name()));
                self.sync_session();
            }
            Err(e) => {
                info!(error = %e, "Login failed");
                self.login_error = Some(e.to_string());
                self.login_focus = LoginFocus::Password;
            }
        }
    }

    pub fn confirm_logout(&mut self) {
        self.state = AppState::Normal;
        self.session.logout();
        self.status_message = Some("Logged out".to_string());
        self.sync_session();
    }

    pub fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Prompts and mutations
    // =========================================================================

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
            error: None,
        });
        self.state = AppState::Prompting;
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
        self.state = AppState::Normal;
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            if can_add_prompt_char(prompt.input.chars().count(), c) {
                prompt.input.push(c);
            }
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.pop();
        }
    }

    /// Parse the prompt and start the mutation, or keep the prompt open with an error
    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match prompt.kind.parse(&prompt.input) {
            Ok(mutation) => {
                self.prompt = None;
                self.state = AppState::Normal;
                self.mutate(mutation);
            }
            Err(message) => prompt.error = Some(message),
        }
    }

    pub fn mutate(&mut self, mutation: Mutation) {
        self.status_message = Some("Saving...".to_string());
        self.spawn_request(Request::Mutate(mutation));
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    fn spawn_request(&self, request: Request) {
        let Some(api) = self.session.authorized_client() else {
            warn!("No stored credentials for the session");
            if let Err(e) = self.fetch_tx.try_send(FetchResult::SessionExpired) {
                error!(error = %e, "Failed to queue session expiry");
            }
            return;
        };
        let tx = self.fetch_tx.clone();
        let session = self.session.clone();

        tokio::spawn(async move {
            let result = run_with_refresh(&session, api, &request).await;
            if let Err(e) = tx.send(result).await {
                error!(error = %e, "Failed to send fetch result - channel closed");
            }
        });
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            self.process_fetch_result(result);
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Loaded(route, payload) => {
                if self.guard.view() != View::Render(route) {
                    debug!(%route, "Dropping data for a screen no longer shown");
                    return;
                }
                self.loading = false;
                self.apply_payload(payload);
                self.clamp_selection();
            }
            FetchResult::Mutated(message) => {
                self.status_message = Some(message);
                self.reload();
            }
            FetchResult::OrderCreated(order) => {
                self.status_message = Some(format!("Order #{} created", order.id));
                self.navigate(Route::OrderDetail(order.id));
            }
            FetchResult::SessionExpired => {
                self.loading = false;
                if !self.session.is_authenticated() {
                    debug!("Session already ended, ignoring expiry");
                    return;
                }
                self.session.logout();
                self.status_message = None;
                self.login_error = Some("Session expired - please log in again".to_string());
                self.sync_session();
            }
            FetchResult::Error(message) => {
                self.loading = false;
                self.status_message = Some(message);
            }
        }
    }

    fn apply_payload(&mut self, payload: Payload) {
        let data = &mut self.data;
        match payload {
            Payload::Dashboard(report, stock) => {
                data.dashboard = Some(report);
                data.stock_levels = stock;
            }
            Payload::Orders(orders, customers) => {
                data.orders = orders;
                data.customers = customers;
            }
            Payload::Order(order, customer) => {
                data.order = Some(order);
                data.customer = Some(customer);
            }
            Payload::OrderForm(customers, products) => {
                data.customers = customers;
                data.products = products;
            }
            Payload::Customers(customers) => data.customers = customers,
            Payload::Customer(customer, orders) => {
                data.customer = Some(customer);
                data.orders = orders;
            }
            Payload::Products(products) => data.products = products,
            Payload::Stock(movements, products) => {
                data.movements = movements;
                data.products = products;
            }
            Payload::Revenue(revenue) => data.revenue = revenue,
            Payload::Users(users) => data.users = users,
            Payload::Profile(user) => data.profile = Some(user),
        }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    pub fn customer_name(&self, id: i64) -> String {
        self.data
            .customers
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Customer #{}", id))
    }

    pub fn product_names(&self) -> HashMap<i64, &str> {
        self.data.products.iter().map(|p| (p.id, p.name.as_str())).collect()
    }

    /// Orders passing the filter and search, newest first
    pub fn visible_orders(&self) -> Vec<&Order> {
        let names: HashMap<i64, &str> =
            self.data.customers.iter().map(|c| (c.id, c.name.as_str())).collect();
        let query = self.search_query.trim();

        let mut orders: Vec<&Order> = self
            .data
            .orders
            .iter()
            .filter(|o| self.order_filter.matches(o))
            .filter(|o| {
                query.is_empty()
                    || o.id.to_string() == query.trim_start_matches('#')
                    || names.get(&o.customer_id).is_some_and(|n| contains_ignore_case(n, query))
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn visible_customers(&self) -> Vec<&Customer> {
        let query = self.search_query.trim();
        let mut customers: Vec<&Customer> = self
            .data
            .customers
            .iter()
            .filter(|c| {
                contains_ignore_case(&c.name, query)
                    || contains_ignore_case(&c.primary_phone, query)
                    || contains_ignore_case(c.status_label(), query)
            })
            .collect();
        customers.sort_by(|a, b| cmp_ignore_case(&a.name, &b.name));
        customers
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        let query = self.search_query.trim();
        let mut products: Vec<&Product> = self
            .data
            .products
            .iter()
            .filter(|p| contains_ignore_case(&p.name, query) || contains_ignore_case(&p.category, query))
            .collect();
        products.sort_by(|a, b| {
            b.is_active
                .cmp(&a.is_active)
                .then_with(|| cmp_ignore_case(&a.name, &b.name))
        });
        products
    }

    /// Stock movements, newest first
    pub fn visible_movements(&self) -> Vec<&StockMovement> {
        let names = self.product_names();
        let query = self.search_query.trim();
        let mut movements: Vec<&StockMovement> = self
            .data
            .movements
            .iter()
            .filter(|m| {
                query.is_empty()
                    || contains_ignore_case(m.movement_type.as_str(), query)
                    || names.get(&m.product_id).is_some_and(|n| contains_ignore_case(n, query))
                    || m.description.as_deref().is_some_and(|d| contains_ignore_case(d, query))
            })
            .collect();
        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        movements
    }

    /// Customers by revenue, highest first
    pub fn visible_revenue(&self) -> Vec<&CustomerRevenueReport> {
        let query = self.search_query.trim();
        let mut rows: Vec<&CustomerRevenueReport> = self
            .data
            .revenue
            .iter()
            .filter(|r| contains_ignore_case(&r.customer_name, query))
            .collect();
        rows.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
        rows
    }

    pub fn visible_users(&self) -> Vec<&User> {
        let query = self.search_query.trim();
        let mut users: Vec<&User> = self
            .data
            .users
            .iter()
            .filter(|u| contains_ignore_case(&u.username, query) || contains_ignore_case(&u.full_name, query))
            .collect();
        users.sort_by(|a, b| cmp_ignore_case(&a.username, &b.username));
        users
    }

    /// Number of selectable rows on the current screen
    pub fn list_len(&self) -> usize {
        match self.current_route() {
            Some(Route::Orders) => self.visible_orders().len(),
            Some(Route::Customers) => self.visible_customers().len(),
            Some(Route::CustomerDetail(_)) => self.data.orders.len(),
            Some(Route::Products) => self.visible_products().len(),
            Some(Route::StockMovements) => self.visible_movements().len(),
            Some(Route::CustomerRevenue) => self.visible_revenue().len(),
            Some(Route::Users) => self.visible_users().len(),
            _ => 0,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.list_len();
        if len == 0 {
            self.selection = 0;
            return;
        }
        let max = (len - 1) as isize;
        self.selection = (self.selection as isize + delta).clamp(0, max) as usize;
    }

    pub fn select_last(&mut self) {
        self.selection = self.list_len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selection = self.selection.min(self.list_len().saturating_sub(1));
    }

    /// Orders of the customer being viewed, newest first
    pub fn customer_orders(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.data.orders.iter().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Open the selected row of a list screen
    pub fn open_selected(&mut self) {
        let target = match self.current_route() {
            Some(Route::Orders) => self.visible_orders().get(self.selection).map(|o| Route::OrderDetail(o.id)),
            Some(Route::Customers) => self
                .visible_customers()
                .get(self.selection)
                .map(|c| Route::CustomerDetail(c.id)),
            Some(Route::CustomerDetail(_)) => {
                self.customer_orders().get(self.selection).map(|o| Route::OrderDetail(o.id))
            }
            Some(Route::CustomerRevenue) => self
                .visible_revenue()
                .get(self.selection)
                .map(|r| Route::CustomerDetail(r.customer_id)),
            _ => None,
        };
        if let Some(route) = target {
            self.navigate(route);
        }
    }
}

// ============================================================================
// Request execution
// ============================================================================

/// Run a request; on a 401 refresh the access token once and retry
async fn run_with_refresh(session: &SessionStore, api: ApiClient, request: &Request) -> FetchResult {
    match execute(&api, request).await {
        Ok(result) => result,
        Err(e) if ApiError::is_unauthorized(&e) => {
            info!("Access token rejected, refreshing");
            let rejected = api.token().unwrap_or_default();
            if let Err(e) = session.refresh_access_token(rejected).await {
                info!(error = %e, "Token refresh failed");
                return FetchResult::SessionExpired;
            }
            let Some(api) = session.authorized_client() else {
                return FetchResult::SessionExpired;
            };
            match execute(&api, request).await {
                Ok(result) => result,
                Err(e) if ApiError::is_unauthorized(&e) => FetchResult::SessionExpired,
                Err(e) => failure(&e),
            }
        }
        Err(e) => failure(&e),
    }
}

fn failure(err: &anyhow::Error) -> FetchResult {
    error!(error = %format!("{:#}", err), "Request failed");
    let message = match err.downcast_ref::<ApiError>() {
        Some(api_err) => api_err.to_string(),
        None => format!("{:#}", err),
    };
    FetchResult::Error(message)
}

async fn execute(api: &ApiClient, request: &Request) -> Result<FetchResult> {
    match request {
        Request::Load(route) => Ok(FetchResult::Loaded(*route, fetch_route(api, *route).await?)),
        Request::Mutate(mutation) => apply_mutation(api, mutation).await,
    }
}

async fn fetch_route(api: &ApiClient, route: Route) -> Result<Payload> {
    Ok(match route {
        Route::Root | Route::Dashboard => {
            let (report, stock) =
                futures::try_join!(api.dashboard_report(), api.stock_report())?;
            Payload::Dashboard(report, stock)
        }
        Route::Orders => {
            let (orders, customers) = futures::try_join!(api.list_orders(), api.list_customers())?;
            Payload::Orders(orders, customers)
        }
        Route::OrderDetail(id) => {
            let order = api.get_order(id).await?;
            let customer = api.get_customer(order.customer_id).await?;
            Payload::Order(order, customer)
        }
        Route::CreateOrder => {
            let (customers, products) =
                futures::try_join!(api.list_customers(), api.list_products(Some(true)))?;
            Payload::OrderForm(customers, products)
        }
        Route::Customers => Payload::Customers(api.list_customers().await?),
        Route::CustomerDetail(id) => {
            let (customer, orders) = futures::try_join!(api.get_customer(id), api.list_orders())?;
            let orders = orders.into_iter().filter(|o| o.customer_id == id).collect();
            Payload::Customer(customer, orders)
        }
        Route::Products => Payload::Products(api.list_products(None).await?),
        Route::StockMovements => {
            let (movements, products) =
                futures::try_join!(api.list_stock_movements(None), api.list_products(None))?;
            Payload::Stock(movements, products)
        }
        Route::CustomerRevenue => Payload::Revenue(api.customer_revenue_report().await?),
        Route::Users => Payload::Users(api.list_users().await?),
        Route::Profile => Payload::Profile(api.fetch_profile().await?),
        Route::Login => anyhow::bail!("The login screen has no data"),
    })
}

async fn apply_mutation(api: &ApiClient, mutation: &Mutation) -> Result<FetchResult> {
    let message = match mutation {
        Mutation::DeliverOrder(id) => {
            api.deliver_order(*id).await?;
            format!("Order #{} delivered", id)
        }
        Mutation::CancelOrder(id, reason) => {
            api.cancel_order(*id, reason).await?;
            format!("Order #{} cancelled", id)
        }
        Mutation::AddPayment(id, payment) => {
            api.add_payment(*id, payment).await?;
            format!("Payment of {} recorded", orderdesk_core::utils::format_money(payment.amount))
        }
        Mutation::AddOrderNote(id, note) => {
            api.add_order_note(*id, note).await?;
            "Note added".to_string()
        }
        Mutation::CreateOrder(order) => {
            return Ok(FetchResult::OrderCreated(api.create_order(order).await?));
        }
        Mutation::CreateCustomer(customer) => {
            let created = api.create_customer(customer).await?;
            format!("Customer {} created", created.name)
        }
        Mutation::AddCustomerStatus(id, status) => {
            api.add_customer_status(*id, status).await?;
            format!("Status set to {}", status)
        }
        Mutation::AddCustomerNote(id, note) => {
            api.add_customer_note(*id, note).await?;
            "Note added".to_string()
        }
        Mutation::CreateProduct(product) => {
            let created = api.create_product(product).await?;
            format!("Product {} created", created.name)
        }
        Mutation::SetProductActive(id, active) => {
            let update = ProductUpdate {
                is_active: Some(*active),
                ..Default::default()
            };
            let product = api.update_product(*id, &update).await?;
            format!("{} {}", product.name, if *active { "activated" } else { "deactivated" })
        }
        Mutation::RecordMovement(movement) => {
            api.create_stock_movement(movement).await?;
            format!("{} of {} recorded", movement.movement_type, movement.quantity)
        }
        Mutation::CreateUser(user) => {
            let created = api.create_user(user).await?;
            format!("User {} created", created.username)
        }
        Mutation::SetUserActive(id, active) => {
            let update = UserUpdate {
                is_active: Some(*active),
                ..Default::default()
            };
            let user = api.update_user(*id, &update).await?;
            format!("{} is now {}", user.username, user.status_label().to_lowercase())
        }
        Mutation::ChangeFullName(id, name) => {
            let update = UserUpdate {
                full_name: Some(name.clone()),
                ..Default::default()
            };
            api.update_user(*id, &update).await?;
            "Name updated".to_string()
        }
    };
    Ok(FetchResult::Mutated(message))
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_prompt_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PROMPT_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::Arc;

    use orderdesk_core::auth::{MemoryTokenStorage, TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn stored_pair() -> Arc<MemoryTokenStorage> {
        Arc::new(MemoryTokenStorage::with_entries(&[
            (ACCESS_TOKEN_KEY, "acc"),
            (REFRESH_TOKEN_KEY, "ref"),
        ]))
    }

    fn app_with(storage: Arc<MemoryTokenStorage>, base_url: &str, initial: Route) -> App {
        let api = ApiClient::new(base_url).expect("client builds");
        let session = SessionStore::new(api, storage);
        App::new(Config::default(), session, initial)
    }

    fn order(id: i64, customer_id: i64, delivered: bool, cancelled: bool, day: u32) -> Order {
        serde_json::from_value(json!({
            "id": id, "customer_id": customer_id, "created_by": 1, "updated_by": null,
            "cancelled_by": null, "cancellation_reason": null, "delivered_at": null,
            "delivered_by": null, "is_cancelled": cancelled,
            "created_at": format!("2024-02-{:02}T09:00:00", day),
            "updated_at": format!("2024-02-{:02}T09:00:00", day),
            "items": [], "payments": [], "notes": [],
            "total_amount": 10.0, "paid_amount": 0.0, "remaining_amount": 10.0,
            "is_fully_paid": false, "is_delivered": delivered, "is_fully_completed": false
        }))
        .expect("valid order")
    }

    fn customer(id: i64, name: &str) -> Customer {
        serde_json::from_value(json!({
            "id": id, "name": name, "primary_phone": "555-0100", "additional_phones": null,
            "created_at": "2024-01-01T09:00:00", "updated_at": "2024-01-01T09:00:00",
            "statuses": [], "notes": []
        }))
        .expect("valid customer")
    }

    fn product_json(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id, "name": name, "category": "bread", "is_active": true,
            "cost_metadata": null, "created_at": "2024-01-10T08:00:00",
            "updated_at": "2024-01-10T08:00:00"
        })
    }

    fn profile_json() -> serde_json::Value {
        json!({
            "id": 1, "username": "maria", "full_name": "Maria Lopez", "is_active": true,
            "created_at": "2024-01-10T08:00:00", "updated_at": "2024-01-10T08:00:00"
        })
    }

    async fn authenticated_app(server: &MockServer, storage: Arc<MemoryTokenStorage>, initial: Route) -> App {
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .mount(server)
            .await;
        let mut app = app_with(storage, &server.uri(), initial);
        app.session.initialize().await;
        app
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_prompt_char() {
        assert!(can_add_prompt_char(0, ';'));
        assert!(!can_add_prompt_char(200, 'a'));
        assert!(!can_add_prompt_char(0, '\t'));
    }

    #[test]
    fn test_prompt_kind_parse() {
        let mutation = PromptKind::AddPayment(12).parse("20 transfer").unwrap();
        assert!(matches!(mutation, Mutation::AddPayment(12, p) if p.amount == 20.0));

        let mutation = PromptKind::CancelOrder(3).parse("  duplicate ").unwrap();
        assert!(matches!(mutation, Mutation::CancelOrder(3, reason) if reason == "duplicate"));

        assert!(PromptKind::AddCustomerNote(1).parse("").is_err());
    }

    #[tokio::test]
    async fn test_starts_loading_until_session_resolves() {
        let app = app_with(Arc::new(MemoryTokenStorage::new()), "http://127.0.0.1:9", Route::Orders);
        assert_eq!(app.view(), View::Loading);
        assert!(app.current_route().is_none());
    }

    #[tokio::test]
    async fn test_logout_returns_to_login_and_clears_data() {
        let mut app = app_with(stored_pair(), "http://127.0.0.1:9", Route::Orders);
        app.data.orders = vec![order(1, 7, false, false, 1)];
        app.login_password = "secret".to_string();

        app.session.logout();
        app.sync_session();

        assert_eq!(app.view(), View::Render(Route::Login));
        assert!(app.data.orders.is_empty());
        assert!(app.login_password.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_prompt_input_keeps_prompt_open() {
        let mut app = app_with(Arc::new(MemoryTokenStorage::new()), "http://127.0.0.1:9", Route::Orders);
        app.open_prompt(PromptKind::AddPayment(5));
        for c in "lots".chars() {
            app.push_prompt_char(c);
        }
        app.submit_prompt();

        assert_eq!(app.state, AppState::Prompting);
        let prompt = app.prompt.as_ref().expect("prompt still open");
        assert!(prompt.error.as_deref().is_some_and(|e| e.contains("not an amount")));

        app.cancel_prompt();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.prompt.is_none());
    }

    #[tokio::test]
    async fn test_visible_orders_filter_and_search() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let mut app = authenticated_app(&server, stored_pair(), Route::Orders).await;
        app.sync_session();
        assert_eq!(app.current_route(), Some(Route::Orders));

        app.data.customers = vec![customer(7, "Corner Bakery"), customer(8, "Deli Uno")];
        app.data.orders = vec![
            order(1, 7, false, false, 1),
            order(2, 8, true, false, 2),
            order(3, 7, false, true, 3),
            order(4, 8, false, false, 4),
        ];

        let ids = |app: &App| app.visible_orders().iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(ids(&app), vec![4, 2, 1]);

        app.order_filter = OrderFilter::Pending;
        assert_eq!(ids(&app), vec![4, 1]);

        app.order_filter = OrderFilter::Delivered;
        assert_eq!(ids(&app), vec![2]);

        app.order_filter = OrderFilter::Active;
        app.search_query = "corner".to_string();
        assert_eq!(ids(&app), vec![1]);

        app.search_query = "#4".to_string();
        assert_eq!(ids(&app), vec![4]);
        Ok(())
    }

    #[tokio::test]
    async fn test_selection_is_clamped() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let mut app = authenticated_app(&server, stored_pair(), Route::Customers).await;
        app.sync_session();

        app.data.customers = vec![customer(1, "A"), customer(2, "B"), customer(3, "C")];
        app.move_selection(10);
        assert_eq!(app.selection, 2);
        app.move_selection(-1);
        assert_eq!(app.selection, 1);
        app.move_selection(-10);
        assert_eq!(app.selection, 0);
        app.select_last();
        assert_eq!(app.selection, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_screen_data_is_dropped() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let mut app = authenticated_app(&server, stored_pair(), Route::Users).await;
        app.sync_session();

        app.process_fetch_result(FetchResult::Loaded(
            Route::Customers,
            Payload::Customers(vec![customer(1, "A")]),
        ));
        assert!(app.data.customers.is_empty());

        app.process_fetch_result(FetchResult::Loaded(Route::Users, Payload::Users(vec![])));
        assert!(!app.loading);
        Ok(())
    }

    #[tokio::test]
    async fn test_screen_loads_on_navigation() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .and(header("authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(4, "Rye loaf")])))
            .mount(&server)
            .await;

        let mut app = authenticated_app(&server, stored_pair(), Route::Products).await;
        app.sync_session();
        assert!(app.loading);

        let result = app.fetch_rx.recv().await.expect("fetch result");
        app.process_fetch_result(result);
        assert!(!app.loading);
        assert_eq!(app.visible_products().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_token_is_refreshed_and_retried() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .and(header("authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .and(header("authorization", "Bearer acc2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(4, "Rye loaf")])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "acc2", "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let storage = stored_pair();
        let session = SessionStore::new(ApiClient::new(&server.uri())?, storage.clone());
        let api = session.authorized_client().expect("stored pair");

        let result = run_with_refresh(&session, api, &Request::Load(Route::Products)).await;
        assert!(matches!(result, FetchResult::Loaded(Route::Products, Payload::Products(p)) if p.len() == 1));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc2".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_refresh_expires_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let storage = stored_pair();
        let mut app = authenticated_app(&server, storage.clone(), Route::Users).await;
        app.sync_session();
        assert_eq!(app.current_route(), Some(Route::Users));

        let result = app.fetch_rx.recv().await.expect("fetch result");
        assert!(matches!(result, FetchResult::SessionExpired));
        app.process_fetch_result(result);

        assert_eq!(app.view(), View::Render(Route::Login));
        assert!(storage.is_empty());
        assert!(app.login_error.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_token_retries_without_refresh() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .and(header("authorization", "Bearer old-acc"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .and(header("authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(4, "Rye loaf")])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;

        // A request issued before the user signed in again
        let storage = stored_pair();
        let session = SessionStore::new(ApiClient::new(&server.uri())?, storage.clone());
        let api = session.api().with_token("old-acc".to_string());

        let result = run_with_refresh(&session, api, &Request::Load(Route::Products)).await;
        assert!(matches!(result, FetchResult::Loaded(Route::Products, _)));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY)?, Some("acc".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY)?, Some("ref".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_credentials_expire_the_session() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let storage = stored_pair();
        let mut app = authenticated_app(&server, storage.clone(), Route::Orders).await;

        // Storage lost the pair behind the session's back
        storage.remove(ACCESS_TOKEN_KEY)?;
        storage.remove(REFRESH_TOKEN_KEY)?;

        app.sync_session();
        assert_eq!(app.current_route(), Some(Route::Orders));
        assert!(app.loading);

        let result = app.fetch_rx.recv().await.expect("fetch result");
        assert!(matches!(result, FetchResult::SessionExpired));
        app.process_fetch_result(result);

        assert!(!app.loading);
        assert_eq!(app.view(), View::Render(Route::Login));
        assert!(app.login_error.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_expiry_after_logout_is_ignored() -> anyhow::Result<()> {
        let mut app = app_with(Arc::new(MemoryTokenStorage::new()), "http://127.0.0.1:9", Route::Login);
        app.session.initialize().await;
        app.sync_session();

        app.process_fetch_result(FetchResult::SessionExpired);
        assert!(app.login_error.is_none());
        assert_eq!(app.view(), View::Render(Route::Login));
        Ok(())
    }

    #[tokio::test]
    async fn test_server_error_goes_to_status_bar() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports/customer-revenue"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
            .mount(&server)
            .await;

        let mut app = authenticated_app(&server, stored_pair(), Route::CustomerRevenue).await;
        app.sync_session();

        let result = app.fetch_rx.recv().await.expect("fetch result");
        app.process_fetch_result(result);
        assert!(!app.loading);
        assert!(app.status_message.as_deref().is_some_and(|m| m.contains("db down")));
        assert_eq!(app.view(), View::Render(Route::CustomerRevenue));
        Ok(())
    }
}
