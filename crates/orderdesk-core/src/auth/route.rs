//! Application routes and their path form.

/// Which tree a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Only reachable while signed out
    Public,
    /// Requires an authenticated session
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    /// `/`, which lands on the dashboard once authorized
    Root,
    Dashboard,
    Orders,
    CreateOrder,
    OrderDetail(i64),
    Customers,
    CustomerDetail(i64),
    Products,
    StockMovements,
    CustomerRevenue,
    Users,
    Profile,
}

impl Route {
    /// Where authenticated users land when they hit the public tree
    pub const LANDING: Route = Route::Dashboard;

    /// Top-level entries of the shell navigation, in display order
    pub const NAVIGATION: [Route; 8] = [
        Route::Dashboard,
        Route::Orders,
        Route::Customers,
        Route::Products,
        Route::StockMovements,
        Route::CustomerRevenue,
        Route::Users,
        Route::Profile,
    ];

    pub fn class(&self) -> RouteClass {
        match self {
            Route::Login => RouteClass::Public,
            _ => RouteClass::Protected,
        }
    }

    pub fn is_public(&self) -> bool {
        self.class() == RouteClass::Public
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Root => "/".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Orders => "/orders".to_string(),
            Route::CreateOrder => "/orders/new".to_string(),
            Route::OrderDetail(id) => format!("/orders/{}", id),
            Route::Customers => "/customers".to_string(),
            Route::CustomerDetail(id) => format!("/customers/{}", id),
            Route::Products => "/products".to_string(),
            Route::StockMovements => "/stock-movements".to_string(),
            Route::CustomerRevenue => "/reports/customer-revenue".to_string(),
            Route::Users => "/users".to_string(),
            Route::Profile => "/profile".to_string(),
        }
    }

    /// Parse a path, ignoring any query string and trailing slash.
    /// Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] if path.starts_with('/') => Some(Route::Root),
            ["login"] => Some(Route::Login),
            ["dashboard"] => Some(Route::Dashboard),
            ["orders"] => Some(Route::Orders),
            ["orders", "new"] => Some(Route::CreateOrder),
            ["orders", id] => id.parse().ok().map(Route::OrderDetail),
            ["customers"] => Some(Route::Customers),
            ["customers", id] => id.parse().ok().map(Route::CustomerDetail),
            ["products"] => Some(Route::Products),
            ["stock-movements"] => Some(Route::StockMovements),
            ["reports", "customer-revenue"] => Some(Route::CustomerRevenue),
            ["users"] => Some(Route::Users),
            ["profile"] => Some(Route::Profile),
            _ => None,
        }
    }

    /// Display title for headers and navigation
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Root | Route::Dashboard => "Dashboard",
            Route::Orders => "Orders",
            Route::CreateOrder => "New Order",
            Route::OrderDetail(_) => "Order",
            Route::Customers => "Customers",
            Route::CustomerDetail(_) => "Customer",
            Route::Products => "Products",
            Route::StockMovements => "Stock",
            Route::CustomerRevenue => "Revenue",
            Route::Users => "Users",
            Route::Profile => "Profile",
        }
    }

    /// The navigation entry a route is shown under
    pub fn section(&self) -> Route {
        match self {
            Route::Root => Route::Dashboard,
            Route::CreateOrder | Route::OrderDetail(_) => Route::Orders,
            Route::CustomerDetail(_) => Route::Customers,
            other => *other,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}
