use std::fmt;
use std::sync::RwLock;

/// Screens of the client. `/` resolves to [`Route::Chat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    VerifyEmail,
    Chat,
    Profile,
    Settings,
    NotFound,
}

impl Route {
    pub fn resolve(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        match path.trim_end_matches('/') {
            "" => Self::Chat,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/verify-email" => Self::VerifyEmail,
            "/chat" => Self::Chat,
            "/profile" => Self::Profile,
            "/settings" => Self::Settings,
            _ => Self::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::VerifyEmail => "/verify-email",
            Self::Chat => "/chat",
            Self::Profile => "/profile",
            Self::Settings => "/settings",
            Self::NotFound => "/404",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Chat | Self::Profile | Self::Settings)
    }

    /// Pages an authenticated user gets bounced away from.
    fn is_entry_page(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub path: String,
    /// Where to go back to after logging in
    pub redirect: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            route: Route::resolve(&path),
            path,
            redirect: None,
        }
    }

    pub fn to_route(route: Route, redirect: Option<String>) -> Self {
        Self {
            route,
            path: route.path().to_string(),
            redirect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    Redirect {
        to: Route,
        redirect: Option<String>,
    },
}

/// Decide whether a transition to `target` may happen.
pub fn guard(target: &Location, authenticated: bool) -> NavigationDecision {
    let requires_auth = target.route.requires_auth();
    if requires_auth && !authenticated {
        NavigationDecision::Redirect {
            to: Route::Login,
            redirect: Some(target.path.clone()),
        }
    } else if !requires_auth && authenticated && target.route.is_entry_page() {
        NavigationDecision::Redirect {
            to: Route::Chat,
            redirect: None,
        }
    } else {
        NavigationDecision::Proceed
    }
}

pub trait Navigator: Send + Sync {
    fn current(&self) -> Location;
    fn go(&self, location: Location);

    fn redirect_to_login(&self) {
        let here = self.current();
        let redirect = (here.route != Route::Login).then_some(here.path);
        self.go(Location::to_route(Route::Login, redirect));
    }
}

/// In-process history of visited locations.
#[derive(Debug)]
pub struct Router {
    history: RwLock<Vec<Location>>,
}

impl Router {
    pub fn new(start: Location) -> Self {
        Self {
            history: RwLock::new(vec![start]),
        }
    }

}

impl Default for Router {
    fn default() -> Self {
        Self::new(Location::new("/"))
    }
}

impl Navigator for Router {
    fn current(&self) -> Location {
        self.history
            .read()
            .ok()
            .and_then(|h| h.last().cloned())
            .unwrap_or_else(|| Location::new("/"))
    }

    fn go(&self, location: Location) {
        tracing::debug!(path = %location.path, "navigate");
        if let Ok(mut history) = self.history.write() {
            history.push(location);
        }
    }
}
