use sd_core::route::{guard, Location, NavigationDecision, Navigator};

use crate::auth::AuthStore;

/// Guarded navigation: refresh the auth state from local storage, then
/// either go to `path` or follow the guard's redirect. Returns where the
/// navigator ended up.
pub async fn navigate(navigator: &dyn Navigator, auth: &AuthStore, path: &str) -> Location {
    let authenticated = auth.check_auth().await;
    let target = Location::new(path);

    match guard(&target, authenticated) {
        NavigationDecision::Proceed => navigator.go(target),
        NavigationDecision::Redirect { to, redirect } => {
            tracing::debug!(from = %target.path, to = %to, "navigation redirected");
            navigator.go(Location::to_route(to, redirect));
        }
    }
    navigator.current()
}
