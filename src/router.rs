//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. A miss is classified so
//! the server can answer 404, 405 or a trailing-slash redirect.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so calls chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

/// Result of a route lookup.
pub(crate) enum Lookup {
    Found(BoxedHandler),
    /// The path exists under other methods only.
    MethodNotAllowed(Vec<Method>),
    /// The path matches once its trailing slash is added or removed.
    Redirect(String),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// # Panics
    ///
    /// Panics when the path is not a valid matchit route or conflicts with an
    /// already registered one. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup {
        if let Some(handler) = self.find(method, path) {
            return Lookup::Found(handler);
        }

        let allowed = self.allowed_methods(path);
        if !allowed.is_empty() {
            return Lookup::MethodNotAllowed(allowed);
        }

        match toggle_trailing_slash(path) {
            Some(alt) if self.find(method, &alt).is_some() => Lookup::Redirect(alt),
            _ => Lookup::NotFound,
        }
    }

    fn find(&self, method: Method, path: &str) -> Option<BoxedHandler> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        Some(Arc::clone(matched.value))
    }

    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| *method)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn toggle_trailing_slash(path: &str) -> Option<String> {
    if path == "/" {
        None
    } else if let Some(stripped) = path.strip_suffix('/') {
        Some(stripped.to_owned())
    } else {
        Some(format!("{path}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    async fn ok(_req: Request) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .get("/", ok)
            .post("/get-quotes/", ok)
    }

    #[test]
    fn finds_registered_route() {
        assert!(matches!(app().lookup(Method::Get, "/"), Lookup::Found(_)));
        assert!(matches!(app().lookup(Method::Post, "/get-quotes/"), Lookup::Found(_)));
    }

    #[test]
    fn wrong_method_lists_allowed() {
        match app().lookup(Method::Get, "/get-quotes/") {
            Lookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::Post]),
            _ => panic!("expected 405"),
        }
    }

    #[test]
    fn missing_trailing_slash_redirects() {
        match app().lookup(Method::Post, "/get-quotes") {
            Lookup::Redirect(to) => assert_eq!(to, "/get-quotes/"),
            _ => panic!("expected redirect"),
        }
    }

    #[test]
    fn unknown_path_is_not_found() {
        assert!(matches!(app().lookup(Method::Get, "/nope"), Lookup::NotFound));
        assert!(matches!(Router::new().lookup(Method::Get, "/"), Lookup::NotFound));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = Router::new().get("/a", ok).get("/a", ok);
    }
}
