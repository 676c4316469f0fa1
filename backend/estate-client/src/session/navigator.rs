/// Where the session guard sends the user after a 401.
pub const SIGN_IN_PATH: &str = "/auth/sign-in";

/// Hard navigation port, outside any router.
///
/// The session guard calls this once per 401 response; closures work directly:
///
/// ```
/// use estate_client::session::Navigator;
///
/// let navigator = |path: &str| println!("go to {path}");
/// navigator.redirect("/auth/sign-in");
/// ```
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, path: &str) {
        self(path)
    }
}
