use tracing::{debug, info, warn};

use crate::config::{Credentials, ScoutConfig};
use crate::error::{Result, ScoutError};
use crate::extractor::POST_CONTAINER;
use crate::session::SessionStore;
use crate::traits::ProfilePage;

/// Present only when the page is signed in.
pub const SIGNED_IN_MARKER: &str = r#"a[data-testid="AppTabBar_Profile_Link"]"#;
pub const USERNAME_INPUT: &str = r#"input[autocomplete="username"]"#;
pub const PASSWORD_INPUT: &str = r#"input[type="password"]"#;
pub const NEXT_BUTTON_TEXT: &str = "Next";
pub const LOGIN_BUTTON_TEXT: &str = "Log in";

/// Gets a page signed in and onto a profile timeline.
pub struct Navigator {
    config: ScoutConfig,
    sessions: SessionStore,
    credentials: Credentials,
}

impl Navigator {
    pub fn new(config: ScoutConfig, credentials: Credentials) -> Self {
        let sessions = SessionStore::new(config.cookies_path.clone());
        Self {
            config,
            sessions,
            credentials,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn site_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub fn profile_url(&self, username: &str) -> String {
        self.site_url(username)
    }

    /// Load saved cookies into the page. Returns whether any were applied.
    pub async fn restore_session<P: ProfilePage + ?Sized>(&self, page: &P) -> bool {
        let Some(cookies) = self.sessions.load() else {
            return false;
        };
        match page.set_cookies(&cookies).await {
            Ok(()) => {
                info!(count = cookies.len(), "Restored saved session");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to apply saved session cookies");
                false
            }
        }
    }

    /// Make sure the page is signed in, logging in with the configured
    /// credentials if needed. Failure is reported, never raised: some
    /// profiles are readable signed out.
    pub async fn authenticate<P: ProfilePage + ?Sized>(&self, page: &P) -> bool {
        match self.try_authenticate(page).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("Login verification failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                false
            }
        }
    }

    async fn try_authenticate<P: ProfilePage + ?Sized>(&self, page: &P) -> Result<bool> {
        if let Err(e) = page
            .goto(&self.site_url("login"), self.config.login_step_timeout())
            .await
        {
            if !e.is_timeout() {
                return Err(e);
            }
            debug!("Login page load event timed out, checking content anyway");
        }

        if page
            .wait_for_selector(SIGNED_IN_MARKER, self.config.login_check_timeout())
            .await?
        {
            info!("Already logged in");
            return Ok(true);
        }

        let Some((identifier, password)) = self.credentials.pair() else {
            warn!("Not signed in and TWITTER_EMAIL / TWITTER_PASSWORD are not set");
            return Ok(false);
        };

        let step = self.config.login_step_timeout();

        if !page.wait_for_selector(USERNAME_INPUT, step).await? {
            warn!("Username field never appeared");
            return Ok(false);
        }
        page.type_into(USERNAME_INPUT, identifier).await?;
        if !page.click_by_text(NEXT_BUTTON_TEXT).await? {
            warn!("No \"{NEXT_BUTTON_TEXT}\" button on login form");
            return Ok(false);
        }

        if !page.wait_for_selector(PASSWORD_INPUT, step).await? {
            warn!("Password field never appeared");
            return Ok(false);
        }
        page.type_into(PASSWORD_INPUT, password).await?;
        if !page.click_by_text(LOGIN_BUTTON_TEXT).await? {
            warn!("No \"{LOGIN_BUTTON_TEXT}\" button on login form");
            return Ok(false);
        }

        if !page
            .wait_for_selector(SIGNED_IN_MARKER, self.config.login_check_timeout())
            .await?
        {
            return Ok(false);
        }

        info!("Successfully logged in");
        match page.cookies().await {
            Ok(cookies) => {
                if let Err(e) = self.sessions.persist(&cookies) {
                    warn!(error = %e, "Could not save session");
                }
            }
            Err(e) => warn!(error = %e, "Could not read cookies after login"),
        }
        Ok(true)
    }

    /// Open `username`'s timeline and wait until at least one post has
    /// rendered and the page is really that profile.
    pub async fn open_profile<P: ProfilePage + ?Sized>(
        &self,
        page: &P,
        username: &str,
    ) -> Result<()> {
        let fail = |reason: String| ScoutError::Navigation {
            username: username.to_string(),
            reason,
        };

        let url = self.profile_url(username);
        info!(username, url = %url, "Opening profile");

        // The load event can lag well behind the first rendered post on an
        // infinite timeline; the readiness check below is what decides.
        if let Err(e) = page.goto(&url, self.config.navigation_timeout()).await {
            if !e.is_timeout() {
                return Err(fail(e.to_string()));
            }
            debug!(username, "Profile load event timed out, checking content anyway");
        }

        let ready = page
            .wait_for_selector(POST_CONTAINER, self.config.quick_check_timeout())
            .await?
            || page
                .wait_for_selector(POST_CONTAINER, self.config.readiness_timeout())
                .await?;
        if !ready {
            let waited =
                self.config.quick_check_timeout_ms + self.config.readiness_timeout_ms;
            return Err(fail(format!("no posts rendered within {waited}ms")));
        }

        let current = page.current_url().await?;
        if !current
            .to_lowercase()
            .contains(&username.to_lowercase())
        {
            return Err(fail(format!("landed on {current}")));
        }

        debug!(username, url = %current, "Profile ready");
        Ok(())
    }
}

/// Strip a leading `@` and check the handle is one the site would accept.
pub fn normalize_username(raw: &str) -> Result<String> {
    let name = raw.trim().trim_start_matches('@');
    let valid = !name.is_empty()
        && name.len() <= 50
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name.to_string())
    } else {
        Err(ScoutError::InvalidUsername(raw.to_string()))
    }
}
