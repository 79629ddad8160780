use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::dom::Page;
use crate::error::{RecorderError, Result};
use headless_chrome::{Browser, Tab};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Serialised document, url and title of the current page
const SNAPSHOT_JS: &str = r#"
    JSON.stringify({
        html: document.documentElement ? document.documentElement.outerHTML : '',
        url: location.href,
        title: document.title
    })
"#;

/// Checks used to find the tab the user is looking at, strongest first
const ACTIVE_TAB_CHECKS: [&str; 2] = [
    "document.visibilityState === 'visible' && document.hasFocus()",
    "document.visibilityState === 'visible'",
];

#[derive(Debug, Deserialize)]
struct PageSnapshot {
    html: String,
    url: String,
    title: String,
}

/// Evaluate an expression returning a JSON string and decode it
pub fn evaluate_json<T: DeserializeOwned>(tab: &Tab, expression: &str) -> Result<T> {
    let result = tab
        .evaluate(expression, false)
        .map_err(|e| RecorderError::EvaluationFailed(e.to_string()))?;

    let json = result
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or_else(|| RecorderError::EvaluationFailed("expression did not return a JSON string".to_string()))?;

    Ok(serde_json::from_str(json)?)
}

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Hide the automation banner and navigator.webdriver
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Recording sessions sit idle while the user thinks
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path;
        launch_opts.user_data_dir = options.user_data_dir;
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| RecorderError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| RecorderError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::debug!("Launched browser (headless: {})", options.headless);
        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| RecorderError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Create a new tab
    pub fn new_tab(&self) -> Result<Arc<Tab>> {
        self.browser
            .new_tab()
            .map_err(|e| RecorderError::TabOperationFailed(format!("Failed to create tab: {}", e)))
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| RecorderError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        for check in ACTIVE_TAB_CHECKS {
            for tab in &tabs {
                match tab.evaluate(check, false) {
                    Ok(remote_object) => {
                        if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                    Err(e) => log::debug!("Failed to check tab status: {}", e),
                }
            }
        }

        Err(RecorderError::TabOperationFailed("No active tab found".to_string()))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL using the active tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| RecorderError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| RecorderError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Parse the active tab's current document
    pub fn snapshot_page(&self) -> Result<Page> {
        let tab = self.tab()?;
        snapshot_tab(&tab)
    }

    /// Close every tab; the browser itself exits when dropped
    pub fn close(&self) -> Result<()> {
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab: {}", e);
            }
        }
        Ok(())
    }
}

/// Parse a tab's current document
pub fn snapshot_tab(tab: &Tab) -> Result<Page> {
    let snapshot: PageSnapshot = evaluate_json(tab, SNAPSHOT_JS)?;
    let mut page = Page::parse(&snapshot.html).with_url(snapshot.url);
    if !snapshot.title.is_empty() {
        page = page.with_title(snapshot.title);
    }
    Ok(page)
}
