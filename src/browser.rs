/// Opens the device authorization page for the user.
pub trait OpenBrowser: Send + Sync {
    fn open(&self, url: &str) -> anyhow::Result<()>;
}

/// The desktop's default browser.
#[derive(Debug, Clone, Default)]
pub struct WebBrowser;

impl OpenBrowser for WebBrowser {
    fn open(&self, url: &str) -> anyhow::Result<()> {
        webbrowser::open(url)?;
        Ok(())
    }
}
