/// Where provisioning references are shown to a human. Informational only:
/// nothing downstream depends on what was displayed.
pub trait DisplayChannel: Send + Sync {
    fn show_html(&self, html: &str);
}
