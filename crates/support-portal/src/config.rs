//! Portal configuration.

/// Configuration shared by the customer and agent portals.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Public origin used to build links in outgoing mail
    /// (e.g. `https://support.example.com`).
    pub base_url: String,
    /// Product name used in mail subjects and greetings.
    pub product_name: String,
    /// Suppresses all outgoing mail. Keys and tickets are still created.
    pub developer_mode: bool,
    /// Link to the service-level agreement quoted in ticket
    /// acknowledgements.
    pub sla_url: String,
    /// Link to end-user documentation quoted in ticket acknowledgements.
    pub user_manual_url: String,
    /// Address customers are pointed to when registration fails.
    pub contact_email: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            product_name: "Support".into(),
            developer_mode: false,
            sla_url: "http://localhost:8000/support-sla".into(),
            user_manual_url: "http://localhost:8000/docs".into(),
            contact_email: "support@localhost".into(),
        }
    }
}
