//! Administrative operations with no REST API equivalent.
//!
//! Every method here is a thin specialization of
//! [`Session::drive_form`]: a URL template, a predicate that picks the
//! one form we mean on that page, and the fields to merge over the
//! form's hidden defaults. Nothing is caught or retried; errors from the
//! primitive propagate unchanged.
//!
//! The predicates are contracts with the live page markup. Where the page
//! carries several similar forms (the security-analysis settings page in
//! particular) the predicate documented on each method is the narrowest
//! the markup supports, and a markup change on the site breaks the
//! operation until the predicate is updated here.

use reqwest::Response;
use tracing::info;

use crate::error::Result;
use crate::form::FormPredicate;
use crate::session::Session;

/// What the organization will be used for, as the signup form encodes it.
///
/// A closed set: the form rejects anything else, so there is no catch-all
/// variant. Business usage requires a company name, which the variant
/// carries so it cannot be forgotten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationUsage {
    Personal,
    Business { company_name: String },
}

impl OrganizationUsage {
    /// Value for the form's `terms_of_service_type` field.
    pub fn terms_of_service_type(&self) -> &'static str {
        match self {
            OrganizationUsage::Personal => "standard",
            OrganizationUsage::Business { .. } => "corporate",
        }
    }
}

/// Security-analysis features toggleable from an organization's settings
/// page. Each maps to the trailing path segment of its toggle form's
/// `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityFeature {
    DependencyGraph,
    DependabotAlerts,
    DependabotSecurityUpdates,
    SecretScanning,
    SecretScanningPushProtection,
}

impl SecurityFeature {
    pub fn slug(&self) -> &'static str {
        match self {
            SecurityFeature::DependencyGraph => "dependency_graph",
            SecurityFeature::DependabotAlerts => "dependabot_alerts",
            SecurityFeature::DependabotSecurityUpdates => "dependabot_security_updates",
            SecurityFeature::SecretScanning => "secret_scanning",
            SecurityFeature::SecretScanningPushProtection => "secret_scanning_push_protection",
        }
    }
}

/// Authenticated entry point for the administrative operations.
#[derive(Debug)]
pub struct Api {
    session: Session,
}

impl Api {
    /// Wrap an already-authenticated session.
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Log a session in and wrap it in one step.
    pub async fn login<F>(mut session: Session, username: &str, password: &str, code: F) -> Result<Self>
    where
        F: FnOnce() -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>>,
    {
        session.login(username, password, code).await?;
        Ok(Self::new(session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create an organization on the free plan.
    ///
    /// Page: `account/organizations/new?plan=free`; form: `id="org-new-form"`.
    /// `org_name` becomes both the profile name and the login.
    pub async fn create_organization(
        &self,
        org_name: &str,
        billing_email: &str,
        usage: &OrganizationUsage,
    ) -> Result<Response> {
        info!(org_name, "creating organization");
        let mut overrides = vec![
            ("organization[profile_name]".to_string(), org_name.to_string()),
            ("organization[login]".to_string(), org_name.to_string()),
            ("organization[billing_email]".to_string(), billing_email.to_string()),
            (
                "terms_of_service_type".to_string(),
                usage.terms_of_service_type().to_string(),
            ),
            ("agreed_to_terms".to_string(), "yes".to_string()),
        ];
        if let OrganizationUsage::Business { company_name } = usage {
            overrides.push(("organization[company_name]".to_string(), company_name.clone()));
        }

        self.session
            .drive_form(
                self.session.url("account/organizations/new?plan=free")?,
                &FormPredicate::with_id("org-new-form"),
                &overrides,
            )
            .await
    }

    /// Install a GitHub App on the account or organization `target_id`,
    /// granting access to all repositories.
    ///
    /// Page: `apps/{app}/installations/new/permissions?target_id={id}`;
    /// the page carries a single install form.
    pub async fn install_application(&self, app_slug: &str, target_id: u64) -> Result<Response> {
        info!(app_slug, target_id, "installing application");
        self.session
            .drive_form(
                self.session.url(&format!(
                    "apps/{app_slug}/installations/new/permissions?target_id={target_id}"
                ))?,
                &FormPredicate::any(),
                &[("install_target".to_string(), "all".to_string())],
            )
            .await
    }

    /// Suspend an app installation in an organization.
    ///
    /// Page: `organizations/{org}/settings/installations/{id}`; form: the
    /// one whose action ends in `/suspended`. The unsuspend form on the
    /// same page ends in `/unsuspended` and does not match.
    pub async fn suspend_installation(&self, org: &str, installation_id: u64) -> Result<Response> {
        info!(org, installation_id, "suspending installation");
        self.session
            .drive_form(
                self.installation_url(org, installation_id)?,
                &FormPredicate::action_ends_with("/suspended"),
                &[],
            )
            .await
    }

    /// Lift a suspension placed by [`Api::suspend_installation`].
    pub async fn unsuspend_installation(
        &self,
        org: &str,
        installation_id: u64,
    ) -> Result<Response> {
        info!(org, installation_id, "unsuspending installation");
        self.session
            .drive_form(
                self.installation_url(org, installation_id)?,
                &FormPredicate::action_ends_with("/unsuspended"),
                &[],
            )
            .await
    }

    /// Approve an app's updated permission request for an organization.
    ///
    /// Page: `organizations/{org}/settings/installations/{id}/permissions/update`;
    /// form: action contains `permissions/update`. The hidden version
    /// fields the page embeds ride along as collected defaults.
    pub async fn approve_updated_permissions(
        &self,
        org: &str,
        installation_id: u64,
    ) -> Result<Response> {
        info!(org, installation_id, "approving updated permissions");
        self.session
            .drive_form(
                self.session.url(&format!(
                    "organizations/{org}/settings/installations/{installation_id}/permissions/update"
                ))?,
                &FormPredicate::action_contains("permissions/update"),
                &[],
            )
            .await
    }

    /// Request generation of a metered-usage report covering the last
    /// `days` days for an enterprise.
    ///
    /// Page: `enterprises/{slug}/settings/metered_exports`; form: action
    /// contains `metered_exports`.
    pub async fn request_usage_report(&self, enterprise: &str, days: u32) -> Result<Response> {
        info!(enterprise, days, "requesting usage report");
        self.session
            .drive_form(
                self.session
                    .url(&format!("enterprises/{enterprise}/settings/metered_exports"))?,
                &FormPredicate::action_contains("metered_exports"),
                &[("days".to_string(), days.to_string())],
            )
            .await
    }

    /// Download a previously requested usage report.
    ///
    /// A plain GET, no form involved; the body (CSV) comes back unmodified.
    pub async fn download_usage_report(&self, enterprise: &str, report_id: &str) -> Result<String> {
        info!(enterprise, report_id, "downloading usage report");
        let response = self
            .session
            .get_checked(self.session.url(&format!(
                "enterprises/{enterprise}/settings/metered_exports/{report_id}"
            ))?)
            .await?;
        Ok(response.text().await?)
    }

    /// Enable or disable a security-analysis feature for an organization.
    ///
    /// Page: `organizations/{org}/settings/security_analysis`. The page
    /// holds one toggle form per feature, all sharing the
    /// `js-setting-toggle` class, so the class alone is ambiguous; the
    /// predicate also requires the action to end with the feature's path
    /// segment. Confirm against live markup before relying on a feature
    /// not exercised by the tests.
    pub async fn set_security_analysis(
        &self,
        org: &str,
        feature: SecurityFeature,
        enabled: bool,
    ) -> Result<Response> {
        info!(org, feature = feature.slug(), enabled, "toggling security analysis");
        let predicate = FormPredicate::class_token("js-setting-toggle")
            .and(FormPredicate::action_ends_with(feature.slug()));
        self.session
            .drive_form(
                self.session
                    .url(&format!("organizations/{org}/settings/security_analysis"))?,
                &predicate,
                &[("enabled".to_string(), enabled.to_string())],
            )
            .await
    }

    fn installation_url(&self, org: &str, installation_id: u64) -> Result<url::Url> {
        self.session.url(&format!(
            "organizations/{org}/settings/installations/{installation_id}"
        ))
    }
}
