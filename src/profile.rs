use std::collections::BTreeMap;

pub mod load;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub sso_start_url: Option<String>,
    pub sso_region: Option<String>,
    pub sso_account_id: Option<String>,
    pub sso_role_name: Option<String>,
    pub region_name: Option<String>,
    pub credential_process: Option<String>,
}

/// The settings an SSO profile needs to issue credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoProfile {
    pub name: String,
    pub start_url: String,
    pub region: String,
    pub account_id: String,
    pub role_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Sso(SsoProfile),
    Process(String),
    Unknown,
}

impl Profile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_sso_profile(&self) -> bool {
        self.sso_start_url().is_some()
    }

    pub fn sso_start_url(&self) -> Option<&str> {
        self.sso_start_url.as_deref().filter(|s| !s.is_empty())
    }

    pub fn sso_region(&self) -> Option<&str> {
        self.sso_region.as_deref()
    }

    pub fn sso_account_id(&self) -> Option<&str> {
        self.sso_account_id.as_deref()
    }

    pub fn sso_role_name(&self) -> Option<&str> {
        self.sso_role_name.as_deref()
    }

    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    pub fn credential_process(&self) -> Option<&str> {
        self.credential_process.as_deref()
    }

    pub fn kind(&self) -> ProfileKind {
        if let Some(start_url) = self.sso_start_url() {
            ProfileKind::Sso(SsoProfile {
                name: self.name.clone(),
                start_url: start_url.to_string(),
                region: self.sso_region().unwrap_or_default().to_string(),
                account_id: self.sso_account_id().unwrap_or_default().to_string(),
                role_name: self.sso_role_name().unwrap_or_default().to_string(),
            })
        } else if let Some(command) = self.credential_process() {
            ProfileKind::Process(command.to_string())
        } else {
            ProfileKind::Unknown
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    pub profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    pub fn get_profile(&self, profile_name: &str) -> Option<&Profile> {
        self.profiles.get(profile_name)
    }
}
