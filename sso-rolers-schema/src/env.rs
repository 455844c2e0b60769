use chrono::SecondsFormat;

use crate::credentials::ProfileCredentials;

/// An environment variable to export, or to unset when `value` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentVariable<'a> {
    pub name: &'a str,
    pub value: Option<String>,
}

pub fn into_variables(credentials: &ProfileCredentials) -> Vec<EnvironmentVariable<'static>> {
    fn v<S: Into<String>>(name: &str, value: Option<S>) -> EnvironmentVariable {
        let value = value.map(|s| s.into());
        EnvironmentVariable { name, value }
    }

    let creds = &credentials.credentials;
    vec![
        // for AWS SDK, aws-cli
        v("AWS_PROFILE", Option::<String>::None),
        v("AWS_REGION", Some(credentials.region_name.as_str())),
        v("AWS_DEFAULT_REGION", Some(credentials.region_name.as_str())),
        v("AWS_ACCESS_KEY_ID", Some(creds.key())),
        v("AWS_SECRET_ACCESS_KEY", Some(creds.secret())),
        v("AWS_SESSION_TOKEN", Some(creds.token())),
        v(
            "AWS_SESSION_EXPIRATION",
            creds
                .expires_at()
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ),
    ]
}
