use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::infra::sems::BaseUrls;
use crate::services::{Credentials, Region};

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// SEMS connection settings read from the environment.
///
/// | Variable            | Default   |
/// |---------------------|-----------|
/// | `SEMS_ACCOUNT`      | required for live calls |
/// | `SEMS_PASSWORD`     | required for live calls |
/// | `SEMS_LOGIN_REGION` | `SEMS_REGION`, then `us` |
/// | `SEMS_DATA_REGION`  | `eu`      |
/// | `SEMS_BASE_URL`     | per-region portal host |
/// | `SEMS_TIMEOUT_SECS` | `20`      |
#[derive(Clone)]
pub struct SemsConfig {
    pub account: Option<String>,
    pub password: Option<String>,
    pub login_region: Region,
    pub data_region: Region,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl SemsConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let login_region = match get("SEMS_LOGIN_REGION").or_else(|| get("SEMS_REGION")) {
            Some(r) => r.parse().map_err(anyhow::Error::msg).context("SEMS_LOGIN_REGION")?,
            None => Region::Us,
        };
        let data_region = match get("SEMS_DATA_REGION") {
            Some(r) => r.parse().map_err(anyhow::Error::msg).context("SEMS_DATA_REGION")?,
            None => Region::Eu,
        };
        let timeout = match get("SEMS_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SEMS_TIMEOUT_SECS is not a number: '{s}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            account: get("SEMS_ACCOUNT"),
            password: get("SEMS_PASSWORD"),
            login_region,
            data_region,
            base_url: get("SEMS_BASE_URL"),
            timeout: Duration::from_secs(timeout),
        })
    }

    /// Credentials for live calls; fails when account or password is unset.
    pub fn credentials(&self) -> Result<Credentials> {
        let (Some(account), Some(password)) = (&self.account, &self.password) else {
            bail!("Set SEMS_ACCOUNT and SEMS_PASSWORD in the environment");
        };
        Ok(Credentials {
            account: account.clone(),
            password: password.clone(),
            login_region: self.login_region,
            data_region: self.data_region,
        })
    }

    pub fn base_urls(&self) -> BaseUrls {
        match &self.base_url {
            Some(url) => BaseUrls::single(url.as_str()),
            None => BaseUrls::default(),
        }
    }
}

impl fmt::Debug for SemsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemsConfig")
            .field("account", &self.account)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("login_region", &self.login_region)
            .field("data_region", &self.data_region)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
