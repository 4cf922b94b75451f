use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

/// Coordinates of a GitHub repository. Owner and name are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    owner: String,
    name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() || name.is_empty() {
            bail!("repository owner and name must not be empty");
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Repository {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let Some((owner, name)) = raw.split_once('/') else {
            bail!("expected owner/name in repository: {raw}");
        };
        if name.contains('/') {
            bail!("too many '/' in repository: {raw}");
        }
        Self::new(owner, name).map_err(|e| e.context(format!("invalid repository: {raw}")))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
