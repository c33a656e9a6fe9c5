//! Package spec parsing.
//!
//! A package can be named on the command line in three forms, all mapping
//! to an identifier (the path under `src/`) and a remote URL for the VCS
//! client:
//!
//! - `user@host:path[.git]`: identifier `host/path`, URL as given
//! - `https://host/path[.git]`: identifier `host/path`, URL as given
//! - `host/path`: identifier as given, URL `https://host/path`

use crate::error::{Error, Result};

/// A parsed package spec: the workspace identifier and the clone URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
  pub id: String,
  pub url: String,
}

impl PackageRef {
  pub fn parse(spec: &str) -> Result<Self> {
    if spec.is_empty() {
      return Err(Error::InvalidPackageSpec(spec.to_string()));
    }

    if let Some((_, rest)) = split_scp_like(spec) {
      let id = rest.replace(':', "/");
      return Ok(Self {
        id: strip_git_suffix(&id).to_string(),
        url: spec.to_string(),
      });
    }

    if let Some(rest) = spec.strip_prefix("https://").or_else(|| spec.strip_prefix("http://")) {
      let id = strip_git_suffix(rest);
      if !id.contains('/') {
        return Err(Error::InvalidPackageSpec(spec.to_string()));
      }
      return Ok(Self {
        id: id.to_string(),
        url: spec.to_string(),
      });
    }

    if spec.contains("://") || !spec.contains('/') {
      return Err(Error::InvalidPackageSpec(spec.to_string()));
    }

    Ok(Self {
      id: spec.to_string(),
      url: format!("https://{}", spec),
    })
  }
}

/// Splits `user@host:path` into `(user, "host:path")`. Returns None unless
/// the `@` comes before the `:`.
fn split_scp_like(spec: &str) -> Option<(&str, &str)> {
  let at = spec.find('@')?;
  let colon = spec.find(':')?;
  if at < colon {
    Some((&spec[..at], &spec[at + 1..]))
  } else {
    None
  }
}

fn strip_git_suffix(s: &str) -> &str {
  s.strip_suffix(".git").unwrap_or(s)
}
