//! Credentials for fetching protected manifests

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use manifest::Credentials;
use regex::Regex;
use std::sync::LazyLock;

static DOMAIN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://(?:[^/@]*@)?([^/:?#]+)").ok());

/// Host part of a URI, used to tell the user what they are logging in to
pub fn parse_domain(uri: &str) -> Option<&str> {
    DOMAIN
        .as_ref()?
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Credentials given on the command line, possibly incomplete
#[derive(Debug, Default, Clone)]
pub struct Supplied {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Ask for whatever is missing even if no username was given
    pub auth: bool,
}

impl Supplied {
    /// Whether any credentials should be sent at all
    pub fn wanted(&self) -> bool {
        self.auth || self.username.is_some()
    }
}

/// Complete `supplied` for `target`, prompting for what is missing
///
/// Returns `None` unless `--auth` or `--username` was given.
pub fn resolve(supplied: &Supplied, target: &str) -> Result<Option<Credentials>> {
    if !supplied.wanted() {
        return Ok(None);
    }
    let domain = parse_domain(target).unwrap_or(target);

    let username = match &supplied.username {
        Some(username) => username.clone(),
        None => Input::new()
            .with_prompt(format!("Username for {domain}"))
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = match &supplied.password {
        Some(password) => password.clone(),
        None => Password::new()
            .with_prompt(format!("Password for {username}@{domain}"))
            .interact()
            .context("Failed to read password")?,
    };

    Ok(Some(Credentials::new(username, password)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain() {
        assert_eq!(
            parse_domain("https://example.com/envs/tools.cfg"),
            Some("example.com")
        );
        assert_eq!(
            parse_domain("http://user@internal.corp:8080/x.cfg"),
            Some("internal.corp")
        );
        assert_eq!(parse_domain("https://example.com"), Some("example.com"));
        assert_eq!(parse_domain("/home/me/tools.cfg"), None);
        assert_eq!(parse_domain("tools.cfg"), None);
    }

    #[test]
    fn test_resolve_without_flags_is_none() {
        let supplied = Supplied {
            password: Some("secret".into()),
            ..Supplied::default()
        };
        assert!(resolve(&supplied, "https://example.com/x.cfg").unwrap().is_none());
    }

    #[test]
    fn test_resolve_complete_does_not_prompt() {
        let supplied = Supplied {
            username: Some("me".into()),
            password: Some("secret".into()),
            auth: false,
        };
        let creds = resolve(&supplied, "https://example.com/x.cfg")
            .unwrap()
            .unwrap();
        assert_eq!(creds.username, "me");
        assert_eq!(creds.password, "secret");
    }
}
