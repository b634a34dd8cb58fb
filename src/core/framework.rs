//! Target framework names.
//!
//! A framework is identified by an identifier (`.NETFramework`, `DNXCore`),
//! a version and an optional profile. Both the long form
//! (`.NETFramework,Version=v4.5,Profile=Client`) and short monikers
//! (`net45`, `dnx451`, `dnxcore50`) are accepted.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::core::version::parse_version_lenient;

pub const NET_FRAMEWORK: &str = ".NETFramework";
pub const ASP_NET: &str = "ASP.NET";
pub const DNX: &str = "DNX";
pub const DNX_CORE: &str = "DNXCore";
pub const NET_PLATFORM: &str = ".NETPlatform";
pub const NET_CORE: &str = ".NETCore";
pub const NET_PORTABLE: &str = ".NETPortable";

/// Short moniker prefixes, longest first so `dnxcore` wins over `dnx`.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("dnxcore", DNX_CORE),
    ("aspnetcore", DNX_CORE),
    ("aspnet", ASP_NET),
    ("dotnet", NET_PLATFORM),
    ("netcore", NET_CORE),
    ("portable", NET_PORTABLE),
    ("dnx", DNX),
    ("net", NET_FRAMEWORK),
];

/// Error parsing a framework name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target framework `{0}`")]
pub struct FrameworkError(pub String);

/// A target framework.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameworkName {
    identifier: String,
    version: Version,
    profile: Option<String>,
}

impl FrameworkName {
    /// Create a framework name from its parts.
    pub fn new(identifier: impl Into<String>, version: Version) -> Self {
        FrameworkName {
            identifier: identifier.into(),
            version,
            profile: None,
        }
    }

    /// Attach a profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Parse either a long-form framework name or a short moniker.
    pub fn parse(s: &str) -> Result<Self, FrameworkError> {
        let s = s.trim();
        if s.contains(',') || s.starts_with('.') {
            parse_long(s)
        } else {
            parse_short(s)
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Whether this is a full desktop framework.
    ///
    /// Desktop compilation implicitly sees `mscorlib`, `System`,
    /// `System.Core` and `Microsoft.CSharp`.
    pub fn is_desktop(&self) -> bool {
        matches!(self.identifier.as_str(), NET_FRAMEWORK | ASP_NET | DNX)
    }

    /// Short folder moniker such as `net45` or `dnxcore50`.
    pub fn short_name(&self) -> String {
        let prefix = SHORT_NAMES
            .iter()
            .find(|(_, id)| *id == self.identifier)
            .map(|(short, _)| *short)
            .unwrap_or(self.identifier.as_str());

        let mut name = format!("{}{}{}", prefix, self.version.major, self.version.minor);
        if self.version.patch != 0 {
            name.push_str(&self.version.patch.to_string());
        }
        if let Some(profile) = &self.profile {
            name.push('-');
            name.push_str(profile);
        }
        name
    }

    /// Version text the way framework folders spell it (`4.5`, `4.5.1`).
    pub fn version_string(&self) -> String {
        if self.version.patch == 0 {
            format!("{}.{}", self.version.major, self.version.minor)
        } else {
            format!(
                "{}.{}.{}",
                self.version.major, self.version.minor, self.version.patch
            )
        }
    }

    /// Whether something built for `self` can be consumed by `target`.
    pub fn is_compatible_with(&self, target: &FrameworkName) -> bool {
        if self.version > target.version {
            return false;
        }

        if self.identifier == target.identifier {
            return self.profile == target.profile || self.profile.is_none();
        }

        match (self.identifier.as_str(), target.identifier.as_str()) {
            // DNX on desktop runs full-framework libraries
            (NET_FRAMEWORK, DNX) | (NET_FRAMEWORK, ASP_NET) => true,
            (DNX, ASP_NET) | (ASP_NET, DNX) => true,
            (DNX_CORE, NET_CORE) | (NET_CORE, DNX_CORE) => true,
            _ => false,
        }
    }
}

/// Pick the candidate declared for the framework closest to `requested`.
///
/// An exact match wins. Otherwise the compatible candidate with the highest
/// version is chosen; `.NETPlatform` candidates are consulted last since they
/// are the least specific.
pub fn select_nearest<'a, T>(
    requested: &FrameworkName,
    candidates: impl IntoIterator<Item = (&'a FrameworkName, T)>,
) -> Option<T> {
    let mut best: Option<(&'a FrameworkName, T)> = None;
    let mut platform: Option<(&'a FrameworkName, T)> = None;

    for (framework, value) in candidates {
        if framework == requested {
            return Some(value);
        }

        if framework.identifier == NET_PLATFORM && requested.identifier != NET_PLATFORM {
            if !requested.is_desktop()
                && platform.as_ref().map_or(true, |(f, _)| framework.version > f.version)
            {
                platform = Some((framework, value));
            }
            continue;
        }

        if framework.is_compatible_with(requested)
            && best.as_ref().map_or(true, |(f, _)| framework.version > f.version)
        {
            best = Some((framework, value));
        }
    }

    best.or(platform).map(|(_, value)| value)
}

fn parse_long(s: &str) -> Result<FrameworkName, FrameworkError> {
    let invalid = || FrameworkError(s.to_string());

    let mut parts = s.split(',').map(str::trim);
    let identifier = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

    let mut version = None;
    let mut profile = None;
    for part in parts {
        let (key, value) = part.split_once('=').ok_or_else(invalid)?;
        match key.trim().to_ascii_lowercase().as_str() {
            "version" => {
                let value = value.trim();
                let value = value.strip_prefix(['v', 'V']).unwrap_or(value);
                version = Some(parse_version_lenient(value).ok_or_else(invalid)?);
            }
            "profile" => profile = Some(value.trim().to_string()).filter(|p| !p.is_empty()),
            _ => return Err(invalid()),
        }
    }

    Ok(FrameworkName {
        identifier: identifier.to_string(),
        version: version.ok_or_else(invalid)?,
        profile,
    })
}

fn parse_short(s: &str) -> Result<FrameworkName, FrameworkError> {
    let invalid = || FrameworkError(s.to_string());
    let lower = s.to_ascii_lowercase();

    let (name, profile) = match lower.split_once('-') {
        Some((name, profile)) => (name, Some(profile.to_string())),
        None => (lower.as_str(), None),
    };

    let (prefix, identifier) = SHORT_NAMES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .ok_or_else(invalid)?;
    let digits = &name[prefix.len()..];

    let version = if digits.is_empty() {
        // `dotnet` without a version means the 5.0 platform
        if *identifier == NET_PLATFORM {
            Version::new(5, 0, 0)
        } else {
            return Err(invalid());
        }
    } else if digits.contains('.') {
        parse_version_lenient(digits).ok_or_else(invalid)?
    } else {
        // One digit per component: `451` is 4.5.1
        let components = digits
            .chars()
            .map(|c| c.to_digit(10).map(u64::from))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        match components.as_slice() {
            [major] => Version::new(*major, 0, 0),
            [major, minor] => Version::new(*major, *minor, 0),
            [major, minor, patch] => Version::new(*major, *minor, *patch),
            _ => return Err(invalid()),
        }
    };

    Ok(FrameworkName {
        identifier: identifier.to_string(),
        version,
        profile,
    })
}

impl FromStr for FrameworkName {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FrameworkName::parse(s)
    }
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}", self.identifier, self.version_string())?;
        if let Some(profile) = &self.profile {
            write!(f, ",Profile={}", profile)?;
        }
        Ok(())
    }
}

impl Serialize for FrameworkName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.short_name())
    }
}

impl<'de> Deserialize<'de> for FrameworkName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FrameworkName::parse(&s).map_err(serde::de::Error::custom)
    }
}
