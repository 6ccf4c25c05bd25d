//! Hierarchical resource locators.
//!
//! A [`ResourceUri`] is the address of anything the loader can read: grammar
//! files, metamodel files, generator models. The interesting scheme is
//! `platform:/resource/<project>/<path>`, which addresses a file relative to
//! a named project root so that workflows stay portable across machines.
//! Plain relative and absolute file paths parse to scheme-less URIs.

use std::path::{Component, Path, PathBuf};

use smol_str::SmolStr;

use crate::base::constants::{PLATFORM_SCHEME, RESOURCE_SEGMENT};

/// A parsed hierarchical URI with an optional scheme and authority.
///
/// Parsing never fails; any string decomposes into scheme, authority, and
/// slash-separated segments. Empty segments are dropped, so `a//b` and
/// `a/b` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    scheme: Option<SmolStr>,
    authority: Option<SmolStr>,
    absolute: bool,
    segments: Vec<SmolStr>,
}

impl ResourceUri {
    pub fn parse(input: &str) -> Self {
        let mut rest = input;
        let mut scheme = None;
        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            if is_scheme(candidate) {
                scheme = Some(SmolStr::new(candidate));
                rest = &rest[colon + 1..];
            }
        }
        let mut authority = None;
        if let Some(stripped) = rest.strip_prefix("//") {
            match stripped.find('/') {
                Some(slash) => {
                    authority = Some(SmolStr::new(&stripped[..slash]));
                    rest = &stripped[slash..];
                }
                None => {
                    authority = Some(SmolStr::new(stripped));
                    rest = "";
                }
            }
        }
        let absolute = rest.starts_with('/');
        let segments = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(SmolStr::new)
            .collect();
        Self {
            scheme,
            authority,
            absolute,
            segments,
        }
    }

    /// A relative URI made of the given segments, with no scheme.
    pub fn relative_from<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            scheme: None,
            authority: None,
            absolute: false,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Convert a filesystem path into a scheme-less URI.
    pub fn from_path(path: &Path) -> Self {
        let segments = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(SmolStr::new(part.to_string_lossy())),
                _ => None,
            })
            .collect();
        Self {
            scheme: None,
            authority: None,
            absolute: path.is_absolute(),
            segments,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn is_relative(&self) -> bool {
        self.scheme.is_none() && !self.absolute
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(SmolStr::as_str)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(SmolStr::as_str)
    }

    /// The part of the last segment after its final `.`, if any.
    pub fn file_extension(&self) -> Option<&str> {
        self.last_segment()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
    }

    /// Whether this is a `platform:/resource/...` locator.
    pub fn is_platform_resource(&self) -> bool {
        self.scheme.as_deref() == Some(PLATFORM_SCHEME)
            && self.segments.first().map(SmolStr::as_str) == Some(RESOURCE_SEGMENT)
    }

    /// Project name of a `platform:/resource/<project>/...` locator.
    pub fn platform_project(&self) -> Option<&str> {
        if self.is_platform_resource() {
            self.segments.get(1).map(SmolStr::as_str)
        } else {
            None
        }
    }

    /// Drop the first `count` segments, yielding a relative URI.
    pub fn trim_leading_segments(&self, count: usize) -> ResourceUri {
        ResourceUri::relative_from(self.segments.iter().skip(count).cloned())
    }

    /// Express this URI relative to `base`, if `base` is a prefix of it.
    ///
    /// Both URIs must be absolute and agree on scheme and authority.
    pub fn deresolve(&self, base: &ResourceUri) -> Option<ResourceUri> {
        if self.scheme != base.scheme || self.authority != base.authority {
            return None;
        }
        if !self.absolute || !base.absolute {
            return None;
        }
        let prefix = base.segments.as_slice();
        if self.segments.len() < prefix.len() || &self.segments[..prefix.len()] != prefix {
            return None;
        }
        Some(ResourceUri::relative_from(
            self.segments[prefix.len()..].iter().cloned(),
        ))
    }

    /// Resolve this URI against `base`. Absolute URIs resolve to themselves;
    /// relative ones append to the base, folding `.` and `..` segments.
    pub fn resolve(&self, base: &ResourceUri) -> ResourceUri {
        if self.scheme.is_some() || self.absolute {
            return self.clone();
        }
        let mut segments = base.segments.clone();
        for segment in &self.segments {
            match segment.as_str() {
                "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(segment.clone()),
            }
        }
        ResourceUri {
            scheme: base.scheme.clone(),
            authority: base.authority.clone(),
            absolute: base.absolute,
            segments,
        }
    }

    /// Filesystem path equivalent of a scheme-less URI.
    pub fn to_file_path(&self) -> PathBuf {
        let mut path = if self.absolute {
            PathBuf::from("/")
        } else {
            PathBuf::new()
        };
        for segment in &self.segments {
            path.push(segment.as_str());
        }
        path
    }
}

impl std::fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = &self.authority {
            write!(f, "//{authority}")?;
        }
        if self.absolute {
            write!(f, "/")?;
        }
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl Default for ResourceUri {
    /// The empty relative URI.
    fn default() -> Self {
        ResourceUri::relative_from(Vec::<SmolStr>::new())
    }
}

impl From<&str> for ResourceUri {
    fn from(value: &str) -> Self {
        ResourceUri::parse(value)
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
