use std::{fmt::Display, path::Path, str::FromStr};

use regex_lite::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("`{0}` is not a valid source URI (expected scheme://location[#fragment])")]
    InvalidUri(String),
}

/// A declared build-source reference: `scheme://location[#fragment]`.
///
/// The scheme may carry a marker prefix (`git+ssh`, `svn+https`, ...) that is
/// used only to route dispatch; it is stripped before the URI is handed to any
/// external tool. The fragment selects a branch or tag for distributed VCS
/// sources and a revision for subversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUri {
    scheme: String,
    location: String,
    fragment: Option<String>,
}

impl SourceUri {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The scheme used to select a resolver: the marker prefix if one is
    /// present (`git+ssh` dispatches on `git`), the plain scheme otherwise.
    pub fn dispatch_scheme(&self) -> &str {
        match self.scheme.split_once('+') {
            Some((marker, _)) => marker,
            None => &self.scheme,
        }
    }

    /// The scheme with any marker prefix stripped: `git+ssh` carries its
    /// payload over `ssh`.
    pub fn transport_scheme(&self) -> &str {
        match self.scheme.split_once('+') {
            Some((_, transport)) => transport,
            None => &self.scheme,
        }
    }

    /// The form passed to external tools: marker stripped, no fragment.
    pub fn remote_url(&self) -> String {
        format!("{}://{}", self.transport_scheme(), self.location)
    }

    /// The URI interpreted as a local filesystem path.
    pub fn local_path(&self) -> &Path {
        Path::new(&self.location)
    }

    /// Rewrite the scheme to the canonical name of the tool that services
    /// this URI. Cache keys are derived from this form so that marker
    /// spelling variants of the same repository land in the same staging
    /// subdirectory.
    pub fn normalized(&self, canonical_scheme: &str) -> SourceUri {
        SourceUri {
            scheme: canonical_scheme.to_owned(),
            location: self.location.clone(),
            fragment: self.fragment.clone(),
        }
    }

    pub fn without_fragment(&self) -> SourceUri {
        SourceUri {
            scheme: self.scheme.clone(),
            location: self.location.clone(),
            fragment: None,
        }
    }
}

impl FromStr for SourceUri {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let re: Regex = Regex::new(
            r"^(?P<scheme>[a-zA-Z][a-zA-Z0-9+.-]*)://(?P<location>[^#]*)(?:#(?P<fragment>.+))?$",
        )
        .unwrap();
        let captures = re
            .captures(value)
            .ok_or_else(|| ParseError::InvalidUri(value.to_owned()))?;

        Ok(SourceUri {
            scheme: captures["scheme"].to_owned(),
            location: captures["location"].to_owned(),
            fragment: captures.name("fragment").map(|m| m.as_str().to_owned()),
        })
    }
}

impl Display for SourceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.location)?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}
