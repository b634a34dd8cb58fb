//! Compilation targets.

use std::fmt;

use crate::core::framework::FrameworkName;

/// The unit an export or compile is produced for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilationTarget {
    name: String,
    framework: FrameworkName,
    configuration: String,
    aspect: Option<String>,
}

impl CompilationTarget {
    pub fn new(
        name: impl Into<String>,
        framework: FrameworkName,
        configuration: impl Into<String>,
    ) -> Self {
        CompilationTarget {
            name: name.into(),
            framework,
            configuration: configuration.into(),
            aspect: None,
        }
    }

    /// Target a build variant of the project, such as `test`.
    pub fn with_aspect(mut self, aspect: Option<&str>) -> Self {
        self.aspect = aspect.map(str::to_string);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn framework(&self) -> &FrameworkName {
        &self.framework
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn aspect(&self) -> Option<&str> {
        self.aspect.as_deref()
    }
}

impl fmt::Display for CompilationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(aspect) = &self.aspect {
            write!(f, "!{}", aspect)?;
        }
        write!(f, " ({}, {})", self.framework.short_name(), self.configuration)
    }
}
