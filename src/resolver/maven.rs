//! Maven repository coordinates.

use std::fmt;
use std::str::FromStr;

use crate::resolver::errors::ResolveError;

pub const CENTRAL: &str = "https://repo.maven.apache.org/maven2";

/// `group:artifact:version[:classifier]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
}

impl Coordinates {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Coordinates {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
        }
    }

    /// Set a classifier; an empty one means none.
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        let classifier = classifier.into();
        self.classifier = (!classifier.is_empty()).then_some(classifier);
        self
    }

    /// URI of the jar file in `repository`.
    pub fn to_uri(&self, repository: &str) -> String {
        let file = match &self.classifier {
            Some(classifier) => format!("{}-{}-{}.jar", self.artifact, self.version, classifier),
            None => format!("{}-{}.jar", self.artifact, self.version),
        };
        format!(
            "{}/{}/{}/{}/{}",
            repository.trim_end_matches('/'),
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            file
        )
    }
}

impl FromStr for Coordinates {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let invalid = || ResolveError::InvalidCoordinates {
            coordinates: s.to_string(),
        };
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [group, artifact, version] => Ok(Coordinates::new(*group, *artifact, *version)),
            [group, artifact, version, classifier] => {
                Ok(Coordinates::new(*group, *artifact, *version).with_classifier(*classifier))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_uri() {
        let coordinates: Coordinates = "org.junit.jupiter:junit-jupiter-api:5.10.2"
            .parse()
            .unwrap();
        assert_eq!(
            coordinates.to_uri(CENTRAL),
            concat!(
                "https://repo.maven.apache.org/maven2/",
                "org/junit/jupiter/junit-jupiter-api/5.10.2/junit-jupiter-api-5.10.2.jar"
            )
        );
    }

    #[test]
    fn test_classifier_uri() {
        let coordinates =
            Coordinates::new("org.openjfx", "javafx-base", "21").with_classifier("linux");
        assert_eq!(
            coordinates.to_uri("https://mirror.example/m2/"),
            "https://mirror.example/m2/org/openjfx/javafx-base/21/javafx-base-21-linux.jar"
        );
        assert_eq!(coordinates.to_string(), "org.openjfx:javafx-base:21:linux");
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!("a:b".parse::<Coordinates>().is_err());
        assert!("a::c".parse::<Coordinates>().is_err());
        assert!("a:b:c:d:e".parse::<Coordinates>().is_err());
    }
}
