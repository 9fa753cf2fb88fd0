use std::fmt;
use std::path::PathBuf;

use formstep_types::{FormDefinition, SchemaError};

use crate::client::FormsClient;

/// Where a form definition comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A JSON file on disk.
    File(PathBuf),
    /// A JSON document at a URL, or a path relative to the backend base URL.
    Url(String),
    /// A definition stored in the backend under a slug.
    Remote(String),
    /// One of the definitions shipped with the binary, by id, title or form type.
    Bundled(String),
}

impl SchemaSource {
    /// Load and validate the definition.
    ///
    /// `bundled` is searched for `Bundled` sources; the client is used for
    /// `Url` and `Remote`. Every failure is a `SchemaError`, with fetch and
    /// read failures wrapped as `SchemaError::Load`.
    pub fn load(
        &self,
        client: &FormsClient,
        bundled: &[FormDefinition],
    ) -> Result<FormDefinition, SchemaError> {
        tracing::debug!(source = %self, "loading form definition");
        let origin = self.to_string();
        match self {
            Self::File(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|err| SchemaError::load(origin, err))?;
                FormDefinition::from_json(&json)
            }
            Self::Url(url) => client.definition_at(url).map_err(|err| match err {
                crate::client::ClientError::Schema(schema) => schema,
                other => SchemaError::load(origin, other),
            }),
            Self::Remote(slug) => client.definition(slug).map_err(|err| match err {
                crate::client::ClientError::Schema(schema) => schema,
                other => SchemaError::load(origin, other),
            }),
            Self::Bundled(name) => find_bundled(bundled, name).cloned().ok_or_else(|| {
                SchemaError::load(origin, anyhow::anyhow!("no bundled form named '{name}'"))
            }),
        }
    }
}

/// Find a bundled definition by id, title or form type, ignoring case.
pub fn find_bundled<'a>(bundled: &'a [FormDefinition], name: &str) -> Option<&'a FormDefinition> {
    let wanted = name.trim().to_lowercase();
    bundled.iter().find(|def| {
        def.id().is_some_and(|id| id.to_lowercase() == wanted)
            || def.title().to_lowercase() == wanted
            || def.form_type() == wanted
    })
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Url(url) => write!(f, "url {url}"),
            Self::Remote(slug) => write!(f, "backend definition '{slug}'"),
            Self::Bundled(name) => write!(f, "bundled form '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstep_types::{FieldKind, FormItem};
    use std::io::Write;

    fn bundled() -> Vec<FormDefinition> {
        vec![
            FormDefinition::from_items("Weekly Report", vec![FormItem::new("Name", FieldKind::Text)])
                .unwrap()
                .with_id("weekly"),
        ]
    }

    fn offline_client() -> FormsClient {
        FormsClient::new("http://127.0.0.1:9").unwrap()
    }

    #[test]
    fn bundled_lookup_by_any_name() {
        let forms = bundled();
        for name in ["weekly", "Weekly Report", "weekly-report", " WEEKLY "] {
            assert!(find_bundled(&forms, name).is_some(), "{name}");
        }
        assert!(find_bundled(&forms, "monthly").is_none());
    }

    #[test]
    fn missing_bundled_is_a_load_error() {
        let err = SchemaSource::Bundled("monthly".into())
            .load(&offline_client(), &bundled())
            .unwrap_err();
        assert!(matches!(err, SchemaError::Load { .. }));
    }

    #[test]
    fn loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "title": "Poll", "items": [ {{ "title": "Q", "type": "text" }} ] }}"#
        )
        .unwrap();
        let def = SchemaSource::File(file.path().to_path_buf())
            .load(&offline_client(), &[])
            .unwrap();
        assert_eq!(def.title(), "Poll");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = SchemaSource::File("/definitely/not/here.json".into())
            .load(&offline_client(), &[])
            .unwrap_err();
        assert!(err.to_string().starts_with("Could not load form definition from file"));
    }

    #[test]
    fn invalid_file_is_a_schema_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "title": "Empty" }}"#).unwrap();
        let err = SchemaSource::File(file.path().to_path_buf())
            .load(&offline_client(), &[])
            .unwrap_err();
        assert!(matches!(err, SchemaError::NoSections { .. }));
    }
}
