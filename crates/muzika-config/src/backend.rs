use crate::io::atomic_write_str;
use crate::paths::{ConfigError, MuzikaPaths};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;

/// Escritura con toml_edit para preservar comentarios del usuario.
use toml_edit::{DocumentMut, Item};

pub trait ConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError>;
  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError>;
}

pub struct TomlConfigBackend {
  paths: MuzikaPaths,
}

impl TomlConfigBackend {
  pub fn new(paths: MuzikaPaths) -> Self {
    Self { paths }
  }

  /// Como `load_section`, pero un archivo o sección ausente da `T::default()`.
  pub fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default,
  {
    use std::io::ErrorKind;

    let path = self.paths.config_file();
    let content = match fs::read_to_string(&path) {
      Ok(c) => c,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Ok(T::default());
      }
      Err(e) => return Err(e.into()),
    };

    let doc: toml::Table = toml::from_str(&content)?;

    let Some(table) = doc.get(section) else {
      return Ok(T::default());
    };

    decode_section(section, table)
  }
}

fn decode_section<T: DeserializeOwned>(section: &str, value: &toml::Value) -> Result<T, ConfigError> {
  value.clone().try_into().map_err(|e| ConfigError::Other(format!("decode section [{section}]: {e}")))
}

impl ConfigBackend for TomlConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
    let path = self.paths.config_file();
    let content = fs::read_to_string(&path)?;
    let doc: toml::Table = toml::from_str(&content)?;

    let table = doc
      .get(section)
      .ok_or_else(|| ConfigError::Other(format!("missing section [{section}] in {:?}", path)))?;

    decode_section(section, table)
  }

  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError> {
    use std::io::ErrorKind;

    let path = self.paths.config_file();

    // 1) Leer config actual como DocumentMut o crear doc vacío si no existe.
    let mut doc: DocumentMut = match fs::read_to_string(&path) {
      Ok(content) => content
        .parse::<DocumentMut>()
        .map_err(|e| ConfigError::Other(format!("parse toml_edit doc: {e}")))?,
      Err(e) if e.kind() == ErrorKind::NotFound => DocumentMut::new(),
      Err(e) => return Err(e.into()),
    };

    // 2) Serializar la sección con `toml` (serde). Sale sin cabecera:
    //      "foo = 1\nbar = 2\n"
    let section_str = toml::to_string(value)
      .map_err(|e| ConfigError::Other(format!("encode section [{section}]: {e}")))?;

    // 3) Convertirla en `Item` (tabla) para insertarla en el documento.
    let section_item: Item = section_str
      .parse::<DocumentMut>()
      .map_err(|e| ConfigError::Other(format!("parse section as doc: {e}")))?
      .into_item();

    // 4) Reemplazar sólo esa sección; el resto del documento queda igual.
    doc[section] = section_item;

    atomic_write_str(&path, &doc.to_string())?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;
  use tempfile::tempdir;

  #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
  struct Sample {
    #[serde(default)]
    retries: u32,
    #[serde(default)]
    name: String,
  }

  fn backend() -> (tempfile::TempDir, TomlConfigBackend) {
    let tmp = tempdir().unwrap();
    let paths = MuzikaPaths::at(tmp.path()).unwrap();
    (tmp, TomlConfigBackend::new(paths))
  }

  #[test]
  fn missing_file_yields_default() {
    let (_tmp, backend) = backend();
    let loaded: Sample = backend.load_section_with_default("sample").unwrap();
    assert_eq!(loaded, Sample::default());
  }

  #[test]
  fn missing_section_is_an_error_without_default() {
    let (_tmp, backend) = backend();
    backend.save_section("other", &Sample::default()).unwrap();

    let err = backend.load_section::<Sample>("sample").unwrap_err();
    assert!(matches!(err, ConfigError::Other(_)));
  }

  #[test]
  fn saved_section_loads_back() {
    let (_tmp, backend) = backend();
    let value = Sample { retries: 5, name: "muzika".into() };

    backend.save_section("sample", &value).unwrap();

    assert_eq!(backend.load_section::<Sample>("sample").unwrap(), value);
  }

  #[test]
  fn save_preserves_other_sections_and_comments() {
    let (tmp, backend) = backend();
    let path = tmp.path().join("config").join("muzika.toml");
    fs::write(&path, "# editado a mano\n[other]\nretries = 9\n").unwrap();

    backend.save_section("sample", &Sample { retries: 1, name: String::new() }).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("# editado a mano"));
    assert_eq!(backend.load_section::<Sample>("other").unwrap().retries, 9);
    assert_eq!(backend.load_section::<Sample>("sample").unwrap().retries, 1);
  }
}
