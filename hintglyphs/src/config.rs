//! The TOML run configuration.
//!
//! ```toml
//! [options]
//! force = true
//!
//! [[fd]]
//! name = "latin"
//! h_stems = [70]
//! v_stems = [85]
//! zones = [
//!     { bottom = -15, top = 0, kind = "bottom" },
//!     { bottom = 500, top = 515, kind = "top" },
//! ]
//! ```
//!
//! Glyphs use the first FdDict unless they name another.

use std::{path::Path, sync::Arc};

use serde::Deserialize;
use stemhint::{FdDict, HintOptions};

use crate::error::CliError;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub options: HintOptions,
    #[serde(default, rename = "fd")]
    pub fds: Vec<FdDict>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| CliError::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// The FdDicts of a run, shared between the tasks that use them.
    pub fn shared_fds(&self) -> Result<FdTable, CliError> {
        if self.fds.is_empty() {
            return Err(CliError::NoFdDicts);
        }
        Ok(FdTable(self.fds.iter().cloned().map(Arc::new).collect()))
    }
}

pub struct FdTable(Vec<Arc<FdDict>>);

impl FdTable {
    pub fn get(&self, glyph: &str, name: Option<&str>) -> Result<Arc<FdDict>, CliError> {
        let fd = match name {
            None => self.0.first(),
            Some(name) => self.0.iter().find(|fd| fd.name == name),
        };
        fd.cloned().ok_or_else(|| CliError::UnknownFd {
            glyph: glyph.to_string(),
            fd: name.unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stemhint::{AlignmentZone, OverlapPolicy};

    #[test]
    fn parse_config() {
        let config: Config = toml::from_str(
            r#"
            [options]
            force = true
            overlap = "never"
            glyphs = ["a", "b"]

            [[fd]]
            name = "latin"
            h_stems = [70]
            v_stems = [85]
            zones = [
                { bottom = -15, top = 0, kind = "bottom" },
                { bottom = 500, top = 515, kind = "top" },
            ]

            [[fd]]
            name = "figures"
            v_stems = [90]
            "#,
        )
        .unwrap();
        assert!(config.options.force);
        assert_eq!(config.options.overlap, OverlapPolicy::Never);
        assert!(config.options.selects("a"));
        assert!(!config.options.selects("c"));
        // unset options keep their defaults
        assert!(config.options.hint_substitution);
        assert_eq!(
            config.fds[0].zones,
            [
                AlignmentZone::bottom(-15.0, 0.0),
                AlignmentZone::top(500.0, 515.0)
            ]
        );
        assert_eq!(config.fds[1].v_stems, [90.0]);
        assert!(config.fds[1].v_counter_glyphs.contains("m"));

        let fds = config.shared_fds().unwrap();
        assert_eq!(fds.get("a", None).unwrap().name, "latin");
        assert_eq!(fds.get("one", Some("figures")).unwrap().name, "figures");
        assert!(matches!(
            fds.get("a", Some("greek")),
            Err(CliError::UnknownFd { .. })
        ));
    }

    #[test]
    fn fds_required() {
        let config: Config = toml::from_str("[options]\nforce = true\n").unwrap();
        assert!(matches!(config.shared_fds(), Err(CliError::NoFdDicts)));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<Config>("[option]\nforce = true\n").is_err());
    }
}
