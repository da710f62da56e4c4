//! Command line interface.
//!
//! Three ways to get a [`Config`]:
//!
//! 1. a config file path argument, parsed and validated while clap
//!    parses the command line;
//! 2. `--tags` occurrences, building a config from defaults;
//! 3. neither: an editor opens on the default config for the user to
//!    fill in ([`Cli::resolve_config`]).

use std::path::PathBuf;

use clap::builder::{PathBufValueParser, TypedValueParser};
use clap::error::ErrorKind;
use clap::Command;
pub use clap::{CommandFactory, Parser};
use dialoguer::Editor;

use crate::config::{Config, Validate, DEFAULT_CONFIG_STR};

const EDITOR_EXTENSION: &str = ".toml";

/// [`clap`] command line interface.
///
/// # Example
///
/// ```no_run
/// use booru_fetch::cli::{Cli, CommandFactory as _, Parser as _};
///
/// let cli = Cli::parse();
/// let config = cli.resolve_config(&mut Cli::command())?;
/// # Ok::<(), clap::Error>(())
/// ```
#[non_exhaustive]
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// TOML config file to use. Omit it to configure via --tags or an editor.
    #[arg(value_name = "PATH")]
    #[arg(value_parser = PathBufValueParser::new().try_map(Self::load_config_file))]
    pub config: Option<Config>,

    /// One search attempt, e.g. "blue_sky -video". Repeat the flag for
    /// fallback searches; they are tried in the order given and replace
    /// the tag sets from the config file.
    #[arg(short, long, value_name = "TAGS")]
    pub tags: Vec<String>,

    /// Where to save the image, overriding the config file.
    #[arg(short, long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}

impl Cli {
    fn load_config_file(path: PathBuf) -> anyhow::Result<Config> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Combine the parsed arguments into one validated [`Config`].
    ///
    /// With neither a config file nor `--tags`, an editor is opened on
    /// the default config and the saved content is parsed instead.
    ///
    /// # Errors
    ///
    /// If the editor fails or its content is empty or invalid, or if
    /// the override flags produce an invalid config.
    pub fn resolve_config(self, cmd: &mut Command) -> Result<Config, clap::Error> {
        let Self {
            config,
            tags,
            download_dir,
        } = self;

        let mut config = match config {
            Some(config) => config,
            None if !tags.is_empty() => Config::default(),
            None => Self::config_from_editor(cmd)?,
        };

        if !tags.is_empty() {
            config.tag_sets = tags
                .iter()
                .map(|set| set.split_whitespace().map(str::to_owned).collect())
                .collect();
        }
        if let Some(download_dir) = download_dir {
            config.download_dir = download_dir;
        }

        match config.validate() {
            Ok(()) => Ok(config),
            Err(err) => Err(cmd.error(ErrorKind::ValueValidation, err)),
        }
    }

    fn config_from_editor(cmd: &mut Command) -> Result<Config, clap::Error> {
        let content = match Editor::new()
            .extension(EDITOR_EXTENSION)
            .edit(DEFAULT_CONFIG_STR)
        {
            Ok(Some(content)) => content,
            Ok(None) => {
                return Err(cmd.error(
                    ErrorKind::ValueValidation,
                    "empty content, maybe you forgot to save in the editor?",
                ))
            }
            Err(err) => return Err(cmd.error(ErrorKind::Io, err)),
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => Ok(config),
            Err(err) => Err(cmd.error(ErrorKind::ValueValidation, err)),
        }
    }
}
