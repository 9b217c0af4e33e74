use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process;

use engine::{ConfigError, Options};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) const HELP_TEXT: &str = "\
typist: type and delete strings in the terminal

USAGE:
    typist [OPTIONS] [STRING]...

OPTIONS:
    --config=PATH         Read options from a TOML file
    --speed=MS            Type pace in milliseconds
    --loop                Replay forever
    --input               Type into a flat input field; markup is shown literally
    --exit-after-ms=MS    Destroy the instance after MS milliseconds
    -h, --help            Show this help
    -V, --version         Show the version

ENVIRONMENT:
    TYPIST_CONFIG         Same as --config
    TYPIST_EXIT_AFTER_MS  Same as --exit-after-ms
    TYPIST_LOG            Log filter for stderr, e.g. debug or typist.engine=trace";

const SAMPLE: &str = "Hi, <strong class='t'>Bob!</strong> <em>Goodbye&nbsp;for now</em>";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Opts {
    pub config: Option<PathBuf>,
    pub strings: Vec<String>,
    pub speed: Option<u64>,
    pub looping: bool,
    pub input: bool,
    pub exit_after_ms: u64,
}

#[derive(Debug)]
pub enum DemoError {
    Read { path: PathBuf, source: std::io::Error },
    Config(ConfigError),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            DemoError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::Read { source, .. } => Some(source),
            DemoError::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for DemoError {
    fn from(err: ConfigError) -> Self {
        DemoError::Config(err)
    }
}

impl Opts {
    /// Parse the process arguments. Flags override environment variables.
    pub fn parse() -> Self {
        let mut opts = Self::default();
        if let Ok(val) = env::var("TYPIST_CONFIG") {
            opts.config = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("TYPIST_EXIT_AFTER_MS")
            && let Ok(n) = val.parse()
        {
            opts.exit_after_ms = n;
        }
        match opts.apply_args(env::args().skip(1)) {
            Ok(Some(opts)) => opts,
            Ok(None) => process::exit(0),
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// `Ok(None)` when the arguments asked for help or version output, already printed.
    fn apply_args(mut self, args: impl IntoIterator<Item = String>) -> Result<Option<Self>, String> {
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => {
                    println!("{HELP_TEXT}");
                    return Ok(None);
                }
                "--version" | "-V" => {
                    println!("typist {VERSION}");
                    return Ok(None);
                }
                "--loop" => self.looping = true,
                "--input" => self.input = true,
                other => {
                    if let Some(val) = other.strip_prefix("--config=") {
                        self.config = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--speed=") {
                        let n = val.parse().map_err(|_| format!("Invalid --speed value: {val}"))?;
                        self.speed = Some(n);
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        self.exit_after_ms = val
                            .parse()
                            .map_err(|_| format!("Invalid --exit-after-ms value: {val}"))?;
                    } else if other.starts_with("--") {
                        return Err(format!("Unknown argument: {other}"));
                    } else {
                        self.strings.push(other.to_string());
                    }
                }
            }
        }
        Ok(Some(self))
    }

    /// Options from the config file, if any, with command-line overrides on top.
    pub fn load_options(&self) -> Result<Options, DemoError> {
        let mut options = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| DemoError::Read {
                    path: path.clone(),
                    source,
                })?;
                Options::from_toml_str(&raw)?
            }
            None => Options::default(),
        };
        if !self.strings.is_empty() {
            options.strings = self.strings.clone();
        }
        if options.strings.is_empty() {
            options.strings = vec![SAMPLE.to_string()];
        }
        if let Some(speed) = self.speed {
            options.speed = speed;
        }
        if self.looping {
            options.looping = true;
        }
        Ok(options)
    }
}
