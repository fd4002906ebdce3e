use h2fuzz::FuzzError;

/// Invalid command line or configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `--test` or `--ratio` value with more than one colon
    TooManyColons {
        option: &'static str,
        value:  String,
    },
    /// A part of an option value is not a number
    InvalidNumber {
        option: &'static str,
        value:  String,
    },
    /// TLS was requested but is not supported
    TlsUnsupported,
    /// No frame fuzzer was enabled on the command line
    NoFuzzersEnabled,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyColons { option, value } => {
                write!(f, "could not parse {option} value {value:?}, too many colons")
            },
            Self::InvalidNumber { option, value } => {
                write!(f, "could not parse {option} value {value:?}, not a number")
            },
            Self::TlsUnsupported => write!(f, "TLS is not supported"),
            Self::NoFuzzersEnabled => write!(f, "no fuzzer enabled"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Anything that stops a fuzzing run
#[derive(Debug)]
pub enum RunnerError {
    Io(std::io::Error),
    Fuzz(FuzzError),
    Config(ConfigError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Fuzz(err) => write!(f, "fuzzer error: {err}"),
            Self::Config(err) => write!(f, "configuration error: {err}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fuzz(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FuzzError> for RunnerError {
    fn from(err: FuzzError) -> Self {
        Self::Fuzz(err)
    }
}

impl From<ConfigError> for RunnerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
