use std::path::{Path, PathBuf};

use crate::error::EvalError;

pub const DATA_DIR_VAR: &str = "KITS21_DATA_DIR";
pub const TEST_DIR_VAR: &str = "KITS21_TEST_DIR";

/// Data roots known to the process. Built once at startup and handed to
/// whatever needs a path; optional roots are checked where they are used.
#[derive(Debug, Clone)]
pub struct Roots {
    pub training: PathBuf,
    pub testing: Option<PathBuf>,
}

impl Roots {
    pub fn from_env(data_override: Option<&Path>) -> Self {
        let training = match data_override {
            Some(path) => path.to_path_buf(),
            None => env_path(DATA_DIR_VAR).unwrap_or_else(|| PathBuf::from("data")),
        };
        Self {
            training,
            testing: env_path(TEST_DIR_VAR),
        }
    }

    pub fn new(training: PathBuf) -> Self {
        Self {
            training,
            testing: None,
        }
    }

    pub fn require_testing(&self) -> Result<&Path, EvalError> {
        self.testing
            .as_deref()
            .ok_or(EvalError::MissingRoot { var: TEST_DIR_VAR })
    }

    pub fn data_root(&self, test_set: bool) -> Result<&Path, EvalError> {
        if test_set {
            self.require_testing()
        } else {
            Ok(&self.training)
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
