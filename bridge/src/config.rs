//! Bridge configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::router::PublicCallEntry;

/// Configuration for the bridge runtime.
///
/// Every field has a default, so an embedding application can deserialize a
/// partial document and get the rest filled in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory holding `<name>.txt` codepage tables.
    /// Default: `codepages`.
    pub codepage_dir: PathBuf,

    /// Codepage to load at startup. `None` keeps the built-in cp1252 table.
    pub codepage: Option<String>,

    /// File that unhandled handler errors are appended to.
    pub error_log_path: Option<PathBuf>,

    /// Return code for public calls that were not handled.
    pub not_handled_code: i32,

    /// Maximum arguments in one native call.
    pub max_native_args: usize,

    /// Maximum parameters in one public call.
    pub max_callback_params: usize,

    /// Public call entries added on top of the built-in hooks.
    pub public_calls: Vec<PublicCallEntry>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            codepage_dir: PathBuf::from("codepages"),
            codepage: None,
            error_log_path: None,
            not_handled_code: 0,
            max_native_args: 32,
            max_callback_params: 16,
            public_calls: Vec::new(),
        }
    }
}
