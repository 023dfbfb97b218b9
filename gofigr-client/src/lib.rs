//! HTTP client for the GoFigr service.
//!
//! - [`ClientConfig`]: connection settings layered from code, `GF_*`
//!   environment variables and `~/.gofigr`
//! - [`HttpTransport`]: the blocking REST [`Transport`](gofigr_model::Transport)
//! - [`JwtAuth`]: username/password login with token refresh
//! - [`GoFigr`]: the connected client, entry point to workspaces and API keys
//!
//! ```no_run
//! use gofigr_client::{ClientConfig, GoFigr};
//!
//! # fn main() -> gofigr_client::ClientResult<()> {
//! let gf = GoFigr::connect(ClientConfig::load()?)?;
//! if let Some(workspace) = gf.primary_workspace()? {
//!     let analysis = workspace.get_analysis("Dose response", true)?;
//!     let _figure = analysis.get_figure("IC50 curve", true)?;
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod http;
mod user;

pub use auth::JwtAuth;
pub use client::GoFigr;
pub use config::{ClientConfig, CONFIG_FILE_NAME, DEFAULT_API_VERSION, DEFAULT_URL, ENV_PREFIX};
pub use error::{ClientError, ClientResult};
pub use http::{build_http_client, Credentials, HttpTransport, TokenRefresher};
pub use user::UserInfo;

pub use gofigr_model;
