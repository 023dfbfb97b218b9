//! Declarative resource model for GoFigr.
//!
//! Maps in-memory entities onto the GoFigr REST resource graph:
//! - [`FieldDescriptor`]: how one attribute converts to and from the wire
//! - [`Entity`]: a synchronized resource with lazy loading and a
//!   create / fetch / save / delete lifecycle
//! - [`EntityCollection`]: ordered linked entities with lookup and
//!   create-with-backlink
//! - [`Shareable`]: access-control operations on shareable resources
//! - [`Data`]: binary payloads (images, code, text, tables) embedded in
//!   revisions
//!
//! Entities reach the service only through a [`Session`], which owns the
//! [`Transport`] and the [`ModelRegistry`] of known entity types.
//!
//! # Example
//!
//! ```no_run
//! # use gofigr_model::{Session, Transport, ModelResult};
//! # fn run(transport: impl Transport + 'static) -> ModelResult<()> {
//! use gofigr_model::{Workspace, WorkspaceMembership};
//!
//! let session = Session::new(transport);
//! let workspace = Workspace::build(
//!     Workspace::builder(&session).field("name", "Experiments"),
//! )?;
//! workspace.create(false)?;
//!
//! let analysis = workspace.get_analysis("Dose response", true)?;
//! let figure = analysis.get_figure("IC50 curve", true)?;
//! workspace.add_member("alice", WorkspaceMembership::Viewer)?;
//! # let _ = figure;
//! # Ok(())
//! # }
//! ```

mod collection;
pub mod data;
mod entity;
mod error;
mod field;
mod models;
mod schema;
mod session;
mod sharing;
mod transport;
mod value;

pub use collection::EntityCollection;
pub use data::{Data, DataObject, DataType};
pub use entity::{Entity, EntityBuilder, JsonOptions, SaveOptions, WeakEntity};
pub use error::{ModelError, ModelResult, TransportError, TransportResult};
pub use field::{FieldDescriptor, FieldKind, LinkSpec, NestedKind, NestedSpec, SortKey};
pub use models::{
    Analysis, ApiKey, Figure, LogItem, Recents, Revision, Workspace, WorkspaceMember,
    WorkspaceMembership, WorkspaceType,
};
pub use schema::{EntitySchema, ModelRegistry, API_ID};
pub use session::Session;
pub use sharing::{LinkSharingStatus, Shareable, SharingUserData};
pub use transport::Transport;
pub use value::FieldValue;

pub use gofigr_types::{ApiId, Timestamp};
