//! Cell addressing for the hexgrid discrete global grid.
//!
//! Every cell of the multi-resolution tessellation is named by a
//! [`CellIndex`]: an ordered sequence of [`Step`]s from the root of the
//! hierarchy. The first four levels are abstract scaffolding (root,
//! hemispheres, a forced globe node, the icosahedron vertices); from
//! level 4 on, each level corresponds to one real-world resolution.
//!
//! The address-space topology is captured by the [`CellClass`] state
//! machine in [`topology`]; no projection math lives here. Geometry
//! (neighbour tables, region intersection) is a collaborator concern.
//!
//! # Modules
//!
//! - [`error`]: error types
//! - `step`: [`Step`] and [`Level`] value types
//! - `topology`: the child-count state machine and [`Site`] positions
//! - `index`: [`CellIndex`] and its textual format
//! - `descendants`: lazy descendant enumeration

pub mod error;

mod descendants;
mod index;
mod step;
mod topology;

pub use descendants::Descendants;
pub use error::{CellError, Result};
pub use index::CellIndex;
pub use step::{Level, Step};
pub use topology::{CellClass, Site};
