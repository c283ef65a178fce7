//! Cross-hierarchy moves for media plans.
//!
//! Moving elements is a three-step flow:
//!
//! 1. **Selection analysis** ([`analyze_selection`]): reduce an arbitrary
//!    selection to its root elements and check that they can travel together.
//! 2. **Destination picking** ([`DestinationPicker`]): walk campaign →
//!    version → onglet → ... down to the level that receives the roots,
//!    one asynchronous list load per level.
//! 3. **Execution** ([`execute_move`]): copy each root subtree under the
//!    destination, delete the original and keep orders dense on both sides.

pub mod cascade;
pub mod error;
pub mod level;
pub mod operation;
pub mod selection;

pub use cascade::{DestinationPicker, LevelState, LoadRequest, MoveDestination, MoveTarget, fetch_level};
pub use error::{MoveError, Result};
pub use level::{CascadeLevel, TargetLevel};
pub use operation::{MoveReport, RootOutcome, execute_move};
pub use selection::{SelectedItem, SelectionAnalysis, analyze_selection, infer_kind};
