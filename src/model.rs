mod axis;
mod error;
mod index;
mod position;
mod table;


pub use axis::PositionAxis;
pub use error::{ModelError, Result};
pub use index::{MatchMode, PositionIndex};
pub use position::{PositionColumns, PositionEntry};
pub use table::{RowId, Table, TableRow};
