pub mod descriptor;
pub mod levels;
pub mod skeleton;
pub mod validate;

pub use descriptor::{TableSchema, TableSchemaBuilder, TableSchemaConfig};
pub use levels::{LevelEnum, Levels};
pub use skeleton::{init_skeleton, RowSource};
pub use validate::{check_col_levels, check_row_levels, normalize, validate};
