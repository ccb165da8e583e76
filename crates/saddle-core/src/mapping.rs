mod bound_sql;
pub use bound_sql::BoundSql;

mod discriminator;
pub use discriminator::Discriminator;

pub mod mapped_statement;
pub use mapped_statement::{MappedStatement, StatementHints, StatementKind};

pub mod result_map;
pub use result_map::ResultMap;

pub mod result_mapping;
pub use result_mapping::{ResultFlag, ResultMapping};

mod row_bounds;
pub use row_bounds::RowBounds;
