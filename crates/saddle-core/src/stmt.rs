mod param;
pub use param::resolve;

mod row;
pub use row::{Row, RowSet};

mod value;
pub use value::Value;

mod value_record;
pub use value_record::ValueRecord;
