pub mod binding;
pub use binding::{MapperDef, MapperProxy, MapperRegistry, MethodDef, MethodKind};

pub mod executor;
pub use executor::{BatchResult, ExecutorKind, LocalCacheScope};

pub mod result;
pub use result::{DuplicateKeyPolicy, ResultContext, ResultHandler};

pub mod session;
pub use session::{Session, SessionFactory, SessionOptions, Settings};

pub use saddle_core::{
    catalog::Catalog,
    driver::{Connection, Driver},
    mapping::{self, MappedStatement, ResultMap, ResultMapping, RowBounds, StatementKind},
    stmt::{self, Value, ValueRecord},
    Error, Result,
};
