mod handler;
pub use handler::{
    DuplicateKeyPolicy, ListResultHandler, MapResultCollector, ResultContext, ResultHandler,
};

mod row_mapper;
pub(crate) use row_mapper::map_result_set;
