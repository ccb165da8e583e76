use saddle_core::mapping::{MappedStatement, ResultMap};

/// How a mapper method dispatches into the session, and what shape its
/// result takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind {
    SelectOne,
    SelectList,
    /// Select into a map keyed by the named result property.
    SelectMap { key: String },
    Insert,
    Update,
    Delete,
}

/// One interface method: its name, dispatch kind, and declared parameter
/// names (used to pack multi-argument calls into a parameter record).
#[derive(Debug, Clone)]
pub struct MethodDef {
    name: String,
    kind: MethodKind,
    param_names: Vec<String>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
            param_names: vec![],
        }
    }

    /// Declares the name of the next parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.param_names.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

/// A mapper interface ready for registration: its name, its methods, and the
/// statements/result maps it contributes to the catalogue.
///
/// Statement ids are conventionally `interface.method`; registration
/// validates that every declared method resolves to one.
#[derive(Debug, Default)]
pub struct MapperDef {
    interface: String,
    methods: Vec<MethodDef>,
    statements: Vec<MappedStatement>,
    result_maps: Vec<ResultMap>,
}

impl MapperDef {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            methods: vec![],
            statements: vec![],
            result_maps: vec![],
        }
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn statement(mut self, statement: MappedStatement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn result_map(mut self, result_map: ResultMap) -> Self {
        self.result_maps.push(result_map);
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub(crate) fn into_parts(self) -> (String, Vec<MethodDef>, Vec<MappedStatement>, Vec<ResultMap>) {
        (
            self.interface,
            self.methods,
            self.statements,
            self.result_maps,
        )
    }
}
