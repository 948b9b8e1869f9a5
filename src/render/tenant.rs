use std::fmt;

/// Supplies the schema substituted for the tenant placeholder
pub trait TenantResolver: Send + Sync + fmt::Debug {
    fn tenant_schema(&self) -> anyhow::Result<String>;
}

/// Resolver that always answers the same schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTenant(pub String);

impl StaticTenant {
    pub fn new(schema: impl Into<String>) -> Self {
        Self(schema.into())
    }
}

impl TenantResolver for StaticTenant {
    fn tenant_schema(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}
