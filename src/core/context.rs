//! 交易上下文
//!
//! 一次计价交易内所有规则校验共享的只读信息：是否环球票、引擎配置与参考数据提供者。

use crate::core::models::EngineConfig;
use crate::core::providers::{AllianceProvider, GeoProvider, InMemoryReferenceData, TableProvider};
use std::sync::Arc;

/// 交易上下文
#[derive(Clone)]
pub struct TransactionContext {
    /// 环球票交易：没有去程/回程划分
    pub round_the_world: bool,
    pub config: EngineConfig,
    tables: Arc<dyn TableProvider>,
    geo: Arc<dyn GeoProvider>,
    alliances: Arc<dyn AllianceProvider>,
}

impl TransactionContext {
    /// 创建上下文，三类参考数据分别由不同提供者给出
    pub fn new(
        tables: Arc<dyn TableProvider>,
        geo: Arc<dyn GeoProvider>,
        alliances: Arc<dyn AllianceProvider>,
    ) -> Self {
        Self {
            round_the_world: false,
            config: EngineConfig::default(),
            tables,
            geo,
            alliances,
        }
    }

    /// 所有参考数据来自同一个内存数据集
    pub fn with_reference_data(data: InMemoryReferenceData) -> Self {
        let data = Arc::new(data);
        Self::new(data.clone(), data.clone(), data)
    }

    pub fn round_the_world(mut self, rtw: bool) -> Self {
        self.round_the_world = rtw;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tables(&self) -> &dyn TableProvider {
        self.tables.as_ref()
    }

    pub fn geo(&self) -> &dyn GeoProvider {
        self.geo.as_ref()
    }

    pub fn alliances(&self) -> &dyn AllianceProvider {
        self.alliances.as_ref()
    }
}

impl Default for TransactionContext {
    fn default() -> Self {
        Self::with_reference_data(InMemoryReferenceData::new())
    }
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("round_the_world", &self.round_the_world)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
