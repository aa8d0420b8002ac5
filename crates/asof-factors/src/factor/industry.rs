//! Industry classification factor.

use super::{CompactFactor, Factor, FactorIdentity};
use crate::calendar::TradingCalendar;
use crate::error::Result;
use crate::matrix::{FactorMatrix, FactorOutput};
use crate::provider::IndustryProvider;
use crate::query::QueryFilter;
use crate::translation::TranslationSource;
use asof_data::{StorePort, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Industry codes of one provider at a chosen level.
///
/// Events are stored at the provider's native level. Coarser levels are
/// produced by translating each forward-filled code; codes the translation
/// does not cover become missing.
#[derive(Debug, Clone)]
pub struct IndustryFactor {
    provider: IndustryProvider,
    level: u8,
    events: CompactFactor,
    mapping: Option<Arc<HashMap<String, String>>>,
}

impl IndustryFactor {
    /// Industry factor for `provider` at `level`.
    ///
    /// `translations` is consulted only when `level` is coarser than native.
    pub fn new(
        store: &dyn StorePort,
        calendar: TradingCalendar,
        provider: IndustryProvider,
        level: u8,
        translations: &dyn TranslationSource,
    ) -> Result<Self> {
        provider.check_level(level)?;
        let table = provider.table_name();
        let events = CompactFactor::new(store, calendar, &table)?;

        let mapping = if level < provider.native_level() {
            let map = translations.load_translation(&table)?.level_map(level);
            debug!(%provider, level, codes = map.len(), "loaded industry translation");
            Some(Arc::new(map))
        } else {
            None
        };

        Ok(Self {
            provider,
            level,
            events,
            mapping,
        })
    }

    /// Classification provider.
    pub const fn provider(&self) -> IndustryProvider {
        self.provider
    }

    /// Output level.
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Industry code matrix for `filter`.
    pub fn matrix(&self, filter: &QueryFilter) -> Result<FactorMatrix> {
        let matrix = self.events.matrix(filter)?;
        Ok(match &self.mapping {
            Some(mapping) => matrix.map_values(|code| {
                let code = code.to_string();
                mapping.get(&code).cloned().map(Value::Text)
            }),
            None => matrix,
        })
    }
}

impl Factor for IndustryFactor {
    fn identity(&self) -> &FactorIdentity {
        self.events.identity()
    }

    fn name(&self) -> String {
        format!("{}_level_{}", self.identity().table(), self.level)
    }

    fn get_data(&self, filter: &QueryFilter) -> Result<FactorOutput> {
        self.matrix(filter).map(FactorOutput::Matrix)
    }
}
