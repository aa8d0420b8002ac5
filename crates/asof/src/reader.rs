//! Reader facade with named, cached factor accessors.

use crate::cache::{BoundedCache, Memo};
use crate::config::{DEFAULT_INDUSTRY_CACHE_SIZE, ReaderConfig};
use crate::error::Result;
use crate::universe::{StockTickers, Universe};
use asof_data::{SqliteStore, StorePort};
use asof_factors::{
    CompactFactor, ContinuousFactor, FactorMatrix, IndustryFactor, IndustryProvider,
    JsonTranslation, TradingCalendar, TranslationSource,
};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Event table of security names.
pub const SEC_NAME_TABLE: &str = "sec_name";
/// Event table of adjustment factors.
pub const ADJ_FACTOR_TABLE: &str = "adj_factor";
/// Event table of free-floating A shares.
pub const FREE_A_SHARES_TABLE: &str = "free_a_shares";
/// Event table of total shares.
pub const TOTAL_SHARE_TABLE: &str = "total_share";
/// Event table of floating shares.
pub const FLOATING_SHARE_TABLE: &str = "floating_share";
/// Daily price and volume table.
pub const STOCK_DAILY_TABLE: &str = "stock_daily";
/// Event table with one membership column (1 in, 0 out) per index.
pub const INDEX_CONSTITUTE_TABLE: &str = "index_constitute";

/// Entry point for point-in-time factor access.
///
/// Each accessor builds its factor on first use and returns the shared
/// instance afterwards. Failed builds are not remembered.
pub struct DataReader {
    store: Arc<dyn StorePort>,
    translations: Arc<dyn TranslationSource>,
    calendar: Memo<TradingCalendar>,
    stocks: Memo<StockTickers>,
    sec_name: Memo<CompactFactor>,
    adj_factor: Memo<CompactFactor>,
    free_a_shares: Memo<CompactFactor>,
    total_share: Memo<CompactFactor>,
    floating_share: Memo<CompactFactor>,
    close: Memo<ContinuousFactor>,
    open: Memo<ContinuousFactor>,
    high: Memo<ContinuousFactor>,
    low: Memo<ContinuousFactor>,
    volume: Memo<ContinuousFactor>,
    index_constitute: BoundedCache<String, CompactFactor>,
    industry: BoundedCache<(IndustryProvider, u8), IndustryFactor>,
}

impl fmt::Debug for DataReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataReader")
            .field("store", &self.store)
            .field("calendar_loaded", &self.calendar.is_initialized())
            .field("cached_industries", &self.industry.len())
            .finish_non_exhaustive()
    }
}

impl DataReader {
    /// Reader over `store` using the packaged industry translation.
    pub fn new(store: Arc<dyn StorePort>) -> Result<Self> {
        let translations = Arc::new(JsonTranslation::packaged()?);
        Ok(Self::with_translations(
            store,
            translations,
            DEFAULT_INDUSTRY_CACHE_SIZE,
        ))
    }

    /// Reader over `store` with an explicit translation source and cache size.
    pub fn with_translations(
        store: Arc<dyn StorePort>,
        translations: Arc<dyn TranslationSource>,
        industry_cache_size: usize,
    ) -> Self {
        Self {
            store,
            translations,
            calendar: Memo::new(),
            stocks: Memo::new(),
            sec_name: Memo::new(),
            adj_factor: Memo::new(),
            free_a_shares: Memo::new(),
            total_share: Memo::new(),
            floating_share: Memo::new(),
            close: Memo::new(),
            open: Memo::new(),
            high: Memo::new(),
            low: Memo::new(),
            volume: Memo::new(),
            index_constitute: BoundedCache::new(industry_cache_size),
            industry: BoundedCache::new(industry_cache_size),
        }
    }

    /// Open the configured SQLite database and translation source.
    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(SqliteStore::open(&config.database)?);
        let translations = match &config.industry_translation {
            Some(path) => JsonTranslation::from_path(path)?,
            None => JsonTranslation::packaged()?,
        };
        info!(
            database = %config.database.display(),
            translation = ?config.industry_translation,
            "opened data reader"
        );
        Ok(Self::with_translations(
            store,
            Arc::new(translations),
            config.industry_cache_size,
        ))
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn StorePort> {
        &self.store
    }

    /// Industry translation source.
    pub fn translations(&self) -> &Arc<dyn TranslationSource> {
        &self.translations
    }

    /// Trading calendar.
    pub fn calendar(&self) -> Result<Arc<TradingCalendar>> {
        self.calendar
            .get_or_try_init(|| Ok(TradingCalendar::load(self.store.as_ref())?))
    }

    /// Stock listing history.
    pub fn stocks(&self) -> Result<Arc<StockTickers>> {
        self.stocks.get_or_try_init(|| {
            StockTickers::new(self.store.as_ref(), self.trading_calendar()?)
        })
    }

    /// Security names.
    pub fn sec_name(&self) -> Result<Arc<CompactFactor>> {
        self.compact(&self.sec_name, SEC_NAME_TABLE)
    }

    /// Price adjustment factors.
    pub fn adj_factor(&self) -> Result<Arc<CompactFactor>> {
        self.compact(&self.adj_factor, ADJ_FACTOR_TABLE)
    }

    /// Free-floating A shares.
    pub fn free_a_shares(&self) -> Result<Arc<CompactFactor>> {
        self.compact(&self.free_a_shares, FREE_A_SHARES_TABLE)
    }

    /// Total shares.
    pub fn total_share(&self) -> Result<Arc<CompactFactor>> {
        self.compact(&self.total_share, TOTAL_SHARE_TABLE)
    }

    /// Floating shares.
    pub fn floating_share(&self) -> Result<Arc<CompactFactor>> {
        self.compact(&self.floating_share, FLOATING_SHARE_TABLE)
    }

    /// Daily close.
    pub fn close(&self) -> Result<Arc<ContinuousFactor>> {
        self.daily(&self.close, "close")
    }

    /// Daily open.
    pub fn open(&self) -> Result<Arc<ContinuousFactor>> {
        self.daily(&self.open, "open")
    }

    /// Daily high.
    pub fn high(&self) -> Result<Arc<ContinuousFactor>> {
        self.daily(&self.high, "high")
    }

    /// Daily low.
    pub fn low(&self) -> Result<Arc<ContinuousFactor>> {
        self.daily(&self.low, "low")
    }

    /// Daily volume.
    pub fn volume(&self) -> Result<Arc<ContinuousFactor>> {
        self.daily(&self.volume, "volume")
    }

    /// Membership flags (1 in, 0 out) of `index`, forward filled.
    pub fn index_constitute(&self, index: &str) -> Result<Arc<CompactFactor>> {
        self.index_constitute.get_or_try_init(index.to_string(), || {
            Ok(CompactFactor::with_field(
                self.store.as_ref(),
                self.trading_calendar()?,
                INDEX_CONSTITUTE_TABLE,
                index,
            )?)
        })
    }

    /// Industry classification of `provider` at `level`.
    pub fn industry(&self, provider: IndustryProvider, level: u8) -> Result<Arc<IndustryFactor>> {
        self.industry.get_or_try_init((provider, level), || {
            debug!(%provider, level, "building industry factor");
            Ok(IndustryFactor::new(
                self.store.as_ref(),
                self.trading_calendar()?,
                provider,
                level,
                self.translations.as_ref(),
            )?)
        })
    }

    /// Restrict and order `matrix` columns to the stocks listed on `as_of`.
    pub fn align_to_listed(&self, matrix: &FactorMatrix, as_of: NaiveDate) -> Result<FactorMatrix> {
        let listed: Vec<String> = self.stocks()?.listed_securities(as_of)?.into_iter().collect();
        Ok(matrix.align_columns(&listed))
    }

    /// Exponentially decaying weights for `n` observations, oldest first.
    ///
    /// The newest weight is 1 and weights halve every `half_life` steps back.
    pub fn exponential_weight(n: usize, half_life: u32) -> Vec<f64> {
        let decay = std::f64::consts::LN_2 / f64::from(half_life.max(1));
        (0..n)
            .map(|i| (-decay * (n - 1 - i) as f64).exp())
            .collect()
    }

    fn trading_calendar(&self) -> Result<TradingCalendar> {
        Ok(TradingCalendar::clone(&*self.calendar()?))
    }

    fn compact(&self, memo: &Memo<CompactFactor>, table: &str) -> Result<Arc<CompactFactor>> {
        memo.get_or_try_init(|| {
            Ok(CompactFactor::new(
                self.store.as_ref(),
                self.trading_calendar()?,
                table,
            )?)
        })
    }

    fn daily(&self, memo: &Memo<ContinuousFactor>, field: &str) -> Result<Arc<ContinuousFactor>> {
        memo.get_or_try_init(|| {
            Ok(ContinuousFactor::new(
                Arc::clone(&self.store),
                self.trading_calendar()?,
                STOCK_DAILY_TABLE,
                [field],
            )?)
        })
    }
}
