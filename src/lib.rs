pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

use application::ports::cache::EntityCache;
use application::ports::social_api::SocialApi;
use application::services::{ActionCoordinator, InteractionService, OptimisticMutator};
use domain::entities::SessionContext;
use infrastructure::cache::EntityCacheService;
use shared::config::CoreConfig;
use shared::error::AppError;
use std::sync::Arc;
use tracing::info;

/// ログ出力を初期化する。既に初期化済みなら何もしない
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surge_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// キャッシュ・コーディネーター・ミューテーターを組み立てたもの
///
/// グローバルな状態は持たない。画面ごとに同じインスタンスを共有して使う。
pub struct SurgeCore {
    cache: Arc<EntityCacheService>,
    interactions: InteractionService,
}

impl SurgeCore {
    pub fn new(
        config: CoreConfig,
        api: Arc<dyn SocialApi>,
        session: SessionContext,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let cache = Arc::new(EntityCacheService::with_config(&config.cache));
        let mutator = OptimisticMutator::new(
            Arc::clone(&cache) as Arc<dyn EntityCache>,
            &config.ledger,
        );
        let interactions = InteractionService::new(
            api,
            mutator,
            ActionCoordinator::new(),
            session,
            config.validation.clone(),
        );
        info!(
            max_posts = config.cache.max_posts,
            history_limit = config.ledger.history_limit,
            "interaction core ready"
        );

        Ok(Self {
            cache,
            interactions,
        })
    }

    /// 環境変数から設定を読み込んで組み立てる
    pub fn from_env(api: Arc<dyn SocialApi>, session: SessionContext) -> Result<Self, AppError> {
        Self::new(CoreConfig::from_env(), api, session)
    }

    pub fn cache(&self) -> &Arc<EntityCacheService> {
        &self.cache
    }

    pub fn interactions(&self) -> &InteractionService {
        &self.interactions
    }
}
